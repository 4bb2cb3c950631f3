use crate::core::interfaces::FileSystemService;
use crate::core::models::Artifact;
use crate::utils::{KilnError, Logger, Result};
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Writes final artifacts under a naming template. Output paths are claimed
/// in a shared set before any write, so two entries mapping onto one path
/// fail deterministically regardless of scheduling order, and never
/// silently overwrite each other.
pub struct ArtifactEmitter {
    fs: Arc<dyn FileSystemService>,
    claimed: DashMap<PathBuf, String>,
}

impl ArtifactEmitter {
    pub fn new(fs: Arc<dyn FileSystemService>) -> Self {
        Self {
            fs,
            claimed: DashMap::new(),
        }
    }

    /// Claim an output path for an entry. Fatal if another entry in this
    /// run already claimed it.
    pub fn claim(&self, path: &Path, entry_name: &str) -> Result<()> {
        if let Some(previous) = self.claimed.insert(path.to_path_buf(), entry_name.to_string()) {
            if previous != entry_name {
                return Err(KilnError::EmitCollision {
                    path: path.to_path_buf(),
                    first: previous,
                    second: entry_name.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Write a claimed artifact, creating intermediate directories as
    /// needed.
    pub async fn emit(&self, path: &Path, content: &str) -> Result<Artifact> {
        self.fs.write_file(path, content).await?;
        Logger::emitted(&path.display().to_string(), content.len());
        Ok(Artifact {
            path: path.to_path_buf(),
            size: content.len(),
        })
    }
}
