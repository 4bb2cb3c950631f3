use crate::core::models::{ModuleType, TransformOutput};
use crate::utils::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// File system operations interface
#[async_trait]
pub trait FileSystemService: Send + Sync {
    async fn read_file(&self, path: &Path) -> Result<String>;
    async fn write_file(&self, path: &Path, content: &str) -> Result<()>;
    async fn create_directory(&self, path: &Path) -> Result<()>;
    fn file_exists(&self, path: &Path) -> bool;
    fn is_directory(&self, path: &Path) -> bool;
}

/// Context handed to a transform for one module.
#[derive(Debug, Clone)]
pub struct TransformContext {
    /// Resolved path of the module being transformed
    pub path: PathBuf,
    pub module_type: ModuleType,
    /// Per-step options from the matching rule
    pub options: HashMap<String, serde_json::Value>,
}

impl TransformContext {
    /// Boolean option lookup with a default
    pub fn bool_option(&self, key: &str, default: bool) -> bool {
        self.options
            .get(key)
            .and_then(|v| v.as_bool())
            .unwrap_or(default)
    }

    /// String-list option lookup (absent → empty)
    pub fn string_list_option(&self, key: &str) -> Vec<String> {
        self.options
            .get(key)
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// A content transform: a pure function of (content, options) producing a
/// primary output plus optional side artifacts. Concrete transforms are
/// registered by identifier and resolved at configuration-load time.
#[async_trait]
pub trait Transform: Send + Sync {
    /// Identifier rules refer to this transform by
    fn id(&self) -> &str;

    async fn apply(&self, content: &str, ctx: &TransformContext) -> Result<TransformOutput>;
}

/// Static dependency discovery over raw content.
pub trait DependencyScanner: Send + Sync {
    /// Ordered dependency references found in `content`
    fn list_dependencies(&self, content: &str, module_type: ModuleType) -> Vec<String>;
}
