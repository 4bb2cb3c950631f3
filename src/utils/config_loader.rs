use crate::core::models::{EntrySource, KilnConfig};
use crate::utils::{KilnError, Logger, Result};
use std::collections::HashSet;
use std::path::Path;

/// Loads and validates `kiln.config.json`. All validation happens here, at
/// startup: a broken configuration never starts a run.
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load(config_path: &Path) -> Result<KilnConfig> {
        if !config_path.is_file() {
            return Err(KilnError::config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        Logger::debug(&format!("Loading config from {}", config_path.display()));
        let content = std::fs::read_to_string(config_path).map_err(KilnError::Io)?;

        let mut config: KilnConfig = serde_json::from_str(&content).map_err(|e| {
            KilnError::config(format!(
                "Failed to parse {}: {}",
                config_path.display(),
                e
            ))
        })?;

        let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
        Self::anchor_paths(&mut config, base_dir);
        Self::validate(&config)?;
        Ok(config)
    }

    /// Relative paths in the config are relative to the config file's
    /// directory, not the process working directory.
    fn anchor_paths(config: &mut KilnConfig, base_dir: &Path) {
        for profile in &mut config.profiles {
            if profile.output_root.is_relative() {
                profile.output_root = base_dir.join(&profile.output_root);
            }
            if profile.resolve.root.is_relative() {
                profile.resolve.root = base_dir.join(&profile.resolve.root);
            }
            for source in profile.entries.values_mut() {
                if let EntrySource::Path(path) = source {
                    if path.is_relative() {
                        *path = base_dir.join(path.as_path());
                    }
                }
            }
        }
    }

    fn validate(config: &KilnConfig) -> Result<()> {
        if config.profiles.is_empty() {
            return Err(KilnError::config("No profiles declared"));
        }

        let mut seen = HashSet::new();
        for (index, profile) in config.profiles.iter().enumerate() {
            if !seen.insert(profile.name.as_str()) {
                return Err(KilnError::config(format!(
                    "Duplicate profile name '{}'",
                    profile.name
                )));
            }

            if profile.entries.is_empty() {
                return Err(KilnError::config(format!(
                    "Profile '{}' declares no entries",
                    profile.name
                )));
            }

            // A dependency must point at an earlier profile so declaration
            // order is a valid run order
            if let Some(dep) = &profile.depends_on {
                let position = config.profiles.iter().position(|p| &p.name == dep);
                match position {
                    None => {
                        return Err(KilnError::config(format!(
                            "Profile '{}' depends on unknown profile '{}'",
                            profile.name, dep
                        )))
                    }
                    Some(pos) if pos >= index => {
                        return Err(KilnError::config(format!(
                            "Profile '{}' must be declared after its dependency '{}'",
                            profile.name, dep
                        )))
                    }
                    Some(_) => {}
                }
            }

            // Cross-profile entries must reference declared profiles/entries
            config.resolved_entries(profile)?;
        }
        Ok(())
    }
}
