use crate::utils::{KilnError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// One resolved unit of source content plus its statically discovered
/// dependency references. Immutable once read.
#[derive(Debug, Clone)]
pub struct Module {
    pub path: PathBuf,
    pub content: String,
    pub module_type: ModuleType,
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleType {
    Script,
    Stylesheet,
    Sass,
    Json,
    Unknown,
}

impl ModuleType {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "js" | "mjs" | "jsx" => ModuleType::Script,
            "css" => ModuleType::Stylesheet,
            "scss" | "sass" => ModuleType::Sass,
            "json" => ModuleType::Json,
            _ => ModuleType::Unknown,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|s| s.to_str())
            .map(Self::from_extension)
            .unwrap_or(ModuleType::Unknown)
    }
}

/// One step inside a rule: a transform identifier plus its options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformStep {
    pub id: String,
    #[serde(default)]
    pub options: HashMap<String, serde_json::Value>,
    /// Downgrade validation failures from this step to logged warnings.
    #[serde(default)]
    pub advisory: bool,
}

/// A path-matched rule contributing transform steps to a module's chain.
/// Rules are cumulative: every matching rule appends its steps in rule-set
/// order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Regex tested against the module path
    pub test: String,
    /// Paths matching this regex are skipped even when `test` matches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,
    #[serde(rename = "use")]
    pub steps: Vec<TransformStep>,
}

/// Where a profile entry's content comes from: a source file, or another
/// profile's emitted artifact (resolved through that profile's naming
/// contract, never re-discovered at runtime).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntrySource {
    Path(PathBuf),
    ProfileOutput { profile: String, entry: String },
}

/// Module reference resolution options (root lookup, manifest main-field
/// preference order, extension inference).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveOptions {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default = "default_main_fields")]
    pub main_fields: Vec<String>,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_main_fields() -> Vec<String> {
    vec!["main".to_string()]
}

fn default_extensions() -> Vec<String> {
    vec![
        "js".to_string(),
        "mjs".to_string(),
        "json".to_string(),
        "css".to_string(),
        "scss".to_string(),
    ]
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            root: default_root(),
            main_fields: default_main_fields(),
            extensions: default_extensions(),
        }
    }
}

/// A named, complete configuration for one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    /// Logical entry name → entry source. BTreeMap keeps entry order
    /// deterministic across runs.
    pub entries: BTreeMap<String, EntrySource>,
    pub output_root: PathBuf,
    /// Naming template; `[name]` is replaced by the entry's logical name.
    #[serde(default = "default_filename")]
    pub filename: String,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub resolve: ResolveOptions,
    /// Bounded worker count for module processing; defaults to CPU count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    /// Declared ordering dependency on another profile's artifacts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<String>,
}

fn default_filename() -> String {
    "[name].js".to_string()
}

impl Profile {
    /// Output path this profile's naming contract assigns to a logical
    /// entry name.
    pub fn artifact_path(&self, entry_name: &str) -> PathBuf {
        self.output_root
            .join(substitute_template(&self.filename, entry_name))
    }
}

/// Substitute the `[name]` placeholder in a naming template.
pub fn substitute_template(template: &str, name: &str) -> String {
    template.replace("[name]", name)
}

/// Top-level configuration: every declared profile, in declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KilnConfig {
    pub profiles: Vec<Profile>,
}

impl KilnConfig {
    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// Resolve a profile's entry sources into concrete paths. Cross-profile
    /// entries go through the referenced profile's naming contract; an
    /// unknown profile or entry is a configuration error.
    pub fn resolved_entries(&self, profile: &Profile) -> Result<Vec<(String, PathBuf)>> {
        let mut entries = Vec::with_capacity(profile.entries.len());
        for (name, source) in &profile.entries {
            let path = match source {
                EntrySource::Path(path) => path.clone(),
                EntrySource::ProfileOutput {
                    profile: other,
                    entry,
                } => {
                    let other = self.profile(other).ok_or_else(|| {
                        KilnError::config(format!(
                            "Profile '{}' entry '{}' references unknown profile '{}'",
                            profile.name, name, other
                        ))
                    })?;
                    if !other.entries.contains_key(entry) {
                        return Err(KilnError::config(format!(
                            "Profile '{}' entry '{}' references unknown entry '{}' of profile '{}'",
                            profile.name, name, entry, other.name
                        )));
                    }
                    other.artifact_path(entry)
                }
            };
            entries.push((name.clone(), path));
        }
        Ok(entries)
    }
}

/// Final emitted output of processing one entry.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub path: PathBuf,
    pub size: usize,
}

/// Run lifecycle. `Failed` is terminal and reachable from any non-terminal
/// state on the first unrecovered error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Resolving,
    Transforming,
    Emitting,
    Done,
    Failed,
}

/// Outcome of one orchestrator run. Artifacts written before a failure are
/// reported, not rolled back.
#[derive(Debug)]
pub struct RunReport {
    pub profile: String,
    pub state: RunState,
    pub modules_processed: usize,
    pub artifacts: Vec<Artifact>,
    pub errors: Vec<String>,
    pub duration: std::time::Duration,
}

impl RunReport {
    pub fn success(&self) -> bool {
        self.state == RunState::Done
    }
}

/// Primary output of a transform plus zero or more named side artifacts
/// (e.g. a source-location map).
#[derive(Debug, Clone, Default)]
pub struct TransformOutput {
    pub primary: String,
    pub side_artifacts: Vec<(String, String)>,
}

impl TransformOutput {
    pub fn primary(content: impl Into<String>) -> Self {
        Self {
            primary: content.into(),
            side_artifacts: Vec::new(),
        }
    }
}
