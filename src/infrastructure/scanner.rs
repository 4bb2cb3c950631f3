use crate::core::interfaces::DependencyScanner;
use crate::core::models::ModuleType;
use once_cell::sync::Lazy;
use regex::Regex;

// Pre-compiled patterns for static dependency discovery
static ES_IMPORT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^\s*import\s+(?:[\w${},*\s]+\s+from\s+)?['"]([^'"]+)['"]"#).unwrap()
});

static REQUIRE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\brequire\s*\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap());

static EXPORT_FROM_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^\s*export\s+(?:\*|\{[^}]*\})\s+from\s+['"]([^'"]+)['"]"#).unwrap());

static CSS_IMPORT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"@(?:import|use)\s+(?:url\s*\(\s*)?['"]([^'"]+)['"]"#).unwrap()
});

/// Regex-based static dependency scanner. Scripts contribute ES imports,
/// re-exports and CommonJS requires; stylesheets contribute `@import`/`@use`
/// references. Other content types have no statically discoverable
/// dependencies.
pub struct RegexDependencyScanner;

impl RegexDependencyScanner {
    pub fn new() -> Self {
        Self
    }

    fn scan_script(content: &str) -> Vec<String> {
        let mut references = Vec::new();
        for regex in [&*ES_IMPORT_REGEX, &*EXPORT_FROM_REGEX, &*REQUIRE_REGEX] {
            for capture in regex.captures_iter(content) {
                references.push(capture[1].to_string());
            }
        }
        references
    }

    fn scan_stylesheet(content: &str) -> Vec<String> {
        CSS_IMPORT_REGEX
            .captures_iter(content)
            .map(|capture| capture[1].to_string())
            // Remote imports are not part of the local graph
            .filter(|reference| !reference.contains("://"))
            .collect()
    }
}

impl Default for RegexDependencyScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyScanner for RegexDependencyScanner {
    fn list_dependencies(&self, content: &str, module_type: ModuleType) -> Vec<String> {
        match module_type {
            ModuleType::Script => Self::scan_script(content),
            ModuleType::Stylesheet | ModuleType::Sass => Self::scan_stylesheet(content),
            ModuleType::Json | ModuleType::Unknown => Vec::new(),
        }
    }
}
