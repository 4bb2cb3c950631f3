use crate::core::interfaces::Transform;
use crate::core::models::Rule;
use crate::utils::{KilnError, Result};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Registry mapping transform identifiers to implementations. Rules are
/// resolved against it at configuration-load time, so an unknown identifier
/// fails before any run begins.
#[derive(Default)]
pub struct TransformRegistry {
    transforms: HashMap<String, Arc<dyn Transform>>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, transform: Arc<dyn Transform>) {
        self.transforms.insert(transform.id().to_string(), transform);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Transform>> {
        self.transforms.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

/// One resolved step of a module's transform chain.
#[derive(Clone)]
pub struct ChainStep {
    pub transform: Arc<dyn Transform>,
    pub options: HashMap<String, serde_json::Value>,
    pub advisory: bool,
}

struct CompiledRule {
    test: Regex,
    exclude: Option<Regex>,
    steps: Vec<ChainStep>,
}

/// A profile's rule set, compiled once at load time and read-only for the
/// run's duration.
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    pub fn compile(rules: &[Rule], registry: &TransformRegistry) -> Result<Self> {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            let test = Regex::new(&rule.test)?;
            let exclude = rule.exclude.as_deref().map(Regex::new).transpose()?;

            let mut steps = Vec::with_capacity(rule.steps.len());
            for step in &rule.steps {
                let transform = registry.get(&step.id).ok_or_else(|| {
                    KilnError::config(format!(
                        "Rule '{}' references unknown transform '{}'",
                        rule.test, step.id
                    ))
                })?;
                steps.push(ChainStep {
                    transform,
                    options: step.options.clone(),
                    advisory: step.advisory,
                });
            }

            compiled.push(CompiledRule {
                test,
                exclude,
                steps,
            });
        }
        Ok(Self { rules: compiled })
    }

    /// Resolve the transform chain for a path. Rules are cumulative: every
    /// matching rule appends its steps in rule-set order. An empty chain is
    /// a valid pass-through, not an error.
    pub fn chain_for(&self, path: &Path) -> Vec<ChainStep> {
        let path_str = path.to_string_lossy();
        let mut chain = Vec::new();
        for rule in &self.rules {
            if !rule.test.is_match(&path_str) {
                continue;
            }
            if let Some(exclude) = &rule.exclude {
                if exclude.is_match(&path_str) {
                    continue;
                }
            }
            chain.extend(rule.steps.iter().cloned());
        }
        chain
    }
}
