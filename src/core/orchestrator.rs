use crate::core::executor::{ChainExecutor, TransformedModule};
use crate::core::interfaces::{DependencyScanner, FileSystemService};
use crate::core::models::{Artifact, Profile, RunReport, RunState};
use crate::core::rules::{RuleSet, TransformRegistry};
use crate::infrastructure::emitter::ArtifactEmitter;
use crate::infrastructure::resolver::{ModuleGraphResolver, ResolvedGraph};
use crate::infrastructure::scanner::RegexDependencyScanner;
use crate::infrastructure::transforms::builtin_registry;
use crate::utils::{KilnError, Logger, Result, Timer};
use futures::stream::StreamExt;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

static IMPORT_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^\s*import\s+(?:[\w${},*\s]+\s+from\s+)?['"][^'"]+['"];?\s*$\n?"#).unwrap()
});

static REEXPORT_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^\s*export\s+(?:\*|\{[^}]*\})\s+from\s+['"][^'"]+['"];?\s*$\n?"#).unwrap()
});

static EXPORT_DECL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(\s*)export\s+(var|let|const|function|class)\b").unwrap()
});

/// Inlined script modules no longer need their module statements: static
/// imports point at content already concatenated above, and exported
/// declarations become plain declarations in the shared scope.
fn rewrite_script_statements(content: &str) -> String {
    let content = IMPORT_LINE_REGEX.replace_all(content, "");
    let content = REEXPORT_LINE_REGEX.replace_all(&content, "");
    EXPORT_DECL_REGEX.replace_all(&content, "$1$2").into_owned()
}

/// Same-named side artifacts from an entry's modules collapse into one
/// document. Source-location maps are merged by aggregating their
/// per-module fields so the result is itself a valid map; anything else is
/// concatenated.
fn merge_side_contents(file: &str, contents: &[String]) -> String {
    merge_location_maps(file, contents).unwrap_or_else(|| contents.join("\n"))
}

fn merge_location_maps(file: &str, contents: &[String]) -> Option<String> {
    let mut sources = Vec::new();
    let mut sources_content = Vec::new();
    let mut names = Vec::new();
    for raw in contents {
        let map: serde_json::Value = serde_json::from_str(raw).ok()?;
        if map.get("version")?.as_u64()? != 3 {
            return None;
        }
        sources.extend(map.get("sources")?.as_array()?.clone());
        sources_content.extend(
            map.get("sourcesContent")
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default(),
        );
        names.extend(
            map.get("names")
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default(),
        );
    }
    Some(
        serde_json::json!({
            "version": 3,
            "file": file,
            "sources": sources,
            "sourcesContent": sources_content,
            "names": names,
            "mappings": "",
        })
        .to_string(),
    )
}

/// Drives one profile run through `Resolving → Transforming → Emitting`.
/// The first unrecovered error from any phase moves the run to `Failed`;
/// artifacts already written stay on disk and are reported for cleanup.
/// A dependent profile's run is a separate instance of this machine; the
/// caller sequences runs, the orchestrator never waits across them.
pub struct PipelineOrchestrator {
    fs: Arc<dyn FileSystemService>,
    scanner: Arc<dyn DependencyScanner>,
    registry: TransformRegistry,
}

impl PipelineOrchestrator {
    pub fn new(fs: Arc<dyn FileSystemService>) -> Self {
        Self {
            fs,
            scanner: Arc::new(RegexDependencyScanner::new()),
            registry: builtin_registry(),
        }
    }

    pub fn with_registry(mut self, registry: TransformRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_scanner(mut self, scanner: Arc<dyn DependencyScanner>) -> Self {
        self.scanner = scanner;
        self
    }

    /// Run one profile over its resolved entry paths. Configuration
    /// problems (bad rule set) surface as `Err` before the run begins;
    /// anything later lands in the report as a `Failed` terminal state.
    pub async fn run(&self, profile: &Profile, entries: &[(String, PathBuf)]) -> Result<RunReport> {
        let started = Instant::now();
        Logger::run_start(&profile.name, &profile.output_root.display().to_string());

        // Startup: a broken rule set means the run never begins
        let rule_set = RuleSet::compile(&profile.rules, &self.registry)?;

        let mut artifacts = Vec::new();
        let mut modules_processed = 0;

        let outcome = self
            .execute(profile, entries, &rule_set, &mut artifacts, &mut modules_processed)
            .await;

        let duration = started.elapsed();
        match outcome {
            Ok(()) => {
                Logger::run_complete(
                    modules_processed,
                    artifacts.len(),
                    duration,
                    &profile.output_root.display().to_string(),
                );
                Ok(RunReport {
                    profile: profile.name.clone(),
                    state: RunState::Done,
                    modules_processed,
                    artifacts,
                    errors: Vec::new(),
                    duration,
                })
            }
            Err(err) => {
                Logger::error(&err.format_detailed());
                Ok(RunReport {
                    profile: profile.name.clone(),
                    state: RunState::Failed,
                    modules_processed,
                    artifacts,
                    errors: vec![err.format_detailed()],
                    duration,
                })
            }
        }
    }

    async fn execute(
        &self,
        profile: &Profile,
        entries: &[(String, PathBuf)],
        rule_set: &RuleSet,
        artifacts: &mut Vec<Artifact>,
        modules_processed: &mut usize,
    ) -> Result<()> {
        // Resolving
        Logger::resolving(entries.len());
        let graph = {
            let _timer = Timer::start("Module graph resolution");
            let resolver = ModuleGraphResolver::new(
                self.fs.clone(),
                self.scanner.clone(),
                profile.resolve.clone(),
            );
            resolver.resolve(entries).await?
        };
        Logger::graph_resolved(graph.module_count());
        *modules_processed = graph.module_count();

        // Transforming
        let transformed = self.transform_modules(profile, rule_set, &graph).await?;

        // Emitting
        self.emit_artifacts(profile, &graph, &transformed, artifacts)
            .await
    }

    /// Transform every unique module once, concurrently up to the profile's
    /// worker bound. The first failure drops the remaining in-flight work.
    async fn transform_modules(
        &self,
        profile: &Profile,
        rule_set: &RuleSet,
        graph: &ResolvedGraph,
    ) -> Result<HashMap<PathBuf, TransformedModule>> {
        let _timer = Timer::start("Transform chains");
        let workers = profile.workers.unwrap_or_else(num_cpus::get).max(1);

        // Sorted for a deterministic submission order
        let mut modules: Vec<_> = graph.modules.values().collect();
        modules.sort_by(|a, b| a.path.cmp(&b.path));

        let mut stream = futures::stream::iter(modules.into_iter().map(|module| {
            let chain = rule_set.chain_for(&module.path);
            async move {
                let chain_ids: Vec<&str> =
                    chain.iter().map(|step| step.transform.id()).collect();
                Logger::transforming(&module.path.display().to_string(), &chain_ids.join(" → "));
                let transformed = ChainExecutor::apply(module, &chain).await?;
                Ok::<_, KilnError>((module.path.clone(), transformed))
            }
        }))
        .buffer_unordered(workers);

        let mut transformed = HashMap::new();
        while let Some(result) = stream.next().await {
            let (path, output) = result?;
            transformed.insert(path, output);
        }
        Ok(transformed)
    }

    /// Claim every output path before the first write so a collision fails
    /// the run with nothing emitted from this phase, then write each
    /// entry's bundle (dependency-first concatenation) and its side
    /// artifacts.
    async fn emit_artifacts(
        &self,
        profile: &Profile,
        graph: &ResolvedGraph,
        transformed: &HashMap<PathBuf, TransformedModule>,
        artifacts: &mut Vec<Artifact>,
    ) -> Result<()> {
        let _timer = Timer::start("Artifact emission");
        let emitter = ArtifactEmitter::new(self.fs.clone());

        let mut planned: Vec<(PathBuf, String)> = Vec::new();
        for (entry_name, order) in &graph.entry_orders {
            let primary_path = profile.artifact_path(entry_name);
            emitter.claim(&primary_path, entry_name)?;

            let mut bundle = Vec::with_capacity(order.len());
            let mut side: BTreeMap<String, Vec<String>> = BTreeMap::new();
            for module_path in order {
                let output = &transformed[module_path];
                let content = match graph.modules[module_path].module_type {
                    crate::core::models::ModuleType::Script => {
                        rewrite_script_statements(&output.content)
                    }
                    _ => output.content.clone(),
                };
                bundle.push(content);
                for (name, content) in &output.side_artifacts {
                    side.entry(name.clone()).or_default().push(content.clone());
                }
            }
            planned.push((primary_path.clone(), bundle.join("\n")));

            let primary_file = primary_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            for (name, contents) in side {
                let side_path = PathBuf::from(format!("{}.{}", primary_path.display(), name));
                emitter.claim(&side_path, entry_name)?;
                planned.push((side_path, merge_side_contents(&primary_file, &contents)));
            }
        }

        for (path, content) in planned {
            artifacts.push(emitter.emit(&path, &content).await?);
        }
        Ok(())
    }
}
