use crate::core::interfaces::{DependencyScanner, FileSystemService};
use crate::core::models::{Module, ModuleType, ResolveOptions};
use crate::utils::{KilnError, Logger, Result};
use futures::future::BoxFuture;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The reachable module graph of one run. Each entry carries its own
/// dependency-first (post-order) path list; module content is held once per
/// unique path regardless of how many entries reach it.
#[derive(Debug, Default)]
pub struct ResolvedGraph {
    pub entry_orders: Vec<(String, Vec<PathBuf>)>,
    pub modules: HashMap<PathBuf, Module>,
}

impl ResolvedGraph {
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }
}

/// Resolves entry paths into a deterministic, dependency-ordered module
/// graph. References are mapped to concrete paths via relative lookup,
/// root-absolute lookup, or a package directory under the configured root
/// (ordered main fields inside its manifest, then index inference).
pub struct ModuleGraphResolver {
    fs: Arc<dyn FileSystemService>,
    scanner: Arc<dyn DependencyScanner>,
    options: ResolveOptions,
}

impl ModuleGraphResolver {
    pub fn new(
        fs: Arc<dyn FileSystemService>,
        scanner: Arc<dyn DependencyScanner>,
        options: ResolveOptions,
    ) -> Self {
        Self {
            fs,
            scanner,
            options,
        }
    }

    /// Traverse from each entry. A module already visited within an entry's
    /// traversal is not re-read or re-traversed, so diamonds and cycles are
    /// safe; content is read once per run even across entries.
    pub async fn resolve(&self, entries: &[(String, PathBuf)]) -> Result<ResolvedGraph> {
        let mut graph = ResolvedGraph::default();

        for (name, entry_path) in entries {
            let resolved_entry = self
                .resolve_file_or_directory(entry_path)
                .await
                .ok_or_else(|| {
                    KilnError::resolution(
                        entry_path.to_string_lossy(),
                        PathBuf::from(format!("entry '{}'", name)),
                    )
                })?;

            let mut visited = HashSet::new();
            let mut order = Vec::new();
            self.visit(resolved_entry, &mut graph.modules, &mut visited, &mut order)
                .await?;
            graph.entry_orders.push((name.clone(), order));
        }

        Ok(graph)
    }

    fn visit<'a>(
        &'a self,
        path: PathBuf,
        modules: &'a mut HashMap<PathBuf, Module>,
        visited: &'a mut HashSet<PathBuf>,
        order: &'a mut Vec<PathBuf>,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            if !visited.insert(path.clone()) {
                // Diamond or cycle: edge recorded by the earlier visit
                return Ok(());
            }

            if !modules.contains_key(&path) {
                let content = self.fs.read_file(&path).await?;
                let module_type = ModuleType::from_path(&path);
                let dependencies = self.scanner.list_dependencies(&content, module_type);
                Logger::debug(&format!(
                    "🔍 Scanned {} ({} references)",
                    path.display(),
                    dependencies.len()
                ));
                modules.insert(
                    path.clone(),
                    Module {
                        path: path.clone(),
                        content,
                        module_type,
                        dependencies,
                    },
                );
            }

            let references = modules[&path].dependencies.clone();
            for reference in references {
                let resolved = self.resolve_reference(&reference, &path).await?;
                self.visit(resolved, modules, visited, order).await?;
            }

            // Post-order: dependencies land ahead of their dependents
            order.push(path);
            Ok(())
        })
    }

    /// Map one reference string to a concrete path. Unresolvable references
    /// are fatal; a broken graph must never produce an artifact set.
    async fn resolve_reference(&self, reference: &str, from: &Path) -> Result<PathBuf> {
        let resolved = if reference.starts_with("./") || reference.starts_with("../") {
            self.resolve_relative(reference, from).await
        } else if let Some(rooted) = reference.strip_prefix('/') {
            self.resolve_file_or_directory(&self.options.root.join(rooted))
                .await
        } else {
            // Bare specifier: package directory under the configured root,
            // then a root-relative file, then a sibling of the importer
            // (Sass-style bare imports and partials)
            let mut found = self.resolve_package(reference).await;
            if found.is_none() {
                found = self
                    .resolve_file_or_directory(&self.options.root.join(reference))
                    .await;
            }
            if found.is_none() {
                found = self.resolve_relative(&format!("./{}", reference), from).await;
            }
            found
        };

        resolved.ok_or_else(|| KilnError::resolution(reference, from.to_path_buf()))
    }

    async fn resolve_relative(&self, reference: &str, from: &Path) -> Option<PathBuf> {
        let base = from.parent()?;
        let candidate = base.join(reference);
        if let Some(found) = self.resolve_file_or_directory(&candidate).await {
            return Some(found);
        }

        // Sass partial convention: `./name` may live on disk as `_name.scss`
        let file_name = candidate.file_name()?.to_str()?;
        if !file_name.starts_with('_') {
            let partial = candidate.with_file_name(format!("_{}", file_name));
            return self.resolve_file_or_directory(&partial).await;
        }
        None
    }

    /// Package lookup: `<root>/node_modules/<name>` with the configured main
    /// fields tried in order against the package manifest, falling back to
    /// index inference. Subpaths bypass the manifest.
    async fn resolve_package(&self, specifier: &str) -> Option<PathBuf> {
        let (package, subpath) = split_package_specifier(specifier);
        let package_dir = self.options.root.join("node_modules").join(package);
        if !self.fs.is_directory(&package_dir) {
            return None;
        }

        if let Some(subpath) = subpath {
            return self.resolve_file_or_directory(&package_dir.join(subpath)).await;
        }

        let manifest_path = package_dir.join("package.json");
        if self.fs.file_exists(&manifest_path) {
            if let Ok(raw) = self.fs.read_file(&manifest_path).await {
                if let Ok(manifest) = serde_json::from_str::<serde_json::Value>(&raw) {
                    for field in &self.options.main_fields {
                        if let Some(main) = manifest.get(field).and_then(|v| v.as_str()) {
                            if let Some(found) =
                                self.resolve_file_or_directory(&package_dir.join(main)).await
                            {
                                return Some(found);
                            }
                        }
                    }
                }
            }
        }

        self.resolve_index(&package_dir).await
    }

    /// Try the path as-is, then with each inferred extension, then as a
    /// directory index. Existing paths are canonicalized so module identity
    /// survives `../` spelling differences.
    async fn resolve_file_or_directory(&self, candidate: &Path) -> Option<PathBuf> {
        if self.fs.file_exists(candidate) {
            return canonical(candidate);
        }

        for ext in &self.options.extensions {
            let with_ext = PathBuf::from(format!("{}.{}", candidate.display(), ext));
            if self.fs.file_exists(&with_ext) {
                return canonical(&with_ext);
            }
        }

        if self.fs.is_directory(candidate) {
            return self.resolve_index(candidate).await;
        }

        None
    }

    async fn resolve_index(&self, dir: &Path) -> Option<PathBuf> {
        for ext in &self.options.extensions {
            let index = dir.join(format!("index.{}", ext));
            if self.fs.file_exists(&index) {
                return canonical(&index);
            }
        }
        None
    }
}

fn canonical(path: &Path) -> Option<PathBuf> {
    std::fs::canonicalize(path).ok()
}

/// Split `pkg/sub/path` (and `@scope/pkg/sub`) into package name and
/// optional subpath.
fn split_package_specifier(specifier: &str) -> (&str, Option<&str>) {
    let segments = if specifier.starts_with('@') { 2 } else { 1 };
    let mut index = 0;
    for _ in 0..segments {
        match specifier[index..].find('/') {
            Some(pos) => index += pos + 1,
            None => return (specifier, None),
        }
    }
    (&specifier[..index - 1], Some(&specifier[index..]))
}
