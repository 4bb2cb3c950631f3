use kiln::core::models::{EntrySource, Profile, ResolveOptions, RunState, Rule, TransformStep};
use kiln::core::orchestrator::PipelineOrchestrator;
use kiln::infrastructure::TokioFileSystemService;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

fn write(dir: &TempDir, rel: &str, content: &str) {
    let path = dir.path().join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn step(id: &str) -> TransformStep {
    TransformStep {
        id: id.to_string(),
        options: HashMap::new(),
        advisory: false,
    }
}

fn rule(test: &str, steps: Vec<TransformStep>) -> Rule {
    Rule {
        test: test.to_string(),
        exclude: None,
        steps,
    }
}

fn profile(dir: &TempDir, entries: &[(&str, &str)], filename: &str, rules: Vec<Rule>) -> Profile {
    Profile {
        name: "dev".to_string(),
        entries: entries
            .iter()
            .map(|(name, path)| {
                (
                    name.to_string(),
                    EntrySource::Path(dir.path().join(path)),
                )
            })
            .collect::<BTreeMap<_, _>>(),
        output_root: dir.path().join("dist"),
        filename: filename.to_string(),
        rules,
        resolve: ResolveOptions {
            root: dir.path().to_path_buf(),
            ..Default::default()
        },
        workers: Some(2),
        depends_on: None,
    }
}

fn entry_paths(profile: &Profile) -> Vec<(String, PathBuf)> {
    profile
        .entries
        .iter()
        .map(|(name, source)| match source {
            EntrySource::Path(path) => (name.clone(), path.clone()),
            EntrySource::ProfileOutput { .. } => unreachable!(),
        })
        .collect()
}

fn orchestrator() -> PipelineOrchestrator {
    PipelineOrchestrator::new(Arc::new(TokioFileSystemService))
}

#[tokio::test]
async fn test_lint_and_transpile_chain_on_script_entry() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "source/js/app.js",
        "import { greet } from \"./greet\";\nconst message = greet(\"kiln\");\nwindow.app = message;\n",
    );
    write(
        &dir,
        "source/js/greet.js",
        "export function greet(name) {\n  const prefix = \"Hello, \";\n  return prefix + name;\n}\n",
    );

    let profile = profile(
        &dir,
        &[("app", "source/js/app.js")],
        "[name].js",
        vec![
            rule(r"source/js/.*\.js$", vec![step("lint")]),
            rule(r"source/js/.*\.js$", vec![step("transpile")]),
        ],
    );

    let report = orchestrator()
        .run(&profile, &entry_paths(&profile))
        .await
        .unwrap();
    assert!(report.success());

    let bundle = std::fs::read_to_string(dir.path().join("dist/app.js")).unwrap();
    assert!(bundle.contains("var message"), "const must be downleveled");
    assert!(bundle.contains("var prefix"));
    assert!(!bundle.contains("const "));

    // Dependency-first bundling
    let greet = bundle.find("function greet").unwrap();
    let usage = bundle.find("window.app").unwrap();
    assert!(greet < usage);
}

#[tokio::test]
async fn test_fatal_lint_blocks_transpile_and_emission() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "source/js/app.js",
        "const x = 1;\ndebugger;\nwindow.x = x;\n",
    );

    let profile = profile(
        &dir,
        &[("app", "source/js/app.js")],
        "[name].js",
        vec![rule(r"\.js$", vec![step("lint"), step("transpile")])],
    );

    let report = orchestrator()
        .run(&profile, &entry_paths(&profile))
        .await
        .unwrap();

    assert_eq!(report.state, RunState::Failed);
    assert!(report.artifacts.is_empty());
    assert!(!dir.path().join("dist/app.js").exists());
    assert!(report.errors[0].contains("lint"));
    assert!(report.errors[0].contains("debugger"));
}

#[tokio::test]
async fn test_advisory_lint_logs_and_continues() {
    let dir = TempDir::new().unwrap();
    write(&dir, "source/js/app.js", "const x = 1;\ndebugger;\n");

    let mut advisory = step("lint");
    advisory.advisory = true;

    let profile = profile(
        &dir,
        &[("app", "source/js/app.js")],
        "[name].js",
        vec![rule(r"\.js$", vec![advisory, step("transpile")])],
    );

    let report = orchestrator()
        .run(&profile, &entry_paths(&profile))
        .await
        .unwrap();
    assert!(report.success());

    let bundle = std::fs::read_to_string(dir.path().join("dist/app.js")).unwrap();
    assert!(bundle.contains("var x"));
}

#[tokio::test]
async fn test_source_map_side_artifact_emitted_next_to_bundle() {
    let dir = TempDir::new().unwrap();
    write(&dir, "source/js/app.js", "const x = 1;\n");

    let mut transpile = step("transpile");
    transpile
        .options
        .insert("sourceMap".to_string(), serde_json::Value::Bool(true));

    let profile = profile(
        &dir,
        &[("app", "source/js/app.js")],
        "[name].js",
        vec![rule(r"\.js$", vec![transpile])],
    );

    let report = orchestrator()
        .run(&profile, &entry_paths(&profile))
        .await
        .unwrap();
    assert!(report.success());
    assert_eq!(report.artifacts.len(), 2);

    let map_path = dir.path().join("dist/app.js.map");
    assert!(map_path.exists());
    let map: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(map_path).unwrap()).unwrap();
    assert_eq!(map["version"], 3);
}

#[tokio::test]
async fn test_multi_module_source_map_is_one_valid_document() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "source/js/app.js",
        "import \"./dep\";\nconst x = 1;\n",
    );
    write(&dir, "source/js/dep.js", "const d = 2;\n");

    let mut transpile = step("transpile");
    transpile
        .options
        .insert("sourceMap".to_string(), serde_json::Value::Bool(true));

    let profile = profile(
        &dir,
        &[("app", "source/js/app.js")],
        "[name].js",
        vec![rule(r"\.js$", vec![transpile])],
    );

    let report = orchestrator()
        .run(&profile, &entry_paths(&profile))
        .await
        .unwrap();
    assert!(report.success());

    let raw = std::fs::read_to_string(dir.path().join("dist/app.js.map")).unwrap();
    let map: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(map["version"], 3);
    assert_eq!(map["file"], "app.js");
    // One map covering every module of the entry, dependency first
    let sources_content = map["sourcesContent"].as_array().unwrap();
    assert_eq!(sources_content.len(), 2);
    assert!(sources_content[0].as_str().unwrap().contains("d = 2"));
}

#[tokio::test]
async fn test_sass_entry_compiles_and_autoprefixes() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "source/sass/screen.scss",
        "@import \"variables\";\n.button {\n  user-select: none;\n  color: $primary;\n}\n",
    );
    write(&dir, "source/sass/_variables.scss", "$primary: #336699;\n");

    let profile = profile(
        &dir,
        &[("screen", "source/sass/screen.scss")],
        "[name].css",
        vec![rule(r"\.scss$", vec![step("sass"), step("autoprefix")])],
    );

    let report = orchestrator()
        .run(&profile, &entry_paths(&profile))
        .await
        .unwrap();
    assert!(report.success());

    let css = std::fs::read_to_string(dir.path().join("dist/screen.css")).unwrap();
    assert!(css.contains("336699"), "variable must be substituted");
    assert!(css.contains("-moz-user-select"), "prefixes must be added");
    assert!(css.contains(".button"));
}

#[tokio::test]
async fn test_rerun_on_unchanged_input_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "source/js/app.js",
        "import \"./a\";\nimport \"./b\";\nconst done = true;\n",
    );
    write(&dir, "source/js/a.js", "import \"./shared\";\nconst a = 1;\n");
    write(&dir, "source/js/b.js", "import \"./shared\";\nconst b = 2;\n");
    write(&dir, "source/js/shared.js", "const shared = 0;\n");

    let profile = profile(
        &dir,
        &[("app", "source/js/app.js")],
        "[name].js",
        vec![rule(r"\.js$", vec![step("transpile")])],
    );

    let first_report = orchestrator()
        .run(&profile, &entry_paths(&profile))
        .await
        .unwrap();
    assert!(first_report.success());
    let first = std::fs::read_to_string(dir.path().join("dist/app.js")).unwrap();

    // Diamond: shared module appears exactly once
    assert_eq!(first.matches("var shared = 0;").count(), 1);
    assert_eq!(first_report.modules_processed, 4);

    let second_report = orchestrator()
        .run(&profile, &entry_paths(&profile))
        .await
        .unwrap();
    assert!(second_report.success());
    let second = std::fs::read_to_string(dir.path().join("dist/app.js")).unwrap();

    assert_eq!(first, second, "reruns must be byte-identical");
}
