use kiln::core::orchestrator::PipelineOrchestrator;
use kiln::infrastructure::TokioFileSystemService;
use kiln::utils::ConfigLoader;
use std::sync::Arc;
use tempfile::TempDir;

fn write(dir: &TempDir, rel: &str, content: &str) {
    let path = dir.path().join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

const TWO_PROFILE_CONFIG: &str = r#"{
    "profiles": [
        {
            "name": "dev",
            "entries": { "app": "source/js/app.js" },
            "outputRoot": "template/assets/js",
            "filename": "[name].js",
            "resolve": { "root": ".", "mainFields": ["web", "main"] },
            "rules": [
                { "test": "\\.js$", "exclude": "node_modules", "use": [ { "id": "lint" } ] },
                { "test": "source/js/.*\\.js$", "use": [ { "id": "transpile" } ] }
            ]
        },
        {
            "name": "buildjs",
            "dependsOn": "dev",
            "entries": { "app": { "profile": "dev", "entry": "app" } },
            "outputRoot": "template/assets/js",
            "filename": "[name].min.js",
            "resolve": { "root": "." },
            "rules": [
                { "test": "\\.js$", "use": [ { "id": "minify" } ] }
            ]
        }
    ]
}"#;

#[tokio::test]
async fn test_dependent_profile_reads_emitted_artifact_not_source() {
    let dir = TempDir::new().unwrap();
    write(&dir, "kiln.config.json", TWO_PROFILE_CONFIG);
    write(
        &dir,
        "source/js/app.js",
        "// dev-only banner comment\nconst answer = 42;\nwindow.answer = answer;\n",
    );

    let config = ConfigLoader::load(&dir.path().join("kiln.config.json")).unwrap();
    let orchestrator = PipelineOrchestrator::new(Arc::new(TokioFileSystemService));

    // Primary profile must reach Done before the dependent profile starts
    let dev = config.profile("dev").unwrap();
    let dev_report = orchestrator
        .run(dev, &config.resolved_entries(dev).unwrap())
        .await
        .unwrap();
    assert!(dev_report.success());

    let dev_bundle =
        std::fs::read_to_string(dir.path().join("template/assets/js/app.js")).unwrap();
    assert!(dev_bundle.contains("var answer"), "dev output is transpiled");
    assert!(dev_bundle.contains("dev-only banner"), "dev keeps comments");

    let buildjs = config.profile("buildjs").unwrap();
    let build_report = orchestrator
        .run(buildjs, &config.resolved_entries(buildjs).unwrap())
        .await
        .unwrap();
    assert!(build_report.success());

    let min_bundle =
        std::fs::read_to_string(dir.path().join("template/assets/js/app.min.js")).unwrap();
    // The minified artifact derives from the emitted bundle: the comment is
    // gone and the downleveled `var` form is what got minified, proving the
    // entry resolved to dev's output rather than the original source
    assert!(!min_bundle.contains("dev-only banner"));
    assert!(min_bundle.contains("var answer = 42;"));
    assert!(!min_bundle.contains("const"));
}

#[tokio::test]
async fn test_dependent_profile_without_primary_run_fails_resolution() {
    let dir = TempDir::new().unwrap();
    write(&dir, "kiln.config.json", TWO_PROFILE_CONFIG);
    write(&dir, "source/js/app.js", "const x = 1;\n");

    let config = ConfigLoader::load(&dir.path().join("kiln.config.json")).unwrap();
    let orchestrator = PipelineOrchestrator::new(Arc::new(TokioFileSystemService));

    // Skipping the dev run leaves nothing at dev's output path
    let buildjs = config.profile("buildjs").unwrap();
    let report = orchestrator
        .run(buildjs, &config.resolved_entries(buildjs).unwrap())
        .await
        .unwrap();

    assert!(!report.success());
    assert!(report.errors[0].contains("app.js"));
}

#[tokio::test]
async fn test_package_lookup_honors_configured_main_fields() {
    let dir = TempDir::new().unwrap();
    write(&dir, "kiln.config.json", TWO_PROFILE_CONFIG);
    write(
        &dir,
        "source/js/app.js",
        "import \"widget\";\nconst ready = true;\nwindow.ready = ready;\n",
    );
    write(
        &dir,
        "node_modules/widget/package.json",
        r#"{"name":"widget","web":"browser.js","main":"node.js"}"#,
    );
    write(&dir, "node_modules/widget/browser.js", "var widgetTarget = \"browser\";\n");
    write(&dir, "node_modules/widget/node.js", "var widgetTarget = \"node\";\n");

    let config = ConfigLoader::load(&dir.path().join("kiln.config.json")).unwrap();
    let orchestrator = PipelineOrchestrator::new(Arc::new(TokioFileSystemService));

    let dev = config.profile("dev").unwrap();
    let report = orchestrator
        .run(dev, &config.resolved_entries(dev).unwrap())
        .await
        .unwrap();
    assert!(report.success());

    let bundle =
        std::fs::read_to_string(dir.path().join("template/assets/js/app.js")).unwrap();
    assert!(bundle.contains("\"browser\""), "'web' field outranks 'main'");
    assert!(!bundle.contains("\"node\""));
}

#[tokio::test]
async fn test_excluded_package_code_skips_lint() {
    let dir = TempDir::new().unwrap();
    write(&dir, "kiln.config.json", TWO_PROFILE_CONFIG);
    // Package code that would fail the lint rule, excluded from it
    write(&dir, "source/js/app.js", "import \"legacy\";\nconst ok = true;\n");
    write(
        &dir,
        "node_modules/legacy/index.js",
        "if (window.mode == \"legacy\") { setup(); }\n",
    );

    let config = ConfigLoader::load(&dir.path().join("kiln.config.json")).unwrap();
    let orchestrator = PipelineOrchestrator::new(Arc::new(TokioFileSystemService));

    let dev = config.profile("dev").unwrap();
    let report = orchestrator
        .run(dev, &config.resolved_entries(dev).unwrap())
        .await
        .unwrap();
    assert!(report.success(), "excluded module must not be linted");
}
