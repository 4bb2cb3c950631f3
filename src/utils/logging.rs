use std::time::Instant;
use tracing::{debug, error, info, warn};

pub struct Logger;

impl Logger {
    pub fn init() {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "kiln=info".into()),
            )
            .with_target(false)
            .init();
    }

    pub fn run_start(profile: &str, outdir: &str) {
        info!("🔨 Kiln - Pipeline Run");
        info!("═══════════════════════════════════════");
        info!("🧱 Profile: {}", profile);
        info!("📦 Output: {}", outdir);
    }

    pub fn resolving(entry_count: usize) {
        info!("📁 Resolving module graph from {} entries...", entry_count);
    }

    pub fn graph_resolved(module_count: usize) {
        info!("📦 Resolved {} modules", module_count);
    }

    pub fn transforming(name: &str, chain: &str) {
        debug!("⚡ Transforming: {} [{}]", name, chain);
    }

    pub fn emitted(path: &str, size: usize) {
        info!("📄 Emitted {} ({} bytes)", path, size);
    }

    pub fn run_complete(
        module_count: usize,
        artifact_count: usize,
        duration: std::time::Duration,
        outdir: &str,
    ) {
        info!("");
        info!("📊 Run Statistics:");
        info!("  • Modules processed: {}", module_count);
        info!("  • Artifacts emitted: {}", artifact_count);
        info!("  • Run time: {:.2?}", duration);
        info!("  • Output directory: {}", outdir);
        info!("");
        info!("✅ Run completed successfully!");
    }

    pub fn info(msg: &str) {
        info!("{}", msg);
    }

    pub fn debug(msg: &str) {
        debug!("{}", msg);
    }

    pub fn error(msg: &str) {
        error!("❌ {}", msg);
    }

    pub fn warn(msg: &str) {
        warn!("⚠️  {}", msg);
    }
}

pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn start(name: &str) -> Self {
        debug!("⏱️  Starting: {}", name);
        Self {
            start: Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        debug!("⏱️  Completed: {} in {:.2?}", self.name, self.elapsed());
    }
}
