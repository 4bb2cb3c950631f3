use crate::core::models::{KilnConfig, Profile};
use crate::core::orchestrator::PipelineOrchestrator;
use crate::infrastructure::TokioFileSystemService;
use crate::utils::{ConfigLoader, KilnError, Logger, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "kiln")]
#[command(about = "kiln - a small asset-pipeline engine")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a single named profile
    Run {
        /// Profile name as declared in the config file
        profile: String,
        /// Path to the configuration file
        #[arg(short, long, default_value = "kiln.config.json")]
        config: PathBuf,
        /// Override the profile's worker count
        #[arg(short, long)]
        workers: Option<usize>,
    },
    /// Run every profile in declared order (dependencies first)
    All {
        /// Path to the configuration file
        #[arg(short, long, default_value = "kiln.config.json")]
        config: PathBuf,
    },
    /// Show engine information
    Info,
}

pub struct CliHandler;

impl CliHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn run(&self) -> Result<()> {
        Logger::init();

        let cli = Cli::parse();
        match cli.command {
            Commands::Run {
                profile,
                config,
                workers,
            } => self.handle_run(&config, &profile, workers).await,
            Commands::All { config } => self.handle_all(&config).await,
            Commands::Info => self.handle_info(),
        }
    }

    async fn handle_run(
        &self,
        config_path: &PathBuf,
        profile_name: &str,
        workers: Option<usize>,
    ) -> Result<()> {
        let config = ConfigLoader::load(config_path)?;
        let profile = config.profile(profile_name).ok_or_else(|| {
            KilnError::config(format!(
                "Unknown profile '{}' (declared: {})",
                profile_name,
                config
                    .profiles
                    .iter()
                    .map(|p| p.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })?;

        let mut profile = profile.clone();
        if workers.is_some() {
            profile.workers = workers;
        }

        self.run_profile(&config, &profile).await
    }

    async fn handle_all(&self, config_path: &PathBuf) -> Result<()> {
        let config = ConfigLoader::load(config_path)?;

        // Declaration order is a valid run order: the loader rejects
        // forward dependencies
        for profile in config.profiles.clone() {
            self.run_profile(&config, &profile).await?;
        }
        Ok(())
    }

    async fn run_profile(&self, config: &KilnConfig, profile: &Profile) -> Result<()> {
        let entries = config.resolved_entries(profile)?;
        let orchestrator = PipelineOrchestrator::new(Arc::new(TokioFileSystemService));
        let report = orchestrator.run(profile, &entries).await?;

        if !report.success() {
            for error in &report.errors {
                eprintln!("❌ {}", error);
            }
            for artifact in &report.artifacts {
                eprintln!("⚠️  Partial artifact left on disk: {}", artifact.path.display());
            }
            return Err(KilnError::RunFailed {
                profile: profile.name.clone(),
            });
        }
        Ok(())
    }

    fn handle_info(&self) -> Result<()> {
        Logger::info(&format!("kiln v{}", env!("CARGO_PKG_VERSION")));
        Logger::info("Built-in transforms: lint, transpile, sass, autoprefix, minify");
        Logger::info("Naming template placeholder: [name]");
        Ok(())
    }
}

impl Default for CliHandler {
    fn default() -> Self {
        Self::new()
    }
}
