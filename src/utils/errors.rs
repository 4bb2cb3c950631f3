use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KilnError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cannot resolve '{reference}' from {}", from.display())]
    Resolution { reference: String, from: PathBuf },

    #[error("Transform '{transform}' failed on {}: {message}", module.display())]
    Transform {
        transform: String,
        module: PathBuf,
        message: String,
    },

    #[error("Validation '{transform}' failed on {} ({} problem{})", module.display(), diagnostics.len(), if diagnostics.len() == 1 { "" } else { "s" })]
    Validation {
        transform: String,
        module: PathBuf,
        diagnostics: Vec<String>,
    },

    #[error("Output collision on {}: entries '{first}' and '{second}' both emit here", path.display())]
    EmitCollision {
        path: PathBuf,
        first: String,
        second: String,
    },

    #[error("Run of profile '{profile}' failed")]
    RunFailed { profile: String },
}

impl KilnError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a resolution error for an unresolvable reference
    pub fn resolution(reference: impl Into<String>, from: PathBuf) -> Self {
        Self::Resolution {
            reference: reference.into(),
            from,
        }
    }

    /// Create a transform error tied to a module path
    pub fn transform(
        transform: impl Into<String>,
        module: PathBuf,
        message: impl Into<String>,
    ) -> Self {
        Self::Transform {
            transform: transform.into(),
            module,
            message: message.into(),
        }
    }

    /// Format the error with per-diagnostic detail for CLI output
    pub fn format_detailed(&self) -> String {
        match self {
            KilnError::Validation {
                transform,
                module,
                diagnostics,
            } => {
                let mut output = format!(
                    "Validation '{}' failed on {}",
                    transform,
                    module.display()
                );
                for diag in diagnostics {
                    output.push_str(&format!("\n   • {}", diag));
                }
                output
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, KilnError>;

impl From<regex::Error> for KilnError {
    fn from(err: regex::Error) -> Self {
        KilnError::config(format!("Invalid pattern: {}", err))
    }
}
