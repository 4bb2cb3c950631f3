use crate::core::interfaces::TransformContext;
use crate::core::models::Module;
use crate::core::rules::ChainStep;
use crate::utils::{KilnError, Logger, Result};

/// A module's content after its full transform chain, with every side
/// artifact the chain produced along the way.
#[derive(Debug, Clone)]
pub struct TransformedModule {
    pub content: String,
    pub side_artifacts: Vec<(String, String)>,
}

/// Applies a resolved transform chain to one module's content as a strict
/// left fold: each transform consumes the previous transform's primary
/// output. The first failure aborts the module; later steps never run.
pub struct ChainExecutor;

impl ChainExecutor {
    pub async fn apply(module: &Module, chain: &[ChainStep]) -> Result<TransformedModule> {
        let mut content = module.content.clone();
        let mut side_artifacts = Vec::new();

        for step in chain {
            let ctx = TransformContext {
                path: module.path.clone(),
                module_type: module.module_type,
                options: step.options.clone(),
            };

            match step.transform.apply(&content, &ctx).await {
                Ok(output) => {
                    content = output.primary;
                    side_artifacts.extend(output.side_artifacts);
                }
                Err(KilnError::Validation {
                    transform,
                    module: path,
                    diagnostics,
                }) if step.advisory => {
                    // Advisory steps report and pass content through unchanged
                    for diag in &diagnostics {
                        Logger::warn(&format!("{} ({}): {}", transform, path.display(), diag));
                    }
                }
                Err(err) => return Err(err),
            }
        }

        Ok(TransformedModule {
            content,
            side_artifacts,
        })
    }
}
