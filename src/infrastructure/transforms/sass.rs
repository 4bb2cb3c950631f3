use crate::core::interfaces::{Transform, TransformContext};
use crate::core::models::TransformOutput;
use crate::utils::{KilnError, Result};
use async_trait::async_trait;
use std::path::Path;

/// SCSS/SASS compilation using the grass crate. Syntax is detected from the
/// module's extension; `includePaths` and the module's own directory are
/// handed to grass as load paths so its `@import`/`@use` resolution works.
pub struct SassTransform;

impl SassTransform {
    pub fn new() -> Self {
        Self
    }

    fn input_syntax(path: &Path) -> grass::InputSyntax {
        if path.extension().and_then(|s| s.to_str()) == Some("sass") {
            grass::InputSyntax::Sass
        } else {
            grass::InputSyntax::Scss
        }
    }
}

impl Default for SassTransform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transform for SassTransform {
    fn id(&self) -> &str {
        "sass"
    }

    async fn apply(&self, content: &str, ctx: &TransformContext) -> Result<TransformOutput> {
        let mut options = grass::Options::default()
            .input_syntax(Self::input_syntax(&ctx.path))
            .style(if ctx.bool_option("compressed", false) {
                grass::OutputStyle::Compressed
            } else {
                grass::OutputStyle::Expanded
            });

        if let Some(parent) = ctx.path.parent() {
            if !parent.as_os_str().is_empty() {
                options = options.load_path(parent);
            }
        }
        for include in ctx.string_list_option("includePaths") {
            options = options.load_path(include);
        }

        match grass::from_string(content.to_string(), &options) {
            Ok(css) => Ok(TransformOutput::primary(css)),
            Err(e) => Err(KilnError::transform(
                self.id(),
                ctx.path.clone(),
                e.to_string(),
            )),
        }
    }
}
