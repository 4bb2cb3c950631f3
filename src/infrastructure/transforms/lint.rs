use crate::core::interfaces::{Transform, TransformContext};
use crate::core::models::TransformOutput;
use crate::utils::{KilnError, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

static DEBUGGER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|[;{}\s])debugger\b").unwrap());

static LOOSE_EQ_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:[^=!<>&|]|^)(==|!=)(?:[^=]|$)").unwrap());

static EVAL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\beval\s*\(").unwrap());

static CONSOLE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bconsole\.\w+\s*\(").unwrap());

/// Script style checker. Produces no output of its own; it either passes
/// content through untouched or fails with the collected diagnostics.
/// Failures are fatal for the run unless the rule step marks it advisory,
/// which is why it belongs ahead of the generating transforms in a chain.
pub struct LintTransform;

impl LintTransform {
    pub fn new() -> Self {
        Self
    }

    fn check_line(line: &str, line_number: usize, no_console: bool, diagnostics: &mut Vec<String>) {
        if DEBUGGER_REGEX.is_match(line) {
            diagnostics.push(format!("line {}: unexpected 'debugger' statement", line_number));
        }
        if LOOSE_EQ_REGEX.is_match(line) {
            diagnostics.push(format!(
                "line {}: use strict equality instead of '==' / '!='",
                line_number
            ));
        }
        if EVAL_REGEX.is_match(line) {
            diagnostics.push(format!("line {}: 'eval' is not allowed", line_number));
        }
        if no_console && CONSOLE_REGEX.is_match(line) {
            diagnostics.push(format!("line {}: unexpected console call", line_number));
        }
    }
}

impl Default for LintTransform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transform for LintTransform {
    fn id(&self) -> &str {
        "lint"
    }

    async fn apply(&self, content: &str, ctx: &TransformContext) -> Result<TransformOutput> {
        let no_console = ctx.bool_option("noConsole", false);

        let mut diagnostics = Vec::new();
        for (index, line) in content.lines().enumerate() {
            let trimmed = line.trim_start();
            if trimmed.starts_with("//") || trimmed.starts_with('*') {
                continue;
            }
            Self::check_line(line, index + 1, no_console, &mut diagnostics);
        }

        if diagnostics.is_empty() {
            Ok(TransformOutput::primary(content))
        } else {
            Err(KilnError::Validation {
                transform: self.id().to_string(),
                module: ctx.path.clone(),
                diagnostics,
            })
        }
    }
}
