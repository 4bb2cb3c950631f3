use crate::core::interfaces::{Transform, TransformContext};
use crate::core::models::TransformOutput;
use crate::utils::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

static DECLARATION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^(\s*)(transform|transition|animation|user-select|appearance|backdrop-filter)(\s*:\s*[^;]+;)",
    )
    .unwrap()
});

/// Vendor-prefix expansion for a fixed set of CSS properties. Prefixed
/// declarations are inserted ahead of the standard one, which stays last so
/// it wins in supporting browsers. Already-prefixed declarations are left
/// alone.
pub struct AutoprefixTransform;

impl AutoprefixTransform {
    pub fn new() -> Self {
        Self
    }

    fn prefixes(property: &str) -> &'static [&'static str] {
        match property {
            "transform" => &["-webkit-", "-ms-"],
            "transition" | "animation" | "backdrop-filter" => &["-webkit-"],
            "user-select" => &["-webkit-", "-moz-", "-ms-"],
            "appearance" => &["-webkit-", "-moz-"],
            _ => &[],
        }
    }
}

impl Default for AutoprefixTransform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transform for AutoprefixTransform {
    fn id(&self) -> &str {
        "autoprefix"
    }

    async fn apply(&self, content: &str, _ctx: &TransformContext) -> Result<TransformOutput> {
        let prefixed = DECLARATION_REGEX.replace_all(content, |caps: &regex::Captures| {
            let indent = &caps[1];
            let property = &caps[2];
            let value = &caps[3];

            let mut lines = String::new();
            for prefix in Self::prefixes(property) {
                lines.push_str(&format!("{indent}{prefix}{property}{value}\n"));
            }
            lines.push_str(&format!("{indent}{property}{value}"));
            lines
        });

        Ok(TransformOutput::primary(prefixed.into_owned()))
    }
}
