use crate::core::interfaces::{Transform, TransformContext};
use crate::core::models::TransformOutput;
use crate::utils::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

static BLOCK_BINDING_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:const|let)\b").unwrap());

static ARROW_FN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([\w\s,]*)\)\s*=>\s*\{").unwrap());

static TEMPLATE_INTERP_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

/// Conservative ES2015 downleveler in the line/regex style of the rest of
/// the pipeline: block bindings become `var`, braced arrow functions become
/// function expressions, and interpolation-free template literals become
/// plain strings. With `sourceMap: true` a location-map side artifact is
/// produced next to the primary output.
pub struct TranspileTransform;

impl TranspileTransform {
    pub fn new() -> Self {
        Self
    }

    fn downlevel(source: &str) -> String {
        let code = map_code_segments(source, |segment| {
            let segment = BLOCK_BINDING_REGEX.replace_all(segment, "var");
            ARROW_FN_REGEX
                .replace_all(&segment, "function($1) {")
                .into_owned()
        });

        // Template literals without interpolation degrade to plain strings
        code.split('\n')
            .map(|line| {
                if line.contains('`') && !TEMPLATE_INTERP_REGEX.is_match(line) {
                    line.replace('`', "\"")
                } else {
                    line.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn source_map(original: &str, ctx: &TransformContext) -> String {
        let file = ctx
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        serde_json::json!({
            "version": 3,
            "file": file,
            "sources": [ctx.path.to_string_lossy()],
            "sourcesContent": [original],
            "names": [],
            "mappings": "",
        })
        .to_string()
    }
}

impl Default for TranspileTransform {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply `rewrite` to the stretches of `source` outside string and template
/// literals. Literal contents, including escape sequences, pass through
/// untouched.
fn map_code_segments(source: &str, rewrite: impl Fn(&str) -> String) -> String {
    let mut out = String::with_capacity(source.len());
    let mut code = String::new();
    let mut chars = source.chars();
    let mut delim: Option<char> = None;

    while let Some(ch) = chars.next() {
        if let Some(d) = delim {
            out.push(ch);
            if ch == '\\' {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            } else if ch == d {
                delim = None;
            }
        } else {
            match ch {
                '\'' | '"' | '`' => {
                    out.push_str(&rewrite(&code));
                    code.clear();
                    delim = Some(ch);
                    out.push(ch);
                }
                _ => code.push(ch),
            }
        }
    }
    out.push_str(&rewrite(&code));
    out
}

#[async_trait]
impl Transform for TranspileTransform {
    fn id(&self) -> &str {
        "transpile"
    }

    async fn apply(&self, content: &str, ctx: &TransformContext) -> Result<TransformOutput> {
        let code = Self::downlevel(content);

        let mut output = TransformOutput::primary(code);
        if ctx.bool_option("sourceMap", false) {
            output
                .side_artifacts
                .push(("map".to_string(), Self::source_map(content, ctx)));
        }
        Ok(output)
    }
}
