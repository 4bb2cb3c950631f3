use crate::core::interfaces::{Transform, TransformContext};
use crate::core::models::TransformOutput;
use crate::utils::{KilnError, Result};
use async_trait::async_trait;

/// Script minifier for already-built output: strips comments, indentation
/// and blank lines with a small string-aware scanner. Statement-per-line
/// structure is preserved, so no semicolon-insertion hazards are introduced.
pub struct MinifyTransform;

impl MinifyTransform {
    pub fn new() -> Self {
        Self
    }

    /// Remove comments while respecting string and template literals.
    fn strip_comments(source: &str, keep_banners: bool) -> std::result::Result<String, String> {
        let mut out = String::with_capacity(source.len());
        let mut chars = source.char_indices().peekable();
        let mut string_delim: Option<char> = None;

        while let Some((index, ch)) = chars.next() {
            if let Some(delim) = string_delim {
                out.push(ch);
                if ch == '\\' {
                    if let Some((_, escaped)) = chars.next() {
                        out.push(escaped);
                    }
                } else if ch == delim {
                    string_delim = None;
                }
                continue;
            }

            match ch {
                '\'' | '"' | '`' => {
                    string_delim = Some(ch);
                    out.push(ch);
                }
                '/' => match chars.peek() {
                    Some(&(_, '/')) => {
                        while let Some(&(_, c)) = chars.peek() {
                            if c == '\n' {
                                break;
                            }
                            chars.next();
                        }
                    }
                    Some(&(_, '*')) => {
                        chars.next();
                        let banner = matches!(chars.peek(), Some(&(_, '!')));
                        let mut body = String::from("/*");
                        let mut closed = false;
                        let mut previous = '\0';
                        for (_, c) in chars.by_ref() {
                            body.push(c);
                            if previous == '*' && c == '/' {
                                closed = true;
                                break;
                            }
                            previous = c;
                        }
                        if !closed {
                            return Err(format!(
                                "unterminated block comment at byte {}",
                                index
                            ));
                        }
                        if banner && keep_banners {
                            out.push_str(&body);
                        }
                    }
                    _ => out.push(ch),
                },
                _ => out.push(ch),
            }
        }

        Ok(out)
    }
}

impl Default for MinifyTransform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transform for MinifyTransform {
    fn id(&self) -> &str {
        "minify"
    }

    async fn apply(&self, content: &str, ctx: &TransformContext) -> Result<TransformOutput> {
        let keep_banners = ctx.bool_option("keepBanners", false);

        let stripped = Self::strip_comments(content, keep_banners)
            .map_err(|message| KilnError::transform(self.id(), ctx.path.clone(), message))?;

        let minified = stripped
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        Ok(TransformOutput::primary(minified))
    }
}
