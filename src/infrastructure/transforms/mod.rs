pub mod autoprefix;
pub mod lint;
pub mod minify;
pub mod sass;
pub mod transpile;

pub use autoprefix::AutoprefixTransform;
pub use lint::LintTransform;
pub use minify::MinifyTransform;
pub use sass::SassTransform;
pub use transpile::TranspileTransform;

use crate::core::rules::TransformRegistry;
use std::sync::Arc;

/// Registry preloaded with every built-in transform. Rule sets resolve
/// their transform identifiers against this at configuration-load time.
pub fn builtin_registry() -> TransformRegistry {
    let mut registry = TransformRegistry::new();
    registry.register(Arc::new(LintTransform::new()));
    registry.register(Arc::new(TranspileTransform::new()));
    registry.register(Arc::new(SassTransform::new()));
    registry.register(Arc::new(AutoprefixTransform::new()));
    registry.register(Arc::new(MinifyTransform::new()));
    registry
}
