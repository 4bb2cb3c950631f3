// kiln - a small asset-pipeline engine
//
// Resolves an entry module graph, applies rule-matched transform chains per
// module, and emits named artifacts. Profiles may declare their entries over
// another profile's emitted output for dependent post-process passes.

pub mod cli;
pub mod core;
pub mod infrastructure;
pub mod utils;
