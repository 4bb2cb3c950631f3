pub mod emitter;
pub mod file_system;
pub mod resolver;
pub mod scanner;
pub mod transforms;

pub use emitter::ArtifactEmitter;
pub use file_system::TokioFileSystemService;
pub use resolver::{ModuleGraphResolver, ResolvedGraph};
pub use scanner::RegexDependencyScanner;
