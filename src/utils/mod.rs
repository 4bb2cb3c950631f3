// Shared utilities module
pub mod config_loader;
pub mod errors;
pub mod logging;

pub use config_loader::ConfigLoader;
pub use errors::*;
pub use logging::*;
