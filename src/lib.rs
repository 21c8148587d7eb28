// Export modules for library usage
pub mod cli;
pub mod config;
pub mod errors;
pub mod git;
pub mod header;
pub mod logging;
pub mod processor;

pub use config::{RunConfig, RunOptions, StaticConfig};
pub use errors::{Error, ExitCode, Result};
pub use processor::FileProcessor;
