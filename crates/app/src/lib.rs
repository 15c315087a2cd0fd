pub mod cli;
pub mod commands;
pub mod error;
pub mod settings;

pub use cli::Cli;
pub use error::{CliError, CliResult};
