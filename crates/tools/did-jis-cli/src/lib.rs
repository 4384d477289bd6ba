//! Library half of the `did-jis` binary, split out so commands can be
//! driven from tests with an in-memory writer.

pub mod commands;
pub mod config;

pub use commands::{run, Cli, Commands, Outcome};
pub use config::CliConfig;
