//! CLI module for donkin.
//!
//! The binary parses its arguments first and only builds the runtime for
//! [`CliCommand::Run`]:
//!
//! ```ignore
//! use donkin::cli::{parse_args, run_cli_command, CliCommand};
//!
//! let command = parse_args(std::env::args())?;
//! if run_cli_command(&command) {
//!     return Ok(());
//! }
//! ```

pub mod args;

pub use args::{parse_args, ArgsError, CliCommand, RunArgs, USAGE};

use crate::config::ChatConfig;

/// The current version of donkin, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Handle the commands that need no runtime. Returns true if `command`
/// was one of them.
pub fn run_cli_command(command: &CliCommand) -> bool {
    match command {
        CliCommand::Version => {
            println!("donkin {}", VERSION);
            true
        }
        CliCommand::Help => {
            print!("{}", USAGE);
            true
        }
        CliCommand::Run(_) => false,
    }
}

/// Overlay the flags in `run` onto `config`.
pub fn apply_run_args(config: ChatConfig, run: &RunArgs) -> ChatConfig {
    let mut config = config;
    if let Some(endpoint) = &run.endpoint {
        config = config.with_endpoint(endpoint.clone());
    }
    if run.thread_id.is_some() {
        config = config.with_thread_id(run.thread_id.clone());
    }
    config
}
