//! Front-ends feeding the dispatcher.
//!
//! A front-end owns its own session state (the selected faction), turns user
//! text into dispatcher commands and prints the replies. Any number of them can
//! share one [`crate::dispatch::DispatcherHandle`].

pub mod cli;

pub use cli::{run_cli, CliCommand, CliCommandParser, CliExit};
