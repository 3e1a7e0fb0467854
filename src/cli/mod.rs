//! CLI module for rbcatalog
//!
//! Provides the command-line boundary around `CatalogStore`:
//! - init: create the catalog data file
//! - add / delete / get / search / list / stats / clear: one-shot requests
//! - import / export: whole-catalog JSON transfer
//! - serve: JSON request loop over stdin/stdout

mod args;
mod commands;
mod config;
mod errors;
mod io;
mod requests;

pub use args::{Cli, Command, ListOrder};
pub use commands::{apply, export_to, import, init, run, run_command, serve};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_requests, write_error_to, write_response_to};
pub use requests::{handle_request, Request};
