//! rbcatalog CLI entry point
//!
//! This is a minimal entrypoint that:
//! 1. Delegates parsing, configuration and dispatch to cli::run
//! 2. Prints errors to stderr
//! 3. Exits with non-zero on failure

use rbcatalog::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
