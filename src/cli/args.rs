//! CLI argument definitions using clap
//!
//! Commands:
//! - rbcatalog init
//! - rbcatalog add --id <id> --title <title> [--author] [--year] [--copies]
//! - rbcatalog delete --id <id>
//! - rbcatalog get --id <id>
//! - rbcatalog search (--exact <title> | --prefix <prefix>)
//! - rbcatalog list [--order id|title]
//! - rbcatalog stats
//! - rbcatalog import --file <path>
//! - rbcatalog export --file <path>
//! - rbcatalog clear
//! - rbcatalog serve
//!
//! Every command accepts `--config <path>`.

use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use std::path::PathBuf;

use crate::catalog::RecordId;

/// rbcatalog - ordered in-memory record catalog
#[derive(Parser, Debug)]
#[command(name = "rbcatalog")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (defaults apply when omitted)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Listing order
#[derive(ValueEnum, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ListOrder {
    /// Ascending identifier
    #[default]
    Id,
    /// Case-folded title, then identifier
    Title,
}

impl ListOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListOrder::Id => "id",
            ListOrder::Title => "title",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the catalog data file
    Init,

    /// Add a record, or replace the record with the same identifier
    Add {
        #[arg(long)]
        id: RecordId,

        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        author: String,

        #[arg(long, default_value_t = 0)]
        year: i32,

        #[arg(long, default_value_t = 1)]
        copies: u32,
    },

    /// Delete a record by identifier
    Delete {
        #[arg(long)]
        id: RecordId,
    },

    /// Look up a record by identifier
    Get {
        #[arg(long)]
        id: RecordId,
    },

    /// Case-insensitive title search
    #[command(group(ArgGroup::new("query").required(true).args(["exact", "prefix"])))]
    Search {
        /// Whole title to match
        #[arg(long)]
        exact: Option<String>,

        /// Title prefix to match (empty matches everything)
        #[arg(long)]
        prefix: Option<String>,
    },

    /// List every record
    List {
        #[arg(long, value_enum, default_value_t = ListOrder::Id)]
        order: ListOrder,
    },

    /// Show entry counts of both indices
    Stats,

    /// Replace the catalog with the records in a JSON file
    Import {
        #[arg(long)]
        file: PathBuf,
    },

    /// Write the catalog to a JSON file
    Export {
        #[arg(long)]
        file: PathBuf,
    },

    /// Remove every record
    Clear,

    /// Read JSON requests from stdin, one per line, and answer on stdout
    Serve,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add_with_defaults() {
        let cli = Cli::try_parse_from(["rbcatalog", "add", "--id", "7", "--title", "Clean Code"])
            .unwrap();
        match cli.command {
            Command::Add {
                id,
                title,
                author,
                year,
                copies,
            } => {
                assert_eq!(id, 7);
                assert_eq!(title, "Clean Code");
                assert_eq!(author, "");
                assert_eq!(year, 0);
                assert_eq!(copies, 1);
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["rbcatalog", "stats", "--config", "/tmp/c.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.json")));
    }

    #[test]
    fn test_search_requires_exactly_one_mode() {
        assert!(Cli::try_parse_from(["rbcatalog", "search"]).is_err());
        assert!(Cli::try_parse_from([
            "rbcatalog", "search", "--exact", "a", "--prefix", "b"
        ])
        .is_err());

        let cli = Cli::try_parse_from(["rbcatalog", "search", "--prefix", ""]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Search { exact: None, prefix: Some(ref p) } if p.is_empty()
        ));
    }

    #[test]
    fn test_list_order() {
        let cli = Cli::try_parse_from(["rbcatalog", "list", "--order", "title"]).unwrap();
        assert!(matches!(cli.command, Command::List { order: ListOrder::Title }));

        let cli = Cli::try_parse_from(["rbcatalog", "list"]).unwrap();
        assert!(matches!(cli.command, Command::List { order: ListOrder::Id }));
    }

    #[test]
    fn test_negative_copies_rejected() {
        assert!(Cli::try_parse_from([
            "rbcatalog", "add", "--id", "1", "--title", "t", "--copies", "-1"
        ])
        .is_err());
    }
}
