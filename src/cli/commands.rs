//! CLI command implementations
//!
//! Every command loads the catalog data file into a fresh `CatalogStore`,
//! applies its request, and rewrites the data file if the store changed.
//! The data file is the only state kept between invocations.
//!
//! A data file with unreadable records is never rewritten by a mutating
//! request, since the rewrite would drop those records. `import` replaces
//! the whole catalog and is still allowed.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use serde_json::{json, Value};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::catalog::seed::demo_records;
use crate::catalog::{CatalogStore, Record, RecordDraft};
use crate::export;

use super::args::{Cli, Command};
use super::config::Config;
use super::errors::{CliError, CliErrorCode, CliResult};
use super::io::{read_requests, write_error_to, write_response_to};
use super::requests::{handle_request, Request};

/// Main CLI entry point
///
/// Parses arguments, loads configuration, installs logging and dispatches.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    let config = Config::resolve(cli.config.as_deref())?;
    init_tracing(&config);
    run_command(cli.command, &config)
}

/// Logs go to stderr; stdout carries only JSON responses
fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command, config: &Config) -> CliResult<()> {
    let mut out = io::stdout().lock();

    match cmd {
        Command::Init => init(config, &mut out),
        Command::Add {
            id,
            title,
            author,
            year,
            copies,
        } => {
            let record = RecordDraft::from(Record::new(id, title, author, year, copies));
            apply(config, Request::Upsert { record }, &mut out)
        }
        Command::Delete { id } => apply(config, Request::Delete { identifier: id }, &mut out),
        Command::Get { id } => apply(config, Request::Get { identifier: id }, &mut out),
        Command::Search { exact, prefix } => {
            let request = match (exact, prefix) {
                (Some(title), _) => Request::SearchExact { title },
                (None, Some(prefix)) => Request::SearchPrefix { prefix },
                (None, None) => {
                    return Err(CliError::invalid_request(
                        "search needs --exact or --prefix",
                    ))
                }
            };
            apply(config, request, &mut out)
        }
        Command::List { order } => apply(config, Request::List { order }, &mut out),
        Command::Stats => apply(config, Request::Stats, &mut out),
        Command::Clear => apply(config, Request::Clear, &mut out),
        Command::Import { file } => import(config, &file, &mut out),
        Command::Export { file } => export_to(config, &file, &mut out),
        Command::Serve => serve(config, io::stdin().lock(), &mut out),
    }
}

/// Create the catalog data file.
///
/// Refuses to overwrite an existing file. Seeds the demo records when
/// `seed_demo` is set.
pub fn init<W: Write>(config: &Config, out: &mut W) -> CliResult<()> {
    let path = config.catalog_path();
    if path.exists() {
        return Err(CliError::already_initialized(path.display()));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            CliError::config_error(format!("Failed to create directory {:?}: {}", parent, e))
        })?;
    }

    let mut store = CatalogStore::new();
    if config.seed_demo {
        store.bulk_load(demo_records().into_iter().map(Ok));
    }
    persist(config, &store)?;
    info!(path = %path.display(), records = store.len(), "catalog initialized");

    write_response_to(
        out,
        json!({
            "initialized": true,
            "path": path.display().to_string(),
            "records": store.len()
        }),
    )
}

/// Run one request against the data file
pub fn apply<W: Write>(config: &Config, request: Request, out: &mut W) -> CliResult<()> {
    let (mut store, skipped) = open_store(config)?;
    let mutating = request.is_mutating();
    if mutating && skipped > 0 {
        return Err(CliError::damaged_catalog(config.catalog_path().display(), skipped));
    }

    let data = handle_request(&mut store, request)?;
    if mutating {
        persist(config, &store)?;
    }

    write_response_to(out, data)
}

/// Replace the catalog with the records in `file`.
///
/// Rejected records are listed in the response; every other record is
/// applied.
pub fn import<W: Write>(config: &Config, file: &Path, out: &mut W) -> CliResult<()> {
    let (mut store, _) = open_store(config)?;
    let report = export::load_from_path(&mut store, file)?;
    persist(config, &store)?;

    let rejected: Vec<Value> = report
        .rejected
        .iter()
        .map(|e| {
            json!({
                "position": e.position(),
                "code": e.code(),
                "message": e.to_string()
            })
        })
        .collect();

    write_response_to(
        out,
        json!({
            "applied": report.applied,
            "rejected": rejected
        }),
    )
}

/// Write the catalog to `file`
pub fn export_to<W: Write>(config: &Config, file: &Path, out: &mut W) -> CliResult<()> {
    let (store, _) = open_store(config)?;
    let count = export::save_to_path(&store, file, config.pretty_export)?;

    write_response_to(
        out,
        json!({
            "path": file.display().to_string(),
            "records": count
        }),
    )
}

/// Serve JSON requests from `input` until it is exhausted.
///
/// Bad requests get an error response and the loop continues. I/O failures
/// (reading input or saving the data file) end the loop. Mutations are
/// refused while the data file holds unreadable records.
pub fn serve<R: BufRead, W: Write>(config: &Config, input: R, out: &mut W) -> CliResult<()> {
    let (mut store, skipped) = open_store(config)?;
    info!(records = store.len(), skipped, "serving requests");

    for line in read_requests(input) {
        let outcome = line.and_then(Request::parse).and_then(|request| {
            let mutating = request.is_mutating();
            if mutating && skipped > 0 {
                return Err(CliError::damaged_catalog(
                    config.catalog_path().display(),
                    skipped,
                ));
            }
            let data = handle_request(&mut store, request)?;
            if mutating {
                persist(config, &store)?;
            }
            Ok(data)
        });

        match outcome {
            Ok(data) => write_response_to(out, data)?,
            Err(e) if *e.code() == CliErrorCode::IoError => {
                write_error_to(out, e.code_str(), e.message())?;
                return Err(e);
            }
            Err(e) => {
                warn!(code = e.code_str(), message = e.message(), "request rejected");
                write_error_to(out, e.code_str(), e.message())?;
            }
        }
    }

    info!(records = store.len(), "input closed");
    Ok(())
}

/// Loads the data file. Also returns how many of its records were skipped.
fn open_store(config: &Config) -> CliResult<(CatalogStore, usize)> {
    let path = config.catalog_path();
    if !path.exists() {
        return Err(CliError::not_initialized(path.display()));
    }

    let mut store = CatalogStore::new();
    let report = export::load_from_path(&mut store, path)?;
    if !report.is_clean() {
        warn!(
            path = %path.display(),
            rejected = report.rejected.len(),
            "catalog file holds records that were skipped"
        );
    }
    Ok((store, report.rejected.len()))
}

fn persist(config: &Config, store: &CatalogStore) -> CliResult<()> {
    export::save_to_path(store, config.catalog_path(), config.pretty_export)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::ListOrder;
    use tempfile::TempDir;

    fn create_config(temp_dir: &TempDir, seed_demo: bool) -> Config {
        Config {
            catalog_path: temp_dir
                .path()
                .join("data")
                .join("catalog.json")
                .to_string_lossy()
                .into_owned(),
            seed_demo,
            pretty_export: false,
            ..Config::default()
        }
    }

    fn responses(out: Vec<u8>) -> Vec<Value> {
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    fn ids(payload: &Value) -> Vec<i64> {
        payload["records"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["identifier"].as_i64().unwrap())
            .collect()
    }

    #[test]
    fn test_init_creates_data_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = create_config(&temp_dir, false);

        let mut out = Vec::new();
        init(&config, &mut out).unwrap();

        assert!(config.catalog_path().exists());
        let resp = responses(out);
        assert_eq!(resp[0]["data"]["records"], 0);
    }

    #[test]
    fn test_init_refuses_reinit() {
        let temp_dir = TempDir::new().unwrap();
        let config = create_config(&temp_dir, false);

        init(&config, &mut Vec::new()).unwrap();
        let err = init(&config, &mut Vec::new()).unwrap_err();
        assert_eq!(*err.code(), CliErrorCode::AlreadyInitialized);
    }

    #[test]
    fn test_commands_require_init() {
        let temp_dir = TempDir::new().unwrap();
        let config = create_config(&temp_dir, false);

        let err = apply(&config, Request::Stats, &mut Vec::new()).unwrap_err();
        assert_eq!(*err.code(), CliErrorCode::NotInitialized);
    }

    #[test]
    fn test_seeded_init_and_search() {
        let temp_dir = TempDir::new().unwrap();
        let config = create_config(&temp_dir, true);
        init(&config, &mut Vec::new()).unwrap();

        let mut out = Vec::new();
        apply(
            &config,
            Request::SearchExact {
                title: "Introduction to Algorithms".to_string(),
            },
            &mut out,
        )
        .unwrap();

        let resp = responses(out);
        assert_eq!(ids(&resp[0]["data"]), vec![101, 120]);
    }

    #[test]
    fn test_mutations_persist_between_invocations() {
        let temp_dir = TempDir::new().unwrap();
        let config = create_config(&temp_dir, false);
        init(&config, &mut Vec::new()).unwrap();

        let record = RecordDraft::from(Record::new(7, "Refactoring", "Fowler", 1999, 2));
        apply(&config, Request::Upsert { record }, &mut Vec::new()).unwrap();
        apply(&config, Request::Delete { identifier: 8 }, &mut Vec::new()).unwrap();

        let mut out = Vec::new();
        apply(&config, Request::List { order: ListOrder::Id }, &mut out).unwrap();
        let resp = responses(out);
        assert_eq!(ids(&resp[0]["data"]), vec![7]);
    }

    #[test]
    fn test_import_reports_rejections_and_export_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let config = create_config(&temp_dir, false);
        init(&config, &mut Vec::new()).unwrap();

        let source = temp_dir.path().join("incoming.json");
        fs::write(
            &source,
            json!([
                {"identifier": 2, "title": "Two"},
                {"title": "No Id"},
                {"identifier": 1, "title": "One"},
                {"identifier": 2, "title": "Two Again"}
            ])
            .to_string(),
        )
        .unwrap();

        let mut out = Vec::new();
        import(&config, &source, &mut out).unwrap();
        let resp = responses(out);
        assert_eq!(resp[0]["data"]["applied"], 2);
        let rejected = resp[0]["data"]["rejected"].as_array().unwrap();
        assert_eq!(rejected.len(), 2);
        assert_eq!(rejected[0]["position"], 1);
        assert_eq!(rejected[0]["code"], "CATALOG_MALFORMED_RECORD");
        assert_eq!(rejected[1]["code"], "CATALOG_DUPLICATE_IDENTIFIER");

        let target = temp_dir.path().join("exported.json");
        export_to(&config, &target, &mut Vec::new()).unwrap();
        let exported: Vec<Value> =
            serde_json::from_str(&fs::read_to_string(&target).unwrap()).unwrap();
        let exported_ids: Vec<i64> = exported
            .iter()
            .map(|r| r["identifier"].as_i64().unwrap())
            .collect();
        assert_eq!(exported_ids, vec![1, 2]);
        assert_eq!(exported[1]["title"], "Two");
    }

    #[test]
    fn test_damaged_data_file_is_not_overwritten() {
        let temp_dir = TempDir::new().unwrap();
        let config = create_config(&temp_dir, false);
        init(&config, &mut Vec::new()).unwrap();

        let damaged = json!([
            {"identifier": 1, "title": "One"},
            {"identifier": "two", "title": "Two"}
        ])
        .to_string();
        fs::write(config.catalog_path(), &damaged).unwrap();

        let record = RecordDraft::from(Record::new(3, "Three", "", 0, 1));
        let err = apply(&config, Request::Upsert { record }, &mut Vec::new()).unwrap_err();
        assert_eq!(*err.code(), CliErrorCode::DamagedCatalog);
        assert_eq!(fs::read_to_string(config.catalog_path()).unwrap(), damaged);

        // Reads still work on the loadable records
        let mut out = Vec::new();
        apply(&config, Request::List { order: ListOrder::Id }, &mut out).unwrap();
        assert_eq!(ids(&responses(out)[0]["data"]), vec![1]);

        let input = [
            r#"{"op":"clear"}"#,
            r#"{"op":"get","identifier":1}"#,
        ]
        .join("\n");
        let mut out = Vec::new();
        serve(&config, input.as_bytes(), &mut out).unwrap();
        let resp = responses(out);
        assert_eq!(resp[0]["code"], "CATALOG_CLI_DAMAGED_CATALOG");
        assert_eq!(resp[1]["data"]["record"]["title"], "One");
        assert_eq!(fs::read_to_string(config.catalog_path()).unwrap(), damaged);
    }

    #[test]
    fn test_serve_loop() {
        let temp_dir = TempDir::new().unwrap();
        let config = create_config(&temp_dir, false);
        init(&config, &mut Vec::new()).unwrap();

        let input = [
            r#"{"op":"upsert","record":{"identifier":101,"title":"Clean Code"}}"#,
            r#"{"op":"upsert","record":{"identifier":102,"title":"Clean Coding"}}"#,
            r#"{"op":"upsert","record":{"identifier":103,"title":"Algorithms"}}"#,
            "this is not json",
            r#"{"op":"search_prefix","prefix":"clean"}"#,
            r#"{"op":"delete","identifier":101}"#,
            r#"{"op":"search_prefix","prefix":"clean"}"#,
        ]
        .join("\n");

        let mut out = Vec::new();
        serve(&config, input.as_bytes(), &mut out).unwrap();
        let resp = responses(out);

        assert_eq!(resp.len(), 7);
        assert_eq!(resp[0]["data"]["outcome"], "inserted");
        assert_eq!(resp[3]["status"], "error");
        assert_eq!(resp[3]["code"], "CATALOG_CLI_INVALID_REQUEST");
        assert_eq!(ids(&resp[4]["data"]), vec![101, 102]);
        assert_eq!(resp[5]["data"]["deleted"], true);
        assert_eq!(ids(&resp[6]["data"]), vec![102]);

        // serve persisted every mutation
        let mut out = Vec::new();
        apply(&config, Request::Stats, &mut out).unwrap();
        assert_eq!(
            responses(out)[0]["data"],
            json!({"by_id": 2, "by_title": 2})
        );
    }
}
