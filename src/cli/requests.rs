//! Request model shared by one-shot commands and serve mode
//!
//! Requests are JSON objects tagged by `op`:
//!
//! ```json
//! {"op": "upsert", "record": {"identifier": 101, "title": "Clean Code"}}
//! {"op": "delete", "identifier": 101}
//! {"op": "get", "identifier": 101}
//! {"op": "search_exact", "title": "clean code"}
//! {"op": "search_prefix", "prefix": "clean"}
//! {"op": "list", "order": "title"}
//! {"op": "stats"}
//! {"op": "clear"}
//! ```

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::catalog::{CatalogStore, Record, RecordDraft, RecordId};

use super::args::ListOrder;
use super::errors::{CliError, CliResult};

/// A single catalog request
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Upsert {
        record: RecordDraft,
    },
    Delete {
        identifier: RecordId,
    },
    Get {
        identifier: RecordId,
    },
    SearchExact {
        title: String,
    },
    SearchPrefix {
        prefix: String,
    },
    List {
        #[serde(default)]
        order: ListOrder,
    },
    Stats,
    Clear,
}

impl Request {
    /// Decode a request object
    pub fn parse(value: Value) -> CliResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| CliError::invalid_request(format!("Invalid request: {}", e)))
    }

    /// Whether handling this request changes the store
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Request::Upsert { .. } | Request::Delete { .. } | Request::Clear
        )
    }
}

/// Applies `request` to `store` and returns the response payload
pub fn handle_request(store: &mut CatalogStore, request: Request) -> CliResult<Value> {
    match request {
        Request::Upsert { record } => {
            let record = record
                .into_record()
                .map_err(|e| CliError::invalid_request(e.to_string()))?;
            let identifier = record.identifier;
            let outcome = store.upsert(record);
            debug!(identifier, outcome = outcome.as_str(), "record upserted");
            Ok(json!({ "identifier": identifier, "outcome": outcome }))
        }
        Request::Delete { identifier } => {
            let deleted = store.delete_by_id(identifier);
            debug!(identifier, deleted, "delete by identifier");
            Ok(json!({ "identifier": identifier, "deleted": deleted }))
        }
        Request::Get { identifier } => Ok(json!({
            "identifier": identifier,
            "record": store.find_by_id(identifier)
        })),
        Request::SearchExact { title } => Ok(records_payload(store.find_by_title_exact(&title))),
        Request::SearchPrefix { prefix } => {
            Ok(records_payload(store.find_by_title_prefix(&prefix)))
        }
        Request::List { order } => {
            let records = match order {
                ListOrder::Id => store.list_by_id(),
                ListOrder::Title => store.list_by_title(),
            };
            let mut payload = records_payload(records);
            payload["order"] = json!(order.as_str());
            Ok(payload)
        }
        Request::Stats => Ok(serde_json::to_value(store.stats())?),
        Request::Clear => {
            let cleared = store.len();
            store.clear();
            debug!(cleared, "catalog cleared");
            Ok(json!({ "cleared": cleared }))
        }
    }
}

fn records_payload(records: Vec<&Record>) -> Value {
    json!({
        "count": records.len(),
        "records": records
    })
}
