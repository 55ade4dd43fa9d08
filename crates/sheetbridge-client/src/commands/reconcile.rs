//! `sheetbridge reconcile`.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use sheetbridge_core::{ItemRecord, ReconcileReport};
use sheetbridge_engine::{CachedRecordStore, MemoryRecordStore, RecordStore, Reconciler};
use tracing::warn;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Diffs the rows file against the records file and prints the report.
pub async fn run(
    config: &ClientConfig,
    user: &str,
    rows_path: &Path,
    records_path: &Path,
    json: bool,
) -> ClientResult<()> {
    let rows = read_json(rows_path)?;
    let records = load_records(records_path)?;

    let store = MemoryRecordStore::from_records(user, records);
    let store: Arc<dyn RecordStore> = match config.engine.record_cache_ttl() {
        Some(ttl) => Arc::new(CachedRecordStore::new(store, ttl)),
        None => Arc::new(store),
    };

    let report = Reconciler::new(store)
        .with_config(&config.engine)
        .reconcile_value(user, &rows)
        .await?;

    if json {
        let out = serde_json::to_string_pretty(&report).map_err(std::io::Error::from)?;
        println!("{}", out);
    } else {
        print!("{}", render_report(&report));
    }
    Ok(())
}

fn read_json(path: &Path) -> ClientResult<Value> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| ClientError::Input(format!("{}: {}", path.display(), e)))
}

/// Loads stored items from a JSON array. Entries without an id are dropped.
fn load_records(path: &Path) -> ClientResult<Vec<ItemRecord>> {
    let Value::Array(items) = read_json(path)? else {
        return Err(ClientError::Input(format!(
            "{}: expected an array of records",
            path.display()
        )));
    };

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let Value::Object(map) = item else {
            return Err(ClientError::Input(format!(
                "{}: record {} is not an object",
                path.display(),
                index
            )));
        };
        let record = ItemRecord::from(map);
        if record.id().is_none() {
            warn!(index, "ignoring stored record without an id");
            continue;
        }
        records.push(record);
    }
    Ok(records)
}

/// Human-readable report.
pub fn render_report(report: &ReconcileReport) -> String {
    let mut out = String::new();
    for diff in &report.diffs {
        if diff.is_new {
            let _ = writeln!(out, "+ {} ({}) new item", diff.item_label, diff.item_id);
            continue;
        }
        let _ = writeln!(out, "~ {} ({})", diff.item_label, diff.item_id);
        for change in &diff.changes {
            let _ = writeln!(
                out,
                "    {}: {:?} -> {:?}",
                change.field, change.old_value, change.new_value
            );
        }
    }
    for skipped in &report.skipped {
        let _ = writeln!(out, "! {} skipped: {}", skipped.item_id, skipped.reason);
    }

    let summary = &report.summary;
    let _ = writeln!(
        out,
        "{} rows, {} with changes ({} new), {} field changes, {} skipped",
        summary.total_items,
        summary.items_with_changes,
        summary.new_items,
        summary.total_changes,
        summary.skipped_items
    );
    out
}
