//! Import reconciliation.
//!
//! Compares uploaded rows against stored items and reports, per item, which
//! fields the upload would change. Nothing is written back.

use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use serde_json::{Map, Value};
use sheetbridge_core::{
    ChangeRecord, ID_FIELD, ItemDiff, ItemRecord, RawRow, ReconcileReport, SkippedRow,
};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::records::RecordStore;

enum RowOutcome {
    Unchanged,
    Changed(ItemDiff),
    Skipped(SkippedRow),
}

/// Diffs import batches against a [`RecordStore`].
pub struct Reconciler {
    records: Arc<dyn RecordStore>,
    concurrency: usize,
    label_fields: Vec<String>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("concurrency", &self.concurrency)
            .field("label_fields", &self.label_fields)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        let config = EngineConfig::default();
        Self {
            records,
            concurrency: config.lookup_concurrency,
            label_fields: config.label_fields,
        }
    }

    pub fn with_config(mut self, config: &EngineConfig) -> Self {
        self.concurrency = config.lookup_concurrency.max(1);
        self.label_fields = config.label_fields.clone();
        self
    }

    /// Reconciles an untyped JSON payload, which must be an array of objects.
    pub async fn reconcile_value(
        &self,
        user_id: &str,
        rows: &Value,
    ) -> EngineResult<ReconcileReport> {
        let rows = parse_rows(rows)?;
        self.reconcile(user_id, &rows).await
    }

    /// Reconciles `rows` against the items stored for `user_id`.
    ///
    /// The batch is validated up front: an empty batch, or any row without a
    /// usable id, fails the whole call. After that, a row whose lookup fails
    /// is skipped and reported in [`ReconcileReport::skipped`]; the rest of
    /// the batch still runs. Diffs come back in row order.
    pub async fn reconcile(&self, user_id: &str, rows: &[RawRow]) -> EngineResult<ReconcileReport> {
        if rows.is_empty() {
            return Err(EngineError::invalid_input("no rows to reconcile"));
        }
        let ids = rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                row.id().ok_or_else(|| {
                    EngineError::invalid_input(format!("row {index} has no '{ID_FIELD}' field"))
                })
            })
            .collect::<EngineResult<Vec<_>>>()?;

        debug!(user_id, rows = rows.len(), "reconciling import batch");

        let lookups = ids.iter().zip(rows).map(|(item_id, row)| async move {
            match self.records.get(user_id, item_id).await {
                Ok(None) => RowOutcome::Changed(ItemDiff::new_item(
                    item_id.clone(),
                    self.label(row.as_map(), item_id),
                )),
                Ok(Some(existing)) => self.diff_existing(item_id, row, &existing),
                Err(e) => {
                    warn!(user_id, item_id = %item_id, "record lookup failed, skipping row: {}", e);
                    RowOutcome::Skipped(SkippedRow {
                        item_id: item_id.clone(),
                        reason: e.to_string(),
                    })
                }
            }
        });
        let outcomes: Vec<RowOutcome> = stream::iter(lookups)
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut diffs = Vec::new();
        let mut skipped = Vec::new();
        for outcome in outcomes {
            match outcome {
                RowOutcome::Unchanged => {}
                RowOutcome::Changed(diff) => diffs.push(diff),
                RowOutcome::Skipped(row) => skipped.push(row),
            }
        }

        let report = ReconcileReport::new(rows.len(), diffs, skipped);
        debug!(
            user_id,
            items_with_changes = report.summary.items_with_changes,
            total_changes = report.summary.total_changes,
            skipped = report.summary.skipped_items,
            "reconciliation finished"
        );
        Ok(report)
    }

    fn diff_existing(&self, item_id: &str, row: &RawRow, existing: &ItemRecord) -> RowOutcome {
        let changes: Vec<ChangeRecord> = row
            .fields()
            .filter(|(_, incoming)| !incoming.is_blank())
            .filter_map(|(field, incoming)| {
                let current = existing.get(field);
                (current.as_str() != incoming.as_str()).then(|| {
                    ChangeRecord::new(item_id, field, current.into_string(), incoming.into_string())
                })
            })
            .collect();

        if changes.is_empty() {
            return RowOutcome::Unchanged;
        }
        RowOutcome::Changed(ItemDiff {
            item_id: item_id.to_string(),
            item_label: self.label(existing.as_map(), item_id),
            changes,
            is_new: false,
        })
    }

    fn label(&self, fields: &Map<String, Value>, item_id: &str) -> String {
        self.label_fields
            .iter()
            .find_map(|name| match fields.get(name) {
                Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            })
            .unwrap_or_else(|| item_id.to_string())
    }
}

/// Validates an untyped payload and converts it into rows.
pub fn parse_rows(value: &Value) -> EngineResult<Vec<RawRow>> {
    let Value::Array(items) = value else {
        return Err(EngineError::invalid_input("expected an array of rows"));
    };
    if items.is_empty() {
        return Err(EngineError::invalid_input("no rows to reconcile"));
    }
    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(map) => Ok(RawRow::from(map.clone())),
            _ => Err(EngineError::invalid_input(format!("row {index} is not an object"))),
        })
        .collect()
}
