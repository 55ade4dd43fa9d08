//! Import rows, stored records and the diff types produced by reconciliation.
//!
//! Rows and records are loosely typed JSON objects. Field order is the
//! insertion order of the object (the workspace enables serde_json's
//! `preserve_order`), which is what keeps change lists ordered the way the
//! uploaded sheet ordered its columns.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name of the field that identifies an item in both rows and records.
pub const ID_FIELD: &str = "id";

/// Field name of the synthetic change emitted for items that don't exist yet.
pub const NEW_ITEM_FIELD: &str = "status";

/// Value of the synthetic change emitted for items that don't exist yet.
pub const NEW_ITEM_MARKER: &str = "NEW_ITEM";

/// A field value reduced to the representation used for comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Missing or `null`.
    Absent,
    /// Any other JSON value rendered as text.
    Text(String),
}

impl FieldValue {
    /// Normalizes an optional JSON value.
    ///
    /// Strings are kept verbatim; numbers and booleans use their JSON text;
    /// arrays and objects are rendered as compact JSON.
    pub fn from_json(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => Self::Absent,
            Some(Value::String(s)) => Self::Text(s.clone()),
            Some(Value::Number(n)) => Self::Text(n.to_string()),
            Some(Value::Bool(b)) => Self::Text(b.to_string()),
            Some(other) => Self::Text(other.to_string()),
        }
    }

    /// Returns true if this value proposes no change (absent or empty).
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Absent => true,
            Self::Text(s) => s.is_empty(),
        }
    }

    /// Returns the text form; absent values display as the empty string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Absent => "",
            Self::Text(s) => s,
        }
    }

    /// Consumes the value and returns its display text.
    pub fn into_string(self) -> String {
        match self {
            Self::Absent => String::new(),
            Self::Text(s) => s,
        }
    }
}

/// Normalizes an `id` value. Only non-blank strings and numbers qualify.
fn normalize_id(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// One row of an uploaded data set (a CSV line or a sheet row).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRow(Map<String, Value>);

impl RawRow {
    /// Creates an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: appends a field, keeping insertion order.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Returns the normalized item id, if the row carries a usable one.
    pub fn id(&self) -> Option<String> {
        normalize_id(self.0.get(ID_FIELD))
    }

    /// Returns the normalized value of a field.
    pub fn get(&self, field: &str) -> FieldValue {
        FieldValue::from_json(self.0.get(field))
    }

    /// Iterates the non-id fields in row order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, FieldValue)> {
        self.0
            .iter()
            .filter(|(key, _)| key.as_str() != ID_FIELD)
            .map(|(key, value)| (key.as_str(), FieldValue::from_json(Some(value))))
    }

    /// Returns the underlying JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for RawRow {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// The system's current copy of an item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemRecord(Map<String, Value>);

impl ItemRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: sets a field.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Returns the normalized item id, if present.
    pub fn id(&self) -> Option<String> {
        normalize_id(self.0.get(ID_FIELD))
    }

    /// Returns the normalized value of a field.
    pub fn get(&self, field: &str) -> FieldValue {
        FieldValue::from_json(self.0.get(field))
    }

    /// Returns the underlying JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for ItemRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// One field-level difference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    pub item_id: String,
    pub field: String,
    pub old_value: String,
    pub new_value: String,
}

impl ChangeRecord {
    /// Creates a change record.
    pub fn new(
        item_id: impl Into<String>,
        field: impl Into<String>,
        old_value: impl Into<String>,
        new_value: impl Into<String>,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            field: field.into(),
            old_value: old_value.into(),
            new_value: new_value.into(),
        }
    }

    /// The synthetic record that marks an item as not yet existing.
    pub fn new_item(item_id: impl Into<String>) -> Self {
        Self::new(item_id, NEW_ITEM_FIELD, "", NEW_ITEM_MARKER)
    }
}

/// All changes proposed for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDiff {
    pub item_id: String,
    pub item_label: String,
    pub changes: Vec<ChangeRecord>,
    pub is_new: bool,
}

impl ItemDiff {
    /// Diff for an item that isn't in the record store.
    pub fn new_item(item_id: impl Into<String>, item_label: impl Into<String>) -> Self {
        let item_id = item_id.into();
        Self {
            changes: vec![ChangeRecord::new_item(item_id.clone())],
            item_id,
            item_label: item_label.into(),
            is_new: true,
        }
    }
}

/// A row that could not be reconciled and was left out of the diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRow {
    pub item_id: String,
    pub reason: String,
}

/// Counters describing a reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileSummary {
    /// Rows in the imported batch.
    pub total_items: usize,
    /// Items with at least one change (new items included).
    pub items_with_changes: usize,
    /// Sum of change records over all diffs.
    pub total_changes: usize,
    /// Items not found in the record store.
    pub new_items: usize,
    /// Rows skipped because their lookup failed.
    pub skipped_items: usize,
}

/// Result of reconciling an imported batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub diffs: Vec<ItemDiff>,
    pub summary: ReconcileSummary,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedRow>,
}

impl ReconcileReport {
    /// Builds a report, deriving the summary from the diffs.
    pub fn new(total_items: usize, diffs: Vec<ItemDiff>, skipped: Vec<SkippedRow>) -> Self {
        let summary = ReconcileSummary {
            total_items,
            items_with_changes: diffs.len(),
            total_changes: diffs.iter().map(|d| d.changes.len()).sum(),
            new_items: diffs.iter().filter(|d| d.is_new).count(),
            skipped_items: skipped.len(),
        };
        Self {
            diffs,
            summary,
            skipped,
        }
    }

    /// Returns true if nothing would change.
    pub fn is_empty(&self) -> bool {
        self.diffs.is_empty()
    }

    /// Iterates every change across all items.
    pub fn changes(&self) -> impl Iterator<Item = &ChangeRecord> {
        self.diffs.iter().flat_map(|d| d.changes.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_value_normalization() {
        assert_eq!(FieldValue::from_json(None), FieldValue::Absent);
        assert_eq!(FieldValue::from_json(Some(&json!(null))), FieldValue::Absent);
        assert_eq!(
            FieldValue::from_json(Some(&json!("x"))),
            FieldValue::Text("x".into())
        );
        assert_eq!(
            FieldValue::from_json(Some(&json!(5))),
            FieldValue::Text("5".into())
        );
        assert_eq!(
            FieldValue::from_json(Some(&json!(1.5))),
            FieldValue::Text("1.5".into())
        );
        assert_eq!(
            FieldValue::from_json(Some(&json!(true))),
            FieldValue::Text("true".into())
        );
        assert_eq!(
            FieldValue::from_json(Some(&json!(["a", 1]))),
            FieldValue::Text("[\"a\",1]".into())
        );
    }

    #[test]
    fn blank_values() {
        assert!(FieldValue::Absent.is_blank());
        assert!(FieldValue::Text(String::new()).is_blank());
        assert!(!FieldValue::Text(" ".into()).is_blank());
        assert_eq!(FieldValue::Absent.as_str(), "");
    }

    #[test]
    fn row_id_normalization() {
        assert_eq!(RawRow::new().with("id", "5").id(), Some("5".to_string()));
        assert_eq!(RawRow::new().with("id", 42).id(), Some("42".to_string()));
        assert_eq!(RawRow::new().with("id", "").id(), None);
        assert_eq!(RawRow::new().with("id", "  ").id(), None);
        assert_eq!(RawRow::new().with("id", json!(null)).id(), None);
        assert_eq!(RawRow::new().with("name", "x").id(), None);
    }

    #[test]
    fn row_fields_keep_insertion_order_and_skip_id() {
        let row: RawRow =
            serde_json::from_str(r#"{"zeta":"1","id":"7","alpha":"2","mid":null}"#).unwrap();
        let keys: Vec<&str> = row.fields().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn new_item_diff_has_single_synthetic_change() {
        let diff = ItemDiff::new_item("new-1", "Fresh");
        assert!(diff.is_new);
        assert_eq!(diff.changes, vec![ChangeRecord::new("new-1", "status", "", "NEW_ITEM")]);
    }

    #[test]
    fn report_summary_counts() {
        let diffs = vec![
            ItemDiff {
                item_id: "1".into(),
                item_label: "One".into(),
                changes: vec![
                    ChangeRecord::new("1", "name", "a", "b"),
                    ChangeRecord::new("1", "slug", "c", "d"),
                ],
                is_new: false,
            },
            ItemDiff::new_item("2", "Two"),
        ];
        let skipped = vec![SkippedRow {
            item_id: "3".into(),
            reason: "store unavailable".into(),
        }];
        let report = ReconcileReport::new(5, diffs, skipped);

        insta::assert_json_snapshot!(report.summary, @r#"
        {
          "totalItems": 5,
          "itemsWithChanges": 2,
          "totalChanges": 3,
          "newItems": 1,
          "skippedItems": 1
        }
        "#);
        assert_eq!(report.changes().count(), 3);
        assert!(!report.is_empty());
    }

    #[test]
    fn report_serializes_camel_case() {
        let report = ReconcileReport::new(1, vec![ItemDiff::new_item("9", "Nine")], vec![]);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["diffs"][0]["itemId"], "9");
        assert_eq!(value["diffs"][0]["isNew"], true);
        assert_eq!(value["diffs"][0]["changes"][0]["newValue"], "NEW_ITEM");
        assert!(value.get("skipped").is_none());
    }
}
