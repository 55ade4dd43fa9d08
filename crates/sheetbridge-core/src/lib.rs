//! Core types: credentials, import rows, diffs, clock, tracing

pub mod connection;
pub mod item;
pub mod time;
pub mod tracing;

pub use connection::{ConnectionKind, Credential, ProviderKind, TokenBundle, UnknownProvider};
pub use item::{
    ChangeRecord, FieldValue, ID_FIELD, ItemDiff, ItemRecord, NEW_ITEM_FIELD, NEW_ITEM_MARKER,
    RawRow, ReconcileReport, ReconcileSummary, SkippedRow,
};
pub use time::{Clock, ManualClock, SharedClock, SystemClock};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
