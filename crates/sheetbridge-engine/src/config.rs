//! Engine configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Tunables for the credential manager and the reconciler.
///
/// Deserialized from the `[engine]` table of the client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Serialize refreshes per `(user, provider)` within this process.
    pub serialize_refreshes: bool,

    /// Subtracted from a fresh token's lifetime before storing its expiry.
    pub expiry_buffer_secs: u64,

    /// Record-store lookups in flight at once during reconciliation.
    pub lookup_concurrency: usize,

    /// Fields tried, in order, to label an item in a diff.
    pub label_fields: Vec<String>,

    /// Cache record-store lookups for this long. `0` disables the cache.
    pub record_cache_ttl_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            serialize_refreshes: true,
            expiry_buffer_secs: 60,
            lookup_concurrency: 8,
            label_fields: vec!["name".into(), "title".into(), "htmlTitle".into()],
            record_cache_ttl_secs: 0,
        }
    }
}

impl EngineConfig {
    pub fn expiry_buffer(&self) -> Duration {
        Duration::seconds(i64::try_from(self.expiry_buffer_secs).unwrap_or(i64::MAX / 1000))
    }

    /// Record cache lifetime, or `None` when caching is off.
    pub fn record_cache_ttl(&self) -> Option<Duration> {
        (self.record_cache_ttl_secs > 0).then(|| {
            Duration::seconds(i64::try_from(self.record_cache_ttl_secs).unwrap_or(i64::MAX / 1000))
        })
    }

    pub fn with_serialize_refreshes(mut self, serialize: bool) -> Self {
        self.serialize_refreshes = serialize;
        self
    }

    pub fn with_expiry_buffer_secs(mut self, secs: u64) -> Self {
        self.expiry_buffer_secs = secs;
        self
    }

    pub fn with_lookup_concurrency(mut self, concurrency: usize) -> Self {
        self.lookup_concurrency = concurrency;
        self
    }

    pub fn with_label_fields(mut self, fields: Vec<String>) -> Self {
        self.label_fields = fields;
        self
    }

    pub fn with_record_cache_ttl_secs(mut self, secs: u64) -> Self {
        self.record_cache_ttl_secs = secs;
        self
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.lookup_concurrency == 0 {
            return Err(EngineError::Config("lookup_concurrency must be at least 1".into()));
        }
        if self.expiry_buffer_secs > 24 * 60 * 60 {
            return Err(EngineError::Config("expiry_buffer_secs must not exceed one day".into()));
        }
        if self.label_fields.iter().any(|f| f.trim().is_empty()) {
            return Err(EngineError::Config("label_fields must not contain empty names".into()));
        }
        Ok(())
    }
}
