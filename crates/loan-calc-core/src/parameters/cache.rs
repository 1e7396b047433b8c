use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

use super::CalculationParameters;
use crate::types::BusinessPath;

/// Default time-to-live for cached parameters.
pub const DEFAULT_TTL_SECS: i64 = 300;

struct CacheEntry {
    parameters: CalculationParameters,
    fetched_at: DateTime<Utc>,
}

/// Per-path parameter cache with a fixed TTL.
///
/// Time is passed in by the caller so expiry can be tested without sleeping.
/// An entry is stale once `now - fetched_at >= ttl`.
pub struct ParameterCache {
    ttl: Duration,
    entries: HashMap<BusinessPath, CacheEntry>,
}

impl Default for ParameterCache {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_TTL_SECS))
    }
}

impl ParameterCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh parameters for `path`, if any.
    pub fn get(&self, path: BusinessPath, now: DateTime<Utc>) -> Option<&CalculationParameters> {
        self.entries
            .get(&path)
            .filter(|entry| now - entry.fetched_at < self.ttl)
            .map(|entry| &entry.parameters)
    }

    pub fn insert(
        &mut self,
        path: BusinessPath,
        parameters: CalculationParameters,
        now: DateTime<Utc>,
    ) {
        self.entries.insert(
            path,
            CacheEntry {
                parameters,
                fetched_at: now,
            },
        );
    }

    pub fn invalidate(&mut self, path: BusinessPath) -> bool {
        self.entries.remove(&path).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of entries held, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
