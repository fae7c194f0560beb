//! Block context handed to every handler and query

use chrono::{DateTime, TimeZone, Utc};

/// Block context
///
/// The block time is the only clock this crate reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    /// Time of the block being processed
    pub block_time: DateTime<Utc>,

    /// Height of the block being processed
    pub block_height: u64,
}

impl Context {
    /// Create a context for the given block
    pub fn new(block_time: DateTime<Utc>, block_height: u64) -> Self {
        Context { block_time, block_height }
    }

    /// Create a context at the given unix time
    pub fn at_unix(seconds: i64) -> Self {
        let block_time = Utc
            .timestamp_opt(seconds, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Context { block_time, block_height: 0 }
    }

    /// Block time in whole unix seconds, rounded down
    pub fn now(&self) -> i64 {
        self.block_time.timestamp()
    }

    /// Whether the block time is strictly later than the instant `unix_secs`
    ///
    /// Compares the full block time, so half a second past `unix_secs` counts.
    pub fn is_after(&self, unix_secs: i64) -> bool {
        let secs = self.block_time.timestamp();
        secs > unix_secs || (secs == unix_secs && self.block_time.timestamp_subsec_nanos() > 0)
    }
}
