//! Query metrics for the attendance store.

use metrics::{counter, histogram};
use std::time::Instant;

/// Times one store query and reports it on completion.
///
/// Repositories create a timer before issuing the query and call
/// `record()` once it resolves, success or failure alike, so the
/// duration histogram covers error paths too. A dropped timer reports
/// nothing.
pub struct QueryTimer {
    query_name: String,
    start: Instant,
}

impl QueryTimer {
    /// Create a new timer for the given query name.
    pub fn new(query_name: impl Into<String>) -> Self {
        Self {
            query_name: query_name.into(),
            start: Instant::now(),
        }
    }

    /// Report the query count and elapsed duration.
    pub fn record(self) {
        let elapsed = self.start.elapsed().as_secs_f64();

        counter!(
            "attendance_store_queries_total",
            "query" => self.query_name.clone()
        )
        .increment(1);

        histogram!(
            "attendance_store_query_duration_seconds",
            "query" => self.query_name
        )
        .record(elapsed);
    }
}
