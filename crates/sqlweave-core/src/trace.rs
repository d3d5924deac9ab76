//! Query trace records.

use std::panic::Location;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// One executed statement.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryTrace {
    /// Statement text with placeholders replaced by literal values.
    pub query: String,
    /// Wall time of the driver round trip.
    pub elapsed: Duration,
    /// `file:line` of the `Database::table` call that built the statement.
    pub location: String,
}

impl QueryTrace {
    /// Elapsed time in seconds.
    #[must_use]
    pub fn seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

/// Collects [`QueryTrace`] records.
#[derive(Debug, Default)]
pub struct QueryTracer {
    records: Mutex<Vec<QueryTrace>>,
}

impl QueryTracer {
    /// Creates an empty tracer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    /// Appends a record.
    pub fn record(&self, query: String, elapsed: Duration, location: &Location<'_>) {
        let trace = QueryTrace {
            query,
            elapsed,
            location: format!("{}:{}", location.file(), location.line()),
        };
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(trace);
    }

    /// Returns a copy of every record so far.
    #[must_use]
    pub fn records(&self) -> Vec<QueryTrace> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Removes and returns every record so far.
    pub fn drain(&self) -> Vec<QueryTrace> {
        std::mem::take(&mut *self.records.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_keep_caller_location() {
        let tracer = QueryTracer::new();
        tracer.record(
            "SELECT 1".into(),
            Duration::from_millis(3),
            Location::caller(),
        );
        let records = tracer.records();
        assert_eq!(records.len(), 1);
        assert!(records[0].location.contains("trace.rs"));
        assert!(records[0].seconds() > 0.0);
        assert_eq!(tracer.drain().len(), 1);
        assert!(tracer.records().is_empty());
    }
}
