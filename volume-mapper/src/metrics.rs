//! Metrics for mapper operations
//!
//! Uses the `metrics` facade only. The embedding controller decides whether
//! and where to export; without an installed recorder every call is a no-op.

use std::time::Instant;

use metrics::{counter, histogram};

/// Metric names
pub mod names {
    /// Counter: Total number of mapper operations by type, volume type and status
    pub const MAPPER_OPERATIONS_TOTAL: &str = "mapper_operations_total";
    /// Histogram: Duration of mapper operations in seconds
    pub const MAPPER_OPERATION_DURATION_SECONDS: &str = "mapper_operation_duration_seconds";
}

/// Record a mapper operation with its result
pub fn record_operation(operation: &str, volume_type: &str, status: &str, duration_secs: f64) {
    counter!(
        names::MAPPER_OPERATIONS_TOTAL,
        "operation" => operation.to_string(),
        "volume_type" => volume_type.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(names::MAPPER_OPERATION_DURATION_SECONDS, "operation" => operation.to_string())
        .record(duration_secs);
}

/// Helper for timing operations
pub struct OperationTimer {
    operation: &'static str,
    volume_type: String,
    start: Instant,
}

impl OperationTimer {
    /// Start timing an operation
    pub fn new(operation: &'static str, volume_type: impl Into<String>) -> Self {
        Self {
            operation,
            volume_type: volume_type.into(),
            start: Instant::now(),
        }
    }

    /// Complete the operation with success
    pub fn success(self) {
        let duration = self.start.elapsed().as_secs_f64();
        record_operation(self.operation, &self.volume_type, "success", duration);
    }

    /// Complete the operation with failure
    pub fn failure(self, error_kind: &str) {
        let duration = self.start.elapsed().as_secs_f64();
        record_operation(self.operation, &self.volume_type, error_kind, duration);
    }
}
