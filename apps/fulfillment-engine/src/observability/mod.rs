//! Logging and metrics.

pub mod metrics;
pub mod tracing;

pub use metrics::init_metrics;
pub use tracing::init_tracing;
