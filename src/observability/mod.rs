pub mod health;
pub mod metrics;
pub mod tracing;

pub use health::{HealthChecker, HealthStatus, ReadinessStatus};
pub use metrics::MetricsRecorder;
pub use tracing::init_tracing;
