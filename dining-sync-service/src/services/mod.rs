//! Services module for dining-sync-service.

pub mod availability;
pub mod metrics;
pub mod reconciler;
pub mod sources;

pub use metrics::{get_metrics, init_metrics};
pub use reconciler::Reconciler;
