//! Metrics collection and exposition for Prometheus.
//!
//! This module provides centralized metrics recording for navigation outcomes,
//! token mints and the initialization barrier.

mod recorder;

pub use recorder::{Metrics, MetricsRecorder};
