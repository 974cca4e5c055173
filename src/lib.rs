//! Library exports for navguard, shared between the binary and tests.

pub mod config;
pub mod guard;
pub mod identity;
pub mod metrics;
pub mod models;
pub mod routes;
pub mod routing;
pub mod startup;
pub mod state;
pub mod store;
pub mod utils;
