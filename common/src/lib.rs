// Common library shared by the CLI and the integration tests

pub mod client;
pub mod config;
pub mod edit;
pub mod errors;
pub mod models;
pub mod options;
pub mod payload;
pub mod reconcile;
pub mod retry;
pub mod runner;
pub mod schedule;
pub mod store;
pub mod substitution;
pub mod telemetry;
pub mod validation;
