//! SDM Exporter Library
//!
//! Prometheus exporter for Google Smart Device Management thermostats.

pub mod app;
pub mod authn;
pub mod config;
pub mod errors;
pub mod filesys;
pub mod logs;
pub mod sdm;
pub mod server;
pub mod telemetry;
pub mod workers;
