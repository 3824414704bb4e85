pub mod devices;
pub mod metrics;
pub mod poller;
pub mod traits;
