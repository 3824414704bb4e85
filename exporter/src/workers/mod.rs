pub mod coordinator;
pub mod poller;
