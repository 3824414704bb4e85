pub mod client;
pub mod lifecycle;
pub mod models;
