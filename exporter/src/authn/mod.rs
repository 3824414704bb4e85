pub mod coordinator;
pub mod handoff;
pub mod oauth;
pub mod token;
pub mod token_store;
