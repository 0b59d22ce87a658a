pub mod client;
pub mod poller;
pub mod registry;
pub mod validation;
