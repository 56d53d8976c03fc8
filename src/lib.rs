pub mod config;
pub mod derive;
pub mod error;
pub mod fetch;
pub mod format;
pub mod ordering;
pub mod poller;
pub mod render;
pub mod server;
pub mod session;
pub mod store;
pub mod summary;
pub mod types;
