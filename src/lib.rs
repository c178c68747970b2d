pub mod error;
pub mod config;
pub mod filestore;
pub mod server;
