pub mod api;
pub mod backup;
pub mod client;
pub mod config;
pub mod error;
pub mod fetch;
pub mod insert;
pub mod manage;
pub mod models;
pub mod restore;
pub mod tracker;
pub mod version;

pub use error::{BackupError, Result};
