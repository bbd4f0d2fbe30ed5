// Appwrite identity backend
//
// REST implementation of the core provider traits:
// - accounts and sessions via the Account API
// - profile documents via the Databases API

pub mod client;
pub mod config;
pub mod types;

pub use client::AppwriteClient;
pub use config::{AppwriteConfig, ConfigError};
