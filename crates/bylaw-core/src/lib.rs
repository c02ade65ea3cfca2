//! Shared configuration for the bylaw workspace.

pub mod config;

pub use config::{ConfigError, Settings};
