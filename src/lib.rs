//! Dovepeak: a polite email discovery pipeline
//!
//! This crate crawls a bounded set of seed domains, extracts email addresses
//! from the pages it finds, classifies them by role, validates them through
//! progressively more expensive checks, scores them and collapses repeated
//! sightings into one record per address.

pub mod config;
pub mod crawler;
pub mod email;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod state;
pub mod url;
pub mod validate;

use thiserror::Error;

/// Main error type for Dovepeak operations
#[derive(Debug, Error)]
pub enum DovepeakError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Invalid task transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::TaskState,
        to: state::TaskState,
    },

    #[error("Run task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
///
/// These are only ever raised before a run starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid seed: {0}")]
    InvalidSeed(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for Dovepeak operations
pub type Result<T> = std::result::Result<T, DovepeakError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, RunHandle};
pub use email::{EmailCandidate, EmailRecord, EmailType, SourceCategory};
pub use output::{SearchStats, StatsAggregator};
pub use pipeline::{Pipeline, RunSnapshot};
pub use state::{DomainState, TaskState};
