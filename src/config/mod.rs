//! Configuration module for Dovepeak
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use dovepeak::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("dovepeak.toml")).unwrap();
//! println!("Crawling {} seed domains", config.seeds.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, FetcherConfig, MergePolicy, OutputConfig, ScoringConfig,
    UserAgentConfig, ValidationConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
