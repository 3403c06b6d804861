//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! ServerConfig::default()
//!     → cli.rs (flags override defaults)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → handed to HttpServer and main
//! ```
//!
//! # Design Decisions
//! - Config is immutable once built
//! - All fields have defaults so no flag is required
//! - Validation separates syntactic (clap) from semantic checks

pub mod cli;
pub mod schema;
pub mod validation;

use thiserror::Error;

pub use cli::Cli;
pub use schema::{
    LimitsConfig, ListenerConfig, ObservabilityConfig, ServerConfig, StaticFilesConfig,
    TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};

/// Error type for building a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),

    #[error("cannot render config: {0}")]
    Render(#[from] serde_json::Error),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ServerConfig {
    /// Pretty JSON rendering of the effective configuration.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
