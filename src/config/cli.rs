//! Command-line overrides.
//!
//! # Responsibilities
//! - Parse flags with clap
//! - Apply them over `ServerConfig::default()`
//! - Validate the result
//!
//! # Design Decisions
//! - Only flags that were given override a default
//! - No configuration file; the command line is the only source

use clap::Parser;

use crate::config::schema::ServerConfig;
use crate::config::validation::validate_config;
use crate::config::ConfigError;

#[derive(Debug, Parser)]
#[command(name = "segment-router")]
#[command(about = "HTTP request dispatcher with segment patterns and middleware chains", long_about = None)]
pub struct Cli {
    /// Address to listen on.
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Directory static files are served from.
    #[arg(short, long)]
    pub root: Option<String>,

    /// File served for directory requests.
    #[arg(long)]
    pub index_file: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Request timeout in seconds.
    #[arg(long)]
    pub request_timeout: Option<u64>,

    /// Maximum buffered request body in bytes.
    #[arg(long)]
    pub max_body_bytes: Option<usize>,

    /// Maximum requests dispatched at once.
    #[arg(long)]
    pub max_concurrent_requests: Option<usize>,

    /// Expose Prometheus metrics on this address.
    #[arg(long)]
    pub metrics_address: Option<String>,

    /// Print the effective configuration as JSON and exit.
    #[arg(long)]
    pub print_config: bool,
}

impl Cli {
    /// Build the effective configuration.
    pub fn into_config(self) -> Result<ServerConfig, ConfigError> {
        let mut config = ServerConfig::default();
        self.apply(&mut config);
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }

    fn apply(self, config: &mut ServerConfig) {
        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
        if let Some(max) = self.max_concurrent_requests {
            config.listener.max_concurrent_requests = max;
        }
        if let Some(secs) = self.request_timeout {
            config.timeouts.request_secs = secs;
        }
        if let Some(bytes) = self.max_body_bytes {
            config.limits.max_body_bytes = bytes;
        }
        if let Some(root) = self.root {
            config.static_files.root = root;
        }
        if let Some(index) = self.index_file {
            config.static_files.index_file = index;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
        if let Some(addr) = self.metrics_address {
            config.observability.metrics_enabled = true;
            config.observability.metrics_address = addr;
        }
    }
}
