//! Configuration types for the Parley service.
//!
//! [`ServiceConfig`] is the top-level configuration. File loading is the
//! operator surface's concern; these types only define shape and defaults,
//! and everything is overridable from the binary's flags.

use serde::{Deserialize, Serialize};

/// How the command parser treats options it has no declaration for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandParsingConfig {
    /// Treat `-x` and `--x` identically instead of short/long.
    #[serde(default)]
    pub agnostic_dashes: bool,
    /// Assume undeclared options take a value argument.
    #[serde(default)]
    pub assume_option_arguments: bool,
}

/// Top-level service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Address the administrative API binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Lifetime of newly issued session tokens, in seconds.
    #[serde(default = "default_token_lifetime_secs")]
    pub token_lifetime_secs: i64,
    /// Interval between sweeps of expired tokens, in seconds.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    #[serde(default)]
    pub parsing: CommandParsingConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            token_lifetime_secs: default_token_lifetime_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            parsing: CommandParsingConfig::default(),
        }
    }
}

fn default_listen_addr() -> String {
    "127.0.0.1:4000".to_string()
}

fn default_token_lifetime_secs() -> i64 {
    // 12 hours
    12 * 60 * 60
}

fn default_sweep_interval_secs() -> u64 {
    300
}
