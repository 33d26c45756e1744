use std::path::PathBuf;

use clap::Args;

pub const DEFAULT_STATE_FILE: &str = "line_caller_state.json";
pub const DEFAULT_PORT: u16 = 8080;

/// Settings shared by every command
#[derive(Args, Debug, Clone)]
pub struct Config {
    /// JSON file holding the roster, history and rotation state
    #[arg(long = "state", global = true, env = "LINE_CALLER_STATE", default_value = DEFAULT_STATE_FILE)]
    pub state_path: PathBuf,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from(DEFAULT_STATE_FILE),
            log_filter: "info".to_string(),
        }
    }
}

/// Where the web server listens
#[derive(Args, Debug, Clone)]
pub struct ServerConfig {
    #[arg(long, env = "LINE_CALLER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
        }
    }
}
