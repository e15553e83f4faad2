// Configuration module entry point
// Loads layered configuration and resolves the upstream API key

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{ChatConfig, Config, StaticFilesConfig, UpstreamConfig};

/// Default config file (without extension), overridable with `RELAY_CONFIG`
const DEFAULT_CONFIG_PATH: &str = "config";

impl Config {
    /// Load configuration from `RELAY_CONFIG` or `config.toml`
    pub fn load() -> Result<Self, config::ConfigError> {
        let path =
            std::env::var("RELAY_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path)
    }

    /// Load configuration from specified file path (without extension)
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = Self::with_defaults(config::Config::builder())?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                // RELAY_SERVER__PORT=9000 overrides server.port
                config::Environment::with_prefix("RELAY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    fn with_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
        builder
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("http.server_name", "outfit-relay/0.1")?
            .set_default("http.max_body_size", 1_048_576)? // 1MB
            .set_default("static_files.root", ".")?
            .set_default("static_files.index_redirect", "/weather.html")?
            .set_default(
                "upstream.url",
                "https://api.groq.com/openai/v1/chat/completions",
            )?
            .set_default("upstream.model", "llama-3.3-70b-versatile")?
            .set_default("upstream.timeout_secs", 30)?
            .set_default("upstream.api_key_env", "GROQ_API_KEY")?
            .set_default("chat.history_limit", 8)?
            .set_default("chat.append_user_message", false)
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Resolve the upstream API key from the environment.
    ///
    /// A `.env` file in the working directory is loaded first; variables
    /// already present in the process environment win.
    pub fn resolve_api_key(&self) -> Result<String, String> {
        dotenvy::dotenv().ok();
        let name = &self.upstream.api_key_env;
        match std::env::var(name) {
            Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => Err(format!(
                "{name} is not set (export it or add it to a .env file)"
            )),
        }
    }
}

#[cfg(test)]
impl Config {
    /// Defaults only, with the document root pointed at `root`
    pub fn for_tests(root: &str) -> Self {
        let mut cfg: Self = Self::with_defaults(config::Config::builder())
            .and_then(|builder| builder.build())
            .and_then(|settings| settings.try_deserialize())
            .expect("defaults should deserialize");
        cfg.static_files.root = root.to_string();
        cfg.logging.access_log = false;
        cfg
    }
}
