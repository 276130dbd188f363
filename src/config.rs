use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Config file picked up from the working directory when no path is given.
const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Document database connection URL (e.g. `ws://localhost:8000`, `surrealkv://data`)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// API key for the Gemini generation endpoint
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Gemini model name
    #[arg(long, env = "GEMINI_MODEL")]
    pub gemini_model: Option<String>,

    /// Custom Search API key (search falls back to mock results without it)
    #[arg(long, env = "SEARCH_API_KEY", hide_env_values = true)]
    pub search_api_key: Option<String>,

    /// Custom Search engine id
    #[arg(long, env = "SEARCH_ENGINE_ID")]
    pub search_engine_id: Option<String>,

    /// The single origin allowed by CORS
    #[arg(long, env = "CORS_ALLOWED_ORIGIN")]
    pub cors_allowed_origin: Option<String>,

    /// Enable rate limiting
    #[arg(long, env = "RATE_LIMIT_ENABLED")]
    pub rate_limit_enabled: Option<bool>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub rate_limit: RateLimitConfig,
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub search: SearchConfig,
    pub chat: ChatConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    /// How long in-flight requests may run after a shutdown signal.
    pub shutdown_grace_secs: u64,
    /// Link returned in 404 bodies.
    pub docs_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allowed_origin: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub requests_per_second: u32,
    pub burst_size: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    /// Root credentials for remote servers; embedded engines need none.
    pub username: Option<String>,
    pub password: Option<String>,
    pub namespace: String,
    pub database: String,
    pub connect_timeout_secs: u64,
    pub ping_timeout_secs: u64,
    pub operation_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_output_tokens: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    pub api_key: Option<String>,
    pub engine_id: Option<String>,
    pub base_url: String,
    pub max_results: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    /// Include the synthetic processing log in chat responses.
    pub thinking_log: bool,
}

impl DatabaseConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_secs(self.ping_timeout_secs)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }
}

impl SearchConfig {
    /// Key and engine id, when both are configured and non-blank.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let key = self.api_key.as_deref().filter(|s| !s.trim().is_empty())?;
        let cx = self.engine_id.as_deref().filter(|s| !s.trim().is_empty())?;
        Some((key, cx))
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder();

        // 1. Defaults
        builder = builder
            .set_default("server.port", 8080)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.shutdown_grace_secs", 15)?
            .set_default("server.docs_url", "https://example.com/docs")?
            .set_default("cors.allowed_origin", "http://localhost:3000")?
            .set_default("rate_limit.enabled", true)?
            .set_default("rate_limit.requests_per_second", 5)?
            .set_default("rate_limit.burst_size", 10)?
            .set_default("database.url", "")?
            .set_default("database.namespace", "chat")?
            .set_default("database.database", "gemini_chat")?
            .set_default("database.connect_timeout_secs", 10)?
            .set_default("database.ping_timeout_secs", 2)?
            .set_default("database.operation_timeout_secs", 5)?
            .set_default("llm.api_key", "")?
            .set_default("llm.base_url", "https://generativelanguage.googleapis.com")?
            .set_default("llm.model", "gemini-1.5-flash")?
            .set_default("llm.temperature", 0.9)?
            .set_default("llm.top_p", 0.95)?
            .set_default("llm.max_output_tokens", 2048)?
            .set_default("llm.timeout_secs", 60)?
            .set_default("search.base_url", "https://www.googleapis.com/customsearch/v1")?
            .set_default("search.max_results", 5)?
            .set_default("chat.thinking_log", true)?;

        // 2. Config file: explicit path must exist, ./config.yaml is optional
        match &cli.config {
            Some(path) => builder = builder.add_source(File::with_name(path)),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                builder = builder.add_source(File::with_name(DEFAULT_CONFIG_FILE));
            }
            None => {}
        }

        // 3. Prefixed environment, e.g. CHAT_SERVER__PORT=9000
        builder = builder.add_source(
            Environment::with_prefix("CHAT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // 4. Well-known env vars and CLI flags (clap resolves both)
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(url) = cli.database_url {
            builder = builder.set_override("database.url", url)?;
        }
        if let Some(key) = cli.gemini_api_key {
            builder = builder.set_override("llm.api_key", key)?;
        }
        if let Some(model) = cli.gemini_model {
            builder = builder.set_override("llm.model", model)?;
        }
        if let Some(key) = cli.search_api_key {
            builder = builder.set_override("search.api_key", key)?;
        }
        if let Some(cx) = cli.search_engine_id {
            builder = builder.set_override("search.engine_id", cx)?;
        }
        if let Some(origin) = cli.cors_allowed_origin {
            builder = builder.set_override("cors.allowed_origin", origin)?;
        }
        if let Some(rl) = cli.rate_limit_enabled {
            builder = builder.set_override("rate_limit.enabled", rl)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        Ok(cfg)
    }

    /// Presence checks for values the service cannot start without.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "Missing required setting: DATABASE_URL".to_string(),
            ));
        }
        if self.llm.api_key.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "Missing required setting: GEMINI_API_KEY".to_string(),
            ));
        }
        for (name, raw) in [
            ("llm.base_url", self.llm.base_url.as_str()),
            ("search.base_url", self.search.base_url.as_str()),
        ] {
            url::Url::parse(raw).map_err(|e| {
                config::ConfigError::Message(format!("Invalid {name} '{raw}': {e}"))
            })?;
        }
        if self.rate_limit.requests_per_second == 0 || self.rate_limit.burst_size == 0 {
            return Err(config::ConfigError::Message(
                "rate_limit.requests_per_second and rate_limit.burst_size must be positive"
                    .to_string(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
