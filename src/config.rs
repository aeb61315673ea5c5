use clap::Parser;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::env;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_STATIC_DIR: &str = "static";
pub const DEFAULT_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "openai/gpt-oss-20b";
pub const DEFAULT_ASSISTANT_NAME: &str = "seu assistente";
pub const DEFAULT_MAX_TOKENS: u32 = 800;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_CONTINUATIONS: u32 = 1;
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_HISTORY_WINDOW: usize = 20;
pub const DEFAULT_HISTORY_TTL_SECS: u64 = 24 * 60 * 60;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Answer with an echo instead of calling the model
    #[arg(long)]
    pub test_mode: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub history: HistoryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    /// Directory served under `/static` (compiled widget bundle).
    pub static_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    /// Full chat-completions URL.
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Follow-up calls allowed when a reply looks cut off.
    pub max_continuations: u32,
    pub timeout_secs: u64,
    pub test_mode: bool,
    /// Name the assistant uses for itself.
    pub assistant_name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HistoryConfig {
    /// Entries kept per session, system prompt included.
    pub window: usize,
    pub ttl_secs: u64,
    /// Store histories in Redis at this URL when it answers at startup.
    pub redis_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: DEFAULT_PORT,
                host: DEFAULT_HOST.to_string(),
                static_dir: DEFAULT_STATIC_DIR.to_string(),
            },
            llm: LlmConfig {
                endpoint: DEFAULT_ENDPOINT.to_string(),
                api_key: None,
                model: DEFAULT_MODEL.to_string(),
                max_tokens: DEFAULT_MAX_TOKENS,
                temperature: DEFAULT_TEMPERATURE,
                max_continuations: DEFAULT_MAX_CONTINUATIONS,
                timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
                test_mode: false,
                assistant_name: DEFAULT_ASSISTANT_NAME.to_string(),
            },
            history: HistoryConfig {
                window: DEFAULT_HISTORY_WINDOW,
                ttl_secs: DEFAULT_HISTORY_TTL_SECS,
                redis_url: None,
            },
        }
    }
}

impl LlmConfig {
    /// API key, ignoring blank values.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}

impl HistoryConfig {
    /// Redis URL, ignoring blank values.
    #[must_use]
    pub fn redis_url(&self) -> Option<&str> {
        self.redis_url.as_deref().filter(|u| !u.trim().is_empty())
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    /// Build the config from, lowest priority first: defaults, the YAML
    /// file, `CHAT_`-prefixed env vars, the flat legacy env vars, CLI flags.
    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder()
            .set_default("server.port", i64::from(DEFAULT_PORT))?
            .set_default("server.host", DEFAULT_HOST)?
            .set_default("server.static_dir", DEFAULT_STATIC_DIR)?
            .set_default("llm.endpoint", DEFAULT_ENDPOINT)?
            .set_default("llm.model", DEFAULT_MODEL)?
            .set_default("llm.max_tokens", i64::from(DEFAULT_MAX_TOKENS))?
            .set_default("llm.temperature", f64::from(DEFAULT_TEMPERATURE))?
            .set_default("llm.max_continuations", i64::from(DEFAULT_MAX_CONTINUATIONS))?
            .set_default("llm.timeout_secs", DEFAULT_LLM_TIMEOUT_SECS)?
            .set_default("llm.test_mode", false)?
            .set_default("llm.assistant_name", DEFAULT_ASSISTANT_NAME)?
            .set_default("history.window", DEFAULT_HISTORY_WINDOW as u64)?
            .set_default("history.ttl_secs", DEFAULT_HISTORY_TTL_SECS)?;

        // An explicit file must exist; ./config.yaml is picked up when present.
        builder = match &cli.config {
            Some(path) => builder.add_source(File::new(path, FileFormat::Yaml)),
            None => builder.add_source(File::new("config.yaml", FileFormat::Yaml).required(false)),
        };

        // E.g. CHAT_SERVER__PORT=8000, CHAT_LLM__MODEL=...
        builder = builder.add_source(
            Environment::with_prefix("CHAT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // Flat variables used by existing deployments.
        if let Ok(val) = env::var("GROQ_API_KEY") {
            builder = builder.set_override("llm.api_key", val)?;
        }
        if let Ok(val) = env::var("GROQ_MODEL") {
            builder = builder.set_override("llm.model", val)?;
        }
        if let Ok(val) = env::var("GROQ_ENDPOINT") {
            builder = builder.set_override("llm.endpoint", val)?;
        }
        if let Ok(val) = env::var("ASSISTANT_NAME") {
            builder = builder.set_override("llm.assistant_name", val)?;
        }
        if let Some(val) = parsed_env::<u32>("MAX_TOKENS") {
            builder = builder.set_override("llm.max_tokens", i64::from(val))?;
        }
        if let Some(val) = parsed_env::<f64>("TEMPERATURE") {
            builder = builder.set_override("llm.temperature", val)?;
        }
        if let Some(val) = parsed_env::<u32>("MAX_CONTINUATIONS") {
            builder = builder.set_override("llm.max_continuations", i64::from(val))?;
        }
        if let Some(val) = parsed_env::<u64>("HISTORY_WINDOW") {
            builder = builder.set_override("history.window", val)?;
        }
        if let Ok(val) = env::var("REDIS_URL") {
            builder = builder.set_override("history.redis_url", val)?;
        }
        if let Ok(val) = env::var("TEST_MODE") {
            builder = builder.set_override("llm.test_mode", is_truthy(&val))?;
        }

        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(host) = cli.host {
            builder = builder.set_override("server.host", host)?;
        }
        if cli.test_mode {
            builder = builder.set_override("llm.test_mode", true)?;
        }

        let cfg = builder.build()?;
        cfg.try_deserialize()
    }
}

fn parsed_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}
