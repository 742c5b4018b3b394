//! Configuration handling for the NL-to-SQL gateway.
//!
//! Configuration comes from CLI arguments and environment variables (a `.env`
//! file in the working directory is loaded first). The resulting [`Config`] is
//! built once in `main` and handed to each component constructor.

use crate::cli::Command;
use crate::db::ExecutionLimits;
use crate::llm::ModelSettings;
use crate::models::{ConnectionSettings, DatabaseType};
use clap::{Parser, ValueEnum};
use std::time::Duration;
use url::Url;

pub const DEFAULT_DB_HOST: &str = "localhost";
pub const DEFAULT_DB_NAME: &str = "mcpdemo1";
pub const DEFAULT_DB_USER: &str = "root";
pub const DEFAULT_DB_PASSWORD: &str = "password";
pub const DEFAULT_AWS_REGION: &str = "us-east-1";
pub const DEFAULT_MODEL_ID: &str = "amazon.nova-pro-v1:0";
pub const DEFAULT_MODEL_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_MODEL_TEMPERATURE: f32 = 0.1;
pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
pub const DEFAULT_HTTP_PORT: u16 = 8000;
pub const DEFAULT_MCP_ENDPOINT: &str = "/mcp";
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_RESULT_ROWS: usize = 10_000;

/// Transport mode for the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TransportMode {
    /// MCP over standard input/output (for agent/CLI hosts)
    #[default]
    Stdio,
    /// REST API plus MCP streamable HTTP on one listener
    Http,
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Http => write!(f, "http"),
        }
    }
}

/// Configuration for the NL-to-SQL gateway.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "nl2sql-mcp-server",
    about = "Ask questions of a SQL database in natural language, over MCP or HTTP",
    version,
    author
)]
pub struct Config {
    /// One-shot command. Without one, the server starts on the selected transport.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Database engine
    #[arg(long, value_enum, default_value = "mysql", env = "DB_TYPE")]
    pub db_type: DatabaseType,

    /// Database host
    #[arg(long, default_value = DEFAULT_DB_HOST, env = "DB_HOST")]
    pub db_host: String,

    /// Database port (defaults to the engine's standard port)
    #[arg(long, env = "DB_PORT")]
    pub db_port: Option<u16>,

    /// Database name (file path for SQLite)
    #[arg(long, default_value = DEFAULT_DB_NAME, env = "DB_NAME")]
    pub db_name: String,

    /// Database user
    #[arg(long, default_value = DEFAULT_DB_USER, env = "DB_USER")]
    pub db_user: String,

    /// Database password
    #[arg(
        long,
        default_value = DEFAULT_DB_PASSWORD,
        env = "DB_PASSWORD",
        hide_env_values = true,
        hide_default_value = true
    )]
    pub db_password: String,

    /// Full connection URL. Overrides the individual DB_* settings.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Region of the Bedrock runtime endpoint
    #[arg(long, default_value = DEFAULT_AWS_REGION, env = "AWS_REGION")]
    pub aws_region: String,

    /// Model identifier passed to the chat-completions endpoint
    #[arg(long, default_value = DEFAULT_MODEL_ID, env = "BEDROCK_MODEL_ID")]
    pub model_id: String,

    /// OpenAI-compatible base URL (defaults to the region's Bedrock endpoint)
    #[arg(long, env = "MODEL_BASE_URL")]
    pub model_base_url: Option<String>,

    /// Bearer key for the model endpoint
    #[arg(long, env = "MODEL_API_KEY", hide_env_values = true)]
    pub model_api_key: Option<String>,

    /// Maximum completion tokens per generation
    #[arg(long, default_value_t = DEFAULT_MODEL_MAX_TOKENS, env = "MODEL_MAX_TOKENS")]
    pub model_max_tokens: u32,

    /// Sampling temperature for generation
    #[arg(long, default_value_t = DEFAULT_MODEL_TEMPERATURE, env = "MODEL_TEMPERATURE")]
    pub model_temperature: f32,

    /// Transport mode (stdio or http)
    #[arg(
        short,
        long,
        value_enum,
        default_value = "stdio",
        env = "MCP_TRANSPORT"
    )]
    pub transport: TransportMode,

    /// HTTP host to bind to (only used with http transport)
    #[arg(long, default_value = DEFAULT_HTTP_HOST, env = "API_HOST")]
    pub http_host: String,

    /// HTTP port to bind to (only used with http transport)
    #[arg(long, default_value_t = DEFAULT_HTTP_PORT, env = "API_PORT")]
    pub http_port: u16,

    /// Path of the MCP streamable-HTTP endpoint (only used with http transport)
    #[arg(long, default_value = DEFAULT_MCP_ENDPOINT, env = "MCP_ENDPOINT")]
    pub mcp_endpoint: String,

    /// Statement timeout in seconds
    #[arg(long, default_value_t = DEFAULT_QUERY_TIMEOUT_SECS, env = "QUERY_TIMEOUT")]
    pub query_timeout: u64,

    /// Connection timeout in seconds
    #[arg(long, default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS, env = "CONNECT_TIMEOUT")]
    pub connect_timeout: u64,

    /// Model request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_MODEL_TIMEOUT_SECS, env = "MODEL_TIMEOUT")]
    pub model_timeout: u64,

    /// Largest result set a statement may return before it is rejected
    #[arg(long, default_value_t = DEFAULT_MAX_RESULT_ROWS, env = "MAX_RESULT_ROWS")]
    pub max_result_rows: usize,

    /// Also parse SQL and require exactly one query statement
    #[arg(long, env = "STRICT_SQL")]
    pub strict_sql: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "JSON_LOGS")]
    pub json_logs: bool,
}

impl Config {
    /// Load `.env` (if present) and parse configuration from the command line.
    pub fn load() -> Self {
        // A missing .env file is normal.
        let _ = dotenv::dotenv();
        Self::parse()
    }

    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            command: None,
            db_type: DatabaseType::MySQL,
            db_host: DEFAULT_DB_HOST.to_string(),
            db_port: None,
            db_name: DEFAULT_DB_NAME.to_string(),
            db_user: DEFAULT_DB_USER.to_string(),
            db_password: DEFAULT_DB_PASSWORD.to_string(),
            database_url: None,
            aws_region: DEFAULT_AWS_REGION.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            model_base_url: None,
            model_api_key: None,
            model_max_tokens: DEFAULT_MODEL_MAX_TOKENS,
            model_temperature: DEFAULT_MODEL_TEMPERATURE,
            transport: TransportMode::Stdio,
            http_host: DEFAULT_HTTP_HOST.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            mcp_endpoint: DEFAULT_MCP_ENDPOINT.to_string(),
            query_timeout: DEFAULT_QUERY_TIMEOUT_SECS,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT_SECS,
            model_timeout: DEFAULT_MODEL_TIMEOUT_SECS,
            max_result_rows: DEFAULT_MAX_RESULT_ROWS,
            strict_sql: false,
            log_level: "info".to_string(),
            json_logs: false,
        }
    }

    /// Effective database engine. A full URL takes precedence over `--db-type`.
    pub fn effective_db_type(&self) -> DatabaseType {
        self.database_url
            .as_deref()
            .and_then(DatabaseType::from_connection_string)
            .unwrap_or(self.db_type)
    }

    /// Build the connection URL from either DATABASE_URL or the DB_* parts.
    pub fn connection_url(&self) -> Result<String, String> {
        if let Some(url) = &self.database_url {
            if DatabaseType::from_connection_string(url).is_none() {
                return Err(
                    "Unsupported DATABASE_URL scheme: expected mysql://, postgres:// or sqlite:"
                        .to_string(),
                );
            }
            return Ok(url.clone());
        }

        match self.db_type {
            // Read-only open mode: the file must already exist.
            DatabaseType::SQLite => Ok(format!("sqlite:{}?mode=ro", self.db_name)),
            db_type => {
                let scheme = match db_type {
                    DatabaseType::PostgreSQL => "postgres",
                    _ => "mysql",
                };
                let mut url = Url::parse(&format!("{}://{}", scheme, self.db_host))
                    .map_err(|e| format!("Invalid DB_HOST '{}': {}", self.db_host, e))?;
                url.set_username(&self.db_user)
                    .map_err(|_| "DB_USER cannot be set on this URL".to_string())?;
                url.set_password(Some(&self.db_password))
                    .map_err(|_| "DB_PASSWORD cannot be set on this URL".to_string())?;
                url.set_port(self.db_port.or(db_type.default_port()))
                    .map_err(|_| "DB_PORT cannot be set on this URL".to_string())?;
                url.set_path(&self.db_name);
                Ok(url.to_string())
            }
        }
    }

    /// Connection parameters for the database collaborator.
    pub fn connection_settings(&self) -> Result<ConnectionSettings, String> {
        Ok(ConnectionSettings {
            db_type: self.effective_db_type(),
            url: self.connection_url()?,
            connect_timeout: self.connect_timeout_duration(),
        })
    }

    /// Settings for the model collaborator.
    pub fn model_settings(&self) -> ModelSettings {
        let base_url = self.model_base_url.clone().unwrap_or_else(|| {
            format!(
                "https://bedrock-runtime.{}.amazonaws.com/openai/v1",
                self.aws_region
            )
        });
        ModelSettings {
            base_url,
            api_key: self.model_api_key.clone().unwrap_or_default(),
            model_id: self.model_id.clone(),
            max_tokens: self.model_max_tokens,
            temperature: self.model_temperature,
            timeout: Duration::from_secs(self.model_timeout),
        }
    }

    /// Bounds applied to every executed statement.
    pub fn execution_limits(&self) -> ExecutionLimits {
        ExecutionLimits {
            query_timeout: self.query_timeout_duration(),
            max_rows: self.max_result_rows,
            strict_sql: self.strict_sql,
        }
    }

    /// Get the query timeout as a Duration.
    pub fn query_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.query_timeout)
    }

    /// Get the connection timeout as a Duration.
    pub fn connect_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}
