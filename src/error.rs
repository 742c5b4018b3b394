//! Error types for the NL-to-SQL gateway.
//!
//! Every component reports one of a closed set of error kinds. Transport
//! adapters map the kind to a wire-level status deterministically, so the
//! variants here are the whole contract between the core and its callers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    /// Missing or empty required field. Caller's fault.
    #[error("Invalid input: {message}")]
    Input { message: String },

    /// SQL rejected by the read-only gate.
    #[error("Query rejected: {reason}")]
    Policy { reason: String },

    /// The model backend produced nothing usable.
    #[error("SQL generation failed: {message}")]
    Generation { message: String },

    #[error("SQL execution failed: {message}")]
    Execution {
        message: String,
        /// e.g., "42S02" for an unknown table on MySQL
        sql_state: Option<String>,
    },

    /// Binary column value that is not valid UTF-8.
    #[error("Encoding error: {message}")]
    Encoding { message: String },

    #[error("Connectivity error: {message}")]
    Connectivity { message: String, suggestion: String },
}

impl GatewayError {
    /// Create an input error.
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
        }
    }

    /// Create a policy error.
    pub fn policy(reason: impl Into<String>) -> Self {
        Self::Policy {
            reason: reason.into(),
        }
    }

    /// Create a generation error.
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }

    /// Create an execution error with optional SQL state.
    pub fn execution(message: impl Into<String>, sql_state: Option<String>) -> Self {
        Self::Execution {
            message: message.into(),
            sql_state,
        }
    }

    /// Create an encoding error.
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    /// Create a connectivity error with a helpful suggestion.
    pub fn connectivity(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connectivity {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Input { .. } => "input",
            Self::Policy { .. } => "policy",
            Self::Generation { .. } => "generation",
            Self::Execution { .. } => "execution",
            Self::Encoding { .. } => "encoding",
            Self::Connectivity { .. } => "connectivity",
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connectivity { suggestion, .. } => Some(suggestion),
            Self::Policy { .. } => Some("Only a single read-only SELECT statement is accepted"),
            _ => None,
        }
    }

    /// True when the caller supplied bad input (as opposed to a server-side failure).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Input { .. })
    }
}

/// Convert sqlx errors to GatewayError.
impl From<sqlx::Error> for GatewayError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => GatewayError::connectivity(
                msg.to_string(),
                "Check the connection parameters and credentials",
            ),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                GatewayError::execution(db_err.message(), code)
            }
            sqlx::Error::RowNotFound => GatewayError::execution("No rows returned", None),
            sqlx::Error::PoolTimedOut => GatewayError::connectivity(
                "Timed out acquiring a database connection",
                "Check database server load",
            ),
            sqlx::Error::PoolClosed => {
                GatewayError::connectivity("Connection pool is closed", "Reconnect to the database")
            }
            sqlx::Error::Io(io_err) => GatewayError::connectivity(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => GatewayError::connectivity(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => GatewayError::connectivity(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::TypeNotFound { type_name } => {
                GatewayError::execution(format!("Type not found: {}", type_name), None)
            }
            sqlx::Error::ColumnNotFound(col) => {
                GatewayError::execution(format!("Column not found: {}", col), None)
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => GatewayError::execution(
                format!("Column index {} out of bounds (len: {})", index, len),
                None,
            ),
            sqlx::Error::ColumnDecode { index, source } => GatewayError::execution(
                format!("Failed to decode column {}: {}", index, source),
                None,
            ),
            sqlx::Error::Decode(source) => {
                GatewayError::execution(format!("Decode error: {}", source), None)
            }
            sqlx::Error::WorkerCrashed => GatewayError::connectivity(
                "Database worker crashed",
                "Retry the request; the connection was lost",
            ),
            _ => GatewayError::execution(format!("Unknown database error: {}", err), None),
        }
    }
}

/// Result type alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Build suggestion data as JSON value.
fn suggestion_data(suggestion: Option<&str>) -> Option<serde_json::Value> {
    suggestion.map(|s| serde_json::json!({ "suggestion": s }))
}

/// Convert GatewayError to MCP ErrorData.
/// Only missing input is the caller's fault; every other kind is internal_error.
impl From<GatewayError> for rmcp::ErrorData {
    fn from(err: GatewayError) -> Self {
        let data = suggestion_data(err.suggestion());
        match &err {
            GatewayError::Input { .. } => {
                rmcp::ErrorData::invalid_params(err.to_string(), data)
            }
            GatewayError::Execution {
                sql_state: Some(code),
                ..
            } => rmcp::ErrorData::internal_error(format!("{} (SQLSTATE: {})", err, code), data),
            _ => rmcp::ErrorData::internal_error(err.to_string(), data),
        }
    }
}
