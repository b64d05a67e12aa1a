use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckerError {
    #[error("Provider API key is not configured")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Malformed hex balance: {0}")]
    MalformedHex(String),

    #[error("Amount out of range: {0}")]
    AmountOutOfRange(String),

    #[error("Provider timed out after {0}ms")]
    Timeout(u64),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to load configuration: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CheckerError>;
