use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrognosisError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider mapping error: {0}")]
    ProviderMapping(String),
}

pub type Result<T> = std::result::Result<T, PrognosisError>;
