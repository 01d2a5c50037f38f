use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Core(#[from] floodgate_core::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("toml deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("toml serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0} of {1} accounts failed their submission sequence")]
    FailedAccounts(usize, usize),
}
