use thiserror::Error;

/// Failure of a single call against the accounting API.
///
/// The resolver never propagates these past the stage that issued the call;
/// they are logged and the source is treated as empty.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Zoho API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Access token rejected")]
    Unauthorized,

    #[error("Token refresh failed: {0}")]
    Auth(String),

    #[error("Unexpected response payload: {0}")]
    Decode(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Cannot edit config: {0}")]
    TomlEdit(#[from] toml_edit::TomlError),
}

#[derive(Error, Debug)]
pub enum DuplicateCheckError {
    /// Every remote call made during the check failed, so "no duplicate" would
    /// be a guess rather than an answer.
    #[error("All {attempts} accounting API calls failed; duplicate status unknown")]
    SourcesUnavailable { attempts: usize },
}
