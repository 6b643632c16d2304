use thiserror::Error;

#[derive(Debug, Error)]
pub enum GrindError {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("no channels configured")]
    NoChannels,

    #[error("api returned {status}: {detail}")]
    Api { status: u16, detail: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Regex(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, GrindError>;
