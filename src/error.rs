use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlappyError {
    #[error("Could not determine the platform config/data directory")]
    NoProjectDirs,
    #[error("Invalid tunables: {0}")]
    InvalidTunables(String),
    #[error("There was a problem reading or writing the score file")]
    Json(#[from] serde_json::Error),
    #[error("There was a problem parsing the config file")]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    IO(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FlappyError>;
