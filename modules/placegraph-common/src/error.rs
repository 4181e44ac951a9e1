use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlaceGraphError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
