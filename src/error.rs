//! Error types for the ONVIF responder.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OnvifError {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config: {0}")]
    Config(String),

    #[error("URL: {0}")]
    Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, OnvifError>;
