//! Error type shared by every pipeline stage.

use thiserror::Error;

/// Pipeline errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("Please provide a sentence as input.")]
    MissingArgument,

    #[error("Azure Speech subscription key or region is missing in .env file.")]
    MissingCredentials,

    #[error("Error synthesizing speech: {0}")]
    SynthesisFailed(String),

    #[error("FFmpeg error: {0}")]
    EncodingFailed(String),

    #[error("failed to launch {program}: {source}")]
    EncoderLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid speech endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
