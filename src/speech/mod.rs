//! Text-to-speech synthesis
//!
//! A [`SpeechSynthesizer`] turns text into encoded audio and reports how the
//! request finished. [`synthesize_to_file`] persists the audio, but only once
//! the service has confirmed the synthesis completed.

pub mod azure;

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::info;

use crate::error::{Error, Result};

pub use azure::AzureSynthesizer;

/// Why a synthesis request finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultReason {
    /// Audio was produced in full.
    SynthesizingAudioCompleted,
    /// The request was rejected or could not reach the service.
    Canceled,
}

impl fmt::Display for ResultReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SynthesizingAudioCompleted => f.write_str("SynthesizingAudioCompleted"),
            Self::Canceled => f.write_str("Canceled"),
        }
    }
}

/// Classified cause of a canceled synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancellationErrorCode {
    AuthenticationFailure,
    BadRequest,
    Forbidden,
    TooManyRequests,
    ConnectionFailure,
    ServiceTimeout,
    ServiceError,
}

impl CancellationErrorCode {
    /// Classify an HTTP status returned by the synthesis endpoint.
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            401 => Self::AuthenticationFailure,
            403 => Self::Forbidden,
            408 | 504 => Self::ServiceTimeout,
            429 => Self::TooManyRequests,
            _ => Self::ServiceError,
        }
    }
}

impl fmt::Display for CancellationErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Details attached to a [`ResultReason::Canceled`] result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancellationDetails {
    pub error_code: CancellationErrorCode,
    pub error_details: String,
}

/// Outcome of one synthesis request.
#[derive(Debug, Clone)]
pub struct SynthesisResult {
    pub reason: ResultReason,
    /// Encoded audio; empty unless the synthesis completed.
    pub audio_data: Bytes,
    pub cancellation: Option<CancellationDetails>,
}

impl SynthesisResult {
    #[must_use]
    pub fn completed(audio_data: Bytes) -> Self {
        Self {
            reason: ResultReason::SynthesizingAudioCompleted,
            audio_data,
            cancellation: None,
        }
    }

    #[must_use]
    pub fn canceled(error_code: CancellationErrorCode, error_details: impl Into<String>) -> Self {
        Self {
            reason: ResultReason::Canceled,
            audio_data: Bytes::new(),
            cancellation: Some(CancellationDetails {
                error_code,
                error_details: error_details.into(),
            }),
        }
    }

    /// Human-readable reason, including cancellation details when present.
    #[must_use]
    pub fn describe(&self) -> String {
        match &self.cancellation {
            Some(details) if details.error_details.is_empty() => {
                format!("{} ({})", self.reason, details.error_code)
            }
            Some(details) => format!(
                "{} ({}: {})",
                self.reason, details.error_code, details.error_details
            ),
            None => self.reason.to_string(),
        }
    }
}

/// A text-to-speech backend.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` and report the outcome.
    ///
    /// Service-side failures come back as [`ResultReason::Canceled`], not as
    /// `Err`; errors are reserved for local failures.
    async fn speak_text(&self, text: &str) -> Result<SynthesisResult>;
}

/// Synthesize `text` and write the audio to `audio_path`.
///
/// The file is written only after the service reports completion, so a failed
/// synthesis never leaves a partial audio file behind.
pub async fn synthesize_to_file<S>(synthesizer: &S, text: &str, audio_path: &Path) -> Result<()>
where
    S: SpeechSynthesizer + ?Sized,
{
    let result = synthesizer.speak_text(text).await?;

    if result.reason != ResultReason::SynthesizingAudioCompleted {
        return Err(Error::SynthesisFailed(result.describe()));
    }

    tokio::fs::write(audio_path, &result.audio_data).await?;
    info!(
        "Wrote {} bytes of audio to {}",
        result.audio_data.len(),
        audio_path.display()
    );

    Ok(())
}
