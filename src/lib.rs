//! `mispronounce` - speak a sentence and render it as a captioned MP4
//!
//! # Pipeline
//!
//! - **Configuration**: Azure credentials from the environment (or `.env`),
//!   optional TOML settings
//! - **Speech**: Azure text-to-speech over REST, audio written to `output.mp3`
//! - **Video**: ffmpeg renders a title card with the sentence, then muxes the
//!   audio into `output.mp4`
//!
//! # Example
//!
//! ```rust,no_run
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let video = mispronounce::run(Some("Atmosphere".to_string()), |p| println!("{p}")).await?;
//!     println!("Wrote {}", video.display());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod speech;
pub mod video;

pub use config::{Credentials, Settings};
pub use error::{Error, Result};
pub use pipeline::{run, OutputPaths, Pipeline, Progress, Stage};
pub use speech::{AzureSynthesizer, ResultReason, SpeechSynthesizer, SynthesisResult};
pub use video::{Compositor, CompositorConfig};

/// Version of mispronounce
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
