//! ffmpeg-based compositor for the captioned pronunciation video
//!
//! Two encoder passes:
//! - render a solid background with the title and caption burned in
//! - mux the synthesized audio onto that render
//!
//! The intermediate render is removed once the mux succeeds.

use std::path::Path;

use tracing::{debug, info};

use super::overlay::{filter_chain, DrawText, TextStyle};
use super::runner::{CommandRunner, ProcessRunner};
use crate::config::VideoSettings;
use crate::error::{Error, Result};

/// Vertical distance of each text line from the frame center.
const LINE_OFFSET: i32 = 50;

/// Configuration for the compositor
#[derive(Debug, Clone)]
pub struct CompositorConfig {
    /// Path to ffmpeg binary
    pub ffmpeg_path: String,
    /// Title line drawn above the caption
    pub title: String,
    /// Font settings for both lines
    pub style: TextStyle,
    /// Background color (ffmpeg color name or hex)
    pub background: String,
    pub width: u32,
    pub height: u32,
    /// Length of the rendered background clip
    pub duration_secs: u32,
    pub video_codec: String,
    pub audio_codec: String,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self::from_settings(&VideoSettings::default())
    }
}

impl CompositorConfig {
    /// Build a config from the `[video]` settings table.
    #[must_use]
    pub fn from_settings(settings: &VideoSettings) -> Self {
        let ffmpeg_path = settings.ffmpeg_path.as_ref().map_or_else(
            || {
                which::which("ffmpeg").map_or_else(
                    |_| "ffmpeg".to_string(),
                    |p| p.to_string_lossy().to_string(),
                )
            },
            |p| p.to_string_lossy().to_string(),
        );

        Self {
            ffmpeg_path,
            title: settings.title.clone(),
            style: TextStyle {
                font_size: settings.font_size,
                font_color: settings.font_color.clone(),
            },
            background: settings.background.clone(),
            width: settings.width,
            height: settings.height,
            duration_secs: settings.duration_secs,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
        }
    }

    /// Specify custom ffmpeg binary path
    #[must_use]
    pub fn with_ffmpeg_path(mut self, path: &str) -> Self {
        self.ffmpeg_path = path.to_string();
        self
    }
}

/// ffmpeg-based video compositor
pub struct Compositor<R = ProcessRunner> {
    config: CompositorConfig,
    runner: R,
}

impl Compositor<ProcessRunner> {
    /// Create a compositor that spawns real ffmpeg processes
    #[must_use]
    pub fn new(config: CompositorConfig) -> Self {
        Self::with_runner(config, ProcessRunner)
    }
}

impl<R: CommandRunner> Compositor<R> {
    #[must_use]
    pub fn with_runner(config: CompositorConfig, runner: R) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    /// Build the `-vf` chain: title above center, caption below
    pub fn build_filter(&self, caption: &str) -> String {
        filter_chain(&[
            DrawText::centered(&self.config.title, -LINE_OFFSET, self.config.style.clone()),
            DrawText::centered(caption, LINE_OFFSET, self.config.style.clone()),
        ])
    }

    /// Arguments for the background + text render
    pub fn render_args(&self, caption: &str, temp_video: &Path) -> Vec<String> {
        let cfg = &self.config;
        let source = format!(
            "color=c={}:s={}x{}:d={}",
            cfg.background, cfg.width, cfg.height, cfg.duration_secs
        );

        let mut args = quiet_args();
        args.extend(
            ["-y", "-f", "lavfi", "-i"]
                .iter()
                .map(std::string::ToString::to_string),
        );
        args.push(source);
        args.push("-vf".to_string());
        args.push(self.build_filter(caption));
        args.push("-c:v".to_string());
        args.push(cfg.video_codec.clone());
        args.push(temp_video.to_string_lossy().to_string());
        args
    }

    /// Arguments for muxing the audio onto the render
    pub fn mux_args(&self, temp_video: &Path, audio: &Path, output: &Path) -> Vec<String> {
        let mut args = quiet_args();
        args.push("-y".to_string());
        args.push("-i".to_string());
        args.push(temp_video.to_string_lossy().to_string());
        args.push("-i".to_string());
        args.push(audio.to_string_lossy().to_string());
        args.push("-c:v".to_string());
        args.push(self.config.video_codec.clone());
        args.push("-c:a".to_string());
        args.push(self.config.audio_codec.clone());
        args.extend(
            ["-strict", "experimental", "-shortest"]
                .iter()
                .map(std::string::ToString::to_string),
        );
        args.push(output.to_string_lossy().to_string());
        args
    }

    /// Run ffmpeg once, failing with its stderr on a non-zero exit
    async fn run_ffmpeg(&self, args: &[String]) -> Result<()> {
        debug!("ffmpeg args: {:?}", args);

        let output = self
            .runner
            .run(&self.config.ffmpeg_path, args)
            .await
            .map_err(|source| Error::EncoderLaunch {
                program: self.config.ffmpeg_path.clone(),
                source,
            })?;

        if !output.success {
            let stderr = output.stderr.trim();
            let message = if stderr.is_empty() {
                match output.code {
                    Some(code) => format!("ffmpeg exited with status: {code}"),
                    None => "ffmpeg terminated by signal".to_string(),
                }
            } else {
                stderr.to_string()
            };
            return Err(Error::EncodingFailed(message));
        }

        Ok(())
    }

    /// Render the captioned video and attach `audio` to it.
    ///
    /// `temp_video` is deleted after a successful mux. When either ffmpeg pass
    /// fails the error is returned as-is and `temp_video` is left on disk.
    pub async fn compose(
        &self,
        caption: &str,
        audio: &Path,
        output: &Path,
        temp_video: &Path,
    ) -> Result<()> {
        self.run_ffmpeg(&self.render_args(caption, temp_video)).await?;
        debug!("Rendered title card to {}", temp_video.display());

        self.run_ffmpeg(&self.mux_args(temp_video, audio, output)).await?;

        if tokio::fs::try_exists(temp_video).await? {
            tokio::fs::remove_file(temp_video).await?;
        }

        info!("Composited video to {}", output.display());
        Ok(())
    }
}

fn quiet_args() -> Vec<String> {
    ["-hide_banner", "-loglevel", "warning"]
        .iter()
        .map(std::string::ToString::to_string)
        .collect()
}
