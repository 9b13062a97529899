//! The run: validate the argument, load configuration, synthesize, compose.
//!
//! Stages advance strictly in order and any failure aborts the run. Nothing is
//! retried.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::{self, Credentials, Settings};
use crate::error::{Error, Result};
use crate::speech::{synthesize_to_file, AzureSynthesizer, SpeechSynthesizer};
use crate::video::{CommandRunner, Compositor, CompositorConfig, ProcessRunner};

/// Pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    ValidateArgs,
    LoadConfig,
    Synthesize,
    Compose,
    Done,
    Aborted,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// User-facing progress reported while the run advances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    AudioSaved(PathBuf),
    VideoSaved(PathBuf),
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AudioSaved(path) => write!(f, "Audio file saved to {}", path.display()),
            Self::VideoSaved(path) => write!(f, "MP4 file saved to {}", path.display()),
        }
    }
}

/// Where a run writes its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub audio: PathBuf,
    pub video: PathBuf,
    pub temp_video: PathBuf,
}

impl Default for OutputPaths {
    fn default() -> Self {
        Self {
            audio: PathBuf::from("output.mp3"),
            video: PathBuf::from("output.mp4"),
            temp_video: PathBuf::from("temp_video.mp4"),
        }
    }
}

impl OutputPaths {
    /// The fixed file names, placed under `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        let names = Self::default();
        Self {
            audio: dir.join(names.audio),
            video: dir.join(names.video),
            temp_video: dir.join(names.temp_video),
        }
    }
}

/// Tracks the current stage and logs each transition.
struct StageTracker {
    trail: Vec<Stage>,
}

impl StageTracker {
    fn new() -> Self {
        Self {
            trail: vec![Stage::Start],
        }
    }

    fn current(&self) -> Stage {
        self.trail.last().copied().unwrap_or(Stage::Start)
    }

    fn enter(&mut self, next: Stage) {
        debug!(from = %self.current(), to = %next, "Stage transition");
        self.trail.push(next);
    }

    /// Mark the run aborted if `result` is an error; pass it through either way.
    fn abort_on_err<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            debug!(stage = %self.current(), "Run aborted: {e}");
            self.trail.push(Stage::Aborted);
        }
        result
    }

    fn finish<T>(&mut self, result: Result<T>) -> Result<T> {
        let result = self.abort_on_err(result);
        if result.is_ok() {
            self.enter(Stage::Done);
        }
        result
    }
}

/// Synthesizer plus compositor, wired to a set of output paths.
pub struct Pipeline<S, R = ProcessRunner> {
    synthesizer: S,
    compositor: Compositor<R>,
    paths: OutputPaths,
}

impl<S: SpeechSynthesizer, R: CommandRunner> Pipeline<S, R> {
    pub fn new(synthesizer: S, compositor: Compositor<R>, paths: OutputPaths) -> Self {
        Self {
            synthesizer,
            compositor,
            paths,
        }
    }

    pub fn paths(&self) -> &OutputPaths {
        &self.paths
    }

    /// Speak `sentence` to the audio file, then compose the final video.
    ///
    /// Returns the path of the finished video.
    pub async fn run<F>(&self, sentence: &str, mut on_progress: F) -> Result<PathBuf>
    where
        F: FnMut(Progress),
    {
        let mut stage = StageTracker::new();
        self.run_tracked(sentence, &mut stage, &mut on_progress).await
    }

    async fn run_tracked<F>(
        &self,
        sentence: &str,
        stage: &mut StageTracker,
        on_progress: &mut F,
    ) -> Result<PathBuf>
    where
        F: FnMut(Progress),
    {
        let result = self.run_stages(sentence, stage, on_progress).await;
        stage.finish(result)
    }

    async fn run_stages<F>(
        &self,
        sentence: &str,
        stage: &mut StageTracker,
        on_progress: &mut F,
    ) -> Result<PathBuf>
    where
        F: FnMut(Progress),
    {
        stage.enter(Stage::Synthesize);
        synthesize_to_file(&self.synthesizer, sentence, &self.paths.audio).await?;
        on_progress(Progress::AudioSaved(self.paths.audio.clone()));

        stage.enter(Stage::Compose);
        self.compositor
            .compose(
                sentence,
                &self.paths.audio,
                &self.paths.video,
                &self.paths.temp_video,
            )
            .await?;
        on_progress(Progress::VideoSaved(self.paths.video.clone()));

        Ok(self.paths.video.clone())
    }
}

/// Run the whole program for one command-line sentence.
///
/// Reads `.env`, the environment and the settings file, then writes
/// `output.mp3` and `output.mp4` in the working directory.
///
/// [`Error::MissingArgument`] and [`Error::MissingCredentials`] are returned
/// before any network or subprocess work happens.
pub async fn run<F>(sentence: Option<String>, mut on_progress: F) -> Result<PathBuf>
where
    F: FnMut(Progress),
{
    let mut stage = StageTracker::new();

    stage.enter(Stage::ValidateArgs);
    let Some(sentence) = sentence.filter(|s| !s.trim().is_empty()) else {
        return stage.abort_on_err(Err(Error::MissingArgument));
    };

    stage.enter(Stage::LoadConfig);
    let (credentials, settings) = stage.abort_on_err(load_config())?;
    let synthesizer =
        stage.abort_on_err(AzureSynthesizer::new(&credentials, &settings.speech))?;

    let compositor = Compositor::new(CompositorConfig::from_settings(&settings.video));
    let pipeline = Pipeline::new(synthesizer, compositor, OutputPaths::default());

    pipeline
        .run_tracked(&sentence, &mut stage, &mut on_progress)
        .await
}

fn load_config() -> Result<(Credentials, Settings)> {
    config::load_dotenv();
    let credentials = Credentials::from_env()?;
    let settings = Settings::load()?;
    debug!(region = %credentials.region, voice = %settings.speech.voice, "Configuration loaded");
    Ok((credentials, settings))
}
