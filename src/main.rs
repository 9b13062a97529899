//! `mispronounce` CLI - speak a sentence and render it as a captioned MP4

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use mispronounce::Error;

#[derive(Parser)]
#[command(name = "mispronounce")]
#[command(about = "Speak a sentence with Azure TTS and render it as a captioned MP4")]
#[command(version)]
struct Cli {
    /// Sentence to speak and caption
    #[arg(allow_hyphen_values = true)]
    sentence: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (stderr, so stdout only carries status lines)
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match mispronounce::run(cli.sentence, |progress| println!("{progress}")).await {
        Ok(_) => {}
        Err(e @ (Error::MissingArgument | Error::MissingCredentials)) => {
            println!("{e}");
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
