//! music-man - organize, compare and transcode tagged music libraries
mod cli;
mod config;

use anyhow::Context;
use clap::Parser;
use cli::Cli;
use config::Settings;
use musicman_library::{ProcessTranscoder, Reconciler};
use musicman_metadata::LoftyMetadataReader;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let settings = Settings::load(cli.config.as_deref())?;
    let quiet = cli.quiet;
    let (command, output, options) = cli.into_run(settings);
    debug!("Run options: {:?}", options);
    info!("Updating {} with {:?}", output.display(), command);

    let reader = LoftyMetadataReader::new();
    let transcoder = ProcessTranscoder::new(&options.transcode);
    let reconciler = Reconciler::new(&options, &reader, &transcoder);

    let summary = reconciler
        .run(&command, &output)
        .await
        .with_context(|| format!("Failed to update {}", output.display()))?;

    if !quiet {
        println!("{}", summary.summary_text());
    }

    Ok(())
}

fn init_tracing(cli: &Cli) {
    let default_level = if cli.quiet {
        "warn"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
