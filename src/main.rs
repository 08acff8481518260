//! Command-line interface for posting-emulator
//!
//! # Usage Examples
//!
//! ```bash
//! # One iteration against a local REST proxy
//! posting-emulator once \
//!   --db-creds db_creds.yaml \
//!   --topic-base-url http://localhost:8082
//!
//! # Continuous load into the topic, stream and archive sinks
//! posting-emulator run \
//!   --topic-base-url https://proxy.example.com \
//!   --stream-base-url https://api.example.com \
//!   --archive s3://my-bucket/emulated/ \
//!   --max-delay 2s
//!
//! # Reproducible run of 100 iterations
//! posting-emulator run --seed 7 --max-iterations 100 --archive ./out
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use posting_emulator::config::{SamplerOpts, SinkOpts, SourceOpts};
use posting_emulator::emulator::DEFAULT_MAX_CONSECUTIVE_FETCH_FAILURES;
use posting_emulator::{setup_shutdown_handler, Emulator, LoopMode, MySqlRowFetcher};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "posting-emulator")]
#[command(about = "Replays sampled MySQL rows as posting events to topics, streams and an archive")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single sample/fetch/emit iteration
    Once {
        #[command(flatten)]
        source: SourceOpts,

        #[command(flatten)]
        sampler: SamplerOpts,

        #[command(flatten)]
        sinks: SinkOpts,
    },

    /// Iterate until interrupted
    Run {
        #[command(flatten)]
        source: SourceOpts,

        #[command(flatten)]
        sampler: SamplerOpts,

        #[command(flatten)]
        sinks: SinkOpts,

        /// Stop after this many iterations
        #[arg(long)]
        max_iterations: Option<u64>,

        /// Abort after this many fetch failures in a row (0 keeps going forever)
        #[arg(long, default_value_t = DEFAULT_MAX_CONSECUTIVE_FETCH_FAILURES)]
        max_consecutive_fetch_failures: u32,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Once {
            source,
            sampler,
            sinks,
        } => {
            // No signal handler here: Ctrl+C keeps its default effect.
            let mut emulator = build(&source, &sampler, &sinks).await?;
            emulator.run_once().await?;
        }
        Commands::Run {
            source,
            sampler,
            sinks,
            max_iterations,
            max_consecutive_fetch_failures,
        } => {
            let mut emulator = build(&source, &sampler, &sinks)
                .await?
                .with_max_consecutive_fetch_failures(max_consecutive_fetch_failures);
            let mode = LoopMode::Continuous { max_iterations };
            emulator.run(mode, setup_shutdown_handler()).await?;
        }
    }

    Ok(())
}

async fn build(
    source: &SourceOpts,
    sampler: &SamplerOpts,
    sinks: &SinkOpts,
) -> anyhow::Result<Emulator<MySqlRowFetcher>> {
    let fetcher = source.build_fetcher()?;
    let emitter = sinks
        .build_emitter()
        .await
        .context("Failed to configure sinks")?;
    Ok(Emulator::new(sampler.build_sampler(), fetcher, emitter))
}
