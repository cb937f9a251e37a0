use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use eventline::config::Config;

mod commands;

use commands::{ConsumeParams, GenerateParams, PipelineKind};

#[derive(Parser)]
#[command(
    name = "eventline",
    version,
    about = "Breaking topic detection over timelines of tweets",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML); environment variables are used otherwise
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a burst detection pipeline over a JSON-lines corpus
    Consume {
        /// Pipeline to run
        #[arg(short, long, value_enum, default_value = "eld")]
        pipeline: PipelineKind,

        /// Corpus file, one JSON object per line
        #[arg(short, long)]
        input: PathBuf,

        /// Window length in seconds, defaults to the pipeline's time window
        #[arg(long)]
        periodicity: Option<f64>,

        /// Seconds without input before ingestion ends (negative waits forever)
        #[arg(long, allow_hyphen_values = true)]
        max_inactivity: Option<f64>,

        /// Close windows on wall-clock time instead of item timestamps
        #[arg(long, default_value = "false")]
        real_time: bool,

        /// Replay the corpus at this multiple of its recorded rate
        #[arg(long)]
        speed: Option<f64>,

        /// Lines to skip at the start of the corpus
        #[arg(long, default_value = "0")]
        skip_lines: usize,

        /// Maximum number of lines to read
        #[arg(long)]
        max_lines: Option<usize>,

        /// Write the full report as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the nutrition store checkpoints as JSON
        #[arg(long)]
        checkpoints: Option<PathBuf>,

        /// IDF table written by `eventline idf`; documents are weighted with TF-IDF
        #[arg(long)]
        scheme: Option<PathBuf>,
    },

    /// Build an IDF table from one or more corpora for TF-IDF weighting
    Idf {
        /// Corpus file, one JSON object per line; repeat to fold several corpora
        #[arg(short, long, required = true)]
        input: Vec<PathBuf>,

        /// Where to write the IDF table as JSON
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Generate a synthetic tweet corpus
    Generate {
        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Number of tweets
        #[arg(short, long, default_value = "1000")]
        documents: usize,

        /// Unix timestamp of the first tweet
        #[arg(long, default_value = "1600000000")]
        start: i64,

        /// Seconds covered by the corpus
        #[arg(long, default_value = "600")]
        span: u64,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Term that bursts in the last quarter of the corpus
        #[arg(long)]
        burst_term: Option<String>,
    },

    /// Measure how strongly two terms co-occur in a corpus
    Cooccur {
        /// Corpus file, one JSON object per line
        #[arg(short, long)]
        input: PathBuf,

        /// First term; separate tokens with spaces for a joint term
        x: String,

        /// Second term
        y: String,

        /// Logarithm base of the pointwise mutual information
        #[arg(long, default_value = "2")]
        base: f64,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    config.validate()?;

    // Initialize tracing/logging
    let log_format = cli.log_format.as_deref().unwrap_or(&config.logging.format);
    setup_tracing(log_format, &config.logging.level, cli.verbose)?;

    if let Err(e) = eventline::metrics::init_metrics() {
        tracing::warn!("Metrics initialization failed: {}", e);
    }

    tracing::info!("eventline starting");

    match cli.command {
        Commands::Consume {
            pipeline,
            input,
            periodicity,
            max_inactivity,
            real_time,
            speed,
            skip_lines,
            max_lines,
            output,
            checkpoints,
            scheme,
        } => {
            tracing::info!(
                pipeline = ?pipeline,
                input = %input.display(),
                periodicity = ?periodicity,
                real_time = %real_time,
                scheme = ?scheme,
                "Starting consume command"
            );
            commands::consume(
                config,
                ConsumeParams {
                    pipeline,
                    input,
                    periodicity,
                    max_inactivity,
                    real_time,
                    speed,
                    skip_lines,
                    max_lines,
                    output,
                    checkpoints,
                    scheme,
                },
            )
            .await?;
        }

        Commands::Idf { input, output } => {
            tracing::info!(inputs = input.len(), output = %output.display(), "Starting idf command");
            commands::idf(&input, &output)?;
        }

        Commands::Generate {
            output,
            documents,
            start,
            span,
            seed,
            burst_term,
        } => {
            tracing::info!(
                output = %output.display(),
                documents = %documents,
                span = %span,
                burst_term = ?burst_term,
                "Starting generate command"
            );
            commands::generate(GenerateParams {
                output,
                documents,
                start,
                span,
                seed,
                burst_term,
            })?;
        }

        Commands::Cooccur { input, x, y, base } => {
            tracing::info!(input = %input.display(), x = %x, y = %y, "Starting cooccur command");
            commands::cooccur(&input, &x, &y, base)?;
        }

        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    tracing::info!("eventline completed successfully");
    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("eventline=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_new(format!("eventline={level},warn"))?
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
