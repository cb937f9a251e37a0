use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use eventline::config::Config;
use eventline::consumer::{ConsumerReport, WindowClock, WindowProcessor, WindowedConsumer};
use eventline::nlp::{DocumentBuilder, TfIdf, Tokenizer, TokenizerConfig};
use eventline::pipelines::{EldPipeline, FirePipeline, ZhaoPipeline};
use eventline::queue::Queue;
use eventline::reader::{JsonlReader, ReaderOptions};

use super::idf::load_idf;

/// How often the feeder checks whether the consumer drained the queue
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Burst detector to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PipelineKind {
    Eld,
    Fire,
    Zhao,
}

/// Parameters of the consume command
#[derive(Debug, Clone)]
pub struct ConsumeParams {
    pub pipeline: PipelineKind,
    pub input: PathBuf,
    pub periodicity: Option<f64>,
    pub max_inactivity: Option<f64>,
    pub real_time: bool,
    pub speed: Option<f64>,
    pub skip_lines: usize,
    pub max_lines: Option<usize>,
    pub output: Option<PathBuf>,
    pub checkpoints: Option<PathBuf>,
    /// IDF table to weight documents with TF-IDF instead of TF
    pub scheme: Option<PathBuf>,
}

pub async fn consume(mut config: Config, params: ConsumeParams) -> Result<()> {
    if let Some(max_inactivity) = params.max_inactivity {
        config.consumer.max_inactivity = max_inactivity;
        config.validate().context("Invalid --max-inactivity")?;
    }

    println!("Consuming {}", params.input.display());
    println!("==========={}", "=".repeat(params.input.display().to_string().len()));

    let mut builder = DocumentBuilder::new(Tokenizer::english(TokenizerConfig::default()));
    if let Some(path) = &params.scheme {
        let idf = load_idf(path)?;
        println!("Weighting with TF-IDF over {} documents", idf.documents());
        if params.pipeline == PipelineKind::Zhao {
            tracing::warn!("The zhao pipeline counts tweets; --scheme is ignored");
        }
        builder = builder.with_scheme(Arc::new(TfIdf::new(idf)));
    }

    let report = match params.pipeline {
        PipelineKind::Eld => {
            let pipeline = EldPipeline::new(
                config.eld.clone(),
                &config.clustering,
                config.burst.clone(),
                builder,
            )?;
            let periodicity = params.periodicity.unwrap_or(config.eld.time_window as f64);
            let (report, pipeline) = run(&config, &params, pipeline, periodicity).await?;
            if let Some(path) = &params.checkpoints {
                pipeline.store().save_json(path)?;
            }
            report
        }
        PipelineKind::Fire => {
            let pipeline = FirePipeline::new(
                config.fire.clone(),
                &config.clustering,
                config.burst.clone(),
                builder,
            )?;
            let periodicity = params.periodicity.unwrap_or(config.fire.time_window as f64);
            let (report, pipeline) = run(&config, &params, pipeline, periodicity).await?;
            if let Some(path) = &params.checkpoints {
                pipeline.store().save_json(path)?;
            }
            report
        }
        PipelineKind::Zhao => {
            let pipeline = ZhaoPipeline::new(config.zhao.clone())?;
            let periodicity = params.periodicity.unwrap_or(config.zhao.time_window as f64);
            let (report, pipeline) = run(&config, &params, pipeline, periodicity).await?;
            if let Some(path) = &params.checkpoints {
                pipeline.store().save_json(path)?;
            }
            report
        }
    };

    print_report(&report);

    if let Some(path) = &params.output {
        write_report(&report, path)?;
        println!("\nReport written to {}", path.display());
    }
    Ok(())
}

/// Feed the corpus through `processor` and return it with the report
async fn run<P: WindowProcessor>(
    config: &Config,
    params: &ConsumeParams,
    processor: P,
    periodicity: f64,
) -> Result<(ConsumerReport, P)> {
    let queue = Arc::new(Queue::new());
    let reader = JsonlReader::new(
        Arc::clone(&queue),
        ReaderOptions {
            skip_lines: params.skip_lines,
            max_lines: params.max_lines,
            speed: params.speed,
            ..ReaderOptions::default()
        },
    )?;

    let clock = if params.real_time || !config.consumer.stream_relative {
        WindowClock::RealTime { periodicity }
    } else {
        WindowClock::StreamRelative { periodicity }
    };
    let mut consumer = WindowedConsumer::new(Arc::clone(&queue), processor, clock)
        .context("Invalid --periodicity")?;
    let handle = consumer.handle();
    let reader_stop = reader.stop_flag();

    // Stop the consumer once the whole corpus has been moved out of the queue
    let feeder = {
        let queue = Arc::clone(&queue);
        let handle = handle.clone();
        let input = params.input.clone();
        tokio::spawn(async move {
            let stats = reader.read(&input).await;
            while !queue.is_empty().await && !handle.is_stop_requested() {
                tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
            }
            handle.stop();
            stats
        })
    };

    let signal = {
        let handle = handle.clone();
        let reader_stop = Arc::clone(&reader_stop);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    println!("\nShutdown signal received, stopping...");
                    reader_stop.store(true, Ordering::SeqCst);
                    handle.stop();
                }
                Err(e) => {
                    tracing::error!("Failed to wait for Ctrl+C: {}", e);
                }
            }
        })
    };

    let result = consumer
        .run(config.consumer.wait, config.consumer.max_inactivity)
        .await;
    signal.abort();

    // The consumer may end on inactivity before the corpus is exhausted
    reader_stop.store(true, Ordering::SeqCst);
    let stats = feeder
        .await
        .context("Corpus reader task failed")?
        .context("Failed to read corpus")?;
    println!(
        "Read {} items ({} malformed, {} skipped)",
        stats.read, stats.malformed, stats.skipped
    );

    let report = result.context("Consumer failed")?;
    Ok((report, consumer.into_processor()))
}

fn print_report(report: &ConsumerReport) {
    println!(
        "\nProcessed {} windows, {} items consumed, {} documents, {} filtered out",
        report.windows, report.consumed, report.documents, report.filtered
    );

    let mut breaking = 0;
    for effects in report.timeline() {
        breaking += 1;
        let time = chrono::DateTime::from_timestamp(effects.timestamp, 0)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| effects.timestamp.to_string());

        if let Some((start, end)) = effects.burst {
            println!("\n[{time}] Volume burst over [{start}, {end}]");
        }
        for topic in &effects.topics {
            let terms: Vec<&str> = topic.terms.iter().map(|t| t.term.as_str()).collect();
            if !terms.is_empty() {
                println!("\n[{time}] {}", terms.join(", "));
            }
            for text in topic.representatives.iter().take(3) {
                println!("    - {}", text.replace('\n', " "));
            }
        }
    }

    if breaking == 0 {
        println!("No breaking topics detected.");
    }
}

fn write_report(report: &ConsumerReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
    Ok(())
}
