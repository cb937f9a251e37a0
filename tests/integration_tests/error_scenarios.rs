//! Error handling and recovery scenarios
//!
//! Tests for:
//! - Malformed items reaching the consumer
//! - Invalid pipeline configuration
//! - Corpus files with broken lines
//! - Consumer lifecycle misuse

use std::io::Write;
use std::sync::Arc;

use eventline::config::{BurstConfig, ClusteringConfig, EldConfig, ZhaoConfig};
use eventline::consumer::{ConsumerError, ConsumerState, WindowClock, WindowedConsumer};
use eventline::error::{Error, ErrorCategory, EventlineErrorTrait};
use eventline::nlp::{DocumentBuilder, Tokenizer, TokenizerConfig};
use eventline::pipelines::{EldPipeline, ZhaoPipeline};
use eventline::queue::Queue;
use eventline::reader::{JsonlReader, ReaderOptions};
use eventline::twitter::TwitterError;
use serde_json::json;
use tempfile::NamedTempFile;

use crate::common::{volume_timeline, T0};

fn zhao_consumer(queue: Arc<Queue<serde_json::Value>>) -> WindowedConsumer<ZhaoPipeline> {
    let pipeline = ZhaoPipeline::new(ZhaoConfig::default()).unwrap();
    WindowedConsumer::new(queue, pipeline, WindowClock::StreamRelative { periodicity: 60.0 })
        .unwrap()
}

// ============================================================================
// Malformed Items
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_item_without_timestamp_fails_the_run() {
    let queue = Arc::new(Queue::new());
    queue.enqueue(volume_timeline(T0, T0 + 10, 1)).await;
    queue.enqueue([json!({"text": "no time"})]).await;

    let mut consumer = zhao_consumer(Arc::clone(&queue));
    let handle = consumer.handle();
    let result = consumer.run(0.0, 1.0).await;

    assert!(matches!(
        result,
        Err(ConsumerError::Timestamp(TwitterError::MissingTimestamp))
    ));
    assert_eq!(consumer.state(), ConsumerState::Stopped);
    assert!(handle.is_stop_requested());

    let err: Error = result.unwrap_err().into();
    assert_eq!(err.category(), ErrorCategory::Parsing);
    assert!(!err.is_recoverable());
}

#[tokio::test(start_paused = true)]
async fn test_unparseable_timestamp_is_reported() {
    let queue = Arc::new(Queue::new());
    queue.enqueue([json!({"timestamp_ms": "soon", "text": "hello"})]).await;

    let mut consumer = zhao_consumer(queue);
    let result = consumer.run(0.0, 1.0).await;

    match result {
        Err(ConsumerError::Timestamp(TwitterError::InvalidTimestamp(raw))) => {
            assert_eq!(raw, "soon");
        }
        other => panic!("expected an invalid timestamp, got {other:?}"),
    }
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_invalid_pipeline_configuration() {
    let builder = || DocumentBuilder::new(Tokenizer::english(TokenizerConfig::default()));

    let config = EldConfig {
        threshold: 1.5,
        ..EldConfig::default()
    };
    let result = EldPipeline::new(config, &ClusteringConfig::default(), BurstConfig::default(), builder());
    let err = result.unwrap_err();
    assert!(matches!(err, Error::Clustering(_)));
    assert_eq!(err.category(), ErrorCategory::Config);

    let config = EldConfig {
        decay_rate: 0.0,
        ..EldConfig::default()
    };
    let result = EldPipeline::new(config, &ClusteringConfig::default(), BurstConfig::default(), builder());
    assert!(matches!(result, Err(Error::Tdt(_))));

    let config = ZhaoConfig {
        windows: vec![],
        ..ZhaoConfig::default()
    };
    assert!(ZhaoPipeline::new(config).is_err());
}

// ============================================================================
// Corpus Files
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_corpus_with_broken_lines() {
    // Arrange: a corpus with a truncated line in the middle
    let mut file = NamedTempFile::new().unwrap();
    for (i, tweet) in volume_timeline(T0, T0 + 120, 1).iter().enumerate() {
        if i == 50 {
            writeln!(file, "{{\"timestamp_ms\": \"16000").unwrap();
        }
        writeln!(file, "{tweet}").unwrap();
    }

    let queue = Arc::new(Queue::new());
    let reader = JsonlReader::new(Arc::clone(&queue), ReaderOptions::default()).unwrap();

    // Act
    let stats = reader.read(file.path()).await.unwrap();
    let mut consumer = zhao_consumer(Arc::clone(&queue));
    let report = consumer.run(0.0, 1.0).await.unwrap();

    // Assert
    assert_eq!(stats.read, 120);
    assert_eq!(stats.malformed, 1);
    assert_eq!(report.consumed, 120);
    assert_eq!(report.checkpoints, vec![T0 + 59, T0 + 119]);
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_consumer_runs_once() {
    let queue = Arc::new(Queue::new());
    queue.enqueue(volume_timeline(T0, T0 + 10, 1)).await;

    let mut consumer = zhao_consumer(queue);
    consumer.run(0.0, 1.0).await.unwrap();

    let second = consumer.run(0.0, 1.0).await;
    assert!(matches!(
        second,
        Err(ConsumerError::InvalidState {
            expected: ConsumerState::Idle,
            actual: ConsumerState::Stopped,
        })
    ));
}

#[test]
fn test_invalid_periodicity_is_rejected() {
    let pipeline = ZhaoPipeline::new(ZhaoConfig::default()).unwrap();
    let result = WindowedConsumer::new(
        Arc::new(Queue::new()),
        pipeline,
        WindowClock::RealTime {
            periodicity: f64::NAN,
        },
    );
    assert!(matches!(result, Err(ConsumerError::InvalidPeriodicity(_))));

    tokio_test::block_on(async {
        let queue: Queue<u8> = Queue::new();
        assert!(!queue.wait_for_input(0.0).await);
    });
}
