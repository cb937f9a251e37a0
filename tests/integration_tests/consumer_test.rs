//! Queue → consumer → pipeline tests
//!
//! Tests the complete workflow:
//! 1. Items enqueued on the inbound queue
//! 2. Ingestion into the consumer's buffer
//! 3. Windowing on the items' own timestamps
//! 4. One checkpoint per window in the pipeline's nutrition store

use std::sync::Arc;
use std::time::Duration;

use eventline::config::{BurstConfig, ClusteringConfig, EldConfig, FireConfig, ZhaoConfig};
use eventline::consumer::{ConsumerState, WindowClock, WindowedConsumer};
use eventline::nlp::{DocumentBuilder, Tokenizer, TokenizerConfig};
use eventline::nutrition::NutritionStore;
use eventline::pipelines::{EldPipeline, FirePipeline, ZhaoPipeline};
use eventline::queue::Queue;

use crate::common::{background_timeline, volume_timeline, T0};

fn builder() -> DocumentBuilder {
    DocumentBuilder::new(Tokenizer::english(TokenizerConfig::default()))
}

fn eld_pipeline() -> EldPipeline {
    EldPipeline::new(
        EldConfig::default(),
        &ClusteringConfig::default(),
        BurstConfig::default(),
        builder(),
    )
    .unwrap()
}

fn fire_pipeline() -> FirePipeline {
    FirePipeline::new(
        FireConfig::default(),
        &ClusteringConfig::default(),
        BurstConfig::default(),
        builder(),
    )
    .unwrap()
}

fn stream(periodicity: f64) -> WindowClock {
    WindowClock::StreamRelative { periodicity }
}

const WINDOW_ENDS: [i64; 5] = [T0 + 59, T0 + 119, T0 + 179, T0 + 239, T0 + 299];

// ============================================================================
// Checkpoints
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_eld_writes_one_checkpoint_per_window() {
    // Arrange: 500 tweets over 300 seconds
    let queue = Arc::new(Queue::new());
    queue.enqueue(background_timeline(T0 * 1000, 300_000, 500)).await;

    let mut consumer =
        WindowedConsumer::new(Arc::clone(&queue), eld_pipeline(), stream(60.0)).unwrap();

    // Act
    let report = consumer.run(0.0, 1.0).await.unwrap();

    // Assert
    assert_eq!(report.windows, 5);
    assert_eq!(report.consumed, 500);
    assert_eq!(report.filtered, 0);
    assert_eq!(report.checkpoints, WINDOW_ENDS.to_vec());
    assert_eq!(consumer.state(), ConsumerState::Stopped);

    let store = consumer.processor().store();
    assert_eq!(store.len(), 5);
    for (timestamp, nutrition) in store.all() {
        assert!(
            nutrition.values().all(|v| (0.0..=1.0).contains(v)),
            "checkpoint {timestamp} is not rescaled"
        );
        let max = nutrition.values().copied().fold(0.0, f64::max);
        assert!((max - 1.0).abs() < 1e-12);
    }
}

#[tokio::test(start_paused = true)]
async fn test_fire_writes_one_checkpoint_per_window() {
    let queue = Arc::new(Queue::new());
    queue.enqueue(background_timeline(T0 * 1000, 300_000, 500)).await;

    let mut consumer =
        WindowedConsumer::new(Arc::clone(&queue), fire_pipeline(), stream(60.0)).unwrap();
    let report = consumer.run(0.0, 1.0).await.unwrap();

    assert_eq!(report.checkpoints, WINDOW_ENDS.to_vec());
    assert_eq!(report.filtered, 0);

    let store = consumer.processor().store();
    let timestamps: Vec<i64> = store.all().into_keys().collect();
    assert_eq!(timestamps, WINDOW_ENDS.to_vec());
}

#[tokio::test(start_paused = true)]
async fn test_filtered_tweets_still_get_a_checkpoint() {
    let mut tweets = background_timeline(T0 * 1000, 120_000, 40);
    for tweet in &mut tweets {
        tweet["lang"] = serde_json::json!("it");
    }

    let queue = Arc::new(Queue::new());
    queue.enqueue(tweets).await;

    let mut consumer =
        WindowedConsumer::new(Arc::clone(&queue), eld_pipeline(), stream(60.0)).unwrap();
    let report = consumer.run(0.0, 1.0).await.unwrap();

    assert_eq!(report.windows, 2);
    assert_eq!(report.filtered, 40);
    assert_eq!(report.documents, 0);
    assert!(report.effects.is_empty());

    let store = consumer.processor().store();
    assert_eq!(store.len(), 2);
    assert!(store.all().values().all(|nutrition| nutrition.is_empty()));
}

// ============================================================================
// Shutdown
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_items_enqueued_after_stop_are_never_processed() {
    // Arrange
    let queue = Arc::new(Queue::new());
    queue.enqueue(volume_timeline(T0, T0 + 100, 1)).await;

    let pipeline = ZhaoPipeline::new(ZhaoConfig::default()).unwrap();
    let mut consumer = WindowedConsumer::new(Arc::clone(&queue), pipeline, stream(60.0)).unwrap();
    let handle = consumer.handle();

    // Act: stop once everything is buffered, then keep publishing
    let control = async {
        while handle.stats().consumed < 100 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.stop();
        queue.enqueue(volume_timeline(T0 + 100, T0 + 200, 1)).await;
    };
    let (result, ()) = tokio::join!(consumer.run(0.0, -1.0), control);
    let report = result.unwrap();

    // Assert: buffered items drained, late items left in the queue
    assert_eq!(report.consumed, 100);
    assert_eq!(queue.len().await, 100);

    assert_eq!(report.documents, 100);
    assert!(report.checkpoints.iter().all(|t| *t < T0 + 100));
    assert!(handle.is_stop_requested());
    assert_eq!(handle.state(), ConsumerState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_inactivity_ends_an_empty_run() {
    let queue = Arc::new(Queue::new());
    let mut consumer = WindowedConsumer::new(queue, eld_pipeline(), stream(60.0)).unwrap();

    let report = consumer.run(0.0, 2.0).await.unwrap();
    assert_eq!(report.windows, 0);
    assert!(report.checkpoints.is_empty());
    assert!(consumer.processor().store().is_empty());
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_pipelines_share_window_boundaries() {
    let timeline = background_timeline(T0 * 1000, 300_000, 500);

    let eld_queue = Arc::new(Queue::new());
    eld_queue.enqueue(timeline.clone()).await;
    let zhao_queue = Arc::new(Queue::new());
    zhao_queue.enqueue(timeline).await;

    let mut eld = WindowedConsumer::new(eld_queue, eld_pipeline(), stream(60.0)).unwrap();
    let zhao_pipeline = ZhaoPipeline::new(ZhaoConfig::default()).unwrap();
    let mut zhao = WindowedConsumer::new(zhao_queue, zhao_pipeline, stream(60.0)).unwrap();

    let (eld_report, zhao_report) = futures::join!(eld.run(0.0, 1.0), zhao.run(0.0, 1.0));
    let (eld_report, zhao_report) = (eld_report.unwrap(), zhao_report.unwrap());

    assert_eq!(eld_report.checkpoints, zhao_report.checkpoints);
    assert_eq!(eld_report.checkpoints.len(), 5);
    assert_eq!(eld_report.documents, zhao_report.documents);
    assert_eq!(eld_report.documents, 500);
}
