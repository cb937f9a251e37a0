//! Breaking topic detection over synthetic timelines
//!
//! Each test feeds a quiet background followed by a burst and checks that the
//! burst, and only the burst, is reported in the window where it happens.

use std::collections::HashSet;
use std::sync::Arc;

use eventline::clustering::{ClusteringAlgorithm, NoKMeans};
use eventline::config::{BurstConfig, ClusteringConfig, EldConfig, FireConfig, ZhaoConfig};
use eventline::consumer::{WindowClock, WindowedConsumer};
use eventline::nlp::{DocumentBuilder, Tokenizer, TokenizerConfig};
use eventline::nutrition::{MemoryNutritionStore, NutritionStore, TermNutrition};
use eventline::pipelines::{EldPipeline, FirePipeline, ZhaoPipeline};
use eventline::queue::Queue;
use eventline::tdt::{Cataldi, Eld};

use crate::common::{
    background_text, background_timeline, burst_text, create_tweet, unique_word, volume_timeline,
    BURST_WORDS, T0,
};

fn builder() -> DocumentBuilder {
    DocumentBuilder::new(Tokenizer::english(TokenizerConfig::default()))
}

fn terms_of(topic: &eventline::consumer::Topic) -> HashSet<&str> {
    topic.terms.iter().map(|t| t.term.as_str()).collect()
}

// ============================================================================
// ELD
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_eld_pipeline_reports_breaking_cluster() {
    // Arrange: two quiet minutes, then 20 tweets about a penalty
    let mut tweets = background_timeline(T0 * 1000, 120_000, 40);
    tweets.extend((0..20).map(|k| {
        let timestamp = T0 * 1000 + 120_000 + 1500 * k as i64;
        create_tweet(1000 + k, timestamp, &burst_text(k))
    }));

    let queue = Arc::new(Queue::new());
    queue.enqueue(tweets).await;

    let config = EldConfig::default();
    let periodicity = config.time_window as f64;
    let pipeline = EldPipeline::new(
        config,
        &ClusteringConfig::default(),
        BurstConfig::default(),
        builder(),
    )
    .unwrap();
    let mut consumer = WindowedConsumer::new(
        Arc::clone(&queue),
        pipeline,
        WindowClock::StreamRelative { periodicity },
    )
    .unwrap();

    // Act
    let report = consumer.run(0.0, 1.0).await.unwrap();

    // Assert
    assert_eq!(
        report.checkpoints,
        vec![T0 + 27, T0 + 57, T0 + 87, T0 + 117, T0 + 148]
    );

    let last = report.effects.last().unwrap();
    assert_eq!(last.timestamp, T0 + 148);
    let topic = last
        .topics
        .iter()
        .find(|t| terms_of(t).contains("messi"))
        .expect("the penalty cluster should be breaking");

    assert_eq!(terms_of(topic), BURST_WORDS.into_iter().collect());
    assert!(topic.terms.iter().all(|t| t.burst > 0.9));
    assert_eq!(topic.representatives.len(), 3);
    assert!(topic.representatives.iter().all(|text| text.starts_with("messi")));

    for effects in report.effects.iter().filter(|e| e.timestamp != T0 + 148) {
        assert!(effects.topics.iter().all(|t| !terms_of(t).contains("messi")));
    }

    let id = topic.cluster.unwrap();
    let cluster = consumer.processor().clustering().get(id).unwrap();
    assert_eq!(cluster.size(), 20);
    assert!(cluster.state.bursty);
}

#[test]
fn test_eld_on_no_k_means_clusters() {
    let builder = builder();

    // History: three quiet windows
    let mut store: MemoryNutritionStore<TermNutrition> = MemoryNutritionStore::new();
    for (window, timestamp) in [60, 120, 180].into_iter().enumerate() {
        let documents: Vec<_> = (0..10)
            .map(|i| builder.build(&background_text(window * 10 + i)).vector)
            .collect();
        store.add(timestamp, DocumentBuilder::checkpoint(&documents).into_dimensions());
    }

    // Current window: background plus a burst
    let mut vectors: Vec<_> = (0..10).map(|i| builder.build(&background_text(i)).vector).collect();
    vectors.extend((0..10).map(|k| builder.build(&burst_text(k)).vector));

    let mut clustering = NoKMeans::new(0.5, 100, false).unwrap();
    clustering.cluster(vectors).unwrap();

    let burst_cluster = clustering
        .clusters()
        .iter()
        .find(|c| c.centroid().dimension("messi") > 0.0)
        .unwrap();
    assert_eq!(burst_cluster.size(), 10);

    let nutrition = DocumentBuilder::checkpoint(burst_cluster.vectors()).into_dimensions();
    let eld = Eld::default();
    let bursts = eld.detect(&store, &nutrition, None, Some(240), 0.5);

    let breaking: HashSet<&str> = bursts.keys().map(String::as_str).collect();
    assert_eq!(breaking, BURST_WORDS.into_iter().collect());
    assert!(bursts.values().all(|b| (b - 1.0).abs() < 1e-9));
}

// ============================================================================
// FIRE
// ============================================================================

/// Four shared words and one of its own, cohesive enough for FIRE's threshold
fn fire_burst_text(k: usize) -> String {
    format!("messi penalty scores final {}", unique_word(k))
}

#[tokio::test(start_paused = true)]
async fn test_fire_pipeline_reports_bursty_terms() {
    // Arrange: four quiet minutes, then a burst in the fifth
    let mut tweets = background_timeline(T0 * 1000, 240_000, 40);
    tweets.extend((0..12).map(|k| {
        let timestamp = T0 * 1000 + 240_000 + 5000 * k as i64;
        create_tweet(1000 + k, timestamp, &fire_burst_text(k))
    }));

    let queue = Arc::new(Queue::new());
    queue.enqueue(tweets).await;

    let config = FireConfig::default();
    let periodicity = config.time_window as f64;
    let pipeline = FirePipeline::new(
        config,
        &ClusteringConfig::default(),
        BurstConfig::default(),
        builder(),
    )
    .unwrap();
    let mut consumer = WindowedConsumer::new(
        Arc::clone(&queue),
        pipeline,
        WindowClock::StreamRelative { periodicity },
    )
    .unwrap();

    // Act
    let report = consumer.run(0.0, 1.0).await.unwrap();

    // Assert
    assert_eq!(report.windows, 5);
    let last = report.effects.last().unwrap();
    assert_eq!(last.timestamp, T0 + 295);
    assert_eq!(last.topics.len(), 1);

    let topic = &last.topics[0];
    let expected: HashSet<&str> = ["messi", "penalty", "scores", "final"].into_iter().collect();
    assert_eq!(terms_of(topic), expected);
    assert_eq!(topic.representatives.len(), 3);
    assert_eq!(last.breaking_terms.len(), 4);
}

#[test]
fn test_cataldi_over_window_checkpoints() {
    let builder = builder();
    let mut store: MemoryNutritionStore<TermNutrition> = MemoryNutritionStore::new();

    for (window, timestamp) in [60, 120, 180].into_iter().enumerate() {
        let documents: Vec<_> = (0..10)
            .map(|i| builder.build(&background_text(window * 10 + i)).vector)
            .collect();
        store.add(timestamp, DocumentBuilder::checkpoint(&documents).into_dimensions());
    }

    let documents: Vec<_> = (0..10)
        .map(|k| builder.build(&fire_burst_text(k)).vector)
        .collect();
    store.add(240, DocumentBuilder::checkpoint(&documents).into_dimensions());

    let terms = Cataldi::new().detect(&store, 240, None).unwrap();
    let terms: HashSet<&str> = terms.iter().map(String::as_str).collect();
    let expected: HashSet<&str> = ["messi", "penalty", "scores", "final"].into_iter().collect();
    assert_eq!(terms, expected);
}

// ============================================================================
// Zhao
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_zhao_pipeline_detects_volume_burst() {
    // Arrange: one tweet a second for 90 seconds, then three a second
    let mut tweets = volume_timeline(T0, T0 + 90, 1);
    tweets.extend(volume_timeline(T0 + 90, T0 + 120, 3));

    let queue = Arc::new(Queue::new());
    queue.enqueue(tweets).await;

    let pipeline = ZhaoPipeline::new(ZhaoConfig::default()).unwrap();
    let mut consumer = WindowedConsumer::new(
        Arc::clone(&queue),
        pipeline,
        WindowClock::StreamRelative { periodicity: 60.0 },
    )
    .unwrap();

    // Act
    let report = consumer.run(0.0, 1.0).await.unwrap();

    // Assert
    assert_eq!(report.checkpoints, vec![T0 + 59, T0 + 119]);
    assert_eq!(report.effects.len(), 1);

    let last = &report.effects[0];
    assert_eq!(last.burst, Some((T0 + 89, T0 + 118)));
    assert_eq!(last.topics.len(), 1);
    assert!(last.topics[0].cluster.is_none());
    assert_eq!(last.topics[0].representatives.len(), 88);

    let store = consumer.processor().store();
    assert_eq!(store.get(T0 + 100), Some(&3.0));
    assert_eq!(store.get(T0 + 58), None);
}
