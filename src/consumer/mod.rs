//! Buffered, windowed stream consumer
//!
//! A [`WindowedConsumer`] runs two cooperating tasks on the same scheduler:
//!
//! ```text
//! ┌──────────┐  dequeue_all  ┌──────────┐  dequeue_all  ┌────────────┐
//! │  inbound │──────────────▶│  buffer  │──────────────▶│ processing │──▶ WindowEffects
//! │  queue   │   ingestion   │          │   (windows)   │  strategy  │
//! └──────────┘               └──────────┘               └────────────┘
//! ```
//!
//! Ingestion moves everything queued into the buffer in one step and then
//! yields. Processing wakes on a [`WindowClock`], takes everything in the
//! buffer in one step and hands each completed window to a
//! [`WindowProcessor`]. The buffer is the only state both tasks touch.
//!
//! The run ends when a stop is requested through a [`StopHandle`] or when no
//! input arrives for `max_inactivity` seconds. Items already buffered at that
//! point are still processed by a final drain; items left in the inbound
//! queue are not.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::watch;

use crate::clustering::ClusteringError;
use crate::metrics;
use crate::queue::Queue;
use crate::tdt::{BreakingTerm, TdtError};
use crate::twitter::{self, TwitterError};
use crate::vsm::ClusterId;

/// How often the stream-relative clock looks at the buffer
const STREAM_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Shortest window a clock accepts
pub const MIN_PERIODICITY: Duration = Duration::from_millis(1);

/// Longest window a clock accepts: one year
pub const MAX_PERIODICITY: Duration = Duration::from_secs(365 * 24 * 3600);

/// Reads an item's timestamp in seconds
pub type TimestampExtractor = fn(&Value) -> Result<f64, TwitterError>;

// ============================================================================
// Errors
// ============================================================================

/// Errors raised by a [`WindowProcessor`] while handling one window
#[derive(Debug, Error)]
pub enum WindowError {
    #[error("Clustering failed: {0}")]
    Clustering(#[from] ClusteringError),

    #[error("Burst detection failed: {0}")]
    Detection(#[from] TdtError),

    #[error("Malformed item: {0}")]
    Item(#[from] TwitterError),
}

/// Errors raised by the consumer
#[derive(Debug, Error)]
pub enum ConsumerError {
    #[error("Consumer is {actual:?}, expected {expected:?}")]
    InvalidState {
        expected: ConsumerState,
        actual: ConsumerState,
    },

    #[error("Periodicity must be between 0.001 seconds and one year, got {0}")]
    InvalidPeriodicity(f64),

    #[error("Wait must be a finite number of seconds, got {0}")]
    InvalidWait(f64),

    #[error("Max inactivity must be a number of seconds, got {0}")]
    InvalidInactivity(f64),

    #[error("Cannot read item timestamp: {0}")]
    Timestamp(#[from] TwitterError),

    #[error("{processor} failed on window {timestamp} with {items} items: {source}")]
    Window {
        processor: &'static str,
        timestamp: i64,
        items: usize,
        #[source]
        source: WindowError,
    },
}

// ============================================================================
// Windows and their effects
// ============================================================================

/// An item together with its extracted timestamp
#[derive(Debug, Clone)]
pub struct TimedItem {
    pub timestamp: f64,
    pub item: Value,
}

/// A completed time window
#[derive(Debug, Clone)]
pub struct Window {
    /// Checkpoint key: the latest item's timestamp, floored
    pub timestamp: i64,
    pub start: f64,
    pub end: f64,
    /// Items sorted by timestamp, ties in arrival order
    pub items: Vec<TimedItem>,
}

impl Window {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A breaking topic found in a window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    /// The cluster the topic was found in, if the pipeline clusters
    pub cluster: Option<ClusterId>,
    pub terms: Vec<BreakingTerm>,
    /// Texts that best describe the topic
    pub representatives: Vec<String>,
}

/// What processing a window produced
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowEffects {
    pub timestamp: i64,
    /// Items that passed the pipeline's filter
    pub documents: usize,
    /// Items the pipeline's filter rejected
    pub filtered: usize,
    /// Key of the checkpoint written for this window
    pub checkpoint: Option<i64>,
    pub breaking_terms: Vec<BreakingTerm>,
    pub topics: Vec<Topic>,
    /// Half-window interval of a volume burst
    pub burst: Option<(i64, i64)>,
}

impl WindowEffects {
    pub fn new(timestamp: i64) -> Self {
        Self {
            timestamp,
            ..Self::default()
        }
    }

    /// Whether anything was found breaking in the window
    pub fn is_breaking(&self) -> bool {
        !self.breaking_terms.is_empty() || !self.topics.is_empty() || self.burst.is_some()
    }
}

/// Everything a run produced
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsumerReport {
    pub windows: usize,
    pub consumed: u64,
    /// Items that passed the pipeline's filter
    pub documents: u64,
    pub filtered: u64,
    pub checkpoints: Vec<i64>,
    /// Effects of the windows in which something was breaking
    pub effects: Vec<WindowEffects>,
}

impl ConsumerReport {
    fn record(&mut self, effects: WindowEffects) {
        self.windows += 1;
        self.documents += effects.documents as u64;
        self.filtered += effects.filtered as u64;
        if let Some(checkpoint) = effects.checkpoint {
            self.checkpoints.push(checkpoint);
        }
        if effects.is_breaking() {
            self.effects.push(effects);
        }
    }

    /// Windows in which something was breaking
    pub fn timeline(&self) -> impl Iterator<Item = &WindowEffects> {
        self.effects.iter()
    }
}

/// Per-window processing strategy
#[async_trait]
pub trait WindowProcessor: Send {
    /// Name used in logs and metrics
    fn name(&self) -> &'static str;

    /// Process one completed window
    async fn process_window(&mut self, window: Window) -> Result<WindowEffects, WindowError>;
}

// ============================================================================
// Clock, state and statistics
// ============================================================================

/// When a window is complete
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowClock {
    /// Every `periodicity` seconds of wall-clock time
    RealTime { periodicity: f64 },

    /// When the buffered items' own timestamps pass the window's end
    StreamRelative { periodicity: f64 },
}

impl WindowClock {
    pub fn periodicity(&self) -> f64 {
        match *self {
            Self::RealTime { periodicity } | Self::StreamRelative { periodicity } => periodicity,
        }
    }
}

/// Lifecycle of a consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ConsumerState {
    Idle = 0,
    Running = 1,
    Stopped = 2,
}

impl ConsumerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Running,
            _ => Self::Stopped,
        }
    }
}

/// Live counters of a consumer
#[derive(Debug, Default)]
pub struct ConsumerStats {
    consumed: AtomicU64,
    processed: AtomicU64,
    windows: AtomicU64,
    failures: AtomicU64,
}

impl ConsumerStats {
    fn record_consumed(&self, items: usize) {
        self.consumed.fetch_add(items as u64, Ordering::Relaxed);
    }

    fn record_window(&self, items: usize) {
        self.windows.fetch_add(1, Ordering::Relaxed);
        self.processed.fetch_add(items as u64, Ordering::Relaxed);
    }

    fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of current stats
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            consumed: self.consumed.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            windows: self.windows.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of [`ConsumerStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Items moved from the inbound queue to the buffer
    pub consumed: u64,
    /// Items handed to the processor
    pub processed: u64,
    pub windows: u64,
    pub failures: u64,
}

#[derive(Debug)]
struct Shared {
    state: AtomicU8,
    stop: watch::Sender<bool>,
    stats: ConsumerStats,
}

impl Shared {
    fn state(&self) -> ConsumerState {
        ConsumerState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn set_state(&self, state: ConsumerState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }
}

/// Requests a running consumer to stop and observes it from other tasks
#[derive(Debug, Clone)]
pub struct StopHandle {
    shared: Arc<Shared>,
}

impl StopHandle {
    /// Stop ingesting; buffered items are still processed
    pub fn stop(&self) {
        self.shared.stop.send_replace(true);
    }

    pub fn is_stop_requested(&self) -> bool {
        *self.shared.stop.borrow()
    }

    pub fn state(&self) -> ConsumerState {
        self.shared.state()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }
}

// ============================================================================
// Consumer
// ============================================================================

/// Two-task consumer feeding windows of items to a [`WindowProcessor`]
pub struct WindowedConsumer<P> {
    queue: Arc<Queue<Value>>,
    buffer: Queue<Value>,
    processor: P,
    clock: WindowClock,
    period: Duration,
    extract_timestamp: TimestampExtractor,
    shared: Arc<Shared>,
}

impl<P: WindowProcessor> WindowedConsumer<P> {
    /// Create an idle consumer reading from `queue`
    pub fn new(
        queue: Arc<Queue<Value>>,
        processor: P,
        clock: WindowClock,
    ) -> Result<Self, ConsumerError> {
        let periodicity = clock.periodicity();
        let period = Duration::try_from_secs_f64(periodicity)
            .ok()
            .filter(|p| (MIN_PERIODICITY..=MAX_PERIODICITY).contains(p))
            .ok_or(ConsumerError::InvalidPeriodicity(periodicity))?;

        let (stop, _) = watch::channel(false);
        Ok(Self {
            queue,
            buffer: Queue::new(),
            processor,
            clock,
            period,
            extract_timestamp: twitter::extract_timestamp,
            shared: Arc::new(Shared {
                state: AtomicU8::new(ConsumerState::Idle as u8),
                stop,
                stats: ConsumerStats::default(),
            }),
        })
    }

    /// Read item timestamps with `extract` instead of the tweet default
    #[must_use]
    pub fn with_timestamp_extractor(mut self, extract: TimestampExtractor) -> Self {
        self.extract_timestamp = extract;
        self
    }

    pub fn handle(&self) -> StopHandle {
        StopHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn state(&self) -> ConsumerState {
        self.shared.state()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    pub fn clock(&self) -> WindowClock {
        self.clock
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }

    pub fn processor_mut(&mut self) -> &mut P {
        &mut self.processor
    }

    pub fn into_processor(self) -> P {
        self.processor
    }

    /// Run until stopped or inactive
    ///
    /// Waits `wait` seconds before starting. Ingestion ends after
    /// `max_inactivity` seconds without input; a negative or infinite value
    /// waits for input forever. A consumer runs at most once.
    pub async fn run(
        &mut self,
        wait: f64,
        max_inactivity: f64,
    ) -> Result<ConsumerReport, ConsumerError> {
        if max_inactivity.is_nan() {
            return Err(ConsumerError::InvalidInactivity(max_inactivity));
        }
        let wait = match wait {
            w if w > 0.0 => {
                Some(Duration::try_from_secs_f64(w).map_err(|_| ConsumerError::InvalidWait(w))?)
            }
            w if w.is_nan() => return Err(ConsumerError::InvalidWait(w)),
            _ => None,
        };

        let state = self.state();
        if state != ConsumerState::Idle {
            return Err(ConsumerError::InvalidState {
                expected: ConsumerState::Idle,
                actual: state,
            });
        }

        if let Some(wait) = wait {
            tokio::time::sleep(wait).await;
        }
        self.shared.set_state(ConsumerState::Running);
        tracing::info!(
            processor = self.processor.name(),
            clock = ?self.clock,
            max_inactivity,
            "Consumer started"
        );

        let (ingested_tx, ingested_rx) = watch::channel(false);
        let Self {
            queue,
            buffer,
            processor,
            clock,
            period,
            extract_timestamp,
            shared,
        } = self;
        let (queue, buffer, shared) = (&**queue, &*buffer, &**shared);

        let ingestion = ingest(queue, buffer, shared, max_inactivity, ingested_tx);
        let processing = async {
            let result = match *clock {
                WindowClock::RealTime { periodicity } => {
                    process_real_time(
                        processor,
                        buffer,
                        shared,
                        periodicity,
                        *period,
                        *extract_timestamp,
                        ingested_rx,
                    )
                    .await
                }
                WindowClock::StreamRelative { periodicity } => {
                    process_stream(processor, buffer, shared, periodicity, *extract_timestamp, ingested_rx)
                        .await
                }
            };
            if result.is_err() {
                shared.stop.send_replace(true);
            }
            result
        };

        let ((), result) = tokio::join!(ingestion, processing);
        shared.set_state(ConsumerState::Stopped);

        let mut report = result?;
        report.consumed = shared.stats.snapshot().consumed;
        tracing::info!(
            windows = report.windows,
            consumed = report.consumed,
            filtered = report.filtered,
            "Consumer stopped"
        );
        Ok(report)
    }
}

/// Move queued items into the buffer until stopped or inactive
async fn ingest(
    queue: &Queue<Value>,
    buffer: &Queue<Value>,
    shared: &Shared,
    max_inactivity: f64,
    ingested: watch::Sender<bool>,
) {
    let mut stop = shared.stop.subscribe();

    loop {
        if *stop.borrow_and_update() {
            tracing::info!("Stop requested, ingestion ending");
            break;
        }

        let ready = tokio::select! {
            ready = queue.wait_for_input(max_inactivity) => ready,
            _ = stop.changed() => continue,
        };
        if !ready {
            tracing::info!(max_inactivity, "No input, ingestion ending");
            break;
        }
        if *stop.borrow() {
            continue;
        }

        let items = queue.dequeue_all().await;
        let count = items.len();
        shared.stats.record_consumed(count);
        metrics::record_items_consumed(count);
        buffer.enqueue(items).await;
        tracing::debug!(items = count, "Buffered items");

        tokio::task::yield_now().await;
    }

    ingested.send_replace(true);
}

/// Windows of `periodicity` wall-clock seconds
async fn process_real_time<P: WindowProcessor>(
    processor: &mut P,
    buffer: &Queue<Value>,
    shared: &Shared,
    periodicity: f64,
    period: Duration,
    extract: TimestampExtractor,
    mut ingested: watch::Receiver<bool>,
) -> Result<ConsumerReport, ConsumerError> {
    let mut report = ConsumerReport::default();
    let mut last_timestamp: Option<i64> = None;

    loop {
        let finished = tokio::select! {
            _ = tokio::time::sleep(period) => false,
            _ = ingested.changed() => true,
        };

        let items = timed(buffer.dequeue_all().await, extract)?;
        if finished && items.is_empty() {
            break;
        }

        let timestamp = latest(&items)
            .map(|t| t.floor() as i64)
            .or_else(|| last_timestamp.map(|t| t + periodicity.ceil() as i64))
            .unwrap_or_else(|| chrono::Utc::now().timestamp());
        last_timestamp = Some(timestamp);

        let window = Window {
            timestamp,
            start: timestamp as f64 - periodicity,
            end: timestamp as f64,
            items: sorted(items),
        };
        process(processor, window, shared, &mut report).await?;

        if finished {
            break;
        }
    }

    Ok(report)
}

/// Windows of `periodicity` seconds of the items' own timestamps
async fn process_stream<P: WindowProcessor>(
    processor: &mut P,
    buffer: &Queue<Value>,
    shared: &Shared,
    periodicity: f64,
    extract: TimestampExtractor,
    mut ingested: watch::Receiver<bool>,
) -> Result<ConsumerReport, ConsumerError> {
    let mut report = ConsumerReport::default();
    let mut pending: Vec<TimedItem> = Vec::new();
    let mut window_start: Option<f64> = None;
    let mut finished = false;

    loop {
        if !finished {
            tokio::select! {
                _ = tokio::time::sleep(STREAM_POLL_INTERVAL) => {}
                _ = ingested.changed() => finished = true,
            }
        }

        pending.extend(timed(buffer.dequeue_all().await, extract)?);

        // The first item fixes where windows start
        let Some(mut start) = window_start.or_else(|| earliest(&pending).map(f64::floor)) else {
            if finished {
                break;
            }
            continue;
        };

        while latest(&pending).is_some_and(|t| t >= start + periodicity) {
            let window = take_window(&mut pending, start, start + periodicity);
            process(processor, window, shared, &mut report).await?;
            start += periodicity;
        }

        if finished {
            while !pending.is_empty() {
                let window = take_window(&mut pending, start, start + periodicity);
                process(processor, window, shared, &mut report).await?;
                start += periodicity;
            }
            break;
        }
        window_start = Some(start);
    }

    Ok(report)
}

/// Hand one window to the processor and record what it produced
async fn process<P: WindowProcessor>(
    processor: &mut P,
    window: Window,
    shared: &Shared,
    report: &mut ConsumerReport,
) -> Result<(), ConsumerError> {
    let timestamp = window.timestamp;
    let items = window.len();
    let started = std::time::Instant::now();

    match processor.process_window(window).await {
        Ok(effects) => {
            shared.stats.record_window(items);
            metrics::record_window(
                processor.name(),
                started.elapsed().as_secs_f64(),
                effects.filtered,
                effects.checkpoint.is_some(),
                effects.topics.len(),
            );

            tracing::debug!(
                timestamp,
                items,
                documents = effects.documents,
                filtered = effects.filtered,
                "Window processed"
            );
            for topic in &effects.topics {
                let terms: Vec<&str> = topic.terms.iter().map(|t| t.term.as_str()).collect();
                tracing::info!(timestamp, cluster = ?topic.cluster, terms = ?terms, "Breaking topic");
            }
            if let Some((start, end)) = effects.burst {
                tracing::info!(timestamp, start, end, "Volume burst");
            }

            report.record(effects);
            Ok(())
        }
        Err(source) => {
            shared.stats.record_failure();
            metrics::record_window_failure(processor.name());
            tracing::error!(
                processor = processor.name(),
                timestamp,
                items,
                error = %source,
                "Window processing failed"
            );
            Err(ConsumerError::Window {
                processor: processor.name(),
                timestamp,
                items,
                source,
            })
        }
    }
}

fn timed(items: Vec<Value>, extract: TimestampExtractor) -> Result<Vec<TimedItem>, ConsumerError> {
    items
        .into_iter()
        .map(|item| {
            let timestamp = extract(&item)?;
            Ok(TimedItem { timestamp, item })
        })
        .collect()
}

fn earliest(items: &[TimedItem]) -> Option<f64> {
    items.iter().map(|i| i.timestamp).min_by(f64::total_cmp)
}

fn latest(items: &[TimedItem]) -> Option<f64> {
    items.iter().map(|i| i.timestamp).max_by(f64::total_cmp)
}

fn sorted(mut items: Vec<TimedItem>) -> Vec<TimedItem> {
    items.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    items
}

/// Remove every pending item before `end`, late arrivals included
fn take_window(pending: &mut Vec<TimedItem>, start: f64, end: f64) -> Window {
    let (inside, rest): (Vec<_>, Vec<_>) =
        std::mem::take(pending).into_iter().partition(|i| i.timestamp < end);
    *pending = rest;

    let items = sorted(inside);
    let timestamp = items
        .last()
        .map_or(start.floor() as i64, |i| i.timestamp.floor() as i64);

    Window {
        timestamp,
        start,
        end,
        items,
    }
}
