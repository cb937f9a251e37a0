//! JSON-lines corpus reader feeding the inbound queue
//!
//! Each line of the corpus is one JSON object, usually a tweet. Lines that do
//! not parse are logged and skipped. With a `speed`, items are paced by their
//! own timestamps so that a recorded stream replays at a multiple of its
//! original rate.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;

use crate::queue::Queue;
use crate::twitter;

/// Errors raised while reading a corpus
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("I/O error on corpus {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Speed must be positive, got {0}")]
    InvalidSpeed(f64),
}

/// Which lines to read and how fast
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Lines to skip at the start of the file
    pub skip_lines: usize,

    /// Stop after this many lines have been read
    pub max_lines: Option<usize>,

    /// Replay speed relative to the items' timestamps; `None` reads at once
    pub speed: Option<f64>,

    /// Items enqueued together when not pacing
    pub batch_size: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            skip_lines: 0,
            max_lines: None,
            speed: None,
            batch_size: 500,
        }
    }
}

/// Counts of a finished read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
    pub read: usize,
    pub skipped: usize,
    pub malformed: usize,
}

/// Streams a JSON-lines file into a queue
#[derive(Debug)]
pub struct JsonlReader {
    queue: Arc<Queue<Value>>,
    options: ReaderOptions,
    stopped: Arc<AtomicBool>,
}

impl JsonlReader {
    pub fn new(queue: Arc<Queue<Value>>, options: ReaderOptions) -> Result<Self, ReaderError> {
        if let Some(speed) = options.speed {
            if !(speed > 0.0 && speed.is_finite()) {
                return Err(ReaderError::InvalidSpeed(speed));
            }
        }

        Ok(Self {
            queue,
            options,
            stopped: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Flag that stops the read at the next line when set
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stopped)
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    /// Read `path` into the queue
    pub async fn read(&self, path: &Path) -> Result<ReadStats, ReaderError> {
        let io_error = |source| ReaderError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).await.map_err(io_error)?;
        let mut lines = BufReader::new(file).lines();

        let mut stats = ReadStats::default();
        let mut batch = Vec::with_capacity(self.options.batch_size);
        let mut origin: Option<(f64, Instant)> = None;
        let mut line_number = 0usize;

        while let Some(line) = lines.next_line().await.map_err(io_error)? {
            if self.stopped.load(Ordering::SeqCst) {
                tracing::info!(line = line_number, "Reader stopped");
                break;
            }
            if self.options.max_lines.is_some_and(|max| stats.read >= max) {
                break;
            }

            line_number += 1;
            if line_number <= self.options.skip_lines {
                stats.skipped += 1;
                continue;
            }
            if line.trim().is_empty() {
                continue;
            }

            let item: Value = match serde_json::from_str(&line) {
                Ok(item) => item,
                Err(e) => {
                    tracing::warn!(line = line_number, error = %e, "Skipping malformed line");
                    stats.malformed += 1;
                    continue;
                }
            };
            stats.read += 1;

            match self.options.speed {
                Some(speed) => {
                    if let Ok(timestamp) = twitter::extract_timestamp(&item) {
                        let (first, started) = *origin.get_or_insert((timestamp, Instant::now()));
                        let offset = ((timestamp - first) / speed).max(0.0);
                        tokio::time::sleep_until(started + Duration::from_secs_f64(offset)).await;
                    }
                    self.queue.enqueue([item]).await;
                }
                None => {
                    batch.push(item);
                    if batch.len() >= self.options.batch_size.max(1) {
                        self.queue.enqueue(std::mem::take(&mut batch)).await;
                    }
                }
            }
        }

        if !batch.is_empty() {
            self.queue.enqueue(batch).await;
        }

        tracing::info!(
            path = %path.display(),
            read = stats.read,
            skipped = stats.skipped,
            malformed = stats.malformed,
            "Finished reading corpus"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn corpus(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file
    }

    #[tokio::test]
    async fn test_reads_and_skips_malformed() {
        let file = corpus(&[r#"{"id": 1}"#, "not json", "", r#"{"id": 2}"#]);
        let queue = Arc::new(Queue::new());
        let reader = JsonlReader::new(Arc::clone(&queue), ReaderOptions::default()).unwrap();

        let stats = reader.read(file.path()).await.unwrap();
        assert_eq!(stats.read, 2);
        assert_eq!(stats.malformed, 1);

        let items = queue.dequeue_all().await;
        assert_eq!(items[0]["id"], 1);
        assert_eq!(items[1]["id"], 2);
    }

    #[tokio::test]
    async fn test_skip_and_max_lines() {
        let file = corpus(&[r#"{"id": 1}"#, r#"{"id": 2}"#, r#"{"id": 3}"#, r#"{"id": 4}"#]);
        let queue = Arc::new(Queue::new());
        let options = ReaderOptions {
            skip_lines: 1,
            max_lines: Some(2),
            ..ReaderOptions::default()
        };
        let reader = JsonlReader::new(Arc::clone(&queue), options).unwrap();

        let stats = reader.read(file.path()).await.unwrap();
        assert_eq!(stats, ReadStats { read: 2, skipped: 1, malformed: 0 });

        let ids: Vec<i64> = queue
            .dequeue_all()
            .await
            .iter()
            .filter_map(|i| i["id"].as_i64())
            .collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_speed_paces_items() {
        let file = corpus(&[
            r#"{"timestamp_ms": "1000000"}"#,
            r#"{"timestamp_ms": "1010000"}"#,
        ]);
        let queue = Arc::new(Queue::new());
        let options = ReaderOptions {
            speed: Some(2.0),
            ..ReaderOptions::default()
        };
        let reader = JsonlReader::new(Arc::clone(&queue), options).unwrap();

        let started = Instant::now();
        reader.read(file.path()).await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(5));
        assert_eq!(queue.len().await, 2);
    }

    #[test]
    fn test_invalid_speed() {
        let options = ReaderOptions {
            speed: Some(0.0),
            ..ReaderOptions::default()
        };
        assert!(JsonlReader::new(Arc::new(Queue::new()), options).is_err());
    }

    #[tokio::test]
    async fn test_missing_file() {
        let reader = JsonlReader::new(Arc::new(Queue::new()), ReaderOptions::default()).unwrap();
        let result = reader.read(Path::new("/nonexistent/corpus.jsonl")).await;
        assert!(matches!(result, Err(ReaderError::Io { .. })));
    }
}
