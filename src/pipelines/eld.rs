//! ELD: breaking topics from clusters of quality tweets

use async_trait::async_trait;
use serde_json::Value;

use super::{
    checkpoint, cluster_nutrition, evict, text_of, tweet_document, REPLY_ATTRIBUTE,
    TOKENS_ATTRIBUTE, URLS_ATTRIBUTE,
};
use crate::clustering::{ClusteringAlgorithm, TemporalNoKMeans};
use crate::config::{BurstConfig, ClusteringConfig, EldConfig};
use crate::consumer::{Topic, Window, WindowEffects, WindowError, WindowProcessor};
use crate::error::Result;
use crate::metrics;
use crate::nlp::{DocumentBuilder, TIMESTAMP_ATTRIBUTE};
use crate::nutrition::{MemoryNutritionStore, TermNutrition};
use crate::tdt::{rank, Eld};
use crate::twitter;
use crate::vsm::{Cluster, Vector};

/// A cluster with more breaking terms than this is breaking
const MIN_BREAKING_TERMS: usize = 2;

/// A cluster whose breaking terms burst more than this on average is breaking
const MIN_MEAN_BURST: f64 = 0.9;

/// Brevity is 1 for texts with at least this many tokens
const BREVITY_LENGTH: f64 = 10.0;

/// Whether a tweet passes the quality rules
pub fn accept_tweet(tweet: &Value) -> bool {
    twitter::lang(tweet) == Some("en")
        && twitter::hashtag_count(tweet) <= 2
        && twitter::user_favourites(tweet) > 0.0
        && twitter::followers_per_status(tweet) >= 1e-3
        && twitter::url_count(tweet) <= 1
        && twitter::user_description(tweet).is_some_and(|d| !d.is_empty())
}

/// `min(exp(1 - r / tokens), 1)`; 0 without tokens
pub fn brevity_score(tokens: usize) -> f64 {
    if tokens == 0 {
        return 0.0;
    }
    (1.0 - BREVITY_LENGTH / tokens as f64).exp().min(1.0)
}

/// Share of cased letters that are lowercase; 0 without letters
pub fn emotion_score(text: &str) -> f64 {
    let upper = text.chars().filter(|c| c.is_uppercase()).count();
    let lower = text.chars().filter(|c| c.is_lowercase()).count();
    if upper + lower == 0 {
        return 0.0;
    }
    1.0 - upper as f64 / (upper + lower) as f64
}

fn document_score(vector: &Vector) -> f64 {
    let tokens = vector.numeric_attribute(TOKENS_ATTRIBUTE).unwrap_or(0.0) as usize;
    brevity_score(tokens) * emotion_score(&text_of(vector))
}

/// Window processor running ELD over filtered, clustered tweets
#[derive(Debug)]
pub struct EldPipeline {
    config: EldConfig,
    burst: BurstConfig,
    builder: DocumentBuilder,
    store: MemoryNutritionStore<TermNutrition>,
    clustering: TemporalNoKMeans,
    eld: Eld,
}

impl EldPipeline {
    pub fn new(
        config: EldConfig,
        clustering: &ClusteringConfig,
        burst: BurstConfig,
        builder: DocumentBuilder,
    ) -> Result<Self> {
        let eld = Eld::new(config.decay_rate)?;
        let clustering = TemporalNoKMeans::new(
            config.threshold,
            config.freeze_period,
            TIMESTAMP_ATTRIBUTE,
            clustering.store_frozen,
        )?;

        Ok(Self {
            config,
            burst,
            builder,
            store: MemoryNutritionStore::new(),
            clustering,
            eld,
        })
    }

    pub fn store(&self) -> &MemoryNutritionStore<TermNutrition> {
        &self.store
    }

    pub fn clustering(&self) -> &TemporalNoKMeans {
        &self.clustering
    }

    /// Whether the cluster should be checked for breaking terms at `timestamp`
    fn is_candidate(&self, cluster: &Cluster, timestamp: f64) -> bool {
        let size = cluster.size();
        if size < self.config.min_size || cluster.state.bursty {
            return false;
        }

        let last_checked = cluster.state.last_checked.unwrap_or(0.0);
        if timestamp - last_checked <= self.config.cooldown {
            return false;
        }

        if cluster.intra_similarity() > self.config.max_intra_similarity {
            return false;
        }

        let urls: f64 = cluster
            .vectors()
            .iter()
            .filter_map(|v| v.numeric_attribute(URLS_ATTRIBUTE))
            .sum();
        if urls / size as f64 > 1.0 {
            return false;
        }

        let replies = cluster
            .vectors()
            .iter()
            .filter(|v| v.attribute(REPLY_ATTRIBUTE).and_then(Value::as_bool) == Some(true))
            .count();
        replies as f64 / size as f64 <= 0.5
    }

    /// Texts of the cluster's most concise, least shouty members
    fn representatives(&self, cluster: &Cluster) -> Vec<String> {
        let mut scored: Vec<(f64, &Vector)> =
            cluster.vectors().iter().map(|v| (document_score(v), v)).collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored
            .into_iter()
            .take(self.burst.representatives)
            .map(|(_, v)| text_of(v))
            .collect()
    }
}

#[async_trait]
impl WindowProcessor for EldPipeline {
    fn name(&self) -> &'static str {
        "eld"
    }

    async fn process_window(&mut self, window: Window) -> std::result::Result<WindowEffects, WindowError> {
        let timestamp = window.timestamp;
        let mut effects = WindowEffects::new(timestamp);

        let documents: Vec<_> = window
            .items
            .iter()
            .filter(|item| accept_tweet(&item.item))
            .map(|item| tweet_document(&self.builder, item))
            .collect();
        effects.documents = documents.len();
        effects.filtered = window.len() - documents.len();

        effects.checkpoint = Some(checkpoint(&mut self.store, timestamp, &documents));
        evict(&mut self.store, timestamp, self.config.time_window, self.config.sets);

        let vectors = documents.into_iter().map(|d| d.vector).collect();
        let updated = self.clustering.cluster(vectors)?;

        let time_window = self.config.time_window as i64;
        let since = timestamp - time_window * i64::from(self.config.sets);
        let until = timestamp - time_window;
        let now = timestamp as f64;

        for id in updated {
            let candidate = self
                .clustering
                .get(id)
                .is_some_and(|cluster| self.is_candidate(cluster, now));
            if !candidate {
                continue;
            }

            let Some(cluster) = self.clustering.get_mut(id) else {
                continue;
            };
            cluster.state.last_checked = Some(now);

            let nutrition = cluster_nutrition(cluster);
            let bursts = self.eld.detect(
                &self.store,
                &nutrition,
                Some(since),
                Some(until),
                self.config.min_burst,
            );

            let mean = bursts.values().sum::<f64>() / bursts.len().max(1) as f64;
            let breaking = bursts.len() > MIN_BREAKING_TERMS
                || (!bursts.is_empty() && mean > MIN_MEAN_BURST);
            if !breaking {
                continue;
            }
            cluster.state.bursty = true;

            let mut terms = rank(bursts);
            terms.truncate(self.burst.max_terms);

            let Some(cluster) = self.clustering.get(id) else {
                continue;
            };
            effects.breaking_terms.extend(terms.iter().cloned());
            effects.topics.push(Topic {
                cluster: Some(id),
                terms,
                representatives: self.representatives(cluster),
            });
        }

        metrics::set_clusters(
            self.name(),
            self.clustering.clusters().len(),
            self.clustering.frozen().len(),
        );
        Ok(effects)
    }
}
