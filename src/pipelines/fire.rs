//! FIRE: Cataldi burst detection over large clusters

use async_trait::async_trait;
use serde_json::Value;

use super::{checkpoint, cluster_nutrition, evict, text_of, tweet_document};
use crate::clustering::{ClusteringAlgorithm, TemporalNoKMeans};
use crate::config::{BurstConfig, ClusteringConfig, FireConfig};
use crate::consumer::{Topic, Window, WindowEffects, WindowError, WindowProcessor};
use crate::error::Result;
use crate::metrics;
use crate::nlp::{Document, DocumentBuilder, TIMESTAMP_ATTRIBUTE};
use crate::nutrition::{MemoryNutritionStore, TermNutrition};
use crate::tdt::Cataldi;
use crate::twitter;

/// Whether a tweet passes the quality rules
pub fn accept_tweet(tweet: &Value) -> bool {
    twitter::lang(tweet) == Some("en")
        && twitter::hashtag_count(tweet) <= 2
        && twitter::user_favourites(tweet) > 0.0
        && twitter::followers_per_status(tweet) >= 1e-3
}

/// `ln(tokens) * unique / tokens`, rewarding long, varied documents; 0 when empty
pub fn document_score(document: &Document) -> f64 {
    let count = document.tokens.len();
    if count == 0 {
        return 0.0;
    }

    let unique = document
        .tokens
        .iter()
        .collect::<std::collections::HashSet<_>>()
        .len();
    (count as f64).ln() * unique as f64 / count as f64
}

/// Window processor running Cataldi over clusters of quality documents
#[derive(Debug)]
pub struct FirePipeline {
    config: FireConfig,
    burst: BurstConfig,
    builder: DocumentBuilder,
    store: MemoryNutritionStore<TermNutrition>,
    clustering: TemporalNoKMeans,
    cataldi: Cataldi,
}

impl FirePipeline {
    pub fn new(
        config: FireConfig,
        clustering: &ClusteringConfig,
        burst: BurstConfig,
        builder: DocumentBuilder,
    ) -> Result<Self> {
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
            cataldi: Cataldi::new(),
        })
    }

    pub fn store(&self) -> &MemoryNutritionStore<TermNutrition> {
        &self.store
    }

    pub fn clustering(&self) -> &TemporalNoKMeans {
        &self.clustering
    }
}

#[async_trait]
impl WindowProcessor for FirePipeline {
    fn name(&self) -> &'static str {
        "fire"
    }

    async fn process_window(&mut self, window: Window) -> std::result::Result<WindowEffects, WindowError> {
        let timestamp = window.timestamp;
        let mut effects = WindowEffects::new(timestamp);

        let documents: Vec<Document> = window
            .items
            .iter()
            .filter(|item| accept_tweet(&item.item))
            .map(|item| tweet_document(&self.builder, item))
            .filter(|document| document_score(document) >= self.config.score_threshold)
            .collect();
        effects.documents = documents.len();
        effects.filtered = window.len() - documents.len();

        effects.checkpoint = Some(checkpoint(&mut self.store, timestamp, &documents));
        evict(&mut self.store, timestamp, self.config.time_window, self.config.sets);

        let vectors = documents.into_iter().map(|d| d.vector).collect();
        let updated = self.clustering.cluster(vectors)?;

        let since = timestamp - self.config.time_window as i64 * i64::from(self.config.sets);
        for id in updated {
            let Some(cluster) = self.clustering.get(id) else {
                continue;
            };
            if cluster.size() < self.config.min_cluster_size {
                continue;
            }

            let nutrition = cluster_nutrition(cluster);
            let mut terms =
                self.cataldi
                    .detect_ranked(&self.store, &nutrition, timestamp, Some(since))?;
            if terms.is_empty() {
                continue;
            }
            terms.truncate(self.burst.max_terms);

            let representatives = cluster
                .representative_vectors(self.burst.representatives)
                .into_iter()
                .map(text_of)
                .collect();
            effects.breaking_terms.extend(terms.iter().cloned());
            effects.topics.push(Topic {
                cluster: Some(id),
                terms,
                representatives,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::Tokenizer;

    #[test]
    fn test_document_score() {
        let builder = DocumentBuilder::new(Tokenizer::default());

        let empty = builder.build("");
        assert_eq!(document_score(&empty), 0.0);

        let repeated = builder.build("goal goal goal goal");
        assert!((document_score(&repeated) - 4f64.ln() / 4.0).abs() < 1e-12);

        let varied = builder.build("messi scores amazing winning goal tonight");
        assert!(document_score(&varied) >= 1.37);
    }

    #[test]
    fn test_accept_tweet() {
        let tweet = serde_json::json!({
            "lang": "en",
            "entities": {"hashtags": [{}, {}], "urls": [{}, {}]},
            "user": {"favourites_count": 1, "followers_count": 1, "statuses_count": 1000}
        });
        assert!(accept_tweet(&tweet));

        let tweet = serde_json::json!({"lang": "en", "user": {"favourites_count": 0}});
        assert!(!accept_tweet(&tweet));
    }
}
