//! Window processors for the three burst detectors
//!
//! | Pipeline         | Filter                  | Nutrition | Detection                         |
//! |------------------|-------------------------|-----------|-----------------------------------|
//! | [`EldPipeline`]  | tweet and user quality  | per term  | ELD per candidate cluster         |
//! | [`FirePipeline`] | document quality score  | per term  | Cataldi per large cluster         |
//! | [`ZhaoPipeline`] | none                    | volume    | Zhao over per-second tweet counts |
//!
//! Every pipeline writes one checkpoint per window, even for a window with
//! no documents, and evicts checkpoints that fall out of its history.

pub mod eld;
pub mod fire;
pub mod zhao;

pub use eld::EldPipeline;
pub use fire::FirePipeline;
pub use zhao::ZhaoPipeline;

use crate::consumer::TimedItem;
use crate::nlp::{Document, DocumentBuilder, TIMESTAMP_ATTRIBUTE};
use crate::nutrition::{MemoryNutritionStore, NutritionStore, TermNutrition};
use crate::twitter;
use crate::vsm::Cluster;

/// Number of links and media in the source tweet
pub const URLS_ATTRIBUTE: &str = "urls";

/// Whether the source tweet is a reply
pub const REPLY_ATTRIBUTE: &str = "reply";

/// Number of tokens in the document
pub const TOKENS_ATTRIBUTE: &str = "tokens";

/// Build a document from a tweet, keeping what cluster filters read
pub(crate) fn tweet_document(builder: &DocumentBuilder, item: &TimedItem) -> Document {
    let mut document = builder.build(twitter::full_text(&item.item));
    let tokens = document.tokens.len();

    let vector = &mut document.vector;
    vector.set_attribute(TIMESTAMP_ATTRIBUTE, item.timestamp);
    vector.set_attribute(URLS_ATTRIBUTE, twitter::url_count(&item.item));
    vector.set_attribute(REPLY_ATTRIBUTE, twitter::is_reply(&item.item));
    vector.set_attribute(TOKENS_ATTRIBUTE, tokens);
    document
}

/// Store the rescaled concatenation of `documents` at `timestamp`
pub(crate) fn checkpoint(
    store: &mut MemoryNutritionStore<TermNutrition>,
    timestamp: i64,
    documents: &[Document],
) -> i64 {
    let nutrition = DocumentBuilder::checkpoint(documents.iter().map(|d| &d.vector));
    store.add(timestamp, nutrition.into_dimensions());
    timestamp
}

/// Remove checkpoints older than `sets` windows before `timestamp`
pub(crate) fn evict(
    store: &mut MemoryNutritionStore<TermNutrition>,
    timestamp: i64,
    time_window: u64,
    sets: u32,
) -> usize {
    let horizon = timestamp - (time_window as i64) * i64::from(sets);
    let evicted = store.evict_before(horizon);
    if evicted > 0 {
        tracing::debug!(timestamp, horizon, evicted, "Evicted old checkpoints");
    }
    evicted
}

/// Nutrition of a single cluster, rescaled like a window checkpoint
pub(crate) fn cluster_nutrition(cluster: &Cluster) -> TermNutrition {
    DocumentBuilder::checkpoint(cluster.vectors()).into_dimensions()
}

/// Source text of a document vector
pub(crate) fn text_of(vector: &crate::vsm::Vector) -> String {
    vector
        .attribute(crate::nlp::TEXT_ATTRIBUTE)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}
