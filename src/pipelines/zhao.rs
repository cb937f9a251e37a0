//! Zhao: bursts in per-second tweet volume

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::config::ZhaoConfig;
use crate::consumer::{Topic, Window, WindowEffects, WindowError, WindowProcessor};
use crate::error::Result;
use crate::nutrition::{MemoryNutritionStore, NutritionStore, Volume};
use crate::tdt::Zhao;
use crate::twitter;

/// Window processor detecting volume bursts
#[derive(Debug)]
pub struct ZhaoPipeline {
    config: ZhaoConfig,
    store: MemoryNutritionStore<Volume>,
    zhao: Zhao,
    /// Recent texts by second, kept for as long as detection can look back
    recent: BTreeMap<i64, Vec<String>>,
}

impl ZhaoPipeline {
    pub fn new(config: ZhaoConfig) -> Result<Self> {
        let zhao = Zhao::new(config.post_rate, config.windows.clone())?;
        Ok(Self {
            config,
            store: MemoryNutritionStore::new(),
            zhao,
            recent: BTreeMap::new(),
        })
    }

    pub fn store(&self) -> &MemoryNutritionStore<Volume> {
        &self.store
    }

    pub fn config(&self) -> &ZhaoConfig {
        &self.config
    }

    /// Texts published within `[start, end]`
    fn texts_between(&self, start: i64, end: i64) -> Vec<String> {
        self.recent
            .range(start..=end)
            .flat_map(|(_, texts)| texts.iter().cloned())
            .collect()
    }
}

#[async_trait]
impl WindowProcessor for ZhaoPipeline {
    fn name(&self) -> &'static str {
        "zhao"
    }

    async fn process_window(&mut self, window: Window) -> std::result::Result<WindowEffects, WindowError> {
        let timestamp = window.timestamp;
        let mut effects = WindowEffects::new(timestamp);
        effects.documents = window.len();

        let mut volumes: BTreeMap<i64, f64> = BTreeMap::new();
        for item in &window.items {
            let second = item.timestamp.floor() as i64;
            *volumes.entry(second).or_insert(0.0) += 1.0;
            self.recent
                .entry(second)
                .or_default()
                .push(twitter::full_text(&item.item).to_string());
        }
        volumes.entry(timestamp).or_insert(0.0);

        for (second, count) in volumes {
            let volume = self.store.get(second).copied().unwrap_or(0.0);
            self.store.add(second, volume + count);
        }
        effects.checkpoint = Some(timestamp);

        let horizon = timestamp - self.zhao.horizon();
        self.store.evict_before(horizon);
        self.recent = self.recent.split_off(&horizon);

        if let Some((start, end)) = self.zhao.detect(&self.store, timestamp) {
            let representatives = self.texts_between(start, end);
            effects.burst = Some((start, end));
            effects.topics.push(Topic {
                cluster: None,
                terms: Vec::new(),
                representatives,
            });
        }

        Ok(effects)
    }
}
