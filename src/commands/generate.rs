use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::{json, Value};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Background vocabulary of the synthetic stream
const VOCABULARY: &[&str] = &[
    "match", "team", "player", "coach", "season", "league", "stadium", "fans", "ticket", "weather",
    "morning", "coffee", "traffic", "music", "concert", "album", "movie", "series", "episode",
    "dinner", "recipe", "garden", "holiday", "flight", "airport", "beach", "office", "meeting",
    "project", "deadline", "weekend", "birthday", "family", "friends", "school", "exam", "library",
    "market", "prices", "phone", "update", "camera", "picture", "video", "stream", "podcast",
];

/// Words that co-occur with the burst term
const BURST_CONTEXT: &[&str] = &["breaking", "unbelievable", "scores", "wins", "final", "minute"];

/// Parameters of the generate command
#[derive(Debug, Clone)]
pub struct GenerateParams {
    pub output: PathBuf,
    pub documents: usize,
    pub start: i64,
    pub span: u64,
    pub seed: u64,
    pub burst_term: Option<String>,
}

/// Write a synthetic tweet corpus, optionally with a burst in its last quarter
pub fn generate(params: GenerateParams) -> Result<()> {
    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);

    let file = std::fs::File::create(&params.output)
        .with_context(|| format!("Failed to create {}", params.output.display()))?;
    let mut writer = BufWriter::new(file);

    let span = params.span.max(1) as f64;
    let burst_start = params.start as f64 + span * 0.75;
    let mut bursty = 0;

    for i in 0..params.documents {
        let offset = span * i as f64 / params.documents.max(1) as f64;
        let timestamp = params.start as f64 + offset + rng.gen_range(0.0..1.0);

        let burst = params
            .burst_term
            .as_deref()
            .filter(|_| timestamp >= burst_start && rng.gen_bool(0.6));
        if burst.is_some() {
            bursty += 1;
        }

        let tweet = synthetic_tweet(&mut rng, i, timestamp, burst);
        serde_json::to_writer(&mut writer, &tweet).context("Failed to serialize tweet")?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    println!(
        "Wrote {} tweets ({} bursty) spanning {}s to {}",
        params.documents,
        bursty,
        params.span,
        params.output.display()
    );
    Ok(())
}

fn synthetic_tweet(rng: &mut ChaCha8Rng, id: usize, timestamp: f64, burst: Option<&str>) -> Value {
    let length = rng.gen_range(6..12);
    let mut words: Vec<&str> = VOCABULARY.choose_multiple(rng, length).copied().collect();
    if let Some(term) = burst {
        words.truncate(length / 2);
        words.push(term);
        words.extend(BURST_CONTEXT.choose_multiple(rng, 3).copied());
        words.shuffle(rng);
    }

    json!({
        "id_str": id.to_string(),
        "timestamp_ms": ((timestamp * 1000.0) as i64).to_string(),
        "text": words.join(" "),
        "lang": "en",
        "entities": {"hashtags": [], "urls": []},
        "user": {
            "id_str": format!("user{}", rng.gen_range(0..500)),
            "description": "synthetic account",
            "favourites_count": rng.gen_range(1..500),
            "followers_count": rng.gen_range(10..5000),
            "statuses_count": rng.gen_range(100..20000),
        },
    })
}
