//! Common test utilities

use serde_json::{json, Value};

/// Start of every synthetic timeline
pub const T0: i64 = 1_600_000_000;

/// Background words, none shared with [`BURST_WORDS`]
pub const BACKGROUND: &[&str] = &[
    "coffee", "traffic", "weather", "morning", "garden", "dinner", "recipe", "holiday", "airport",
    "office", "meeting", "deadline", "weekend", "birthday", "library", "market", "camera",
    "podcast", "concert", "album",
];

/// Words every burst tweet shares
pub const BURST_WORDS: [&str; 3] = ["messi", "penalty", "scores"];

/// A tweet that passes every quality filter
pub fn create_tweet(id: usize, timestamp_ms: i64, text: &str) -> Value {
    json!({
        "id_str": id.to_string(),
        "timestamp_ms": timestamp_ms.to_string(),
        "text": text,
        "lang": "en",
        "entities": {"hashtags": [], "urls": []},
        "user": {
            "description": "football fan",
            "favourites_count": 12,
            "followers_count": 340,
            "statuses_count": 2100,
        },
    })
}

/// A word made only of letters, unique for each `i`
pub fn unique_word(i: usize) -> String {
    let letter = |n: usize| (b'a' + (n % 26) as u8) as char;
    format!("uniq{}x{}", letter(i / 26), letter(i))
}

/// Background text of five words
#[allow(dead_code)]
pub fn background_text(i: usize) -> String {
    (0..5)
        .map(|k| BACKGROUND[(i * 7 + k * 3) % BACKGROUND.len()])
        .collect::<Vec<_>>()
        .join(" ")
}

/// Burst text: the three burst words and two words of its own
#[allow(dead_code)]
pub fn burst_text(i: usize) -> String {
    format!(
        "{} {} {} {} {}",
        BURST_WORDS[0],
        unique_word(2 * i),
        BURST_WORDS[1],
        unique_word(2 * i + 1),
        BURST_WORDS[2]
    )
}

/// `count` background tweets evenly spread over `span_ms` from `start_ms`
#[allow(dead_code)]
pub fn background_timeline(start_ms: i64, span_ms: i64, count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            let timestamp = start_ms + span_ms * i as i64 / count as i64;
            create_tweet(i, timestamp, &background_text(i))
        })
        .collect()
}

/// `per_second` tweets for every second in `[from, to)`
#[allow(dead_code)]
pub fn volume_timeline(from: i64, to: i64, per_second: usize) -> Vec<Value> {
    (from..to)
        .flat_map(|second| {
            (0..per_second).map(move |k| {
                let timestamp = second * 1000 + (k * 1000 / per_second) as i64;
                create_tweet(k, timestamp, &format!("tweet at {second}"))
            })
        })
        .collect()
}
