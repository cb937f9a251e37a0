//! Helpers over raw tweet JSON
//!
//! Tweets are kept as [`serde_json::Value`]s so that any field can be read
//! by filters without a full schema.

use chrono::DateTime;
use serde_json::Value;
use thiserror::Error;

/// Format of the `created_at` field, e.g. `Wed Oct 10 20:19:24 +0000 2018`
const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Errors raised when reading tweets
#[derive(Debug, Error)]
pub enum TwitterError {
    #[error("Tweet has no usable timestamp")]
    MissingTimestamp,

    #[error("Invalid timestamp '{0}'")]
    InvalidTimestamp(String),
}

/// Timestamp of the tweet in whole seconds
///
/// Uses `timestamp_ms` when present (floored to the second) and falls back
/// to parsing `created_at`.
pub fn extract_timestamp(tweet: &Value) -> Result<f64, TwitterError> {
    if let Some(ms) = tweet.get("timestamp_ms") {
        let ms = match ms {
            Value::String(s) => s
                .parse::<i64>()
                .map_err(|_| TwitterError::InvalidTimestamp(s.clone()))?,
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .ok_or_else(|| TwitterError::InvalidTimestamp(n.to_string()))?,
            other => return Err(TwitterError::InvalidTimestamp(other.to_string())),
        };
        return Ok(ms.div_euclid(1000) as f64);
    }

    if let Some(created_at) = tweet.get("created_at").and_then(Value::as_str) {
        let parsed = DateTime::parse_from_str(created_at, CREATED_AT_FORMAT)
            .map_err(|_| TwitterError::InvalidTimestamp(created_at.to_string()))?;
        return Ok(parsed.timestamp() as f64);
    }

    Err(TwitterError::MissingTimestamp)
}

/// Full text of the tweet
///
/// Retweets resolve to the retweeted status; long tweets use
/// `extended_tweet.full_text`.
pub fn full_text(tweet: &Value) -> &str {
    let mut status = tweet;
    while let Some(retweeted) = status.get("retweeted_status") {
        status = retweeted;
    }

    status
        .get("extended_tweet")
        .and_then(|e| e.get("full_text"))
        .and_then(Value::as_str)
        .or_else(|| status.get("full_text").and_then(Value::as_str))
        .or_else(|| status.get("text").and_then(Value::as_str))
        .unwrap_or_default()
}

pub fn lang(tweet: &Value) -> Option<&str> {
    tweet.get("lang").and_then(Value::as_str)
}

fn entity_count(tweet: &Value, entity: &str) -> usize {
    tweet
        .get("entities")
        .and_then(|e| e.get(entity))
        .and_then(Value::as_array)
        .map_or(0, Vec::len)
}

pub fn hashtag_count(tweet: &Value) -> usize {
    entity_count(tweet, "hashtags")
}

/// Number of links and media attached to the tweet
pub fn url_count(tweet: &Value) -> usize {
    entity_count(tweet, "urls") + entity_count(tweet, "media")
}

/// Whether the tweet is a reply
pub fn is_reply(tweet: &Value) -> bool {
    let replying = tweet
        .get("in_reply_to_status_id")
        .is_some_and(|id| !id.is_null());
    replying || full_text(tweet).starts_with('@')
}

fn user_count(tweet: &Value, field: &str) -> f64 {
    tweet
        .get("user")
        .and_then(|u| u.get(field))
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
}

pub fn user_followers(tweet: &Value) -> f64 {
    user_count(tweet, "followers_count")
}

pub fn user_statuses(tweet: &Value) -> f64 {
    user_count(tweet, "statuses_count")
}

pub fn user_favourites(tweet: &Value) -> f64 {
    user_count(tweet, "favourites_count")
}

/// Followers per tweet posted; 0 for accounts that never posted
pub fn followers_per_status(tweet: &Value) -> f64 {
    let statuses = user_statuses(tweet);
    if statuses == 0.0 {
        return 0.0;
    }
    user_followers(tweet) / statuses
}

pub fn user_description(tweet: &Value) -> Option<&str> {
    tweet
        .get("user")
        .and_then(|u| u.get("description"))
        .and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_timestamp_ms() {
        let tweet = json!({"timestamp_ms": "1539202764999"});
        assert_eq!(extract_timestamp(&tweet).unwrap(), 1539202764.0);

        let tweet = json!({"timestamp_ms": 1539202764000i64});
        assert_eq!(extract_timestamp(&tweet).unwrap(), 1539202764.0);
    }

    #[test]
    fn test_extract_timestamp_created_at() {
        let tweet = json!({"created_at": "Wed Oct 10 20:19:24 +0000 2018"});
        assert_eq!(extract_timestamp(&tweet).unwrap(), 1539202764.0);
    }

    #[test]
    fn test_extract_timestamp_missing() {
        assert!(matches!(
            extract_timestamp(&json!({"text": "no time"})),
            Err(TwitterError::MissingTimestamp)
        ));
        assert!(extract_timestamp(&json!({"timestamp_ms": "soon"})).is_err());
    }

    #[test]
    fn test_full_text() {
        let tweet = json!({
            "text": "RT @user: short",
            "retweeted_status": {
                "text": "short",
                "extended_tweet": {"full_text": "short but actually long"}
            }
        });
        assert_eq!(full_text(&tweet), "short but actually long");
        assert_eq!(full_text(&json!({"text": "plain"})), "plain");
        assert_eq!(full_text(&json!({})), "");
    }

    #[test]
    fn test_entities() {
        let tweet = json!({
            "entities": {"hashtags": [{}, {}], "urls": [{}], "media": [{}]},
            "user": {"followers_count": 10, "statuses_count": 1000, "favourites_count": 3}
        });
        assert_eq!(hashtag_count(&tweet), 2);
        assert_eq!(url_count(&tweet), 2);
        assert_eq!(followers_per_status(&tweet), 0.01);
        assert_eq!(user_favourites(&tweet), 3.0);
    }

    #[test]
    fn test_is_reply() {
        assert!(is_reply(&json!({"text": "@someone hello"})));
        assert!(is_reply(&json!({"text": "hello", "in_reply_to_status_id": 12})));
        assert!(!is_reply(&json!({"text": "hello", "in_reply_to_status_id": null})));
    }
}
