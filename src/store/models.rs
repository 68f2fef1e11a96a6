//! Data models persisted by the content store

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Grammatical dimension that distinguishes the answers of one item.
///
/// Verb datasets only use a pronoun; phrase datasets pair a tense with a pronoun.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tense: Option<String>,
    pub pronoun: String,
}

impl ContextKey {
    pub fn pronoun(pronoun: impl Into<String>) -> Self {
        Self {
            tense: None,
            pronoun: pronoun.into(),
        }
    }

    pub fn tensed(tense: impl Into<String>, pronoun: impl Into<String>) -> Self {
        Self {
            tense: Some(tense.into()),
            pronoun: pronoun.into(),
        }
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tense {
            Some(tense) => write!(f, "{} {}", tense, self.pronoun),
            None => f.write_str(&self.pronoun),
        }
    }
}

/// Expected answer for one context of an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemAnswer {
    pub context: ContextKey,
    pub expected: String,
    /// Per-context prompt text, e.g. the English phrase for a tense exercise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

/// A unit of practice content, replaced wholesale whenever the dataset version changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    /// Natural key: the infinitive for verbs, the verb for grouped phrases
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    #[serde(default)]
    pub answers: Vec<ItemAnswer>,
}

impl ContentItem {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            translation: None,
            answers: Vec::new(),
        }
    }

    pub fn with_translation(mut self, translation: impl Into<String>) -> Self {
        self.translation = Some(translation.into());
        self
    }

    pub fn with_answer(mut self, context: ContextKey, expected: impl Into<String>) -> Self {
        self.answers.push(ItemAnswer {
            context,
            expected: expected.into(),
            prompt: None,
        });
        self
    }

    pub fn answer_for(&self, context: &ContextKey) -> Option<&ItemAnswer> {
        self.answers.iter().find(|a| &a.context == context)
    }
}

/// Structured key of a statistics record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatKey {
    pub content_key: String,
    pub context: ContextKey,
}

impl StatKey {
    pub fn new(content_key: impl Into<String>, context: ContextKey) -> Self {
        Self {
            content_key: content_key.into(),
            context,
        }
    }
}

/// Performance statistics for one (item, context) combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatRecord {
    pub key: StatKey,
    /// Consecutive correct answers since the last incorrect one
    #[serde(default)]
    pub correct_streak: u32,
    #[serde(default)]
    pub incorrect_count: u32,
    #[serde(default)]
    pub total_attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_practiced: Option<DateTime<Utc>>,
}

impl StatRecord {
    pub fn new(key: StatKey) -> Self {
        Self {
            key,
            correct_streak: 0,
            incorrect_count: 0,
            total_attempts: 0,
            last_practiced: None,
        }
    }

    /// Apply one answer. An incorrect answer always drops the streak to zero.
    pub fn apply_outcome(&mut self, correct: bool, at: DateTime<Utc>) {
        self.total_attempts += 1;
        if correct {
            self.correct_streak += 1;
        } else {
            self.incorrect_count += 1;
            self.correct_streak = 0;
        }
        self.last_practiced = Some(at);
    }
}

/// Dataset version tag, kept as the JSON value it arrived as.
///
/// `"1"` and `1` are different versions. Numbers compare by value, so `1`
/// and `1.0` are the same version.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DatasetVersion {
    Number(serde_json::Number),
    Text(String),
}

impl PartialEq for DatasetVersion {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => match (a.as_i64(), b.as_i64()) {
                (Some(a), Some(b)) => a == b,
                _ => a.as_f64() == b.as_f64(),
            },
            (Self::Text(a), Self::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&str> for DatasetVersion {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<u64> for DatasetVersion {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

impl fmt::Display for DatasetVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incorrect_resets_streak() {
        let mut record = StatRecord::new(StatKey::new("aller", ContextKey::pronoun("je")));
        let now = Utc::now();
        for _ in 0..5 {
            record.apply_outcome(true, now);
        }
        assert_eq!(record.correct_streak, 5);

        record.apply_outcome(false, now);
        assert_eq!(record.correct_streak, 0);
        assert_eq!(record.incorrect_count, 1);
        assert_eq!(record.total_attempts, 6);
        assert_eq!(record.last_practiced, Some(now));
    }

    #[test]
    fn test_version_json_semantics() {
        let text: DatasetVersion = serde_json::from_str("\"1\"").unwrap();
        let number: DatasetVersion = serde_json::from_str("1").unwrap();
        assert_ne!(text, number);
        assert_eq!(text.to_string(), number.to_string());

        let float: DatasetVersion = serde_json::from_str("1.0").unwrap();
        assert_eq!(number, float);
        let other: DatasetVersion = serde_json::from_str("1.5").unwrap();
        assert_ne!(float, other);
    }

    #[test]
    fn test_context_key_display() {
        assert_eq!(ContextKey::pronoun("nous").to_string(), "nous");
        assert_eq!(ContextKey::tensed("futur", "tu").to_string(), "futur tu");
    }
}
