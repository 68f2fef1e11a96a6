//! Data models for mastery tracking

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::store::{ContextKey, StatKey};

/// Consecutive correct answers needed to retire a combination
pub const MASTERY_THRESHOLD: u32 = 3;

/// An item paired with one context key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Combination {
    pub item_key: String,
    pub context: ContextKey,
}

impl Combination {
    pub fn new(item_key: impl Into<String>, context: ContextKey) -> Self {
        Self {
            item_key: item_key.into(),
            context,
        }
    }

    pub fn stat_key(&self) -> StatKey {
        StatKey::new(self.item_key.clone(), self.context.clone())
    }
}

/// Whether a combination is still practiced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MasteryState {
    /// In rotation
    Active,
    /// Retired until the next reset or incorrect answer
    Mastered,
}

impl MasteryState {
    pub fn from_streak(correct_streak: u32, threshold: u32) -> Self {
        if correct_streak >= threshold {
            Self::Mastered
        } else {
            Self::Active
        }
    }
}

/// Non-mastered combinations eligible for selection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rotation {
    combinations: Vec<Combination>,
    total: usize,
}

impl Rotation {
    pub fn new(combinations: Vec<Combination>, total: usize) -> Self {
        Self { combinations, total }
    }

    /// Combinations still in rotation
    pub fn len(&self) -> usize {
        self.combinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combinations.is_empty()
    }

    /// Size of the full items × contexts cross product
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn contains(&self, combination: &Combination) -> bool {
        self.combinations.contains(combination)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Combination> {
        self.combinations.iter()
    }

    /// Pick uniformly at random. `None` means everything is mastered.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Combination> {
        self.combinations.choose(rng)
    }
}

/// Counters for the current run only
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub correct: u32,
    pub incorrect: u32,
    pub total: u32,
}

impl SessionStats {
    pub fn record(&mut self, correct: bool) {
        self.total += 1;
        if correct {
            self.correct += 1;
        } else {
            self.incorrect += 1;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Rounded percentage of correct answers, `None` before the first answer
    pub fn accuracy(&self) -> Option<u32> {
        if self.total == 0 {
            return None;
        }
        Some(((self.correct as f64 / self.total as f64) * 100.0).round() as u32)
    }
}
