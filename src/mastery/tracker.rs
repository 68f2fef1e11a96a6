//! Rotation filtering and outcome recording.
//!
//! Mastery is pull-based: after recording an outcome the caller recomputes the
//! rotation. Each combination is evaluated on its own statistics only.

use std::collections::HashMap;

use chrono::Utc;

use crate::store::{ContentItem, ContentStore, ContextKey, StatKey, StatRecord, StoreError};

use super::models::{Combination, MasteryState, Rotation, MASTERY_THRESHOLD};

/// Every combination of `items` × `contexts` whose streak is below `threshold`.
///
/// Ordered by item, then context. Combinations without statistics are active.
pub fn compute_rotation(
    items: &[ContentItem],
    contexts: &[ContextKey],
    stats: &[StatRecord],
    threshold: u32,
) -> Rotation {
    let streaks: HashMap<&StatKey, u32> = stats
        .iter()
        .map(|record| (&record.key, record.correct_streak))
        .collect();

    let mut active = Vec::new();
    for item in items {
        for context in contexts {
            let key = StatKey::new(item.key.clone(), context.clone());
            let streak = streaks.get(&key).copied().unwrap_or(0);
            if MasteryState::from_streak(streak, threshold) == MasteryState::Active {
                active.push(Combination {
                    item_key: key.content_key,
                    context: key.context,
                });
            }
        }
    }

    Rotation::new(active, items.len() * contexts.len())
}

/// Records outcomes and answers rotation queries against a store
#[derive(Debug, Clone, Copy)]
pub struct MasteryTracker {
    threshold: u32,
}

impl Default for MasteryTracker {
    fn default() -> Self {
        Self::new(MASTERY_THRESHOLD)
    }
}

impl MasteryTracker {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn state_of(&self, record: &StatRecord) -> MasteryState {
        MasteryState::from_streak(record.correct_streak, self.threshold)
    }

    /// Current rotation, read from the stored statistics
    pub fn rotation(
        &self,
        store: &ContentStore,
        items: &[ContentItem],
        contexts: &[ContextKey],
    ) -> Result<Rotation, StoreError> {
        let stats = store.get_all_stats()?;
        Ok(compute_rotation(items, contexts, &stats, self.threshold))
    }

    /// Apply one answer to the combination's record and persist it
    pub fn record_outcome(
        &self,
        store: &mut ContentStore,
        combination: &Combination,
        correct: bool,
    ) -> Result<StatRecord, StoreError> {
        let mut record = store.get_stat(&combination.stat_key())?;
        let before = self.state_of(&record);

        record.apply_outcome(correct, Utc::now());
        store.put_stat(&record)?;

        let after = self.state_of(&record);
        if before != after {
            log::debug!(
                "{} / {} is now {:?} (streak {})",
                combination.item_key,
                combination.context,
                after,
                record.correct_streak
            );
        }

        Ok(record)
    }

    /// Forget every statistic; all combinations become active again
    pub fn reset(&self, store: &mut ContentStore) -> Result<(), StoreError> {
        store.clear_all_stats()
    }
}
