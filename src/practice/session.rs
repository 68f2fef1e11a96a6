//! The practice session context object.
//!
//! A session owns the store handle, the loaded items, the current rotation and
//! the per-run counters. The controller drives it: draw a card, report the
//! outcome, draw again. The rotation is recomputed after every outcome.

use std::fmt;

use rand::Rng;
use serde::Serialize;
use thiserror::Error;

use crate::dataset::{sync_dataset, DatasetSource, SyncError, SyncOutcome};
use crate::mastery::{
    build_choices, ChoiceSet, Combination, MasteryState, MasteryTracker, Rotation, SessionStats,
};
use crate::store::{ContentItem, ContentStore, ContextKey, StatRecord, StoreError};

use super::mode::PracticeMode;

/// Shown when everything has been retired
pub const ALL_MASTERED_MESSAGE: &str = "All combinations mastered! Reset to practice again.";

#[derive(Error, Debug)]
pub enum PracticeError {
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("{hint}")]
    NoContentAvailable { hint: String },

    #[error("Storage error: {0}")]
    Store(StoreError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("Unknown tense: {0}")]
    InvalidTense(String),

    #[error("No card has been drawn")]
    NoCurrentCard,
}

impl From<StoreError> for PracticeError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(reason) => Self::StorageUnavailable(reason),
            other => Self::Store(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, PracticeError>;

/// What the controller shows for one combination
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub item_key: String,
    pub context: ContextKey,
    /// `None` when the item has no answer for this context
    pub expected: Option<String>,
    pub prompt: Option<String>,
    pub translation: Option<String>,
}

/// Remaining versus total combinations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub remaining: usize,
    pub total: usize,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} combinations remaining", self.remaining, self.total)
    }
}

/// Result of answering the current card
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerReport {
    pub combination: Combination,
    pub correct: bool,
    pub record: StatRecord,
    pub state: MasteryState,
    pub progress: Progress,
}

pub struct PracticeSession {
    store: ContentStore,
    mode: PracticeMode,
    tracker: MasteryTracker,
    items: Vec<ContentItem>,
    contexts: Vec<ContextKey>,
    rotation: Rotation,
    stats: SessionStats,
    current: Option<Combination>,
    sync_outcome: Option<SyncOutcome>,
}

impl PracticeSession {
    /// Sync with `source`, then load content from the store.
    ///
    /// A sync failure is logged and treated like being offline: whatever the
    /// store already holds is used.
    pub async fn start<S: DatasetSource + ?Sized>(
        mut store: ContentStore,
        source: &S,
        mode: PracticeMode,
        tracker: MasteryTracker,
    ) -> Result<Self> {
        let outcome = match sync_dataset(source, &mut store).await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::warn!("Sync failed, continuing with stored content: {}", e);
                SyncOutcome::Offline {
                    reason: e.to_string(),
                }
            }
        };

        let mut session = Self::open(store, mode, tracker)?;
        session.sync_outcome = Some(outcome);
        Ok(session)
    }

    /// Load content from the store without contacting the remote source
    pub fn open(store: ContentStore, mode: PracticeMode, tracker: MasteryTracker) -> Result<Self> {
        let contexts = mode.context_keys();
        let items = load_items(&store, &mode, &contexts)?;
        let rotation = tracker.rotation(&store, &items, &contexts)?;
        log::info!(
            "{} session: {} items, {}/{} combinations in rotation",
            mode,
            items.len(),
            rotation.len(),
            rotation.total()
        );

        Ok(Self {
            store,
            mode,
            tracker,
            items,
            contexts,
            rotation,
            stats: SessionStats::default(),
            current: None,
            sync_outcome: None,
        })
    }

    /// Sync again and reload. Unlike [`PracticeSession::start`], store
    /// failures during the sync are returned.
    pub async fn refresh<S: DatasetSource + ?Sized>(&mut self, source: &S) -> Result<SyncOutcome> {
        let outcome = sync_dataset(source, &mut self.store).await?;
        if matches!(outcome, SyncOutcome::Updated { .. }) {
            self.items = load_items(&self.store, &self.mode, &self.contexts)?;
            self.current = None;
            self.recompute()?;
        }
        self.sync_outcome = Some(outcome.clone());
        Ok(outcome)
    }

    fn recompute(&mut self) -> Result<()> {
        self.rotation = self
            .tracker
            .rotation(&self.store, &self.items, &self.contexts)?;
        Ok(())
    }

    /// Draw a random combination from the rotation. `None` means everything
    /// is mastered.
    pub fn next_card<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Card> {
        let combination = self.rotation.choose(rng)?.clone();
        let card = self.card_for(&combination);
        self.current = Some(combination);
        Some(card)
    }

    fn card_for(&self, combination: &Combination) -> Card {
        let item = self.items.iter().find(|i| i.key == combination.item_key);
        let answer = item.and_then(|i| i.answer_for(&combination.context));
        Card {
            item_key: combination.item_key.clone(),
            context: combination.context.clone(),
            expected: answer.map(|a| a.expected.clone()),
            prompt: answer.and_then(|a| a.prompt.clone()),
            translation: item.and_then(|i| i.translation.clone()),
        }
    }

    /// Multiple-choice options for the current card
    pub fn choices<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<ChoiceSet> {
        let current = self.current.as_ref()?;
        build_choices(&self.items, current, rng)
    }

    /// Record the outcome for the current card and recompute the rotation
    pub fn answer(&mut self, correct: bool) -> Result<AnswerReport> {
        let combination = self.current.take().ok_or(PracticeError::NoCurrentCard)?;

        let record = self
            .tracker
            .record_outcome(&mut self.store, &combination, correct)?;
        self.stats.record(correct);
        self.recompute()?;

        Ok(AnswerReport {
            state: self.tracker.state_of(&record),
            combination,
            correct,
            record,
            progress: self.progress(),
        })
    }

    /// Forget all statistics; the rotation is the full cross product again
    pub fn reset_progress(&mut self) -> Result<()> {
        self.tracker.reset(&mut self.store)?;
        self.stats.reset();
        self.current = None;
        self.recompute()?;
        log::info!("Progress reset");
        Ok(())
    }

    pub fn progress(&self) -> Progress {
        Progress {
            remaining: self.rotation.len(),
            total: self.rotation.total(),
        }
    }

    pub fn status_line(&self) -> String {
        if self.rotation.is_empty() {
            ALL_MASTERED_MESSAGE.to_string()
        } else {
            self.progress().to_string()
        }
    }

    pub fn is_complete(&self) -> bool {
        self.rotation.is_empty()
    }

    pub fn mode(&self) -> &PracticeMode {
        &self.mode
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    pub fn rotation(&self) -> &Rotation {
        &self.rotation
    }

    pub fn session_stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Outcome of the sync run by [`PracticeSession::start`] or `refresh`
    pub fn sync_outcome(&self) -> Option<&SyncOutcome> {
        self.sync_outcome.as_ref()
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    pub fn into_store(self) -> ContentStore {
        self.store
    }
}

/// Every stored item for conjugation practice. Tense practice keeps only the
/// phrase groups with at least one answer in the selected tenses.
fn load_items(
    store: &ContentStore,
    mode: &PracticeMode,
    contexts: &[ContextKey],
) -> Result<Vec<ContentItem>> {
    let all = store.get_all_content()?;
    if all.is_empty() {
        return Err(PracticeError::NoContentAvailable {
            hint: "No verbs available. Please check your internet connection.".to_string(),
        });
    }

    if let PracticeMode::Conjugation = mode {
        return Ok(all);
    }

    let items: Vec<ContentItem> = all
        .into_iter()
        .filter(|item| item.answers.iter().any(|a| contexts.contains(&a.context)))
        .collect();
    if items.is_empty() {
        return Err(PracticeError::NoContentAvailable {
            hint: "No phrases available for the selected tenses.".to_string(),
        });
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::test_support::StaticSource;
    use crate::dataset::Dataset;
    use crate::practice::mode::{Tense, PRONOUNS};
    use crate::store::SCHEMA_VERSION;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn verbs(keys: &[&str]) -> Vec<ContentItem> {
        keys.iter()
            .map(|verb| {
                PRONOUNS.iter().fold(ContentItem::new(*verb), |item, p| {
                    item.with_answer(ContextKey::pronoun(*p), format!("{} {}", p, verb))
                })
            })
            .collect()
    }

    fn store() -> ContentStore {
        ContentStore::open_in_memory(SCHEMA_VERSION).unwrap()
    }

    /// Draw until the session lands on `target`
    fn draw(session: &mut PracticeSession, rng: &mut StdRng, target: &Combination) {
        for _ in 0..1000 {
            let card = session.next_card(rng).unwrap();
            if card.item_key == target.item_key && card.context == target.context {
                return;
            }
        }
        panic!("never drew {:?}", target);
    }

    #[tokio::test]
    async fn test_mastery_scenario() {
        let source = StaticSource::serving(Dataset::new(1u64, verbs(&["A", "B"])));
        let mut session = PracticeSession::start(
            store(),
            &source,
            PracticeMode::Conjugation,
            MasteryTracker::default(),
        )
        .await
        .unwrap();
        let mut rng = StdRng::seed_from_u64(9);

        assert!(matches!(
            session.sync_outcome(),
            Some(SyncOutcome::Updated { items: 2, .. })
        ));
        assert_eq!(session.status_line(), "12/12 combinations remaining");

        let a_je = Combination::new("A", ContextKey::pronoun("je"));
        for _ in 0..3 {
            draw(&mut session, &mut rng, &a_je);
            session.answer(true).unwrap();
        }
        assert_eq!(session.progress().remaining, 11);
        assert!(!session.rotation().contains(&a_je));

        let b_tu = Combination::new("B", ContextKey::pronoun("tu"));
        draw(&mut session, &mut rng, &b_tu);
        let report = session.answer(false).unwrap();
        assert_eq!(report.record.correct_streak, 0);
        assert_eq!(report.state, MasteryState::Active);
        assert_eq!(report.progress.remaining, 11);

        assert_eq!(session.session_stats().total, 4);
        assert_eq!(session.session_stats().accuracy(), Some(75));

        session.reset_progress().unwrap();
        assert_eq!(session.progress().remaining, 12);
        assert_eq!(session.session_stats().total, 0);
    }

    #[tokio::test]
    async fn test_offline_with_empty_store_has_no_content() {
        let source = StaticSource::offline();
        let result = PracticeSession::start(
            store(),
            &source,
            PracticeMode::Conjugation,
            MasteryTracker::default(),
        )
        .await;

        match result {
            Err(PracticeError::NoContentAvailable { hint }) => {
                assert!(hint.contains("internet connection"))
            }
            other => panic!("expected NoContentAvailable, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_offline_uses_stored_content() {
        let mut store = store();
        store
            .replace_all_content(&verbs(&["aller"]), &1u64.into())
            .unwrap();

        let source = StaticSource::offline();
        let session = PracticeSession::start(
            store,
            &source,
            PracticeMode::Conjugation,
            MasteryTracker::default(),
        )
        .await
        .unwrap();

        assert!(matches!(session.sync_outcome(), Some(SyncOutcome::Offline { .. })));
        assert_eq!(session.items().len(), 1);
        assert_eq!(session.progress().total, 6);
    }

    #[test]
    fn test_answer_requires_a_card() {
        let mut store = store();
        store
            .replace_all_content(&verbs(&["aller"]), &1u64.into())
            .unwrap();
        let mut session =
            PracticeSession::open(store, PracticeMode::Conjugation, MasteryTracker::default())
                .unwrap();

        assert!(matches!(session.answer(true), Err(PracticeError::NoCurrentCard)));
    }

    #[test]
    fn test_everything_mastered() {
        let mut store = store();
        store
            .replace_all_content(&verbs(&["aller"]), &1u64.into())
            .unwrap();
        let mut session =
            PracticeSession::open(store, PracticeMode::Conjugation, MasteryTracker::new(1))
                .unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        while session.next_card(&mut rng).is_some() {
            session.answer(true).unwrap();
        }
        assert!(session.is_complete());
        assert_eq!(session.status_line(), ALL_MASTERED_MESSAGE);
        assert!(session.next_card(&mut rng).is_none());
    }

    #[test]
    fn test_conjugation_mode_keeps_items_without_answers() {
        let mut items = verbs(&["aller"]);
        items.push(ContentItem::new("falloir"));
        let mut store = store();
        store.replace_all_content(&items, &1u64.into()).unwrap();

        let session =
            PracticeSession::open(store, PracticeMode::Conjugation, MasteryTracker::default())
                .unwrap();
        assert_eq!(session.progress().total, 2 * PRONOUNS.len());
    }

    #[test]
    fn test_tense_mode_uses_phrase_contexts() {
        let phrases = ContentItem::new("parler")
            .with_answer(ContextKey::tensed("present", "je"), "je parle")
            .with_answer(ContextKey::tensed("futur", "je"), "je parlerai");
        let mut store = store();
        store
            .replace_all_content(&[phrases], &"2024-01".into())
            .unwrap();
        let mut rng = StdRng::seed_from_u64(4);

        let mut session = PracticeSession::open(
            store,
            PracticeMode::Tenses(vec![Tense::Futur]),
            MasteryTracker::default(),
        )
        .unwrap();
        assert_eq!(session.progress().total, 6);

        let card = session.next_card(&mut rng).unwrap();
        assert_eq!(card.context.tense.as_deref(), Some("futur"));
        if card.context.pronoun == "je" {
            assert_eq!(card.expected.as_deref(), Some("je parlerai"));
        } else {
            assert_eq!(card.expected, None);
        }

        let store = session.into_store();
        assert!(matches!(
            PracticeSession::open(
                store,
                PracticeMode::Tenses(vec![Tense::Imparfait]),
                MasteryTracker::default()
            ),
            Err(PracticeError::NoContentAvailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_refresh_reloads_new_version() {
        let source = StaticSource::serving(Dataset::new(1u64, verbs(&["aller"])));
        let mut session = PracticeSession::start(
            store(),
            &source,
            PracticeMode::Conjugation,
            MasteryTracker::default(),
        )
        .await
        .unwrap();
        assert_eq!(session.progress().total, 6);

        source.set(Some(Dataset::new(2u64, verbs(&["aller", "venir"]))));
        let outcome = session.refresh(&source).await.unwrap();
        assert!(matches!(outcome, SyncOutcome::Updated { items: 2, .. }));
        assert_eq!(session.progress().total, 12);
    }
}
