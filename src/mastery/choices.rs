//! Multiple-choice options for a combination

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::store::ContentItem;

use super::models::Combination;

/// Number of options shown per question
pub const CHOICE_COUNT: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceSet {
    pub options: Vec<String>,
    pub correct_index: usize,
}

impl ChoiceSet {
    pub fn is_correct(&self, index: usize) -> bool {
        index == self.correct_index
    }

    pub fn correct_answer(&self) -> &str {
        &self.options[self.correct_index]
    }
}

/// Build the correct answer plus up to two distractors.
///
/// Distractors come from other items' answers for the same context so they look
/// plausible; when there are too few, any other answer is used. Returns `None`
/// if the combination has no expected answer.
pub fn build_choices<R: Rng + ?Sized>(
    items: &[ContentItem],
    combination: &Combination,
    rng: &mut R,
) -> Option<ChoiceSet> {
    let item = items.iter().find(|i| i.key == combination.item_key)?;
    let correct = item.answer_for(&combination.context)?.expected.clone();

    let mut options = vec![correct.clone()];

    let mut same_context: Vec<&str> = items
        .iter()
        .filter(|other| other.key != item.key)
        .filter_map(|other| other.answer_for(&combination.context))
        .map(|answer| answer.expected.as_str())
        .collect();
    same_context.shuffle(rng);
    push_distinct(&mut options, same_context);

    if options.len() < CHOICE_COUNT {
        let mut fallback: Vec<&str> = items
            .iter()
            .flat_map(|other| other.answers.iter())
            .map(|answer| answer.expected.as_str())
            .collect();
        fallback.shuffle(rng);
        push_distinct(&mut options, fallback);
    }

    options.shuffle(rng);
    let correct_index = options.iter().position(|o| *o == correct)?;

    Some(ChoiceSet {
        options,
        correct_index,
    })
}

fn push_distinct(options: &mut Vec<String>, candidates: Vec<&str>) {
    for candidate in candidates {
        if options.len() >= CHOICE_COUNT {
            break;
        }
        if !options.iter().any(|o| o == candidate) {
            options.push(candidate.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ContextKey;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn verb(key: &str, je: &str, tu: &str) -> ContentItem {
        ContentItem::new(key)
            .with_answer(ContextKey::pronoun("je"), je)
            .with_answer(ContextKey::pronoun("tu"), tu)
    }

    #[test]
    fn test_distractors_share_context() {
        let items = vec![
            verb("aller", "vais", "vas"),
            verb("avoir", "ai", "as"),
            verb("être", "suis", "es"),
            verb("faire", "fais", "fais"),
        ];
        let combo = Combination::new("aller", ContextKey::pronoun("je"));

        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let set = build_choices(&items, &combo, &mut rng).unwrap();
            assert_eq!(set.options.len(), CHOICE_COUNT);
            assert_eq!(set.correct_answer(), "vais");
            for option in &set.options {
                assert!(["vais", "ai", "suis", "fais"].contains(&option.as_str()));
            }
        }
    }

    #[test]
    fn test_falls_back_to_other_contexts() {
        let items = vec![verb("aller", "vais", "vas"), verb("avoir", "ai", "as")];
        let combo = Combination::new("aller", ContextKey::pronoun("je"));
        let mut rng = StdRng::seed_from_u64(7);

        let set = build_choices(&items, &combo, &mut rng).unwrap();
        assert_eq!(set.options.len(), CHOICE_COUNT);
        assert!(set.options.contains(&"ai".to_string()));
        assert!(set.is_correct(set.correct_index));
    }

    #[test]
    fn test_no_duplicate_options() {
        // "fais" is the answer for both je and tu
        let items = vec![verb("faire", "fais", "fais"), verb("taire", "tais", "tais")];
        let combo = Combination::new("faire", ContextKey::pronoun("je"));
        let mut rng = StdRng::seed_from_u64(3);

        let set = build_choices(&items, &combo, &mut rng).unwrap();
        assert_eq!(set.options.len(), 2);
    }

    #[test]
    fn test_missing_answer_has_no_choices() {
        let items = vec![verb("aller", "vais", "vas")];
        let combo = Combination::new("aller", ContextKey::pronoun("nous"));
        let mut rng = StdRng::seed_from_u64(0);
        assert!(build_choices(&items, &combo, &mut rng).is_none());
    }
}
