//! Wire format of the remote dataset and its conversion into content items

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::store::{ContentItem, ContextKey, DatasetVersion, ItemAnswer};

use super::source::FetchError;

/// One verb with its present-tense conjugations
#[derive(Debug, Clone, Deserialize)]
pub struct VerbRecord {
    pub infinitive: String,
    #[serde(default)]
    pub english: Option<String>,
    pub conjugations: BTreeMap<String, String>,
}

/// One phrase exercising a verb in a given tense and person
#[derive(Debug, Clone, Deserialize)]
pub struct PhraseRecord {
    pub verb: String,
    pub english: String,
    pub pronoun: String,
    pub tense: String,
    pub french: String,
}

/// Raw dataset descriptor as served by the remote endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetPayload {
    pub version: Option<DatasetVersion>,
    #[serde(default)]
    pub verbs: Option<Vec<VerbRecord>>,
    #[serde(default)]
    pub phrases: Option<Vec<PhraseRecord>>,
}

/// A validated dataset ready to be written to the store
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub version: DatasetVersion,
    pub items: Vec<ContentItem>,
}

impl Dataset {
    pub fn new(version: impl Into<DatasetVersion>, items: Vec<ContentItem>) -> Self {
        Self {
            version: version.into(),
            items,
        }
    }

    /// Parse and validate a dataset body
    pub fn from_slice(bytes: &[u8]) -> Result<Self, FetchError> {
        let payload: DatasetPayload =
            serde_json::from_slice(bytes).map_err(|e| FetchError::Malformed(e.to_string()))?;
        payload.validate()
    }
}

impl DatasetPayload {
    pub fn validate(self) -> Result<Dataset, FetchError> {
        let version = self
            .version
            .ok_or_else(|| FetchError::Malformed("missing version".to_string()))?;

        let items = match (self.verbs, self.phrases) {
            (Some(verbs), None) => verbs_to_items(verbs)?,
            (None, Some(phrases)) => phrases_to_items(phrases)?,
            (Some(_), Some(_)) => {
                return Err(FetchError::Malformed(
                    "dataset carries both verbs and phrases".to_string(),
                ))
            }
            (None, None) => {
                return Err(FetchError::Malformed(
                    "dataset carries neither verbs nor phrases".to_string(),
                ))
            }
        };

        Ok(Dataset { version, items })
    }
}

fn verbs_to_items(verbs: Vec<VerbRecord>) -> Result<Vec<ContentItem>, FetchError> {
    verbs
        .into_iter()
        .map(|verb| {
            if verb.infinitive.trim().is_empty() {
                return Err(FetchError::Malformed("verb with empty infinitive".to_string()));
            }

            let answers = verb
                .conjugations
                .into_iter()
                .map(|(pronoun, form)| ItemAnswer {
                    context: ContextKey::pronoun(pronoun),
                    expected: form,
                    prompt: None,
                })
                .collect();

            Ok(ContentItem {
                key: verb.infinitive,
                translation: verb.english,
                answers,
            })
        })
        .collect()
}

/// Group phrases by verb, preserving first-seen order.
fn phrases_to_items(phrases: Vec<PhraseRecord>) -> Result<Vec<ContentItem>, FetchError> {
    let mut items: Vec<ContentItem> = Vec::new();

    for phrase in phrases {
        if phrase.verb.trim().is_empty() || phrase.tense.trim().is_empty() {
            return Err(FetchError::Malformed("phrase without verb or tense".to_string()));
        }

        let answer = ItemAnswer {
            context: ContextKey::tensed(phrase.tense, phrase.pronoun),
            expected: phrase.french,
            prompt: Some(phrase.english),
        };

        match items.iter_mut().find(|item| item.key == phrase.verb) {
            Some(item) => {
                if item.answer_for(&answer.context).is_none() {
                    item.answers.push(answer);
                }
            }
            None => items.push(ContentItem {
                key: phrase.verb,
                translation: None,
                answers: vec![answer],
            }),
        }
    }

    Ok(items)
}
