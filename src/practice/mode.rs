use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::store::ContextKey;

use super::session::PracticeError;

/// Subject pronouns, in display order
pub const PRONOUNS: [&str; 6] = ["je", "tu", "il", "nous", "vous", "ils"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tense {
    Present,
    PasseCompose,
    Imparfait,
    Futur,
    Conditionnel,
}

impl Tense {
    pub const ALL: [Tense; 5] = [
        Tense::Present,
        Tense::PasseCompose,
        Tense::Imparfait,
        Tense::Futur,
        Tense::Conditionnel,
    ];

    /// Key used by phrase datasets
    pub fn key(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::PasseCompose => "passe_compose",
            Self::Imparfait => "imparfait",
            Self::Futur => "futur",
            Self::Conditionnel => "conditionnel",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Present => "Présent",
            Self::PasseCompose => "Passé Composé",
            Self::Imparfait => "Imparfait",
            Self::Futur => "Futur Simple",
            Self::Conditionnel => "Conditionnel",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.key() == key)
    }
}

impl fmt::Display for Tense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Tense {
    type Err = PracticeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s.trim()).ok_or_else(|| PracticeError::InvalidTense(s.trim().to_string()))
    }
}

/// Parse a comma-separated tense list such as `present,futur`.
///
/// Duplicates are dropped; an empty selection is rejected.
pub fn parse_tenses(list: &str) -> Result<Vec<Tense>, PracticeError> {
    let mut tenses = Vec::new();
    for part in list.split(',').filter(|p| !p.trim().is_empty()) {
        let tense: Tense = part.parse()?;
        if !tenses.contains(&tense) {
            tenses.push(tense);
        }
    }
    if tenses.is_empty() {
        return Err(PracticeError::InvalidTense("no tense selected".to_string()));
    }
    Ok(tenses)
}

/// Which context keys a session practices
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PracticeMode {
    /// Verb × pronoun
    Conjugation,
    /// Phrase × tense × pronoun, restricted to the selected tenses
    Tenses(Vec<Tense>),
}

impl PracticeMode {
    pub fn context_keys(&self) -> Vec<ContextKey> {
        match self {
            Self::Conjugation => PRONOUNS.iter().map(|p| ContextKey::pronoun(*p)).collect(),
            Self::Tenses(tenses) => tenses
                .iter()
                .flat_map(|tense| {
                    PRONOUNS
                        .iter()
                        .map(move |p| ContextKey::tensed(tense.key(), *p))
                })
                .collect(),
        }
    }
}

impl fmt::Display for PracticeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conjugation => f.write_str("Conjugation"),
            Self::Tenses(tenses) => {
                let names: Vec<&str> = tenses.iter().map(|t| t.display_name()).collect();
                write!(f, "Tenses ({})", names.join(", "))
            }
        }
    }
}
