//! Practice sessions driven by a controller
//!
//! This module provides:
//! - Practice modes (conjugation, or selected tenses) and their context keys
//! - The session object tying the store, rotation and counters together

mod mode;
mod session;

pub use mode::{parse_tenses, PracticeMode, Tense, PRONOUNS};
pub use session::{
    AnswerReport, Card, PracticeError, PracticeSession, Progress, ALL_MASTERED_MESSAGE,
};
