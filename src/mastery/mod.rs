//! Mastery tracking for verb × context combinations
//!
//! This module provides:
//! - The mastery predicate (three consecutive correct answers)
//! - Rotation filtering and uniform random selection
//! - Outcome recording and reset against the content store
//! - Multiple-choice option generation and per-run counters

pub mod choices;
pub mod models;
mod tracker;

pub use choices::{build_choices, ChoiceSet, CHOICE_COUNT};
pub use models::*;
pub use tracker::{compute_rotation, MasteryTracker};
