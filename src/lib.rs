//! Offline-first French conjugation practice.
//!
//! The [`store`] persists content and statistics, [`dataset`] keeps content in
//! step with the remote dataset, [`mastery`] decides what is still practiced,
//! [`practice`] ties those together into a session, and [`assets`] keeps an
//! offline copy of the application shell.

pub mod assets;
pub mod config;
pub mod dataset;
pub mod mastery;
pub mod practice;
pub mod reset;
pub mod store;
