//! Game engines. One screen machine per game, plus the shared RNG and the
//! in-memory session store.
//!
//! Engines know nothing about HTML. Each exposes its screen/phase tag, a
//! read-only view of its record, and one method per user action; every
//! method validates before mutating, so an `Err` leaves the game untouched.

pub mod avalon;
pub mod categories;
pub mod imposter;
pub mod oh_hell;
pub mod rng;
pub mod state;
