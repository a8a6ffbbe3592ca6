//! Global session container.
//!
//! Uses `thread_local!` + `RefCell` for safe mutable access in single-threaded
//! WASM. The Web Worker keeps the module alive, so each game's state persists
//! across `handle_request` calls until the page is reloaded. Nothing is
//! written to storage.

use serde::Serialize;
use std::cell::RefCell;

use crate::game::avalon::Avalon;
use crate::game::imposter::Imposter;
use crate::game::oh_hell::OhHell;
use crate::game::rng::GameRng;

/// All three engines plus the RNG they draw from.
#[derive(Debug, Default)]
pub struct Sessions {
    pub avalon: Avalon,
    pub imposter: Imposter,
    pub oh_hell: OhHell,
    pub rng: GameRng,
}

thread_local! {
    static SESSIONS: RefCell<Sessions> = RefCell::new(Sessions::default());
}

/// Execute a closure with read access to the sessions.
pub fn with_sessions<F, R>(f: F) -> R
where
    F: FnOnce(&Sessions) -> R,
{
    SESSIONS.with(|s| f(&s.borrow()))
}

/// Execute a closure with mutable access to the sessions.
pub fn with_sessions_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut Sessions) -> R,
{
    SESSIONS.with(|s| f(&mut s.borrow_mut()))
}

/// Replace every session (tests, full reset).
pub fn replace_sessions(new_sessions: Sessions) {
    SESSIONS.with(|s| {
        *s.borrow_mut() = new_sessions;
    });
}

/// Reseed the shared RNG so subsequent draws are reproducible.
pub fn reseed(seed: u64) {
    with_sessions_mut(|s| s.rng = GameRng::new(seed));
}

/// Serialize one part of the sessions as JSON (debug snapshot).
pub fn export_json<F, T>(pick: F) -> String
where
    F: FnOnce(&Sessions) -> &T,
    T: Serialize,
{
    with_sessions(|s| serde_json::to_string(pick(s)).unwrap_or_else(|_| "{}".to_string()))
}
