//! Validation errors shared by all three game engines.
//!
//! Every engine operation validates its input before touching state, so an
//! `Err` always means "nothing changed". Route handlers render the message
//! above the unchanged screen.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("Please select exactly {required} characters ({selected} selected)")]
    IncompleteSelection { selected: usize, required: usize },
    #[error("Please enter a custom item or select a different category!")]
    MissingCustomItem,
    #[error("Cannot bid {bid}: total bids would equal the tricks available")]
    ForbiddenBid { bid: u32 },
    #[error("{count} players is not supported (choose {min}-{max})")]
    InvalidPlayerCount { count: usize, min: usize, max: usize },
    #[error("invalid {name}: {value}")]
    InvalidSetting { name: &'static str, value: u32 },
    #[error("{tricks} tricks is more than the {available} dealt this round")]
    TricksOutOfRange { tricks: u32, available: u32 },
    #[error("unknown character slot: {0}")]
    UnknownSlot(String),
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error("unknown player: {0}")]
    UnknownPlayer(usize),
    #[error("flip the card first")]
    CardNotFlipped,
    #[error("cast a vote first")]
    NoVoteCast,
    #[error("rounds remain before the final results")]
    RoundsRemaining,
    #[error("this is already the last round")]
    LastRound,
    #[error("not available on the {actual} screen (needs {expected})")]
    WrongScreen {
        expected: &'static str,
        actual: &'static str,
    },
    #[error("not available in this scoring mode")]
    WrongMode,
}
