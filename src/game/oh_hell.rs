//! Oh Hell: trick-taking score keeper.
//!
//! Rounds follow a pyramid: the number of tricks rises by one each round
//! up to `max_rounds / 2`, then falls back down. In bid & tricks mode each
//! round is bid first and scored after play; the other modes skip bidding
//! and take scores directly.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::GameError;

pub const MIN_PLAYERS: usize = 3;
pub const MAX_PLAYERS: usize = 7;
pub const DECK_SIZE: usize = 52;
pub const MIN_ROUNDS: usize = 10;
pub const MAX_BASE_POINTS: u32 = 50;
pub const MIN_POINTS_PER_TRICK: u32 = 1;
pub const MAX_POINTS_PER_TRICK: u32 = 10;

pub fn max_rounds_for(player_count: usize) -> usize {
    MIN_ROUNDS.max(DECK_SIZE / player_count.max(1))
}

/// Tricks dealt in a 1-based round.
pub fn tricks_for_round(round: usize, max_rounds: usize) -> u32 {
    let peak = max_rounds / 2;
    let tricks = if round <= peak {
        round
    } else {
        (max_rounds + 1).saturating_sub(round)
    };
    tricks as u32
}

/// Score for one round: base plus per-trick points when the bid is made
/// exactly, nothing otherwise. Saturates at `u32::MAX`.
pub fn round_score(bid: u32, tricks: u32, base_points: u32, points_per_trick: u32) -> u32 {
    if bid == tricks {
        base_points.saturating_add(points_per_trick.saturating_mul(tricks))
    } else {
        0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringMode {
    /// Bid, then record tricks taken; scores are computed.
    BidTrick,
    /// +/- buttons in base and per-trick steps.
    Buttons,
    /// Free numeric entry.
    Typing,
}

impl ScoringMode {
    pub fn key(self) -> &'static str {
        match self {
            Self::BidTrick => "bidtrick",
            Self::Buttons => "buttons",
            Self::Typing => "typing",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "bidtrick" => Some(Self::BidTrick),
            "buttons" => Some(Self::Buttons),
            "typing" => Some(Self::Typing),
            _ => None,
        }
    }

    fn first_phase(self) -> Phase {
        match self {
            Self::BidTrick => Phase::Bidding,
            _ => Phase::Scoring,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub scoring_mode: ScoringMode,
    pub base_points: u32,
    pub points_per_trick: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scoring_mode: ScoringMode::BidTrick,
            base_points: 10,
            points_per_trick: 2,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), GameError> {
        if self.base_points > MAX_BASE_POINTS {
            return Err(GameError::InvalidSetting {
                name: "base points",
                value: self.base_points,
            });
        }
        if !(MIN_POINTS_PER_TRICK..=MAX_POINTS_PER_TRICK).contains(&self.points_per_trick) {
            return Err(GameError::InvalidSetting {
                name: "points per trick",
                value: self.points_per_trick,
            });
        }
        Ok(())
    }
}

/// A buttons-mode score nudge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    BaseUp,
    BaseDown,
    TrickUp,
    TrickDown,
}

impl Adjustment {
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "base_up" => Some(Self::BaseUp),
            "base_down" => Some(Self::BaseDown),
            "trick_up" => Some(Self::TrickUp),
            "trick_down" => Some(Self::TrickDown),
            _ => None,
        }
    }

    fn apply(self, score: u32, settings: &Settings) -> u32 {
        match self {
            Self::BaseUp => score.saturating_add(settings.base_points),
            Self::BaseDown => score.saturating_sub(settings.base_points),
            Self::TrickUp => score.saturating_add(settings.points_per_trick),
            Self::TrickDown => score.saturating_sub(settings.points_per_trick),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: usize,
    pub name: String,
    /// Always the sum of `round_scores`.
    pub total_score: u32,
    /// Index = round - 1. Zero-padded up to the latest round scored.
    pub round_scores: Vec<u32>,
    /// Index = round - 1.
    pub bids: Vec<Option<u32>>,
    /// Index = round - 1, parallel to `bids`.
    pub tricks_taken: Vec<Option<u32>>,
}

impl Player {
    fn new(id: usize, name: String) -> Self {
        Self {
            id,
            name,
            total_score: 0,
            round_scores: Vec::new(),
            bids: Vec::new(),
            tricks_taken: Vec::new(),
        }
    }

    /// Rounds are 1-based; round 0 has nothing recorded.
    pub fn bid(&self, round: usize) -> Option<u32> {
        self.bids.get(round.checked_sub(1)?).copied().flatten()
    }

    pub fn tricks(&self, round: usize) -> Option<u32> {
        self.tricks_taken.get(round.checked_sub(1)?).copied().flatten()
    }

    pub fn score(&self, round: usize) -> u32 {
        round
            .checked_sub(1)
            .and_then(|i| self.round_scores.get(i))
            .copied()
            .unwrap_or(0)
    }

    /// Totals saturate at `u32::MAX` rather than wrapping.
    fn set_round_score(&mut self, round: usize, score: u32) {
        set_slot(&mut self.round_scores, round, score, 0);
        self.total_score = self
            .round_scores
            .iter()
            .fold(0u32, |total, &s| total.saturating_add(s));
    }
}

fn set_slot<T: Clone>(slots: &mut Vec<T>, round: usize, value: T, fill: T) {
    if slots.len() < round {
        slots.resize(round, fill);
    }
    slots[round - 1] = value;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Setup,
    Bidding,
    Scoring,
    Results,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Bidding => "bidding",
            Self::Scoring => "scoring",
            Self::Results => "results",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OhHell {
    players: Vec<Player>,
    /// 1-based.
    current_round: usize,
    max_rounds: usize,
    tricks_this_round: u32,
    phase: Phase,
    settings: Settings,
}

impl Default for OhHell {
    fn default() -> Self {
        Self {
            players: Vec::new(),
            current_round: 1,
            max_rounds: MIN_ROUNDS,
            tricks_this_round: 1,
            phase: Phase::Setup,
            settings: Settings::default(),
        }
    }
}

impl OhHell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn current_round(&self) -> usize {
        self.current_round
    }

    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    pub fn tricks_this_round(&self) -> u32 {
        self.tricks_this_round
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_last_round(&self) -> bool {
        self.current_round >= self.max_rounds
    }

    fn require(&self, expected: Phase) -> Result<(), GameError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(GameError::WrongScreen {
                expected: expected.name(),
                actual: self.phase.name(),
            })
        }
    }

    fn player_mut(&mut self, id: usize) -> Result<&mut Player, GameError> {
        self.players
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(GameError::UnknownPlayer(id))
    }

    fn player(&self, id: usize) -> Result<&Player, GameError> {
        self.players
            .iter()
            .find(|p| p.id == id)
            .ok_or(GameError::UnknownPlayer(id))
    }

    /// Begin a session. Blank names become `Player N`.
    pub fn start_session<S: AsRef<str>>(
        &mut self,
        names: &[S],
        settings: Settings,
    ) -> Result<(), GameError> {
        self.require(Phase::Setup)?;
        let count = names.len();
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&count) {
            return Err(GameError::InvalidPlayerCount {
                count,
                min: MIN_PLAYERS,
                max: MAX_PLAYERS,
            });
        }
        settings.validate()?;

        self.players = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let name = name.as_ref().trim();
                let name = if name.is_empty() {
                    format!("Player {}", i + 1)
                } else {
                    name.to_string()
                };
                Player::new(i, name)
            })
            .collect();
        self.current_round = 1;
        self.max_rounds = max_rounds_for(count);
        self.tricks_this_round = tricks_for_round(1, self.max_rounds);
        self.settings = settings;
        self.phase = settings.scoring_mode.first_phase();
        info!(
            "oh hell: {} players, {} rounds, {} scoring",
            count,
            self.max_rounds,
            settings.scoring_mode.key()
        );
        Ok(())
    }

    // ── Bidding ────────────────────────────────────────────────────

    pub fn total_bids(&self) -> u32 {
        self.players
            .iter()
            .filter_map(|p| p.bid(self.current_round))
            .fold(0u32, |total, bid| total.saturating_add(bid))
    }

    fn players_with_bids(&self) -> usize {
        self.players
            .iter()
            .filter(|p| p.bid(self.current_round).is_some())
            .count()
    }

    /// Everyone else has bid this round and this player has not.
    pub fn is_last_bidder(&self, id: usize) -> bool {
        let Ok(player) = self.player(id) else {
            return false;
        };
        player.bid(self.current_round).is_none()
            && self.players_with_bids() + 1 == self.players.len()
    }

    /// The one bid the last bidder may not make, so that total bids never
    /// equal the tricks available.
    pub fn forbidden_bid(&self, id: usize) -> Option<u32> {
        if !self.is_last_bidder(id) {
            return None;
        }
        self.tricks_this_round.checked_sub(self.total_bids())
    }

    pub fn record_bid(&mut self, id: usize, bid: u32) -> Result<(), GameError> {
        self.require(Phase::Bidding)?;
        if self.forbidden_bid(id) == Some(bid) {
            return Err(GameError::ForbiddenBid { bid });
        }
        let round = self.current_round;
        let player = self.player_mut(id)?;
        set_slot(&mut player.bids, round, Some(bid), None);
        debug!("oh hell: player {} bids {} in round {}", id, bid, round);
        Ok(())
    }

    /// Bidding done; play the hand.
    pub fn begin_play(&mut self) -> Result<(), GameError> {
        self.require(Phase::Bidding)?;
        self.phase = Phase::Scoring;
        Ok(())
    }

    pub fn back_to_bidding(&mut self) -> Result<(), GameError> {
        self.require(Phase::Scoring)?;
        if self.settings.scoring_mode != ScoringMode::BidTrick {
            return Err(GameError::WrongMode);
        }
        self.phase = Phase::Bidding;
        Ok(())
    }

    // ── Scoring ────────────────────────────────────────────────────

    /// Bid & tricks mode: record tricks taken and recompute the score.
    /// A missing bid counts as 0.
    pub fn record_tricks_taken(&mut self, id: usize, tricks: u32) -> Result<(), GameError> {
        self.require(Phase::Scoring)?;
        if self.settings.scoring_mode != ScoringMode::BidTrick {
            return Err(GameError::WrongMode);
        }
        if tricks > self.tricks_this_round {
            return Err(GameError::TricksOutOfRange {
                tricks,
                available: self.tricks_this_round,
            });
        }
        let round = self.current_round;
        let Settings {
            base_points,
            points_per_trick,
            ..
        } = self.settings;
        let player = self.player_mut(id)?;
        set_slot(&mut player.tricks_taken, round, Some(tricks), None);
        let bid = player.bid(round).unwrap_or(0);
        player.set_round_score(round, round_score(bid, tricks, base_points, points_per_trick));
        Ok(())
    }

    /// Buttons/typing mode: set this round's score directly.
    pub fn record_direct_score(&mut self, id: usize, score: u32) -> Result<(), GameError> {
        self.require(Phase::Scoring)?;
        if self.settings.scoring_mode == ScoringMode::BidTrick {
            return Err(GameError::WrongMode);
        }
        let round = self.current_round;
        self.player_mut(id)?.set_round_score(round, score);
        Ok(())
    }

    /// Buttons mode: nudge this round's score, never below 0.
    pub fn adjust_score(&mut self, id: usize, step: Adjustment) -> Result<(), GameError> {
        if self.settings.scoring_mode != ScoringMode::Buttons {
            return Err(GameError::WrongMode);
        }
        let current = self.player(id)?.score(self.current_round);
        self.record_direct_score(id, step.apply(current, &self.settings))
    }

    pub fn advance_round(&mut self) -> Result<(), GameError> {
        self.require(Phase::Scoring)?;
        if self.is_last_round() {
            return Err(GameError::LastRound);
        }
        self.current_round += 1;
        self.tricks_this_round = tricks_for_round(self.current_round, self.max_rounds);
        self.phase = self.settings.scoring_mode.first_phase();
        debug!(
            "oh hell: round {} of {}, {} tricks",
            self.current_round, self.max_rounds, self.tricks_this_round
        );
        Ok(())
    }

    pub fn finish(&mut self) -> Result<(), GameError> {
        self.require(Phase::Scoring)?;
        if !self.is_last_round() {
            return Err(GameError::RoundsRemaining);
        }
        self.phase = Phase::Results;
        info!("oh hell: final results");
        Ok(())
    }

    /// Players by total score, highest first. Ties keep seating order.
    pub fn standings(&self) -> Vec<&Player> {
        let mut ranked: Vec<&Player> = self.players.iter().collect();
        ranked.sort_by(|a, b| b.total_score.cmp(&a.total_score));
        ranked
    }

    /// Play again: back to setup with no players.
    pub fn restart(&mut self) {
        *self = Self::default();
        debug!("oh hell: restart");
    }
}
