//! Avalon: hidden-role engine.
//!
//! Screen flow:
//!
//! ```text
//! setup → characterReveal → gameBoard → questVoting → questReveal → questResult
//!                               ↑                                       │
//!                               └──────────── (no side at 3) ───────────┤
//!                                                                       ↓
//!                                                                    winner
//! ```
//!
//! The device is passed hand to hand, so pacing matters: identities and
//! vote cards are hidden until flipped, and vote disclosure runs on timers.
//! Timers are never run here. A transition that wants one returns a
//! [`Scheduled`] carrying the engine's current generation, and the caller
//! hands it back to [`Avalon::fire`] when it elapses. `new_game` bumps the
//! generation, which turns every in-flight timer into a no-op.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::game::rng::GameRng;

pub const MIN_PLAYERS: usize = 5;
pub const MAX_PLAYERS: usize = 10;
pub const MISSIONS: usize = 5;
pub const WINS_NEEDED: usize = 3;

/// Evil seats per player count, indexed by `count - MIN_PLAYERS`.
const EVIL_QUOTA: [usize; 6] = [2, 2, 3, 3, 3, 4];

/// Team size per mission, indexed by `count - MIN_PLAYERS` then `mission - 1`.
const TEAM_SIZES: [[usize; MISSIONS]; 6] = [
    [2, 3, 2, 3, 3],
    [2, 3, 4, 3, 4],
    [2, 3, 3, 4, 4],
    [3, 4, 4, 5, 5],
    [3, 4, 4, 5, 5],
    [3, 4, 4, 5, 5],
];

const _: () = {
    assert!(EVIL_QUOTA.len() == MAX_PLAYERS - MIN_PLAYERS + 1);
    assert!(TEAM_SIZES.len() == MAX_PLAYERS - MIN_PLAYERS + 1);
    let mut i = 0;
    while i < EVIL_QUOTA.len() {
        let count = MIN_PLAYERS + i;
        assert!(EVIL_QUOTA[i] > 0 && EVIL_QUOTA[i] < count);
        let mut m = 0;
        while m < MISSIONS {
            assert!(TEAM_SIZES[i][m] > 0 && TEAM_SIZES[i][m] <= count);
            m += 1;
        }
        i += 1;
    }
};

fn table_row(player_count: usize) -> Option<usize> {
    (MIN_PLAYERS..=MAX_PLAYERS)
        .contains(&player_count)
        .then(|| player_count - MIN_PLAYERS)
}

/// Evil seats for a player count, `None` outside 5..=10.
pub fn evil_quota(player_count: usize) -> Option<usize> {
    table_row(player_count).map(|row| EVIL_QUOTA[row])
}

/// Good seats for a player count, `None` outside 5..=10.
pub fn good_quota(player_count: usize) -> Option<usize> {
    evil_quota(player_count).map(|evil| player_count - evil)
}

/// Team size for a 1-based mission.
pub fn team_size(player_count: usize, mission: usize) -> Option<usize> {
    let row = table_row(player_count)?;
    TEAM_SIZES[row].get(mission.checked_sub(1)?).copied()
}

/// Fail cards needed to sink a mission.
///
/// Mission 4 with 7+ players tolerates a single fail. This is the variant
/// the group played with; other rule sets differ.
pub fn fails_needed(player_count: usize, mission: usize) -> usize {
    if mission == 4 && player_count >= 7 { 2 } else { 1 }
}

pub fn mission_passes(player_count: usize, mission: usize, fail_votes: usize) -> bool {
    fail_votes < fails_needed(player_count, mission)
}

/// Uniform Fisher–Yates shuffle into a new vector.
pub fn shuffled<T: Clone>(items: &[T], rng: &mut GameRng) -> Vec<T> {
    let mut out = items.to_vec();
    rng.shuffle(&mut out);
    out
}

// ── Character slots ────────────────────────────────────────────────

/// A selectable seat on the setup screen. Several seats may share an
/// archetype (six Loyal Servants, four Minions); `id` tells them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub is_evil: bool,
}

const fn good(id: &'static str, name: &'static str, description: &'static str) -> SlotDef {
    SlotDef { id, name, description, is_evil: false }
}

const fn evil(id: &'static str, name: &'static str, description: &'static str) -> SlotDef {
    SlotDef { id, name, description, is_evil: true }
}

const LOYAL: &str = "No special knowledge";
const MINION: &str = "Regular evil player";

pub const SLOTS: [SlotDef; 16] = [
    good("merlin", "Merlin", "Knows all evil players except Mordred"),
    good("percival", "Percival", "Knows who Merlin and Morgana are"),
    good("loyal0", "Loyal Servant", LOYAL),
    good("loyal1", "Loyal Servant", LOYAL),
    good("loyal2", "Loyal Servant", LOYAL),
    good("loyal3", "Loyal Servant", LOYAL),
    good("loyal4", "Loyal Servant", LOYAL),
    good("loyal5", "Loyal Servant", LOYAL),
    evil("mordred", "Mordred", "Unknown to Merlin"),
    evil("morgana", "Morgana", "Appears as Merlin to Percival"),
    evil("assassin", "Assassin", "Can assassinate Merlin at the end"),
    evil("oberon", "Oberon", "Unknown to other evil players"),
    evil("minion0", "Minion", MINION),
    evil("minion1", "Minion", MINION),
    evil("minion2", "Minion", MINION),
    evil("minion3", "Minion", MINION),
];

pub fn find_slot(id: &str) -> Option<&'static SlotDef> {
    SLOTS.iter().find(|s| s.id == id)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub description: String,
    pub is_evil: bool,
    /// Slot key, e.g. `loyal3`. Identity is the slot, not the name.
    pub id: String,
}

impl From<&SlotDef> for Character {
    fn from(slot: &SlotDef) -> Self {
        Self {
            name: slot.name.to_string(),
            description: slot.description.to_string(),
            is_evil: slot.is_evil,
            id: slot.id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Team {
    Good,
    Evil,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vote {
    Pass,
    Fail,
}

impl Vote {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pass" => Some(Self::Pass),
            "fail" => Some(Self::Fail),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Screen {
    Setup,
    CharacterReveal,
    GameBoard,
    QuestVoting,
    QuestReveal,
    QuestResult,
    Winner,
}

impl Screen {
    pub fn name(self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::CharacterReveal => "characterReveal",
            Self::GameBoard => "gameBoard",
            Self::QuestVoting => "questVoting",
            Self::QuestReveal => "questReveal",
            Self::QuestResult => "questResult",
            Self::Winner => "winner",
        }
    }
}

// ── Timers ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerEvent {
    /// Show the next player's card once the previous one has flipped back.
    SettleReveal,
    /// Disclose one more mission vote.
    RevealNextVote,
    /// All votes disclosed; move to the result.
    ShowResult,
}

impl TimerEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SettleReveal => "settle_reveal",
            Self::RevealNextVote => "reveal_next_vote",
            Self::ShowResult => "show_result",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "settle_reveal" => Some(Self::SettleReveal),
            "reveal_next_vote" => Some(Self::RevealNextVote),
            "show_result" => Some(Self::ShowResult),
            _ => None,
        }
    }
}

/// A timer the caller should start. Hand `event` and `generation` back to
/// [`Avalon::fire`] after `delay_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scheduled {
    pub event: TimerEvent,
    pub delay_ms: u32,
    pub generation: u64,
}

/// UI pacing in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pacing {
    pub settle_ms: u32,
    pub vote_cadence_ms: u32,
    pub result_delay_ms: u32,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            settle_ms: 300,
            vote_cadence_ms: 1500,
            result_delay_ms: 2000,
        }
    }
}

// ── Game record ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub player_count: usize,
    pub selected_characters: Vec<Character>,
    /// Shuffled permutation of `selected_characters`, one per seat.
    pub players: Vec<Character>,
    pub current_player_index: usize,
    /// 1-based.
    pub current_mission_index: usize,
    /// `true` = mission passed.
    pub mission_outcomes: Vec<bool>,
    pub current_voter_index: usize,
    pub mission_votes: Vec<Vote>,
    pub mission_slots: Vec<Option<Character>>,
}

impl Default for GameRecord {
    fn default() -> Self {
        Self {
            player_count: 0,
            selected_characters: Vec::new(),
            players: Vec::new(),
            current_player_index: 0,
            current_mission_index: 1,
            mission_outcomes: Vec::new(),
            current_voter_index: 0,
            mission_votes: Vec::new(),
            mission_slots: Vec::new(),
        }
    }
}

impl GameRecord {
    pub fn selected_on(&self, team: Team) -> usize {
        let evil = team == Team::Evil;
        self.selected_characters
            .iter()
            .filter(|c| c.is_evil == evil)
            .count()
    }

    pub fn wins(&self, team: Team) -> usize {
        let passed = team == Team::Good;
        self.mission_outcomes
            .iter()
            .filter(|&&o| o == passed)
            .count()
    }

    pub fn fail_votes(&self) -> usize {
        self.mission_votes.iter().filter(|&&v| v == Vote::Fail).count()
    }

    pub fn pass_votes(&self) -> usize {
        self.mission_votes.iter().filter(|&&v| v == Vote::Pass).count()
    }
}

// ── Engine ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Avalon {
    screen: Screen,
    record: GameRecord,
    card_flipped: bool,
    settling: bool,
    vote_card_flipped: bool,
    revealing: bool,
    revealed_votes: usize,
    generation: u64,
    pacing: Pacing,
}

impl Default for Avalon {
    fn default() -> Self {
        Self::with_pacing(Pacing::default())
    }
}

impl Avalon {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pacing(pacing: Pacing) -> Self {
        Self {
            screen: Screen::Setup,
            record: GameRecord::default(),
            card_flipped: false,
            settling: false,
            vote_card_flipped: false,
            revealing: false,
            revealed_votes: 0,
            generation: 0,
            pacing,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn record(&self) -> &GameRecord {
        &self.record
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    pub fn card_flipped(&self) -> bool {
        self.card_flipped
    }

    pub fn vote_card_flipped(&self) -> bool {
        self.vote_card_flipped
    }

    pub fn is_revealing(&self) -> bool {
        self.revealing
    }

    fn require(&self, expected: Screen) -> Result<(), GameError> {
        if self.screen == expected {
            Ok(())
        } else {
            Err(GameError::WrongScreen {
                expected: expected.name(),
                actual: self.screen.name(),
            })
        }
    }

    fn schedule(&self, event: TimerEvent, delay_ms: u32) -> Scheduled {
        Scheduled {
            event,
            delay_ms,
            generation: self.generation,
        }
    }

    // ── Setup ──────────────────────────────────────────────────────

    /// Choose the table size. Clears any character selection.
    pub fn select_player_count(&mut self, count: usize) -> Result<(), GameError> {
        self.require(Screen::Setup)?;
        if table_row(count).is_none() {
            return Err(GameError::InvalidPlayerCount {
                count,
                min: MIN_PLAYERS,
                max: MAX_PLAYERS,
            });
        }
        self.record.player_count = count;
        self.record.selected_characters.clear();
        debug!("avalon: {} players", count);
        Ok(())
    }

    pub fn is_selected(&self, slot_id: &str) -> bool {
        self.record
            .selected_characters
            .iter()
            .any(|c| c.id == slot_id)
    }

    /// Toggle a character slot. Returns whether the slot is selected
    /// afterwards. Adding to a team that is already at quota is a no-op.
    pub fn toggle_character_slot(&mut self, slot_id: &str) -> Result<bool, GameError> {
        self.require(Screen::Setup)?;
        let slot = find_slot(slot_id).ok_or_else(|| GameError::UnknownSlot(slot_id.to_string()))?;

        if self.is_selected(slot_id) {
            self.record.selected_characters.retain(|c| c.id != slot_id);
            return Ok(false);
        }

        let (team, quota) = if slot.is_evil {
            (Team::Evil, evil_quota(self.record.player_count))
        } else {
            (Team::Good, good_quota(self.record.player_count))
        };
        match quota {
            Some(q) if self.record.selected_on(team) < q => {
                self.record.selected_characters.push(Character::from(slot));
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Shuffle the selection into seats and start the reveal round.
    pub fn start_game(&mut self, rng: &mut GameRng) -> Result<(), GameError> {
        self.require(Screen::Setup)?;
        let required = self.record.player_count;
        let selected = self.record.selected_characters.len();
        if table_row(required).is_none() || selected != required {
            return Err(GameError::IncompleteSelection { selected, required });
        }

        self.record.players = shuffled(&self.record.selected_characters, rng);
        self.record.current_player_index = 0;
        self.card_flipped = false;
        self.settling = false;
        self.screen = Screen::CharacterReveal;
        info!("avalon: game started with {} players", required);
        Ok(())
    }

    // ── Character reveal ───────────────────────────────────────────

    /// Flip the current player's card face up. Ignored while the previous
    /// card is still settling.
    pub fn flip_card(&mut self) -> Result<(), GameError> {
        self.require(Screen::CharacterReveal)?;
        if !self.settling {
            self.card_flipped = true;
        }
        Ok(())
    }

    /// The identity currently face up, if any.
    pub fn visible_character(&self) -> Option<&Character> {
        if self.screen != Screen::CharacterReveal || !self.card_flipped || self.settling {
            return None;
        }
        self.record.players.get(self.record.current_player_index)
    }

    /// Hand the device on. Flips the card back and schedules the settle
    /// timer; after the last player it moves to the board instead.
    pub fn advance_reveal(&mut self) -> Result<Option<Scheduled>, GameError> {
        self.require(Screen::CharacterReveal)?;
        if self.settling {
            return Ok(None);
        }
        if !self.card_flipped {
            return Err(GameError::CardNotFlipped);
        }

        self.card_flipped = false;
        if self.record.current_player_index + 1 < self.record.player_count {
            self.settling = true;
            Ok(Some(self.schedule(TimerEvent::SettleReveal, self.pacing.settle_ms)))
        } else {
            self.screen = Screen::GameBoard;
            debug!("avalon: all identities revealed");
            Ok(None)
        }
    }

    // ── Missions ───────────────────────────────────────────────────

    pub fn current_team_size(&self) -> Option<usize> {
        team_size(self.record.player_count, self.record.current_mission_index)
    }

    pub fn start_mission(&mut self) -> Result<(), GameError> {
        self.require(Screen::GameBoard)?;
        let size = self
            .current_team_size()
            .ok_or(GameError::InvalidPlayerCount {
                count: self.record.player_count,
                min: MIN_PLAYERS,
                max: MAX_PLAYERS,
            })?;

        self.record.mission_slots = vec![None; size];
        self.record.current_voter_index = 0;
        self.record.mission_votes.clear();
        self.vote_card_flipped = false;
        self.screen = Screen::QuestVoting;
        debug!(
            "avalon: mission {} needs {} members",
            self.record.current_mission_index, size
        );
        Ok(())
    }

    pub fn flip_vote_card(&mut self) -> Result<(), GameError> {
        self.require(Screen::QuestVoting)?;
        self.vote_card_flipped = true;
        Ok(())
    }

    /// The vote the current voter has cast so far.
    pub fn current_vote(&self) -> Option<Vote> {
        self.record
            .mission_votes
            .get(self.record.current_voter_index)
            .copied()
    }

    /// Cast (or change) the current voter's vote.
    pub fn cast_vote(&mut self, vote: Vote) -> Result<(), GameError> {
        self.require(Screen::QuestVoting)?;
        if !self.vote_card_flipped {
            return Err(GameError::CardNotFlipped);
        }
        let voter = self.record.current_voter_index;
        match self.record.mission_votes.get_mut(voter) {
            Some(existing) => *existing = vote,
            None => self.record.mission_votes.push(vote),
        }
        Ok(())
    }

    pub fn advance_voter(&mut self) -> Result<(), GameError> {
        self.require(Screen::QuestVoting)?;
        if self.current_vote().is_none() {
            return Err(GameError::NoVoteCast);
        }

        self.vote_card_flipped = false;
        if self.record.current_voter_index + 1 < self.record.mission_slots.len() {
            self.record.current_voter_index += 1;
        } else {
            self.revealed_votes = 0;
            self.revealing = false;
            self.screen = Screen::QuestReveal;
            debug!("avalon: all {} votes cast", self.record.mission_votes.len());
        }
        Ok(())
    }

    // ── Vote disclosure ────────────────────────────────────────────

    /// Votes disclosed so far, in casting order.
    pub fn revealed_votes(&self) -> &[Vote] {
        let n = self.revealed_votes.min(self.record.mission_votes.len());
        &self.record.mission_votes[..n]
    }

    pub fn start_vote_reveal(&mut self) -> Result<Option<Scheduled>, GameError> {
        self.require(Screen::QuestReveal)?;
        if self.revealing {
            return Ok(None);
        }
        self.revealing = true;
        self.revealed_votes = 0;
        Ok(Some(self.schedule(
            TimerEvent::RevealNextVote,
            self.pacing.vote_cadence_ms,
        )))
    }

    /// The timer the current state is waiting on, if any. Lets a fresh render
    /// pick pacing back up after the page has been redrawn.
    pub fn pending_timer(&self) -> Option<Scheduled> {
        match self.screen {
            Screen::CharacterReveal if self.settling => {
                Some(self.schedule(TimerEvent::SettleReveal, self.pacing.settle_ms))
            }
            Screen::QuestReveal if self.revealing => {
                if self.revealed_votes < self.record.mission_votes.len() {
                    Some(self.schedule(TimerEvent::RevealNextVote, self.pacing.vote_cadence_ms))
                } else {
                    Some(self.schedule(TimerEvent::ShowResult, self.pacing.result_delay_ms))
                }
            }
            _ => None,
        }
    }

    /// Deliver an elapsed timer. Stale generations and events the current
    /// screen no longer expects are dropped.
    pub fn fire(&mut self, event: TimerEvent, generation: u64) -> Option<Scheduled> {
        if generation != self.generation {
            debug!(
                "avalon: dropping stale {} (generation {} != {})",
                event.as_str(),
                generation,
                self.generation
            );
            return None;
        }

        let total = self.record.mission_votes.len();
        match event {
            TimerEvent::SettleReveal
                if self.screen == Screen::CharacterReveal && self.settling =>
            {
                self.settling = false;
                self.record.current_player_index += 1;
                None
            }
            TimerEvent::RevealNextVote
                if self.screen == Screen::QuestReveal
                    && self.revealing
                    && self.revealed_votes < total =>
            {
                self.revealed_votes += 1;
                if self.revealed_votes == total {
                    Some(self.schedule(TimerEvent::ShowResult, self.pacing.result_delay_ms))
                } else {
                    Some(self.schedule(TimerEvent::RevealNextVote, self.pacing.vote_cadence_ms))
                }
            }
            TimerEvent::ShowResult
                if self.screen == Screen::QuestReveal
                    && self.revealing
                    && self.revealed_votes == total =>
            {
                self.enter_result();
                None
            }
            _ => {
                debug!(
                    "avalon: ignoring {} on {}",
                    event.as_str(),
                    self.screen.name()
                );
                None
            }
        }
    }

    /// The only place an outcome is recorded: entry into questResult.
    fn enter_result(&mut self) {
        let passed = mission_passes(
            self.record.player_count,
            self.record.current_mission_index,
            self.record.fail_votes(),
        );
        self.record.mission_outcomes.push(passed);
        self.revealing = false;
        self.screen = Screen::QuestResult;
        info!(
            "avalon: mission {} {} with {} fail vote(s)",
            self.record.current_mission_index,
            if passed { "passed" } else { "failed" },
            self.record.fail_votes()
        );
    }

    /// Outcome of the mission on the result screen.
    pub fn last_outcome(&self) -> Option<bool> {
        match self.screen {
            Screen::QuestResult | Screen::Winner => self.record.mission_outcomes.last().copied(),
            _ => None,
        }
    }

    pub fn winner(&self) -> Option<Team> {
        if self.record.wins(Team::Good) >= WINS_NEEDED {
            Some(Team::Good)
        } else if self.record.wins(Team::Evil) >= WINS_NEEDED {
            Some(Team::Evil)
        } else {
            None
        }
    }

    pub fn continue_after_result(&mut self) -> Result<(), GameError> {
        self.require(Screen::QuestResult)?;
        if let Some(team) = self.winner() {
            self.screen = Screen::Winner;
            info!("avalon: {:?} wins", team);
        } else {
            self.record.current_mission_index += 1;
            self.screen = Screen::GameBoard;
        }
        Ok(())
    }

    /// Back to setup. Any timer scheduled before this call becomes a no-op.
    pub fn new_game(&mut self) {
        let generation = self.generation + 1;
        *self = Self::with_pacing(self.pacing);
        self.generation = generation;
        debug!("avalon: new game (generation {})", generation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Select the first quota's worth of slots on each team.
    fn fill_selection(game: &mut Avalon, count: usize) {
        game.select_player_count(count).unwrap();
        let evil = evil_quota(count).unwrap();
        let good = count - evil;
        for slot in SLOTS.iter().filter(|s| s.is_evil).take(evil) {
            assert!(game.toggle_character_slot(slot.id).unwrap());
        }
        for slot in SLOTS.iter().filter(|s| !s.is_evil).take(good) {
            assert!(game.toggle_character_slot(slot.id).unwrap());
        }
    }

    /// Run the game to the board.
    fn at_board(count: usize) -> Avalon {
        let mut game = Avalon::new();
        fill_selection(&mut game, count);
        game.start_game(&mut GameRng::new(11)).unwrap();
        loop {
            game.flip_card().unwrap();
            match game.advance_reveal().unwrap() {
                Some(t) => assert!(game.fire(t.event, t.generation).is_none()),
                None => break,
            }
        }
        assert_eq!(game.screen(), Screen::GameBoard);
        game
    }

    /// Play one mission with the given number of fail votes, through to
    /// the result screen.
    fn play_mission(game: &mut Avalon, fails: usize) {
        game.start_mission().unwrap();
        let size = game.record().mission_slots.len();
        for voter in 0..size {
            game.flip_vote_card().unwrap();
            let vote = if voter < fails { Vote::Fail } else { Vote::Pass };
            game.cast_vote(vote).unwrap();
            game.advance_voter().unwrap();
        }
        let mut next = game.start_vote_reveal().unwrap();
        while let Some(t) = next {
            next = game.fire(t.event, t.generation);
        }
        assert_eq!(game.screen(), Screen::QuestResult);
    }

    #[test]
    fn quotas_match_table_and_sum_to_count() {
        let expected = [(5, 2), (6, 2), (7, 3), (8, 3), (9, 3), (10, 4)];
        for (count, evil) in expected {
            assert_eq!(evil_quota(count), Some(evil));
            assert_eq!(evil_quota(count).unwrap() + good_quota(count).unwrap(), count);
        }
        assert_eq!(evil_quota(4), None);
        assert_eq!(evil_quota(11), None);
    }

    #[test]
    fn team_sizes_cover_every_mission() {
        for count in MIN_PLAYERS..=MAX_PLAYERS {
            for mission in 1..=MISSIONS {
                assert!(team_size(count, mission).is_some());
            }
            assert_eq!(team_size(count, 0), None);
            assert_eq!(team_size(count, 6), None);
        }
        assert_eq!(team_size(7, 4), Some(4));
        assert_eq!(team_size(6, 3), Some(4));
    }

    #[test]
    fn mission_four_at_seven_tolerates_one_fail() {
        assert!(mission_passes(7, 4, 0));
        assert!(mission_passes(7, 4, 1));
        assert!(!mission_passes(7, 4, 2));
        assert!(!mission_passes(6, 4, 1));
        for mission in [1, 2, 3, 5] {
            for count in MIN_PLAYERS..=MAX_PLAYERS {
                assert!(!mission_passes(count, mission, 1));
                assert!(mission_passes(count, mission, 0));
            }
        }
    }

    #[test]
    fn select_player_count_rejects_out_of_range() {
        let mut game = Avalon::new();
        assert!(matches!(
            game.select_player_count(4),
            Err(GameError::InvalidPlayerCount { count: 4, .. })
        ));
        assert_eq!(game.record().player_count, 0);
    }

    #[test]
    fn changing_player_count_clears_selection() {
        let mut game = Avalon::new();
        fill_selection(&mut game, 5);
        game.select_player_count(6).unwrap();
        assert!(game.record().selected_characters.is_empty());
    }

    #[test]
    fn toggle_respects_team_quota() {
        let mut game = Avalon::new();
        game.select_player_count(5).unwrap();
        assert!(game.toggle_character_slot("mordred").unwrap());
        assert!(game.toggle_character_slot("morgana").unwrap());
        // Evil quota for 5 is 2.
        assert!(!game.toggle_character_slot("assassin").unwrap());
        assert!(!game.is_selected("assassin"));
        // Removing frees a seat.
        assert!(!game.toggle_character_slot("mordred").unwrap());
        assert!(game.toggle_character_slot("assassin").unwrap());
        assert_eq!(game.record().selected_on(Team::Evil), 2);
    }

    #[test]
    fn toggle_before_count_is_noop() {
        let mut game = Avalon::new();
        assert!(!game.toggle_character_slot("merlin").unwrap());
        assert!(game.record().selected_characters.is_empty());
    }

    #[test]
    fn toggle_unknown_slot_errors() {
        let mut game = Avalon::new();
        game.select_player_count(5).unwrap();
        assert_eq!(
            game.toggle_character_slot("lancelot"),
            Err(GameError::UnknownSlot("lancelot".to_string()))
        );
    }

    #[test]
    fn loyal_servants_are_distinct_slots() {
        let mut game = Avalon::new();
        game.select_player_count(10).unwrap();
        for id in ["loyal0", "loyal1", "loyal2"] {
            assert!(game.toggle_character_slot(id).unwrap());
        }
        let names: Vec<_> = game
            .record()
            .selected_characters
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, ["Loyal Servant"; 3]);
    }

    #[test]
    fn start_game_requires_full_selection() {
        let mut game = Avalon::new();
        game.select_player_count(5).unwrap();
        game.toggle_character_slot("merlin").unwrap();
        let err = game.start_game(&mut GameRng::new(1)).unwrap_err();
        assert_eq!(
            err,
            GameError::IncompleteSelection {
                selected: 1,
                required: 5
            }
        );
        assert!(game.record().players.is_empty());
        assert_eq!(game.screen(), Screen::Setup);
    }

    #[test]
    fn start_game_without_count_is_incomplete() {
        let mut game = Avalon::new();
        assert!(matches!(
            game.start_game(&mut GameRng::new(1)),
            Err(GameError::IncompleteSelection { .. })
        ));
    }

    #[test]
    fn start_game_seats_a_permutation_of_the_selection() {
        let mut game = Avalon::new();
        fill_selection(&mut game, 8);
        game.start_game(&mut GameRng::new(5)).unwrap();
        let mut seated: Vec<_> = game.record().players.iter().map(|c| c.id.clone()).collect();
        let mut chosen: Vec<_> = game
            .record()
            .selected_characters
            .iter()
            .map(|c| c.id.clone())
            .collect();
        seated.sort();
        chosen.sort();
        assert_eq!(seated, chosen);
        assert_eq!(game.screen(), Screen::CharacterReveal);
        assert_eq!(game.record().current_player_index, 0);
    }

    #[test]
    fn advance_reveal_requires_flip() {
        let mut game = Avalon::new();
        fill_selection(&mut game, 5);
        game.start_game(&mut GameRng::new(2)).unwrap();
        assert!(game.visible_character().is_none());
        assert_eq!(game.advance_reveal(), Err(GameError::CardNotFlipped));
    }

    #[test]
    fn settle_hides_identity_until_timer_fires() {
        let mut game = Avalon::new();
        fill_selection(&mut game, 5);
        game.start_game(&mut GameRng::new(2)).unwrap();
        game.flip_card().unwrap();
        assert!(game.visible_character().is_some());

        let timer = game.advance_reveal().unwrap().expect("settle timer");
        assert_eq!(timer.event, TimerEvent::SettleReveal);
        assert_eq!(timer.delay_ms, 300);
        // Outgoing card is face down and the index has not moved yet.
        assert_eq!(game.record().current_player_index, 0);
        game.flip_card().unwrap();
        assert!(game.visible_character().is_none());
        // A second tap while settling is ignored.
        assert_eq!(game.advance_reveal(), Ok(None));

        game.fire(timer.event, timer.generation);
        assert_eq!(game.record().current_player_index, 1);
        assert!(!game.card_flipped());
    }

    #[test]
    fn last_reveal_goes_to_board() {
        let game = at_board(5);
        assert_eq!(game.record().current_player_index, 4);
        assert_eq!(game.record().current_mission_index, 1);
    }

    #[test]
    fn start_mission_sizes_slots_from_table() {
        let mut game = at_board(7);
        game.start_mission().unwrap();
        assert_eq!(game.record().mission_slots.len(), 2);
        assert!(game.record().mission_slots.iter().all(Option::is_none));
        assert_eq!(game.screen(), Screen::QuestVoting);
    }

    #[test]
    fn recasting_replaces_the_vote() {
        let mut game = at_board(5);
        game.start_mission().unwrap();
        assert_eq!(game.cast_vote(Vote::Pass), Err(GameError::CardNotFlipped));
        game.flip_vote_card().unwrap();
        game.cast_vote(Vote::Pass).unwrap();
        game.cast_vote(Vote::Fail).unwrap();
        assert_eq!(game.record().mission_votes, vec![Vote::Fail]);
        assert_eq!(game.current_vote(), Some(Vote::Fail));
    }

    #[test]
    fn advance_voter_requires_vote() {
        let mut game = at_board(5);
        game.start_mission().unwrap();
        assert_eq!(game.advance_voter(), Err(GameError::NoVoteCast));
    }

    #[test]
    fn votes_are_disclosed_one_at_a_time() {
        let mut game = at_board(5);
        game.start_mission().unwrap();
        for vote in [Vote::Pass, Vote::Fail] {
            game.flip_vote_card().unwrap();
            game.cast_vote(vote).unwrap();
            game.advance_voter().unwrap();
        }
        assert_eq!(game.screen(), Screen::QuestReveal);
        assert!(game.revealed_votes().is_empty());

        let first = game.start_vote_reveal().unwrap().unwrap();
        assert_eq!(first.event, TimerEvent::RevealNextVote);
        assert_eq!(first.delay_ms, 1500);
        assert_eq!(game.start_vote_reveal(), Ok(None));

        let second = game.fire(first.event, first.generation).unwrap();
        assert_eq!(game.revealed_votes(), &[Vote::Pass]);
        assert_eq!(second.event, TimerEvent::RevealNextVote);

        let result = game.fire(second.event, second.generation).unwrap();
        assert_eq!(game.revealed_votes(), &[Vote::Pass, Vote::Fail]);
        assert_eq!(result.event, TimerEvent::ShowResult);
        assert_eq!(result.delay_ms, 2000);
        assert_eq!(game.screen(), Screen::QuestReveal);

        assert!(game.fire(result.event, result.generation).is_none());
        assert_eq!(game.screen(), Screen::QuestResult);
        assert_eq!(game.last_outcome(), Some(false));
    }

    #[test]
    fn pending_timer_tracks_what_the_state_waits_on() {
        let mut game = at_board(5);
        assert_eq!(game.pending_timer(), None);
        game.start_mission().unwrap();
        for _ in 0..2 {
            game.flip_vote_card().unwrap();
            game.cast_vote(Vote::Pass).unwrap();
            game.advance_voter().unwrap();
        }
        assert_eq!(game.pending_timer(), None);
        let first = game.start_vote_reveal().unwrap();
        assert_eq!(game.pending_timer(), first);
        let second = game.fire(TimerEvent::RevealNextVote, game.generation());
        assert_eq!(game.pending_timer(), second);
        let result = game.fire(TimerEvent::RevealNextVote, game.generation());
        assert_eq!(result.map(|t| t.event), Some(TimerEvent::ShowResult));
        assert_eq!(game.pending_timer(), result);
        game.fire(TimerEvent::ShowResult, game.generation());
        assert_eq!(game.pending_timer(), None);
    }

    #[test]
    fn outcome_recorded_once_even_if_timer_repeats() {
        let mut game = at_board(5);
        play_mission(&mut game, 0);
        let generation = game.generation();
        game.fire(TimerEvent::ShowResult, generation);
        game.fire(TimerEvent::RevealNextVote, generation);
        assert_eq!(game.record().mission_outcomes, vec![true]);
    }

    #[test]
    fn stale_timer_after_new_game_is_noop() {
        let mut game = at_board(5);
        game.start_mission().unwrap();
        for _ in 0..2 {
            game.flip_vote_card().unwrap();
            game.cast_vote(Vote::Fail).unwrap();
            game.advance_voter().unwrap();
        }
        let pending = game.start_vote_reveal().unwrap().unwrap();
        game.new_game();
        assert_eq!(game.generation(), pending.generation + 1);
        assert!(game.fire(pending.event, pending.generation).is_none());
        assert_eq!(game.screen(), Screen::Setup);
        assert_eq!(*game.record(), GameRecord::default());
        assert!(game.revealed_votes().is_empty());
    }

    #[test]
    fn stale_settle_timer_does_not_move_next_game() {
        let mut game = Avalon::new();
        fill_selection(&mut game, 5);
        game.start_game(&mut GameRng::new(3)).unwrap();
        game.flip_card().unwrap();
        let pending = game.advance_reveal().unwrap().unwrap();
        game.new_game();
        fill_selection(&mut game, 5);
        game.start_game(&mut GameRng::new(3)).unwrap();
        game.fire(pending.event, pending.generation);
        assert_eq!(game.record().current_player_index, 0);
    }

    #[test]
    fn mission_four_at_seven_passes_with_one_fail_in_play() {
        let mut game = at_board(7);
        for _ in 0..3 {
            // pass, fail, pass → 2-1 going into mission 4
            let fails = if game.record().current_mission_index == 2 { 1 } else { 0 };
            play_mission(&mut game, fails);
            game.continue_after_result().unwrap();
        }
        assert_eq!(game.record().current_mission_index, 4);
        play_mission(&mut game, 1);
        assert_eq!(game.last_outcome(), Some(true));
        game.continue_after_result().unwrap();
        assert_eq!(game.screen(), Screen::Winner);
        assert_eq!(game.winner(), Some(Team::Good));
    }

    #[test]
    fn winner_exactly_at_third_outcome() {
        let mut game = at_board(5);
        // fail, pass, fail, pass, fail → evil wins on mission 5
        for (i, fails) in [1, 0, 1, 0, 1].into_iter().enumerate() {
            play_mission(&mut game, fails);
            game.continue_after_result().unwrap();
            if i < 4 {
                assert_eq!(game.screen(), Screen::GameBoard);
                assert_eq!(game.winner(), None);
            }
        }
        assert_eq!(game.screen(), Screen::Winner);
        assert_eq!(game.winner(), Some(Team::Evil));
        assert_eq!(game.record().mission_outcomes.len(), 5);
    }

    #[test]
    fn three_straight_passes_end_after_mission_three() {
        let mut game = at_board(6);
        for _ in 0..3 {
            play_mission(&mut game, 0);
            game.continue_after_result().unwrap();
        }
        assert_eq!(game.screen(), Screen::Winner);
        assert_eq!(game.record().mission_outcomes, vec![true, true, true]);
        assert_eq!(game.start_mission(), Err(GameError::WrongScreen {
            expected: "gameBoard",
            actual: "winner",
        }));
    }

    #[test]
    fn custom_pacing_flows_into_timers() {
        let mut game = Avalon::with_pacing(Pacing {
            settle_ms: 1,
            vote_cadence_ms: 2,
            result_delay_ms: 3,
        });
        fill_selection(&mut game, 5);
        game.start_game(&mut GameRng::new(4)).unwrap();
        game.flip_card().unwrap();
        assert_eq!(game.advance_reveal().unwrap().unwrap().delay_ms, 1);
        game.new_game();
        assert_eq!(game.pacing().vote_cadence_ms, 2);
    }

    #[test]
    fn timer_event_names_roundtrip() {
        for event in [
            TimerEvent::SettleReveal,
            TimerEvent::RevealNextVote,
            TimerEvent::ShowResult,
        ] {
            assert_eq!(TimerEvent::parse(event.as_str()), Some(event));
        }
        assert_eq!(TimerEvent::parse("nope"), None);
    }

    proptest! {
        #[test]
        fn shuffle_is_a_permutation(items in proptest::collection::vec(0u8..6, 0..24), seed in any::<u64>()) {
            let mut rng = GameRng::new(seed);
            let mut out = shuffled(&items, &mut rng);
            let mut sorted = items.clone();
            out.sort_unstable();
            sorted.sort_unstable();
            prop_assert_eq!(out, sorted);
        }

        #[test]
        fn full_selection_always_starts(count in MIN_PLAYERS..=MAX_PLAYERS, seed in any::<u64>()) {
            let mut game = Avalon::new();
            fill_selection(&mut game, count);
            prop_assert!(game.start_game(&mut GameRng::new(seed)).is_ok());
            prop_assert_eq!(game.record().players.len(), count);
            prop_assert_eq!(
                game.record().players.iter().filter(|c| c.is_evil).count(),
                evil_quota(count).unwrap()
            );
        }
    }
}
