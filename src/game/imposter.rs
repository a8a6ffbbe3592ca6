//! Imposter: social-deduction word game.
//!
//! One secret item per round. Every player but one (the imposter) sees it.
//! The device goes round the table, alternating between a "pass to player N"
//! screen and that player's role card, then play moves off-device until the
//! answer is revealed.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::game::categories::Category;
use crate::game::rng::GameRng;

pub const MIN_PLAYERS: usize = 3;
pub const MAX_PLAYERS: usize = 8;
pub const DEFAULT_PLAYERS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Screen {
    Setup,
    Pass,
    Player,
    GameActive,
    Reveal,
}

impl Screen {
    pub fn name(self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Pass => "pass",
            Self::Player => "player",
            Self::GameActive => "gameActive",
            Self::Reveal => "reveal",
        }
    }
}

/// One round. Only `current_player_index` changes after the draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub total_players: usize,
    /// 1-based.
    pub current_player_index: usize,
    pub secret_item: String,
    pub category: Category,
    /// 1-based.
    pub imposter_player_index: usize,
    /// 1-based. Drawn independently of the imposter, so the two may match.
    pub first_clue_giver_index: usize,
}

impl RoundRecord {
    /// What player `index` is shown on their role card.
    pub fn role_for(&self, index: usize) -> RoleCard<'_> {
        let role = if index == self.imposter_player_index {
            Role::Imposter
        } else {
            Role::Knows(&self.secret_item)
        };
        RoleCard {
            player: index,
            role,
            gives_first_clue: index == self.first_clue_giver_index,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role<'a> {
    Imposter,
    Knows(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleCard<'a> {
    pub player: usize,
    pub role: Role<'a>,
    pub gives_first_clue: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Imposter {
    screen: Screen,
    round: Option<RoundRecord>,
}

impl Default for Imposter {
    fn default() -> Self {
        Self {
            screen: Screen::Setup,
            round: None,
        }
    }
}

impl Imposter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn round(&self) -> Option<&RoundRecord> {
        self.round.as_ref()
    }

    fn require(&self, expected: Screen) -> Result<&RoundRecord, GameError> {
        match &self.round {
            Some(round) if self.screen == expected => Ok(round),
            _ => Err(GameError::WrongScreen {
                expected: expected.name(),
                actual: self.screen.name(),
            }),
        }
    }

    /// Draw the secret item, the imposter and the first clue giver.
    pub fn start_round(
        &mut self,
        player_count: usize,
        category: Category,
        custom_item: Option<&str>,
        rng: &mut GameRng,
    ) -> Result<(), GameError> {
        if self.screen != Screen::Setup {
            return Err(GameError::WrongScreen {
                expected: Screen::Setup.name(),
                actual: self.screen.name(),
            });
        }
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&player_count) {
            return Err(GameError::InvalidPlayerCount {
                count: player_count,
                min: MIN_PLAYERS,
                max: MAX_PLAYERS,
            });
        }

        let secret_item = match category {
            Category::Custom => custom_item
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or(GameError::MissingCustomItem)?
                .to_string(),
            _ => rng
                .choose(category.items())
                .ok_or_else(|| GameError::UnknownCategory(category.key().to_string()))?
                .to_string(),
        };

        let imposter_player_index = rng.between(1, player_count);
        let first_clue_giver_index = rng.between(1, player_count);

        self.round = Some(RoundRecord {
            total_players: player_count,
            current_player_index: 1,
            secret_item,
            category,
            imposter_player_index,
            first_clue_giver_index,
        });
        self.screen = Screen::Pass;
        info!(
            "imposter: round started, {} players, category {}",
            player_count,
            category.key()
        );
        Ok(())
    }

    /// "I have the device": show the current player's role.
    pub fn show_player_role(&mut self) -> Result<(), GameError> {
        self.require(Screen::Pass)?;
        self.screen = Screen::Player;
        Ok(())
    }

    /// The role card on screen, if a player's role is showing.
    pub fn current_role(&self) -> Option<RoleCard<'_>> {
        let round = self.round.as_ref()?;
        (self.screen == Screen::Player).then(|| round.role_for(round.current_player_index))
    }

    /// "Done - next player".
    pub fn advance_to_next_player(&mut self) -> Result<(), GameError> {
        let round = self.require(Screen::Player)?;
        if round.current_player_index < round.total_players {
            if let Some(round) = self.round.as_mut() {
                round.current_player_index += 1;
            }
            self.screen = Screen::Pass;
        } else {
            self.screen = Screen::GameActive;
            debug!("imposter: every player has seen their role");
        }
        Ok(())
    }

    pub fn reveal(&mut self) -> Result<&RoundRecord, GameError> {
        self.require(Screen::GameActive)?;
        self.screen = Screen::Reveal;
        self.require(Screen::Reveal)
    }

    pub fn new_game(&mut self) {
        *self = Self::default();
        debug!("imposter: new game");
    }
}
