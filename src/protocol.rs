use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    Join {
        display_name: String,
    },
    Submit {
        text: String,
    },
    Accuse {
        target_name: String,
        guessed_category: CategoryId,
    },
    /// "My local countdown for this phase ran out"
    SignalTimeout {
        phase: GamePhase,
    },
    RequestNextRound,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Reply to Join: everything a (re)connecting client needs to render
    Welcome {
        protocol: String,
        game: Game,
        /// The joining player's hidden category plus its keyword list
        category: CategoryId,
        keywords: Vec<String>,
        players: Vec<PlayerInfo>,
        cards: Vec<CardInfo>,
        locked_accusers: Vec<String>,
        server_now: String,
    },
    PlayerListUpdate {
        players: Vec<PlayerInfo>,
    },
    RoundUpdate {
        theme: String,
        round_no: u32,
    },
    PhaseUpdate {
        phase: GamePhase,
        server_now: String,
        deadline: Option<String>,
    },
    CardPublished {
        card: CardInfo,
    },
    CardRevoked {
        owner_name: String,
        turn_index: u32,
    },
    AccusationOutcome {
        accuser_name: String,
        target_name: String,
        is_correct: bool,
        /// None when the target held no live card (forced miss)
        score_change: Option<i64>,
        guessed_text: String,
    },
    /// Targeted to a single player after join, a successful poke against
    /// them, or a bonus payout
    CategoryAssigned {
        category: CategoryId,
        keywords: Vec<String>,
    },
    BonusAwarded {
        player_name: String,
        bonus_points: i64,
        /// Category the player held when the bonus was granted
        category: CategoryId,
    },
    /// Accusers who have already spent their poke this round
    PokeLockStatus {
        accusers: Vec<String>,
    },
    Error {
        code: String,
        msg: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerInfo {
    pub display_name: String,
    pub score: i64,
}

impl From<&Player> for PlayerInfo {
    fn from(p: &Player) -> Self {
        Self {
            display_name: p.display_name.clone(),
            score: p.score,
        }
    }
}

/// Public card info. The owner's category stays server-side so the
/// broadcast cannot spoil the guessing game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardInfo {
    pub owner_name: String,
    pub text: String,
    pub theme: String,
    pub turn_index: u32,
    pub round: u32,
    pub score_potential: i64,
}

impl From<&Card> for CardInfo {
    fn from(c: &Card) -> Self {
        Self {
            owner_name: c.owner_name.clone(),
            text: c.text.clone(),
            theme: c.theme.clone(),
            turn_index: c.turn_index,
            round: c.round,
            score_potential: c.score_potential,
        }
    }
}
