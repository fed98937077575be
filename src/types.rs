use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type PlayerId = String;
pub type CategoryId = String;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GamePhase {
    Composing,
    Thinking,
    Poking,
    Finished,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    pub thinking_seconds: u32,
    pub max_card_chars: usize,
    /// Score a card is worth on its owner's first-ever submission; each
    /// later card of the same owner is worth one less, floored at 0.
    pub max_poke_score: i64,
    /// Points lost by a player whose category is guessed correctly.
    pub poked_penalty: i64,
    /// Points lost by an accuser who guesses wrong.
    pub miss_penalty: i64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            thinking_seconds: 30,
            max_card_chars: 200,
            max_poke_score: 4,
            poked_penalty: 1,
            miss_penalty: 1,
        }
    }
}

/// The shared room's round/phase state (single authoritative copy)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub version: u64,
    pub theme: String,
    pub round_no: u32,
    pub phase: GamePhase,
    /// ISO timestamp for the thinking-phase safety-net timer
    pub phase_deadline: Option<String>,
    pub config: GameConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub display_name: String,
    pub score: i64,
    /// Hidden category this player has to sneak keywords from
    pub category: CategoryId,
    /// Lifetime submission count, never reset per round. Drives the
    /// decreasing score potential of each new card.
    pub cards_submitted: u32,
    /// Join ordinal for stable scoreboard ordering
    pub joined_at: u64,
}

/// One submitted card. Immutable after creation; removed wholesale when
/// its owner is successfully poked or cashes in a bonus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub owner_id: PlayerId,
    pub owner_name: String,
    pub text: String,
    /// Round theme at submission time
    pub theme: String,
    /// Owner's category at submission time
    pub category: CategoryId,
    /// Owner's lifetime submission index (0-based)
    pub turn_index: u32,
    pub round: u32,
    pub score_potential: i64,
}
