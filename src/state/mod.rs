mod bonus;
mod card;
mod game;
mod player;
mod poke;

pub use poke::PokeOutcome;

use crate::content::Content;
use crate::protocol::ServerMessage;
use crate::types::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, RwLock};

/// All mutable room state behind one lock. Every check-then-write
/// (submission dedup, accusation record, gate evaluation, phase
/// compare-and-set) runs as a single step under the write guard, with
/// no await point in between.
#[derive(Default)]
pub struct Room {
    pub game: Option<Game>,
    pub players: HashMap<PlayerId, Player>,
    pub cards: Vec<Card>,
    /// Display names that have already spent their accusation this round
    pub accusers: HashSet<String>,
    /// Per-phase "my local timer expired" acknowledgements
    pub composing_acks: HashSet<PlayerId>,
    pub thinking_acks: HashSet<PlayerId>,
    pub poking_acks: HashSet<PlayerId>,
    next_join_ordinal: u64,
}

impl Room {
    pub fn acks_mut(&mut self, phase: GamePhase) -> Option<&mut HashSet<PlayerId>> {
        match phase {
            GamePhase::Composing => Some(&mut self.composing_acks),
            GamePhase::Thinking => Some(&mut self.thinking_acks),
            GamePhase::Poking => Some(&mut self.poking_acks),
            GamePhase::Finished => None,
        }
    }

    pub fn clear_acks(&mut self) {
        self.composing_acks.clear();
        self.thinking_acks.clear();
        self.poking_acks.clear();
    }

    /// Categories that would collide if handed out again: those on any
    /// live card plus those currently assigned to a player.
    pub fn categories_in_use(&self) -> HashSet<CategoryId> {
        self.cards
            .iter()
            .map(|c| c.category.clone())
            .chain(self.players.values().map(|p| p.category.clone()))
            .collect()
    }

    pub fn all_submitted_for_round(&self, round: u32) -> bool {
        !self.players.is_empty()
            && self.players.values().all(|p| {
                self.cards
                    .iter()
                    .any(|c| c.owner_id == p.id && c.round == round)
            })
    }

    pub fn adjust_score(&mut self, display_name: &str, delta: i64) {
        if let Some(p) = self
            .players
            .values_mut()
            .find(|p| p.display_name == display_name)
        {
            p.score += delta;
        }
    }

    /// Remove and return every live card of one owner, across all rounds
    pub fn remove_cards_of(&mut self, display_name: &str) -> Vec<Card> {
        let (removed, kept): (Vec<Card>, Vec<Card>) = self
            .cards
            .drain(..)
            .partition(|c| c.owner_name == display_name);
        self.cards = kept;
        removed
    }

    pub fn next_join_ordinal(&mut self) -> u64 {
        let ordinal = self.next_join_ordinal;
        self.next_join_ordinal += 1;
        ordinal
    }

    pub fn sorted_accusers(&self) -> Vec<String> {
        let mut accusers: Vec<String> = self.accusers.iter().cloned().collect();
        accusers.sort();
        accusers
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub room: Arc<RwLock<Room>>,
    pub content: Arc<Content>,
    /// Broadcast channel for messages every connected client should see
    pub broadcast: broadcast::Sender<ServerMessage>,
    /// Per-connection senders for targeted messages (category reveals)
    pub direct: Arc<RwLock<HashMap<PlayerId, mpsc::UnboundedSender<ServerMessage>>>>,
}

impl AppState {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(256);
        Self {
            room: Arc::new(RwLock::new(Room::default())),
            content: Arc::new(Content::from_embedded()),
            broadcast: tx,
            direct: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn broadcast_to_all(&self, msg: ServerMessage) {
        // No receivers connected is fine
        let _ = self.broadcast.send(msg);
    }

    pub async fn register_connection(
        &self,
        conn_id: &PlayerId,
        tx: mpsc::UnboundedSender<ServerMessage>,
    ) {
        self.direct.write().await.insert(conn_id.clone(), tx);
    }

    pub async fn unregister_connection(&self, conn_id: &PlayerId) {
        self.direct.write().await.remove(conn_id);
    }

    /// Targeted delivery; silently dropped if the connection is gone
    pub async fn send_to_player(&self, conn_id: &PlayerId, msg: ServerMessage) {
        if let Some(tx) = self.direct.read().await.get(conn_id) {
            let _ = tx.send(msg);
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
