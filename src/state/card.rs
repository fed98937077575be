use super::AppState;
use crate::protocol::{CardInfo, ServerMessage};
use crate::types::*;

impl AppState {
    /// Record a card for the current round. Rejections come back as error
    /// codes for the submitting client; nothing here is fatal.
    pub async fn record_submission(&self, conn_id: &PlayerId, text: String) -> Result<Card, String> {
        let text = text.trim().to_string();

        let (card, completes_round) = {
            let mut room = self.room.write().await;
            let Some(game) = room.game.as_ref() else {
                return Err("NO_GAME".to_string());
            };
            if game.phase != GamePhase::Composing {
                // Lagging client, the round has moved on
                return Err("WRONG_PHASE".to_string());
            }
            let round = game.round_no;
            let theme = game.theme.clone();
            let max_poke_score = game.config.max_poke_score;
            let max_chars = game.config.max_card_chars;

            if text.is_empty() {
                return Err("EMPTY_TEXT".to_string());
            }
            if text.chars().count() > max_chars {
                return Err("TEXT_TOO_LONG".to_string());
            }
            if room
                .cards
                .iter()
                .any(|c| c.owner_id == *conn_id && c.round == round)
            {
                return Err("ALREADY_SUBMITTED".to_string());
            }
            let Some(player) = room.players.get_mut(conn_id) else {
                return Err("NOT_JOINED".to_string());
            };

            let turn_index = player.cards_submitted;
            player.cards_submitted += 1;
            let card = Card {
                owner_id: conn_id.clone(),
                owner_name: player.display_name.clone(),
                text,
                theme,
                category: player.category.clone(),
                turn_index,
                round,
                score_potential: (max_poke_score - turn_index as i64).max(0),
            };
            room.cards.push(card.clone());
            (card, room.all_submitted_for_round(round))
        };

        tracing::info!(
            "Card published by {} (turn {}, worth {})",
            card.owner_name,
            card.turn_index,
            card.score_potential
        );
        self.broadcast_to_all(ServerMessage::CardPublished {
            card: CardInfo::from(&card),
        });

        if completes_round {
            self.advance_phase(GamePhase::Composing, GamePhase::Thinking)
                .await;
        }
        Ok(card)
    }

    pub async fn all_submitted(&self) -> bool {
        let room = self.room.read().await;
        match room.game.as_ref() {
            Some(game) => room.all_submitted_for_round(game.round_no),
            None => false,
        }
    }

    /// Live cards as clients see them (category withheld)
    pub async fn public_cards(&self) -> Vec<CardInfo> {
        self.room
            .read()
            .await
            .cards
            .iter()
            .map(CardInfo::from)
            .collect()
    }

    pub async fn locked_accusers(&self) -> Vec<String> {
        self.room.read().await.sorted_accusers()
    }

    pub(crate) fn broadcast_revocations(&self, removed: &[Card]) {
        for card in removed {
            self.broadcast_to_all(ServerMessage::CardRevoked {
                owner_name: card.owner_name.clone(),
                turn_index: card.turn_index,
            });
        }
    }
}
