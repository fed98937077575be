use super::AppState;
use crate::protocol::ServerMessage;
use crate::types::*;

/// Resolution of a single accusation, as broadcast to all clients
#[derive(Debug, Clone, PartialEq)]
pub struct PokeOutcome {
    pub accuser_name: String,
    pub target_name: String,
    pub is_correct: bool,
    /// None when the target held no live card
    pub score_change: Option<i64>,
    pub guessed_text: String,
}

impl AppState {
    /// Judge an accusation against the target's newest live card.
    ///
    /// The accuser's name is written into the round's accusation record
    /// before the resolution, all inside one critical section, so a
    /// racing duplicate from the same accuser falls out as a no-op.
    /// Returns None when the accusation had no effect at all (repeat
    /// accuser, wrong phase, unknown accuser).
    pub async fn accuse(
        &self,
        accuser_conn: &PlayerId,
        target_name: &str,
        guessed_category: &str,
    ) -> Option<PokeOutcome> {
        let (outcome, revoked, reassigned, accusers) = {
            let mut room = self.room.write().await;
            let game = room.game.as_ref()?;
            if game.phase != GamePhase::Poking {
                return None;
            }
            let poked_penalty = game.config.poked_penalty;
            let miss_penalty = game.config.miss_penalty;

            let accuser_name = room.players.get(accuser_conn)?.display_name.clone();
            if room.accusers.contains(&accuser_name) {
                // One accusation per player per round
                return None;
            }
            room.accusers.insert(accuser_name.clone());

            let judged = room
                .cards
                .iter()
                .filter(|c| c.owner_name == target_name)
                .next_back()
                .cloned();

            match judged {
                None => {
                    // Unreachable target: deterministic miss, no score movement
                    let outcome = PokeOutcome {
                        accuser_name,
                        target_name: target_name.to_string(),
                        is_correct: false,
                        score_change: None,
                        guessed_text: guessed_category.to_string(),
                    };
                    (outcome, Vec::new(), None, room.sorted_accusers())
                }
                Some(card) if card.category == guessed_category => {
                    room.adjust_score(&accuser_name, card.score_potential);
                    room.adjust_score(target_name, -poked_penalty);
                    // A hit clears the victim's whole hand
                    let revoked = room.remove_cards_of(target_name);
                    let fresh = self.content.pick_category(&room.categories_in_use());
                    let reassigned = room
                        .players
                        .values_mut()
                        .find(|p| p.display_name == target_name)
                        .map(|p| {
                            p.category = fresh.clone();
                            (p.id.clone(), fresh)
                        });
                    let outcome = PokeOutcome {
                        accuser_name,
                        target_name: target_name.to_string(),
                        is_correct: true,
                        score_change: Some(card.score_potential),
                        guessed_text: guessed_category.to_string(),
                    };
                    (outcome, revoked, reassigned, room.sorted_accusers())
                }
                Some(_) => {
                    room.adjust_score(&accuser_name, -miss_penalty);
                    let outcome = PokeOutcome {
                        accuser_name,
                        target_name: target_name.to_string(),
                        is_correct: false,
                        score_change: Some(-miss_penalty),
                        guessed_text: guessed_category.to_string(),
                    };
                    (outcome, Vec::new(), None, room.sorted_accusers())
                }
            }
        };

        tracing::info!(
            "Poke: {} -> {} guessed {:?}, correct={}",
            outcome.accuser_name,
            outcome.target_name,
            outcome.guessed_text,
            outcome.is_correct
        );
        self.broadcast_to_all(ServerMessage::AccusationOutcome {
            accuser_name: outcome.accuser_name.clone(),
            target_name: outcome.target_name.clone(),
            is_correct: outcome.is_correct,
            score_change: outcome.score_change,
            guessed_text: outcome.guessed_text.clone(),
        });
        self.broadcast_revocations(&revoked);
        if let Some((target_id, category)) = reassigned {
            self.send_to_player(
                &target_id,
                ServerMessage::CategoryAssigned {
                    keywords: self.content.keywords(&category),
                    category,
                },
            )
            .await;
        }
        self.broadcast_player_list().await;
        self.broadcast_to_all(ServerMessage::PokeLockStatus { accusers });

        Some(outcome)
    }
}
