use super::AppState;
use crate::protocol::ServerMessage;
use crate::types::*;

/// Lowest nonzero score tier; a live card still worth exactly this at
/// round end marks its owner for the survival bonus.
const BONUS_TIER: i64 = 1;

struct BonusAward {
    player_id: PlayerId,
    player_name: String,
    bonus_points: i64,
    /// Category held when the bonus was granted
    held_category: CategoryId,
    new_category: CategoryId,
}

impl AppState {
    /// Runs once on entry to the finished phase. A player holding at
    /// least one live card at the lowest nonzero tier cashes in the sum
    /// of all their live cards' potentials, loses the hand, and starts
    /// over with a fresh category. Each player is paid at most once.
    pub(crate) async fn run_bonus_pass(&self) {
        let (awards, revoked) = {
            let mut room = self.room.write().await;

            let mut qualifying: Vec<(u64, PlayerId, String)> = room
                .players
                .values()
                .filter(|p| {
                    room.cards
                        .iter()
                        .any(|c| c.owner_name == p.display_name && c.score_potential == BONUS_TIER)
                })
                .map(|p| (p.joined_at, p.id.clone(), p.display_name.clone()))
                .collect();
            // Pay out in join order so the broadcast sequence is stable
            qualifying.sort();

            let mut awards = Vec::new();
            let mut revoked = Vec::new();
            for (_, player_id, player_name) in qualifying {
                let bonus_points: i64 = room
                    .cards
                    .iter()
                    .filter(|c| c.owner_name == player_name)
                    .map(|c| c.score_potential)
                    .sum();
                room.adjust_score(&player_name, bonus_points);
                revoked.extend(room.remove_cards_of(&player_name));

                let new_category = self.content.pick_category(&room.categories_in_use());
                let Some(player) = room.players.get_mut(&player_id) else {
                    continue;
                };
                let held_category = player.category.clone();
                player.category = new_category.clone();

                awards.push(BonusAward {
                    player_id,
                    player_name,
                    bonus_points,
                    held_category,
                    new_category,
                });
            }
            (awards, revoked)
        };

        self.broadcast_revocations(&revoked);
        for award in awards {
            tracing::info!(
                "Bonus: {} +{} (category {:?})",
                award.player_name,
                award.bonus_points,
                award.held_category
            );
            self.broadcast_to_all(ServerMessage::BonusAwarded {
                player_name: award.player_name,
                bonus_points: award.bonus_points,
                category: award.held_category,
            });
            self.send_to_player(
                &award.player_id,
                ServerMessage::CategoryAssigned {
                    keywords: self.content.keywords(&award.new_category),
                    category: award.new_category,
                },
            )
            .await;
        }
    }
}
