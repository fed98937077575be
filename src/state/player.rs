use super::AppState;
use crate::protocol::{PlayerInfo, ServerMessage};
use crate::types::*;

impl AppState {
    /// Idempotent join. A reconnecting identity keeps its score and
    /// category and only has its display name refreshed; a new identity
    /// gets score 0 and a category avoiding everything already in play.
    pub async fn join(&self, conn_id: &PlayerId, display_name: String) -> Player {
        self.ensure_game().await;

        let mut room = self.room.write().await;
        if let Some(p) = room.players.get_mut(conn_id) {
            p.display_name = display_name;
            return p.clone();
        }

        let category = self.content.pick_category(&room.categories_in_use());
        let joined_at = room.next_join_ordinal();
        let player = Player {
            id: conn_id.clone(),
            display_name,
            score: 0,
            category,
            cards_submitted: 0,
            joined_at,
        };
        room.players.insert(conn_id.clone(), player.clone());
        player
    }

    /// Drop a player and the transient state keyed to them. Their cards
    /// stay on the table; only a poke hit or a bonus clears cards.
    pub async fn remove_player(&self, conn_id: &PlayerId) {
        let (removed, accusers) = {
            let mut room = self.room.write().await;
            let Some(player) = room.players.remove(conn_id) else {
                return;
            };
            // The accusation record is keyed by display name
            room.accusers.remove(&player.display_name);
            room.composing_acks.remove(conn_id);
            room.thinking_acks.remove(conn_id);
            room.poking_acks.remove(conn_id);
            (player, room.sorted_accusers())
        };

        tracing::info!("Player left: {} ({})", removed.display_name, conn_id);
        self.broadcast_player_list().await;
        self.broadcast_to_all(ServerMessage::PokeLockStatus { accusers });
        // A departure can satisfy "everyone submitted / everyone acked"
        self.reevaluate_gates().await;
    }

    /// Overwrite a player's category and privately tell them
    pub async fn reassign_category(&self, conn_id: &PlayerId, category: CategoryId) {
        {
            let mut room = self.room.write().await;
            let Some(player) = room.players.get_mut(conn_id) else {
                return;
            };
            player.category = category.clone();
        }
        let keywords = self.content.keywords(&category);
        self.send_to_player(conn_id, ServerMessage::CategoryAssigned { category, keywords })
            .await;
    }

    /// Scoreboard snapshot in join order
    pub async fn player_snapshot(&self) -> Vec<PlayerInfo> {
        let room = self.room.read().await;
        let mut players: Vec<&Player> = room.players.values().collect();
        players.sort_by_key(|p| p.joined_at);
        players.iter().map(|p| PlayerInfo::from(*p)).collect()
    }

    pub(crate) async fn broadcast_player_list(&self) {
        let players = self.player_snapshot().await;
        self.broadcast_to_all(ServerMessage::PlayerListUpdate { players });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_join_is_idempotent_for_reconnects() {
        let state = AppState::new();
        let conn = "c1".to_string();

        let first = state.join(&conn, "Ana".to_string()).await;
        state.room.write().await.adjust_score("Ana", 7);

        let again = state.join(&conn, "Ana Banana".to_string()).await;
        assert_eq!(again.score, 7);
        assert_eq!(again.category, first.category);
        assert_eq!(again.display_name, "Ana Banana");
        assert_eq!(state.room.read().await.players.len(), 1);
    }

    #[tokio::test]
    async fn test_join_assigns_distinct_categories_while_available() {
        let state = AppState::new();
        let total = state.content.category_count();

        // Fill the table up to the category count; every assignment must
        // avoid the ones already held.
        let mut seen = std::collections::HashSet::new();
        for i in 0..total {
            let player = state.join(&format!("c{i}"), format!("P{i}")).await;
            assert!(seen.insert(player.category), "category handed out twice");
        }
    }

    #[tokio::test]
    async fn test_snapshot_keeps_join_order() {
        let state = AppState::new();
        state.join(&"c1".to_string(), "Ana".to_string()).await;
        state.join(&"c2".to_string(), "Ben".to_string()).await;
        state.join(&"c3".to_string(), "Cleo".to_string()).await;

        let names: Vec<String> = state
            .player_snapshot()
            .await
            .into_iter()
            .map(|p| p.display_name)
            .collect();
        assert_eq!(names, vec!["Ana", "Ben", "Cleo"]);
    }

    #[tokio::test]
    async fn test_remove_player_clears_accusation_entry() {
        let state = AppState::new();
        let conn = "c1".to_string();
        state.join(&conn, "Ana".to_string()).await;
        state.room.write().await.accusers.insert("Ana".to_string());

        state.remove_player(&conn).await;

        let room = state.room.read().await;
        assert!(room.players.is_empty());
        assert!(room.accusers.is_empty());
    }

    #[tokio::test]
    async fn test_reassign_category_notifies_only_the_target() {
        let state = AppState::new();
        let conn = "c1".to_string();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        state.register_connection(&conn, tx).await;
        state.join(&conn, "Ana".to_string()).await;

        state
            .reassign_category(&conn, "animals".to_string())
            .await;

        assert_eq!(state.room.read().await.players[&conn].category, "animals");
        match rx.try_recv() {
            Ok(ServerMessage::CategoryAssigned { category, keywords }) => {
                assert_eq!(category, "animals");
                assert!(!keywords.is_empty());
            }
            other => panic!("Expected CategoryAssigned, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_departure_unblocks_submission_gate() {
        let state = AppState::new();
        let (p1, p2) = ("c1".to_string(), "c2".to_string());
        state.join(&p1, "Ana".to_string()).await;
        state.join(&p2, "Ben".to_string()).await;

        state
            .record_submission(&p1, "a perfectly normal card".to_string())
            .await
            .unwrap();
        assert_eq!(state.get_game().await.unwrap().phase, GamePhase::Composing);

        // The only outstanding non-submitter leaves
        state.remove_player(&p2).await;
        assert_eq!(state.get_game().await.unwrap().phase, GamePhase::Thinking);
    }
}
