use super::AppState;
use crate::protocol::ServerMessage;
use crate::types::*;

impl AppState {
    /// Lazily initialize the shared game on first join
    pub async fn ensure_game(&self) -> Game {
        let mut room = self.room.write().await;
        if let Some(g) = &room.game {
            return g.clone();
        }
        let game = Game {
            version: 1,
            theme: self.content.pick_theme(),
            round_no: 0,
            phase: GamePhase::Composing,
            phase_deadline: None,
            config: GameConfig::default(),
        };
        room.game = Some(game.clone());
        tracing::info!("Game created, round 0, theme {:?}", game.theme);
        game
    }

    pub async fn get_game(&self) -> Option<Game> {
        self.room.read().await.game.clone()
    }

    /// Compare-and-set phase transition. Every trigger (submission
    /// completion, timeout acks, the deadline watcher) funnels through
    /// here, so a duplicate or late trigger is inherently a no-op.
    pub async fn advance_phase(&self, from: GamePhase, to: GamePhase) -> bool {
        let deadline = {
            let mut room = self.room.write().await;
            let Some(game) = room.game.as_mut() else {
                return false;
            };
            if game.phase != from {
                return false;
            }
            game.phase = to;
            game.version += 1;
            game.phase_deadline = match to {
                GamePhase::Thinking => {
                    let until = chrono::Utc::now()
                        + chrono::Duration::seconds(game.config.thinking_seconds as i64);
                    Some(until.to_rfc3339())
                }
                _ => None,
            };
            let deadline = game.phase_deadline.clone();
            room.clear_acks();
            deadline
        };

        tracing::info!("Phase advanced: {:?} -> {:?}", from, to);
        self.broadcast_to_all(ServerMessage::PhaseUpdate {
            phase: to,
            server_now: chrono::Utc::now().to_rfc3339(),
            deadline,
        });

        if to == GamePhase::Finished {
            self.run_bonus_pass().await;
            self.broadcast_player_list().await;
        }
        true
    }

    /// Record a per-client "my timer expired" signal for a phase. Signals
    /// for anything but the current phase come from lagging clients and
    /// are dropped. When every registered player has signaled, the phase
    /// advances.
    pub async fn signal_timeout(&self, conn_id: &PlayerId, phase: GamePhase) {
        let all_acked = {
            let mut room = self.room.write().await;
            let Some(game) = room.game.as_ref() else {
                return;
            };
            if game.phase != phase || !room.players.contains_key(conn_id) {
                return;
            }
            let player_ids: Vec<PlayerId> = room.players.keys().cloned().collect();
            let Some(acks) = room.acks_mut(phase) else {
                return;
            };
            acks.insert(conn_id.clone());
            player_ids.iter().all(|id| acks.contains(id))
        };

        if all_acked {
            self.advance_from(phase).await;
        }
    }

    async fn advance_from(&self, phase: GamePhase) -> bool {
        match phase {
            GamePhase::Composing => self.advance_phase(GamePhase::Composing, GamePhase::Thinking),
            GamePhase::Thinking => self.advance_phase(GamePhase::Thinking, GamePhase::Poking),
            GamePhase::Poking => self.advance_phase(GamePhase::Poking, GamePhase::Finished),
            GamePhase::Finished => return false,
        }
        .await
    }

    /// Re-check the current phase's gate after the registry shrinks; a
    /// departure can be the event that satisfies "everyone acted".
    pub(crate) async fn reevaluate_gates(&self) {
        let ready = {
            let room = self.room.read().await;
            let Some(game) = room.game.as_ref() else {
                return;
            };
            if room.players.is_empty() {
                return;
            }
            let ids: Vec<&PlayerId> = room.players.keys().collect();
            match game.phase {
                GamePhase::Composing => {
                    room.all_submitted_for_round(game.round_no)
                        || ids.iter().all(|id| room.composing_acks.contains(*id))
                }
                GamePhase::Thinking => ids.iter().all(|id| room.thinking_acks.contains(*id)),
                GamePhase::Poking => ids.iter().all(|id| room.poking_acks.contains(*id)),
                GamePhase::Finished => false,
            }
            .then_some(game.phase)
        };

        if let Some(phase) = ready {
            self.advance_from(phase).await;
        }
    }

    /// Roll the room into a fresh composing phase. Categories persist;
    /// only an accusation hit or a bonus rotates them.
    pub async fn next_round(&self) {
        let (theme, round_no) = {
            let mut room = self.room.write().await;
            let theme = self.content.pick_theme();
            let Some(game) = room.game.as_mut() else {
                return;
            };
            game.round_no += 1;
            game.theme = theme.clone();
            game.phase = GamePhase::Composing;
            game.phase_deadline = None;
            game.version += 1;
            let round_no = game.round_no;
            room.accusers.clear();
            room.clear_acks();
            (theme, round_no)
        };

        tracing::info!("Round {} started, theme {:?}", round_no, theme);
        self.broadcast_to_all(ServerMessage::RoundUpdate { theme, round_no });
        self.broadcast_to_all(ServerMessage::PhaseUpdate {
            phase: GamePhase::Composing,
            server_now: chrono::Utc::now().to_rfc3339(),
            deadline: None,
        });
        self.broadcast_to_all(ServerMessage::PokeLockStatus { accusers: vec![] });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ensure_game_is_lazy_and_stable() {
        let state = AppState::new();
        assert!(state.get_game().await.is_none());

        let game = state.ensure_game().await;
        assert_eq!(game.round_no, 0);
        assert_eq!(game.phase, GamePhase::Composing);
        assert!(!game.theme.is_empty());

        // A second call must not reroll the theme or the round
        let again = state.ensure_game().await;
        assert_eq!(again.theme, game.theme);
        assert_eq!(again.version, game.version);
    }

    #[tokio::test]
    async fn test_advance_phase_is_idempotent() {
        let state = AppState::new();
        state.ensure_game().await;

        assert!(
            state
                .advance_phase(GamePhase::Composing, GamePhase::Thinking)
                .await
        );
        // Same trigger again is a no-op
        assert!(
            !state
                .advance_phase(GamePhase::Composing, GamePhase::Thinking)
                .await
        );
        assert_eq!(state.get_game().await.unwrap().phase, GamePhase::Thinking);
    }

    #[tokio::test]
    async fn test_thinking_entry_arms_deadline() {
        let state = AppState::new();
        state.ensure_game().await;

        state
            .advance_phase(GamePhase::Composing, GamePhase::Thinking)
            .await;
        assert!(state.get_game().await.unwrap().phase_deadline.is_some());

        state
            .advance_phase(GamePhase::Thinking, GamePhase::Poking)
            .await;
        assert!(state.get_game().await.unwrap().phase_deadline.is_none());
    }

    #[tokio::test]
    async fn test_stale_timeout_signal_is_ignored() {
        let state = AppState::new();
        let p1 = "c1".to_string();
        state.join(&p1, "Ana".to_string()).await;

        // Game is composing; a thinking timeout is from a lagging client
        state.signal_timeout(&p1, GamePhase::Thinking).await;
        assert_eq!(state.get_game().await.unwrap().phase, GamePhase::Composing);
        assert!(state.room.read().await.thinking_acks.is_empty());
    }

    #[tokio::test]
    async fn test_all_timeout_acks_advance_phase() {
        let state = AppState::new();
        let (p1, p2) = ("c1".to_string(), "c2".to_string());
        state.join(&p1, "Ana".to_string()).await;
        state.join(&p2, "Ben".to_string()).await;

        state.signal_timeout(&p1, GamePhase::Composing).await;
        assert_eq!(state.get_game().await.unwrap().phase, GamePhase::Composing);

        state.signal_timeout(&p2, GamePhase::Composing).await;
        assert_eq!(state.get_game().await.unwrap().phase, GamePhase::Thinking);
        // Acks were wiped for the new phase
        assert!(state.room.read().await.composing_acks.is_empty());
    }

    #[tokio::test]
    async fn test_poking_needs_every_player_not_accusations() {
        let state = AppState::new();
        let (p1, p2) = ("c1".to_string(), "c2".to_string());
        state.join(&p1, "Ana".to_string()).await;
        state.join(&p2, "Ben".to_string()).await;
        state
            .advance_phase(GamePhase::Composing, GamePhase::Thinking)
            .await;
        state
            .advance_phase(GamePhase::Thinking, GamePhase::Poking)
            .await;

        state.signal_timeout(&p1, GamePhase::Poking).await;
        assert_eq!(state.get_game().await.unwrap().phase, GamePhase::Poking);

        state.signal_timeout(&p2, GamePhase::Poking).await;
        assert_eq!(state.get_game().await.unwrap().phase, GamePhase::Finished);
    }

    #[tokio::test]
    async fn test_next_round_resets_transient_state() {
        let state = AppState::new();
        let (p1, p2) = ("c1".to_string(), "c2".to_string());
        state.join(&p1, "Ana".to_string()).await;
        state.join(&p2, "Ben".to_string()).await;

        state.signal_timeout(&p1, GamePhase::Composing).await;
        state.room.write().await.accusers.insert("Ana".to_string());
        let before = state.get_game().await.unwrap();

        state.next_round().await;

        let game = state.get_game().await.unwrap();
        assert_eq!(game.round_no, before.round_no + 1);
        assert_eq!(game.phase, GamePhase::Composing);
        assert!(game.phase_deadline.is_none());

        let room = state.room.read().await;
        assert!(room.accusers.is_empty());
        assert!(room.composing_acks.is_empty());
        assert!(room.thinking_acks.is_empty());
        assert!(room.poking_acks.is_empty());
    }
}
