//! WebSocket message dispatch
//!
//! Validated client messages land here and are routed into the game
//! room. Replies go back to the sender; everything else reaches clients
//! through the broadcast and targeted channels.

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use crate::types::PlayerId;
use std::sync::Arc;

/// Handle a client message and return an optional direct reply
pub async fn handle_message(
    msg: ClientMessage,
    conn_id: &PlayerId,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::Join { display_name } => {
            let name = display_name.trim().to_string();
            if name.is_empty() {
                return Some(ServerMessage::Error {
                    code: "INVALID_NAME".to_string(),
                    msg: "Display name must not be empty".to_string(),
                });
            }
            tracing::info!("Join: {} ({})", name, conn_id);

            let player = state.join(conn_id, name).await;
            state.broadcast_player_list().await;

            let game = state.get_game().await?;
            Some(ServerMessage::Welcome {
                protocol: "1.0".to_string(),
                game,
                keywords: state.content.keywords(&player.category),
                category: player.category,
                players: state.player_snapshot().await,
                cards: state.public_cards().await,
                locked_accusers: state.locked_accusers().await,
                server_now: chrono::Utc::now().to_rfc3339(),
            })
        }

        ClientMessage::Submit { text } => match state.record_submission(conn_id, text).await {
            // The CardPublished broadcast is the confirmation
            Ok(_) => None,
            Err(e) => Some(ServerMessage::Error {
                code: "SUBMISSION_FAILED".to_string(),
                msg: e,
            }),
        },

        ClientMessage::Accuse {
            target_name,
            guessed_category,
        } => {
            // Duplicate or out-of-phase accusations die silently; any
            // real resolution is broadcast to everyone
            state.accuse(conn_id, &target_name, &guessed_category).await;
            None
        }

        ClientMessage::SignalTimeout { phase } => {
            state.signal_timeout(conn_id, phase).await;
            None
        }

        ClientMessage::RequestNextRound => {
            // UI policy keeps this behind the finished screen; the core
            // accepts it whenever it arrives
            state.next_round().await;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GamePhase;

    #[tokio::test]
    async fn test_join_replies_with_welcome() {
        let state = Arc::new(AppState::new());
        let conn = "c1".to_string();

        let result = handle_message(
            ClientMessage::Join {
                display_name: "Alice".to_string(),
            },
            &conn,
            &state,
        )
        .await;

        match result {
            Some(ServerMessage::Welcome {
                game,
                category,
                keywords,
                players,
                ..
            }) => {
                assert_eq!(game.round_no, 0);
                assert_eq!(game.phase, GamePhase::Composing);
                assert!(!category.is_empty());
                assert!(!keywords.is_empty());
                assert_eq!(players.len(), 1);
            }
            other => panic!("Expected Welcome, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_blank_join_is_rejected() {
        let state = Arc::new(AppState::new());
        let conn = "c1".to_string();

        let result = handle_message(
            ClientMessage::Join {
                display_name: "   ".to_string(),
            },
            &conn,
            &state,
        )
        .await;

        match result {
            Some(ServerMessage::Error { code, .. }) => assert_eq!(code, "INVALID_NAME"),
            other => panic!("Expected Error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_submission_reports_back() {
        let state = Arc::new(AppState::new());
        let conn = "c1".to_string();
        handle_message(
            ClientMessage::Join {
                display_name: "Alice".to_string(),
            },
            &conn,
            &state,
        )
        .await;

        let result = handle_message(
            ClientMessage::Submit {
                text: String::new(),
            },
            &conn,
            &state,
        )
        .await;

        match result {
            Some(ServerMessage::Error { code, msg }) => {
                assert_eq!(code, "SUBMISSION_FAILED");
                assert_eq!(msg, "EMPTY_TEXT");
            }
            other => panic!("Expected Error, got {:?}", other),
        }
    }
}
