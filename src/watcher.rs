use crate::state::AppState;
use crate::types::GamePhase;
use std::sync::Arc;
use std::time::Duration;

/// Spawn the thinking-phase safety net: force thinking -> poking once the
/// armed deadline passes, even if no client ever reports its timer.
pub fn spawn_thinking_deadline_watcher(state: Arc<AppState>) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_millis(500)).await;

            let game = match state.get_game().await {
                Some(g) => g,
                None => continue,
            };
            if game.phase != GamePhase::Thinking {
                continue;
            }
            let Some(deadline) = game.phase_deadline.as_deref() else {
                continue;
            };
            let Ok(deadline) = chrono::DateTime::parse_from_rfc3339(deadline) else {
                tracing::error!("Unparseable phase deadline: {:?}", game.phase_deadline);
                continue;
            };

            if chrono::Utc::now() >= deadline.with_timezone(&chrono::Utc) {
                // advance_phase re-checks the phase, so losing the race
                // against a client-driven transition is a clean no-op
                state
                    .advance_phase(GamePhase::Thinking, GamePhase::Poking)
                    .await;
            }
        }
    });
}
