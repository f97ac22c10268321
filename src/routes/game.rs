use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use crate::auth::AuthUser;
use crate::engine::reward::{level_progress_percent, xp_threshold};
use crate::response::{ok, AppError};
use crate::state::AppState;
use crate::store::operations::game_states::GameState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/state", get(game_state))
        .route("/level", get(level))
        .route("/badges", get(badges))
}

fn load_game_state(auth_user: &AuthUser, state: &AppState) -> Result<GameState, AppError> {
    auth_user.require_student()?;
    // Seeded at registration; a missing record still answers as a fresh one.
    Ok(state
        .store()
        .get_game_state(&auth_user.user_id)?
        .unwrap_or_else(|| GameState::new(&auth_user.user_id)))
}

async fn game_state(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let gs = load_game_state(&auth_user, &state)?;
    Ok(ok(serde_json::json!({
        "xp": gs.xp,
        "level": gs.level,
        "levelProgressPercent": level_progress_percent(gs.xp),
        "streak": gs.streak,
        "stats": gs.stats,
        "badges": gs.badges,
    })))
}

async fn level(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let gs = load_game_state(&auth_user, &state)?;
    Ok(ok(serde_json::json!({
        "level": gs.level,
        "xp": gs.xp,
        "currentLevelXp": xp_threshold(gs.level),
        "nextLevelXp": xp_threshold(gs.level + 1),
        "progressPercent": level_progress_percent(gs.xp),
    })))
}

async fn badges(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let gs = load_game_state(&auth_user, &state)?;
    Ok(ok(gs.badges))
}
