use axum::extract::State;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::engine::action_match::Action;
use crate::extractors::JsonBody;
use crate::response::{ok, AppError};
use crate::state::AppState;
use crate::store::operations::users::Role;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_actions).put(replace_actions))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReplaceActionsRequest {
    actions: Vec<Action>,
}

async fn list_actions(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    auth_user.require(Role::Admin)?;
    Ok(ok(state.store().list_actions()?))
}

/// 动作库整库导入（覆盖式）
async fn replace_actions(
    auth_user: AuthUser,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ReplaceActionsRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    auth_user.require(Role::Admin)?;

    let count = state.store().replace_actions(&req.actions)?;
    tracing::info!(count, operator = %auth_user.username, "动作库已更新");
    Ok(ok(serde_json::json!({ "imported": count })))
}
