use axum::extract::State;
use axum::routing::get;
use axum::Router;

use crate::auth::AuthUser;
use crate::response::{ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_visible_tags))
}

/// 训练标签选项（仅可见标签）。管理端的增改在 /api/admin/tags 下。
async fn list_visible_tags(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let tags = state.store().visible_tags()?;
    Ok(ok(tags))
}
