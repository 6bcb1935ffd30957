use axum::extract::State;
use axum::routing::get;
use axum::Router;

use crate::auth::AuthUser;
use crate::response::{ok, AppError};
use crate::routes::auth::StaffProfile;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/me", get(me))
}

async fn me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let user = state
        .store()
        .get_user_by_id(&auth_user.user_id)?
        .ok_or_else(|| AppError::unauthorized("User not found"))?;

    Ok(ok(StaffProfile::from(&user)))
}
