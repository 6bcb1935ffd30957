pub mod actions;
pub mod tags;
pub mod users;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::response::{ok, AppError};
use crate::state::AppState;
use crate::store::operations::users::{Role, User};

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/users", users::router())
        .nest("/tags", tags::router())
        .nest("/actions", actions::router())
        .route("/permission-logs", get(list_permission_logs))
}

/// 操作者能否管理目标账户：
/// 管理员可管理除自己以外的任何账户（防止自我降权/删除）；
/// 校长只能管理本训练中心、且角色低于校长的账户。
pub(crate) fn can_manage_user(operator: &AuthUser, target: &User) -> bool {
    match operator.role {
        Role::Admin => operator.user_id != target.id,
        Role::Principal => {
            target.training_center == operator.training_center
                && target.role.level() < Role::Principal.level()
        }
        _ => false,
    }
}

/// 操作者能否授予某个角色：管理员任意，校长只能授予校长以下的角色
pub(crate) fn can_assign_role(operator: &AuthUser, new_role: Role) -> bool {
    match operator.role {
        Role::Admin => true,
        Role::Principal => new_role.level() < Role::Principal.level(),
        _ => false,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PermissionLogsQuery {
    limit: Option<usize>,
}

async fn list_permission_logs(
    auth_user: AuthUser,
    Query(query): Query<PermissionLogsQuery>,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    auth_user.require(Role::Principal)?;

    let limit = query.limit.unwrap_or(50).clamp(1, 500);
    let logs = state.store().list_permission_logs(limit)?;
    Ok(ok(logs))
}
