use axum::extract::{Path, State};
use axum::routing::{get, patch};
use axum::Router;
use chrono::Utc;
use serde::Deserialize;

use crate::auth::{hash_password, AuthUser};
use crate::extractors::JsonBody;
use crate::response::{created, ok, AppError};
use crate::routes::admin::{can_assign_role, can_manage_user};
use crate::routes::auth::StaffProfile;
use crate::state::AppState;
use crate::store::operations::permission_logs::PermissionLogEntry;
use crate::store::operations::users::{Role, User, DEFAULT_ROLE};
use crate::store::StoreError;
use crate::validation::{validate_password, validate_person_name, validate_username};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", patch(update_user).delete(delete_user))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateUserRequest {
    username: String,
    password: String,
    display_name: String,
    #[serde(default)]
    role: Option<Role>,
    #[serde(default)]
    training_center: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateUserRequest {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    role: Option<Role>,
    #[serde(default)]
    training_center: Option<String>,
}

fn log_role_change(
    state: &AppState,
    operator: &AuthUser,
    target: &User,
    old_role: Option<Role>,
) {
    let entry = PermissionLogEntry {
        id: uuid::Uuid::new_v4().to_string(),
        target_user_id: target.id.clone(),
        target_username: target.username.clone(),
        old_role,
        new_role: target.role,
        operator_id: operator.user_id.clone(),
        operator_username: operator.username.clone(),
        operator_role: operator.role,
        created_at: Utc::now(),
    };
    if let Err(e) = state.store().append_permission_log(&entry) {
        tracing::warn!(error = %e, target = %target.username, "权限日志写入失败");
    }
}

async fn list_users(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    auth_user.require(Role::Principal)?;

    let users = state.store().list_users()?;
    let visible: Vec<StaffProfile> = users
        .iter()
        .filter(|u| match auth_user.role {
            Role::Admin => true,
            _ => u.training_center == auth_user.training_center,
        })
        .map(StaffProfile::from)
        .collect();

    Ok(ok(visible))
}

async fn create_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateUserRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    auth_user.require(Role::Principal)?;

    let username = req.username.trim();
    if let Err(msg) = validate_username(username) {
        return Err(AppError::bad_request("INVALID_USERNAME", msg));
    }
    if let Err(msg) = validate_password(&req.password) {
        return Err(AppError::bad_request("AUTH_WEAK_PASSWORD", msg));
    }
    let display_name = req.display_name.trim();
    if let Err(msg) = validate_person_name(display_name) {
        return Err(AppError::bad_request("INVALID_NAME", msg));
    }

    let role = req.role.unwrap_or(DEFAULT_ROLE);
    if !can_assign_role(&auth_user, role) {
        return Err(AppError::forbidden("无权创建该角色的账户"));
    }

    // 校长建号固定落在自己的训练中心
    let training_center = match auth_user.role {
        Role::Admin => req
            .training_center
            .as_deref()
            .unwrap_or(&auth_user.training_center)
            .trim()
            .to_string(),
        _ => auth_user.training_center.clone(),
    };

    let now = Utc::now();
    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        username: username.to_string(),
        display_name: display_name.to_string(),
        role,
        training_center,
        password_hash: hash_password(&req.password)?,
        created_at: now,
        updated_at: now,
        failed_login_count: 0,
        locked_until: None,
    };

    match state.store().create_user(&user) {
        Ok(()) => {}
        Err(StoreError::Conflict { .. }) => {
            return Err(AppError::conflict("USERNAME_EXISTS", "登录名已被使用"));
        }
        Err(e) => return Err(e.into()),
    }

    log_role_change(&state, &auth_user, &user, None);
    Ok(created(StaffProfile::from(&user)))
}

async fn update_user(
    auth_user: AuthUser,
    Path(user_id): Path<String>,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<UpdateUserRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    auth_user.require(Role::Principal)?;

    let mut user = state
        .store()
        .get_user_by_id(&user_id)?
        .ok_or_else(|| AppError::not_found("账户不存在"))?;

    if !can_manage_user(&auth_user, &user) {
        return Err(AppError::forbidden("无权管理该账户"));
    }

    if let Some(display_name) = &req.display_name {
        let trimmed = display_name.trim();
        if let Err(msg) = validate_person_name(trimmed) {
            return Err(AppError::bad_request("INVALID_NAME", msg));
        }
        user.display_name = trimmed.to_string();
    }

    if let Some(password) = &req.password {
        if let Err(msg) = validate_password(password) {
            return Err(AppError::bad_request("AUTH_WEAK_PASSWORD", msg));
        }
        user.password_hash = hash_password(password)?;
        // 重置密码的同时吊销既有会话
        let _ = state.store().delete_user_sessions(&user.id);
    }

    if let Some(center) = &req.training_center {
        if auth_user.role != Role::Admin {
            return Err(AppError::forbidden("只有管理员可以调整训练中心"));
        }
        user.training_center = center.trim().to_string();
    }

    let old_role = user.role;
    if let Some(new_role) = req.role {
        if new_role != user.role {
            if !can_assign_role(&auth_user, new_role) {
                return Err(AppError::forbidden("无权授予该角色"));
            }
            user.role = new_role;
        }
    }

    user.updated_at = Utc::now();
    state.store().update_user(&user)?;

    if user.role != old_role {
        log_role_change(&state, &auth_user, &user, Some(old_role));
    }

    Ok(ok(StaffProfile::from(&user)))
}

async fn delete_user(
    auth_user: AuthUser,
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    auth_user.require(Role::Principal)?;

    let user = state
        .store()
        .get_user_by_id(&user_id)?
        .ok_or_else(|| AppError::not_found("账户不存在"))?;

    if !can_manage_user(&auth_user, &user) {
        return Err(AppError::forbidden("无权删除该账户"));
    }

    state.store().delete_user(&user.id)?;
    tracing::info!(
        target = %user.username,
        operator = %auth_user.username,
        "账户已删除"
    );
    Ok(ok(serde_json::json!({"deleted": true})))
}
