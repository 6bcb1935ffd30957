use axum::extract::State;
use axum::http::{header::SET_COOKIE, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::{
    dummy_argon2_hash, hash_password, hash_token, sign_jwt_for_user, verify_password, AuthUser,
};
use crate::constants::MAX_SESSIONS_PER_USER;
use crate::extractors::JsonBody;
use crate::response::{ok, AppError};
use crate::state::AppState;
use crate::store::operations::sessions::Session;
use crate::store::operations::users::User;
use crate::validation::validate_password;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/change-password", post(change_password))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StaffProfile {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub role: String,
    pub role_name: String,
    pub training_center: String,
}

impl From<&User> for StaffProfile {
    fn from(value: &User) -> Self {
        Self {
            id: value.id.clone(),
            username: value.username.clone(),
            display_name: value.display_name.clone(),
            role: value.role.as_str().to_string(),
            role_name: value.role.display_name().to_string(),
            training_center: value.training_center.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub user: StaffProfile,
}

/// Issue an access token and persist its session.
fn issue_token(user_id: &str, state: &AppState) -> Result<String, AppError> {
    // 清理超出限制的旧会话
    if let Err(e) = state
        .store()
        .cleanup_oldest_user_sessions(user_id, MAX_SESSIONS_PER_USER)
    {
        tracing::warn!(user_id, error = %e, "清理多余会话失败");
    }

    let access_token = sign_jwt_for_user(
        user_id,
        &state.config().jwt_secret,
        state.config().jwt_expires_in_hours,
    )?;

    let token_hash = hash_token(&access_token);
    state.store().create_session(&Session {
        token_hash,
        user_id: user_id.to_string(),
        created_at: Utc::now(),
        expires_at: Utc::now() + Duration::hours(state.config().jwt_expires_in_hours as i64),
        revoked: false,
    })?;

    Ok(access_token)
}

async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Response, AppError> {
    let user = state.store().get_user_by_username(req.username.trim())?;

    let Some(user) = user else {
        // 账户不存在也跑一次哈希校验，避免时间侧信道暴露用户名是否存在
        let _ = verify_password(&req.password, &dummy_argon2_hash());
        return Err(AppError::unauthorized("用户名或密码错误"));
    };

    // 检查账户是否因多次登录失败而被锁定
    if state.store().is_account_locked(&user.id)? {
        return Err(AppError::too_many_requests(
            "账户因多次登录失败被临时锁定，请稍后再试",
        ));
    }

    let verified = verify_password(&req.password, &user.password_hash)?;
    if !verified {
        // 记录登录失败，可能触发锁定
        let _ = state.store().record_failed_login(&user.id);
        return Err(AppError::unauthorized("用户名或密码错误"));
    }

    // 登录成功，重置失败计数
    let _ = state.store().reset_login_attempts(&user.id);

    let access_token = issue_token(&user.id, &state)?;

    let payload = AuthResponse {
        access_token: access_token.clone(),
        user: StaffProfile::from(&user),
    };

    let mut response = ok(payload).into_response();
    set_token_cookie(&mut response, &access_token)?;
    Ok(response)
}

async fn logout(auth_user: AuthUser, State(state): State<AppState>) -> Result<Response, AppError> {
    state.store().delete_user_sessions(&auth_user.user_id)?;

    let mut response = ok(serde_json::json!({"loggedOut": true})).into_response();
    clear_auth_cookie(&mut response)?;
    Ok(response)
}

async fn change_password(
    auth_user: AuthUser,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ChangePasswordRequest>,
) -> Result<Response, AppError> {
    if let Err(msg) = validate_password(&req.new_password) {
        return Err(AppError::bad_request("AUTH_WEAK_PASSWORD", msg));
    }

    let mut user = state
        .store()
        .get_user_by_id(&auth_user.user_id)?
        .ok_or_else(|| AppError::unauthorized("User not found"))?;

    if !verify_password(&req.old_password, &user.password_hash)? {
        return Err(AppError::unauthorized("原密码错误"));
    }

    user.password_hash = hash_password(&req.new_password)?;
    user.updated_at = Utc::now();
    state.store().update_user(&user)?;

    // 改密后吊销所有既有会话，要求重新登录
    let _ = state.store().delete_user_sessions(&user.id);

    let mut response = ok(serde_json::json!({"passwordChanged": true})).into_response();
    clear_auth_cookie(&mut response)?;
    Ok(response)
}

fn set_token_cookie(response: &mut Response, token: &str) -> Result<(), AppError> {
    let cookie = format!("token={token}; Path=/; SameSite=Strict; HttpOnly; Secure");
    append_set_cookie(response, &cookie, "token cookie set failed")?;
    Ok(())
}

fn clear_auth_cookie(response: &mut Response) -> Result<(), AppError> {
    append_set_cookie(
        response,
        "token=; Path=/; Max-Age=0; SameSite=Strict; HttpOnly; Secure",
        "token cookie clear failed",
    )?;
    Ok(())
}

fn append_set_cookie(
    response: &mut Response,
    cookie: &str,
    error_context: &str,
) -> Result<(), AppError> {
    let value = HeaderValue::from_str(cookie)
        .map_err(|e| AppError::internal(&format!("{error_context}: {e}")))?;
    response.headers_mut().append(SET_COOKIE, value);
    Ok(())
}
