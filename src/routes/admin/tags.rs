use axum::extract::{Path, State};
use axum::routing::{get, patch};
use axum::Router;
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::extractors::JsonBody;
use crate::response::{created, ok, AppError};
use crate::state::AppState;
use crate::store::operations::users::Role;
use crate::store::StoreError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_all_tags).post(add_tag))
        .route("/:name", patch(update_tag))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddTagRequest {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateTagRequest {
    #[serde(default)]
    visible: Option<bool>,
    #[serde(default)]
    new_name: Option<String>,
}

/// 管理端标签列表（包含隐藏标签）
async fn list_all_tags(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    auth_user.require(Role::Admin)?;
    Ok(ok(state.store().list_tags()?))
}

async fn add_tag(
    auth_user: AuthUser,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<AddTagRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    auth_user.require(Role::Admin)?;

    match state.store().add_tag(&req.name) {
        Ok(tag) => Ok(created(tag)),
        Err(StoreError::Conflict { .. }) => {
            Err(AppError::conflict("TAG_EXISTS", "标签已存在"))
        }
        Err(e) => Err(e.into()),
    }
}

async fn update_tag(
    auth_user: AuthUser,
    Path(name): Path<String>,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<UpdateTagRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    auth_user.require(Role::Admin)?;

    let mut tag = state
        .store()
        .get_tag(&name)?
        .ok_or_else(|| AppError::not_found("标签不存在"))?;

    if let Some(visible) = req.visible {
        tag = state.store().set_tag_visibility(&tag.name, visible)?;
    }

    if let Some(new_name) = &req.new_name {
        tag = match state.store().rename_tag(&tag.name, new_name) {
            Ok(tag) => tag,
            Err(StoreError::Conflict { .. }) => {
                return Err(AppError::conflict("TAG_EXISTS", "目标标签名已存在"));
            }
            Err(e) => return Err(e.into()),
        };
    }

    Ok(ok(tag))
}
