use axum::extract::State;
use axum::routing::post;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::engine::action_match::{plan_actions, Action};
use crate::extractors::JsonBody;
use crate::response::{created, AppError};
use crate::state::AppState;
use crate::store::operations::users::Role;
use crate::validation::validate_person_name;

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(generate_training_plan))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateTrainingPlanRequest {
    student_name: String,
    student_age: u32,
    selected_tags: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TrainingPlanResponse {
    student_name: String,
    student_age: u32,
    selected_tags: Vec<String>,
    lessons: Vec<Vec<Action>>,
}

/// 基于标签匹配生成感统训练方案（12 节课 × 每课 3 个动作）
async fn generate_training_plan(
    auth_user: AuthUser,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<GenerateTrainingPlanRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    auth_user.require(Role::Teacher)?;

    let student_name = req.student_name.trim();
    if let Err(msg) = validate_person_name(student_name) {
        return Err(AppError::bad_request("INVALID_NAME", msg));
    }

    let selected_tags: Vec<String> = req
        .selected_tags
        .iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    if selected_tags.is_empty() {
        return Err(AppError::bad_request(
            "EMPTY_TAGS",
            "请至少选择一个训练标签",
        ));
    }

    let actions = state.store().list_actions()?;
    if actions.is_empty() {
        return Err(AppError::unprocessable(
            "EMPTY_ACTION_LIBRARY",
            "动作库为空，请联系管理员导入动作库",
        ));
    }

    let lessons = plan_actions(
        &mut rand::thread_rng(),
        &actions,
        req.student_age,
        &selected_tags,
    )?;

    tracing::info!(
        student = student_name,
        age = req.student_age,
        tags = selected_tags.len(),
        "感统训练方案已生成"
    );

    Ok(created(TrainingPlanResponse {
        student_name: student_name.to_string(),
        student_age: req.student_age,
        selected_tags,
        lessons,
    }))
}
