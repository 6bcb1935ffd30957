use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::constants::{MAX_ASSESSMENT_AGE, MIN_ASSESSMENT_AGE};
use crate::engine::rating::classify_named;
use crate::extractors::JsonBody;
use crate::report::report_payload;
use crate::response::{created, ok, AppError};
use crate::state::AppState;
use crate::store::operations::profiles::{AbilityResult, StudentProfile};
use crate::store::operations::users::Role;
use crate::validation::{age_at, parse_date, validate_person_name};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(submit_assessment))
        .route("/:id", get(get_assessment))
        .route("/:id/report", get(get_report))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitAssessmentRequest {
    name: String,
    /// 出生日期，YYYY-MM-DD
    dob: String,
    /// 测评日期，YYYY-MM-DD
    test_date: String,
    #[serde(default)]
    training_center: Option<String>,
    #[serde(default)]
    assessor: Option<String>,
    /// 能力名 → 原始得分。未识别的能力名按未知评级原样保留。
    scores: BTreeMap<String, f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AssessmentResponse {
    profile_id: String,
    name: String,
    age: u32,
    test_date: String,
    training_center: String,
    assessor: String,
    results: BTreeMap<String, AbilityResult>,
}

impl AssessmentResponse {
    fn from_profile(profile: &StudentProfile) -> Self {
        Self {
            profile_id: profile.id.clone(),
            name: profile.name.clone(),
            age: profile.age,
            test_date: profile.test_date.to_string(),
            training_center: profile.training_center.clone(),
            assessor: profile.assessor.clone(),
            results: profile.ratings.clone(),
        }
    }
}

/// 对一次提交的全部能力分档。单项出错（未知能力名）不影响其余能力。
fn classify_all(scores: &BTreeMap<String, f64>, age: u32) -> BTreeMap<String, AbilityResult> {
    scores
        .iter()
        .map(|(ability_name, &score)| {
            let classified = classify_named(ability_name, age, score);
            (
                ability_name.clone(),
                AbilityResult {
                    current_score: score,
                    current_rating: classified.current_rating,
                    target_score: classified.target_score,
                    target_rating: classified.target_rating,
                },
            )
        })
        .collect()
}

async fn submit_assessment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SubmitAssessmentRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    auth_user.require(Role::Assessor)?;

    let name = req.name.trim();
    if let Err(msg) = validate_person_name(name) {
        return Err(AppError::bad_request("INVALID_NAME", msg));
    }

    let dob = parse_date(&req.dob).map_err(|msg| AppError::bad_request("INVALID_DATE", msg))?;
    let test_date =
        parse_date(&req.test_date).map_err(|msg| AppError::bad_request("INVALID_DATE", msg))?;

    let age = age_at(dob, test_date).map_err(|msg| AppError::bad_request("INVALID_DATE", msg))?;
    if !(MIN_ASSESSMENT_AGE..=MAX_ASSESSMENT_AGE).contains(&age) {
        return Err(AppError::bad_request(
            "AGE_OUT_OF_RANGE",
            &format!("测评年龄需在{MIN_ASSESSMENT_AGE}-{MAX_ASSESSMENT_AGE}岁之间（当前 {age} 岁）"),
        ));
    }

    if req.scores.is_empty() {
        return Err(AppError::bad_request(
            "EMPTY_SCORES",
            "请至少填写一项测评数据",
        ));
    }
    if req.scores.values().any(|score| !score.is_finite() || *score < 0.0) {
        return Err(AppError::bad_request(
            "INVALID_SCORE",
            "测评得分必须是非负数",
        ));
    }

    let ratings = classify_all(&req.scores, age);

    let profile = StudentProfile {
        id: uuid::Uuid::new_v4().to_string(),
        name: name.to_string(),
        dob,
        age,
        test_date,
        training_center: req
            .training_center
            .as_deref()
            .unwrap_or(&auth_user.training_center)
            .trim()
            .to_string(),
        assessor: req
            .assessor
            .as_deref()
            .unwrap_or(&auth_user.username)
            .trim()
            .to_string(),
        scores: req.scores,
        ratings,
        created_by: auth_user.user_id.clone(),
        created_at: Utc::now(),
    };

    state.store().create_profile(&profile)?;
    tracing::info!(
        profile_id = %profile.id,
        age,
        abilities = profile.ratings.len(),
        "测评档案已创建"
    );

    Ok(created(AssessmentResponse::from_profile(&profile)))
}

async fn get_assessment(
    auth_user: AuthUser,
    Path(profile_id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let profile = load_accessible_profile(&auth_user, &state, &profile_id)?;
    Ok(ok(AssessmentResponse::from_profile(&profile)))
}

async fn get_report(
    auth_user: AuthUser,
    Path(profile_id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let profile = load_accessible_profile(&auth_user, &state, &profile_id)?;
    Ok(ok(report_payload(&profile)))
}

/// 读取档案并套用与档案列表一致的可见性规则
pub(crate) fn load_accessible_profile(
    auth_user: &AuthUser,
    state: &AppState,
    profile_id: &str,
) -> Result<StudentProfile, AppError> {
    let profile = state
        .store()
        .get_profile(profile_id)?
        .ok_or_else(|| AppError::not_found("测评档案不存在"))?;

    if super::profiles::can_access_profile(auth_user, &profile) {
        Ok(profile)
    } else {
        Err(AppError::forbidden("无权查看该学生档案"))
    }
}
