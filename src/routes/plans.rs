use std::collections::BTreeMap;
use std::path::{Path as FsPath, PathBuf};

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::constants::{ITEMS_PER_LESSON, LESSONS_PER_WEEK, MAX_PLAN_WEEKS};
use crate::engine::allocator::{allocate, allocate_direct, AllocationRequest, LessonPlan};
use crate::engine::item_index::ItemIndex;
use crate::engine::types::{Ability, Rating};
use crate::extractors::JsonBody;
use crate::response::{created, ok, AppError};
use crate::routes::assessments::load_accessible_profile;
use crate::state::AppState;
use crate::store::operations::plans::{PlanKind, TrainingPlanRecord};
use crate::store::operations::users::Role;
use crate::validation::validate_person_name;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(generate_plan))
        .route("/direct", post(generate_direct_plan))
        .route("/:id", get(get_plan))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratePlanRequest {
    profile_id: String,
    #[serde(default)]
    weeks: Option<usize>,
    /// 是否把选中的题目文件复制成按课次分组的目录
    #[serde(default)]
    package: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateDirectPlanRequest {
    child_name: String,
    child_age: u32,
    /// 能力名 → 难度标签（"L1"～"L9"）
    difficulties: BTreeMap<String, String>,
    #[serde(default)]
    weeks: Option<usize>,
    #[serde(default)]
    package: Option<bool>,
}

fn validate_weeks(weeks: Option<usize>) -> Result<usize, AppError> {
    let weeks = weeks.unwrap_or(1);
    if !(1..=MAX_PLAN_WEEKS).contains(&weeks) {
        return Err(AppError::bad_request(
            "INVALID_WEEKS",
            &format!("训练周数需在1-{MAX_PLAN_WEEKS}周之间"),
        ));
    }
    Ok(weeks)
}

/// 解析 "L3" / "l3" / "3" 形式的难度标签
fn parse_level(raw: &str) -> Option<u8> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix('L')
        .or_else(|| trimmed.strip_prefix('l'))
        .unwrap_or(trimmed)
        .trim();
    match digits.parse::<u8>() {
        Ok(level) if (1..=9).contains(&level) => Some(level),
        _ => None,
    }
}

/// 列出题库目录下的全部文件名，目录不存在按空题库处理
async fn list_item_identifiers(item_dir: &str) -> Result<Vec<String>, AppError> {
    let mut identifiers = Vec::new();
    let mut entries = match tokio::fs::read_dir(item_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(item_dir, "题库目录不存在，按空题库处理");
            return Ok(identifiers);
        }
        Err(e) => return Err(AppError::internal(&format!("读取题库目录失败: {e}"))),
    };

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::internal(&format!("读取题库目录失败: {e}")))?
    {
        let is_file = entry
            .file_type()
            .await
            .map(|t| t.is_file())
            .unwrap_or(false);
        if !is_file {
            continue;
        }
        if let Ok(name) = entry.file_name().into_string() {
            identifiers.push(name);
        }
    }

    Ok(identifiers)
}

/// 把方案题目文件复制成「第N次课」目录结构，返回输出根目录
async fn package_plan(
    item_dir: &str,
    output_root: &str,
    folder_name: &str,
    plan: &LessonPlan,
) -> Result<PathBuf, AppError> {
    let base = FsPath::new(output_root).join(folder_name);
    tokio::fs::create_dir_all(&base)
        .await
        .map_err(|e| AppError::internal(&format!("创建方案目录失败: {e}")))?;

    for (index, lesson) in plan.lessons.iter().enumerate() {
        let lesson_dir = base.join(format!("第{}次课", index + 1));
        tokio::fs::create_dir_all(&lesson_dir)
            .await
            .map_err(|e| AppError::internal(&format!("创建课次目录失败: {e}")))?;

        for item in lesson {
            let src = FsPath::new(item_dir).join(item);
            let dst = lesson_dir.join(item);
            if let Err(e) = tokio::fs::copy(&src, &dst).await {
                tracing::warn!(item, error = %e, "复制题目文件失败，方案记录不受影响");
            }
        }
    }

    Ok(base)
}

/// 从档案评级中取出可参与视觉训练排课的能力
fn visual_ratings_of(
    ratings: &BTreeMap<String, crate::store::operations::profiles::AbilityResult>,
) -> BTreeMap<Ability, Rating> {
    ratings
        .iter()
        .filter_map(|(name, result)| {
            let ability = name.parse::<Ability>().ok()?;
            if !ability.is_visual() {
                return None;
            }
            let rating = result.current_rating.as_rating()?;
            Some((ability, rating))
        })
        .collect()
}

async fn generate_plan(
    auth_user: AuthUser,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<GeneratePlanRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    auth_user.require(Role::Assessor)?;
    let weeks = validate_weeks(req.weeks)?;

    let profile = load_accessible_profile(&auth_user, &state, &req.profile_id)?;
    let ratings = visual_ratings_of(&profile.ratings);
    if ratings.is_empty() {
        return Err(AppError::bad_request(
            "EMPTY_RATINGS",
            "没有可用的视觉能力评估结果，请确保至少提供一项视觉相关的能力评估",
        ));
    }

    let identifiers = list_item_identifiers(&state.config().library.item_dir).await?;
    let index = ItemIndex::build(identifiers);

    let lessons = weeks * LESSONS_PER_WEEK;
    let allocation = AllocationRequest {
        child_age: profile.age,
        ratings: &ratings,
        index: &index,
        lessons,
        items_per_lesson: ITEMS_PER_LESSON,
    };
    let plan = allocate(&mut rand::thread_rng(), &allocation)?;

    let plan_id = uuid::Uuid::new_v4().to_string();
    let output_dir = if req.package.unwrap_or(true) {
        let folder_name = format!(
            "{}—{}节课视觉训练-{}",
            profile.name,
            lessons,
            &plan_id[..8]
        );
        let base = package_plan(
            &state.config().library.item_dir,
            &state.config().library.plan_output_dir,
            &folder_name,
            &plan,
        )
        .await?;
        Some(base.to_string_lossy().to_string())
    } else {
        None
    };

    let record = TrainingPlanRecord {
        id: plan_id,
        kind: PlanKind::Assessment,
        profile_id: Some(profile.id.clone()),
        child_name: profile.name.clone(),
        child_age: profile.age,
        weeks,
        plan,
        output_dir,
        created_by: auth_user.user_id.clone(),
        created_at: Utc::now(),
    };
    state.store().create_plan(&record)?;

    tracing::info!(
        plan_id = %record.id,
        lessons,
        items = record.plan.total_items(),
        "视觉训练方案已生成"
    );
    Ok(created(record))
}

async fn generate_direct_plan(
    auth_user: AuthUser,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<GenerateDirectPlanRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    auth_user.require(Role::Teacher)?;
    let weeks = validate_weeks(req.weeks)?;

    let child_name = req.child_name.trim();
    if let Err(msg) = validate_person_name(child_name) {
        return Err(AppError::bad_request("INVALID_NAME", msg));
    }

    let mut difficulties: BTreeMap<Ability, u8> = BTreeMap::new();
    for (ability_name, level_label) in &req.difficulties {
        let ability = ability_name.parse::<Ability>().map_err(|_| {
            AppError::bad_request("UNKNOWN_ABILITY", &format!("未知能力: {ability_name}"))
        })?;
        let level = parse_level(level_label).ok_or_else(|| {
            AppError::bad_request(
                "INVALID_DIFFICULTY",
                &format!("难度标签无效: {level_label}，应为 L1～L9"),
            )
        })?;
        difficulties.insert(ability, level);
    }
    if difficulties.is_empty() {
        return Err(AppError::bad_request(
            "EMPTY_RATINGS",
            "请至少为一项能力选择难度",
        ));
    }

    let identifiers = list_item_identifiers(&state.config().library.item_dir).await?;
    let index = ItemIndex::build(identifiers);

    let lessons = weeks * LESSONS_PER_WEEK;
    let plan = allocate_direct(
        &mut rand::thread_rng(),
        &index,
        &difficulties,
        lessons,
        ITEMS_PER_LESSON,
    )?;

    let plan_id = uuid::Uuid::new_v4().to_string();
    let output_dir = if req.package.unwrap_or(true) {
        let folder_name = format!("{child_name}—{lessons}节课视觉训练-{}", &plan_id[..8]);
        let base = package_plan(
            &state.config().library.item_dir,
            &state.config().library.plan_output_dir,
            &folder_name,
            &plan,
        )
        .await?;
        Some(base.to_string_lossy().to_string())
    } else {
        None
    };

    let record = TrainingPlanRecord {
        id: plan_id,
        kind: PlanKind::Direct,
        profile_id: None,
        child_name: child_name.to_string(),
        child_age: req.child_age,
        weeks,
        plan,
        output_dir,
        created_by: auth_user.user_id.clone(),
        created_at: Utc::now(),
    };
    state.store().create_plan(&record)?;

    Ok(created(record))
}

async fn get_plan(
    auth_user: AuthUser,
    Path(plan_id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let record = state
        .store()
        .get_plan(&plan_id)?
        .ok_or_else(|| AppError::not_found("训练方案不存在"))?;

    if auth_user.role != Role::Admin && record.created_by != auth_user.user_id {
        return Err(AppError::forbidden("无权查看该训练方案"));
    }

    Ok(ok(record))
}

#[cfg(test)]
mod tests {
    use crate::engine::types::RatingLabel;
    use crate::store::operations::profiles::AbilityResult;

    use super::*;

    #[test]
    fn level_labels_parse() {
        assert_eq!(parse_level("L3"), Some(3));
        assert_eq!(parse_level("l9"), Some(9));
        assert_eq!(parse_level(" 4 "), Some(4));
        assert_eq!(parse_level("L0"), None);
        assert_eq!(parse_level("L10"), None);
        assert_eq!(parse_level("hard"), None);
    }

    #[test]
    fn weeks_are_bounded() {
        assert_eq!(validate_weeks(None).unwrap(), 1);
        assert_eq!(validate_weeks(Some(4)).unwrap(), 4);
        assert!(validate_weeks(Some(0)).is_err());
        assert!(validate_weeks(Some(MAX_PLAN_WEEKS + 1)).is_err());
    }

    #[test]
    fn visual_filter_drops_auditory_and_unknown() {
        let result = AbilityResult {
            current_score: 3.0,
            current_rating: RatingLabel::Pass,
            target_score: 4.0,
            target_rating: RatingLabel::Excellent,
        };
        let mut ratings = BTreeMap::new();
        ratings.insert("visual_memory".to_string(), result);
        ratings.insert("auditory_memory".to_string(), result);
        let mut unknown = result;
        unknown.current_rating = RatingLabel::Unknown;
        ratings.insert("visual_breadth".to_string(), unknown);
        ratings.insert("读心术".to_string(), result);

        let visual = visual_ratings_of(&ratings);
        assert_eq!(visual.len(), 1);
        assert_eq!(visual[&Ability::VisualMemory], Rating::Pass);
    }
}
