use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::engine::types::Ability;
use crate::response::{paginated, AppError};
use crate::state::AppState;
use crate::store::operations::profiles::StudentProfile;
use crate::store::operations::users::Role;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_profiles))
        .route("/export", get(export_profiles))
}

/// 档案可见性：管理员看全部，校长看本训练中心，测评师看自己创建的，
/// 老师无档案查看权限。
pub(crate) fn can_access_profile(auth_user: &AuthUser, profile: &StudentProfile) -> bool {
    match auth_user.role {
        Role::Admin => true,
        Role::Principal => profile.training_center == auth_user.training_center,
        Role::Assessor => profile.created_by == auth_user.user_id,
        Role::Teacher => false,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListProfilesQuery {
    #[serde(default)]
    search_name: Option<String>,
    #[serde(default)]
    search_assessor: Option<String>,
    #[serde(default)]
    sort_by: Option<String>,
    #[serde(default)]
    sort_order: Option<String>,
    page: Option<u64>,
    per_page: Option<u64>,
}

impl ListProfilesQuery {
    fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    fn per_page(&self) -> u64 {
        self.per_page
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }
}

/// 姓名/测评师子串过滤
fn search_profiles(
    profiles: Vec<StudentProfile>,
    search_name: &str,
    search_assessor: &str,
) -> Vec<StudentProfile> {
    profiles
        .into_iter()
        .filter(|p| search_name.is_empty() || p.name.contains(search_name))
        .filter(|p| search_assessor.is_empty() || p.assessor.contains(search_assessor))
        .collect()
}

fn sort_profiles(profiles: &mut [StudentProfile], sort_by: &str, descending: bool) {
    match sort_by {
        "age" => profiles.sort_by_key(|p| p.age),
        "test_date" => profiles.sort_by_key(|p| p.test_date),
        _ => profiles.sort_by(|a, b| a.name.cmp(&b.name)),
    }
    if descending {
        profiles.reverse();
    }
}

fn accessible_profiles(
    auth_user: &AuthUser,
    state: &AppState,
    query: &ListProfilesQuery,
) -> Result<Vec<StudentProfile>, AppError> {
    // 老师角色没有档案列表权限，直接拒绝而不是返回空列表
    if !auth_user.role.at_least(Role::Assessor) {
        return Err(AppError::forbidden("该操作需要测评师及以上权限"));
    }

    let all = state.store().list_profiles()?;
    let mut visible: Vec<StudentProfile> = all
        .into_iter()
        .filter(|p| can_access_profile(auth_user, p))
        .collect();

    visible = search_profiles(
        visible,
        query.search_name.as_deref().unwrap_or("").trim(),
        query.search_assessor.as_deref().unwrap_or("").trim(),
    );

    let descending = query.sort_order.as_deref() == Some("desc");
    sort_profiles(
        &mut visible,
        query.sort_by.as_deref().unwrap_or("name"),
        descending,
    );

    Ok(visible)
}

async fn list_profiles(
    auth_user: AuthUser,
    Query(query): Query<ListProfilesQuery>,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let visible = accessible_profiles(&auth_user, &state, &query)?;

    let page = query.page();
    let per_page = query.per_page();
    let total = visible.len() as u64;
    let offset = ((page - 1) * per_page) as usize;
    let page_items: Vec<StudentProfile> = visible
        .into_iter()
        .skip(offset)
        .take(per_page as usize)
        .collect();

    Ok(paginated(page_items, total, page, per_page))
}

/// 档案导出 CSV：基础列 + 每项能力四列
fn profiles_to_csv(profiles: &[StudentProfile]) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec![
        "姓名".to_string(),
        "出生日期".to_string(),
        "年龄".to_string(),
        "测评日期".to_string(),
        "训练中心".to_string(),
        "测评师".to_string(),
    ];
    for ability in Ability::ALL {
        let kw = ability.keyword();
        header.push(format!("{kw}得分"));
        header.push(format!("{kw}评级"));
        header.push(format!("{kw}目标分"));
        header.push(format!("{kw}目标评级"));
    }
    writer
        .write_record(&header)
        .map_err(|e| AppError::internal(&format!("CSV 写入失败: {e}")))?;

    for profile in profiles {
        let mut row = vec![
            profile.name.clone(),
            profile.dob.to_string(),
            profile.age.to_string(),
            profile.test_date.to_string(),
            profile.training_center.clone(),
            profile.assessor.clone(),
        ];
        for ability in Ability::ALL {
            match profile.ratings.get(ability.name()) {
                Some(result) => {
                    row.push(result.current_score.to_string());
                    row.push(result.current_rating.label().to_string());
                    row.push(result.target_score.to_string());
                    row.push(result.target_rating.label().to_string());
                }
                None => row.extend(std::iter::repeat(String::new()).take(4)),
            }
        }
        writer
            .write_record(&row)
            .map_err(|e| AppError::internal(&format!("CSV 写入失败: {e}")))?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::internal(&format!("CSV 写入失败: {e}")))
}

async fn export_profiles(
    auth_user: AuthUser,
    Query(query): Query<ListProfilesQuery>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let visible = accessible_profiles(&auth_user, &state, &query)?;
    let csv_bytes = profiles_to_csv(&visible)?;

    let response = (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"student_profiles.csv\"",
            ),
        ],
        csv_bytes,
    )
        .into_response();
    Ok(response)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{NaiveDate, Utc};

    use super::*;

    fn profile(name: &str, assessor: &str, center: &str, created_by: &str) -> StudentProfile {
        StudentProfile {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            dob: NaiveDate::from_ymd_opt(2018, 1, 1).unwrap(),
            age: 7,
            test_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            training_center: center.to_string(),
            assessor: assessor.to_string(),
            scores: BTreeMap::new(),
            ratings: BTreeMap::new(),
            created_by: created_by.to_string(),
            created_at: Utc::now(),
        }
    }

    fn auth(role: Role, user_id: &str, center: &str) -> AuthUser {
        AuthUser {
            user_id: user_id.to_string(),
            username: user_id.to_string(),
            role,
            training_center: center.to_string(),
        }
    }

    #[test]
    fn admin_sees_everything() {
        let p = profile("小明", "王老师", "东区", "someone");
        assert!(can_access_profile(&auth(Role::Admin, "admin", "西区"), &p));
    }

    #[test]
    fn principal_sees_own_center_only() {
        let p = profile("小明", "王老师", "东区", "someone");
        assert!(can_access_profile(&auth(Role::Principal, "p1", "东区"), &p));
        assert!(!can_access_profile(&auth(Role::Principal, "p1", "西区"), &p));
    }

    #[test]
    fn assessor_sees_own_submissions_only() {
        let p = profile("小明", "王老师", "东区", "u1");
        assert!(can_access_profile(&auth(Role::Assessor, "u1", "东区"), &p));
        assert!(!can_access_profile(&auth(Role::Assessor, "u2", "东区"), &p));
    }

    #[test]
    fn teacher_sees_nothing() {
        let p = profile("小明", "王老师", "东区", "u1");
        assert!(!can_access_profile(&auth(Role::Teacher, "u1", "东区"), &p));
    }

    #[test]
    fn search_filters_by_name_and_assessor() {
        let profiles = vec![
            profile("张小明", "王老师", "东区", "u1"),
            profile("李小红", "刘老师", "东区", "u1"),
        ];
        let by_name = search_profiles(profiles.clone(), "小明", "");
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].name, "张小明");

        let by_assessor = search_profiles(profiles, "", "刘");
        assert_eq!(by_assessor.len(), 1);
        assert_eq!(by_assessor[0].assessor, "刘老师");
    }

    #[test]
    fn sort_by_age_descending() {
        let mut profiles = vec![
            profile("甲", "王老师", "东区", "u1"),
            profile("乙", "王老师", "东区", "u1"),
        ];
        profiles[0].age = 5;
        profiles[1].age = 9;

        sort_profiles(&mut profiles, "age", true);
        assert_eq!(profiles[0].age, 9);
    }

    #[test]
    fn csv_has_header_and_rows() {
        let profiles = vec![profile("小明", "王老师", "东区", "u1")];
        let bytes = profiles_to_csv(&profiles).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("姓名,出生日期"));
        assert!(text.contains("小明"));
        assert_eq!(text.lines().count(), 2);
    }
}
