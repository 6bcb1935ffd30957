use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::types::RatingLabel;
use crate::store::keys;
use crate::store::{Store, StoreError};

/// 单项能力的测评结果（得分 + 评级 + 目标）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbilityResult {
    pub current_score: f64,
    pub current_rating: RatingLabel,
    pub target_score: f64,
    pub target_rating: RatingLabel,
}

/// 学生测评档案。scores/ratings 以提交时的能力名为键，
/// 未识别的能力名原样保留（评级为未知）。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    pub id: String,
    pub name: String,
    pub dob: NaiveDate,
    pub age: u32,
    pub test_date: NaiveDate,
    pub training_center: String,
    pub assessor: String,
    pub scores: BTreeMap<String, f64>,
    pub ratings: BTreeMap<String, AbilityResult>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Store {
    pub fn create_profile(&self, profile: &StudentProfile) -> Result<(), StoreError> {
        let key = keys::profile_key(&profile.id);
        self.student_profiles
            .insert(key.as_bytes(), Self::serialize(profile)?)?;
        Ok(())
    }

    pub fn get_profile(&self, profile_id: &str) -> Result<Option<StudentProfile>, StoreError> {
        let key = keys::profile_key(profile_id);
        match self.student_profiles.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// 全量档案，按创建时间倒序
    pub fn list_profiles(&self) -> Result<Vec<StudentProfile>, StoreError> {
        let mut profiles = Vec::new();
        for item in self.student_profiles.iter() {
            let (_, value) = item?;
            profiles.push(Self::deserialize::<StudentProfile>(&value)?);
        }
        profiles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(profiles)
    }

    pub fn delete_profile(&self, profile_id: &str) -> Result<(), StoreError> {
        let key = keys::profile_key(profile_id);
        let removed = self.student_profiles.remove(key.as_bytes())?;
        if removed.is_none() {
            return Err(StoreError::NotFound {
                entity: "student_profile".to_string(),
                key: profile_id.to_string(),
            });
        }
        Ok(())
    }
}
