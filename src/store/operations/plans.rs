use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::allocator::LessonPlan;
use crate::store::keys;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanKind {
    /// 按测评评级加权排课
    Assessment,
    /// 用户直接指定难度，权重均分
    Direct,
}

/// 一次生成的训练方案记录
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingPlanRecord {
    pub id: String,
    pub kind: PlanKind,
    pub profile_id: Option<String>,
    pub child_name: String,
    pub child_age: u32,
    pub weeks: usize,
    pub plan: LessonPlan,
    /// 方案文件打包输出目录；清理后为 None
    pub output_dir: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Store {
    pub fn create_plan(&self, record: &TrainingPlanRecord) -> Result<(), StoreError> {
        let key = keys::plan_key(&record.id);
        self.training_plans
            .insert(key.as_bytes(), Self::serialize(record)?)?;
        Ok(())
    }

    pub fn get_plan(&self, plan_id: &str) -> Result<Option<TrainingPlanRecord>, StoreError> {
        let key = keys::plan_key(plan_id);
        match self.training_plans.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn update_plan(&self, record: &TrainingPlanRecord) -> Result<(), StoreError> {
        if self.get_plan(&record.id)?.is_none() {
            return Err(StoreError::NotFound {
                entity: "training_plan".to_string(),
                key: record.id.clone(),
            });
        }
        self.create_plan(record)
    }

    pub fn list_plans(&self) -> Result<Vec<TrainingPlanRecord>, StoreError> {
        let mut plans = Vec::new();
        for item in self.training_plans.iter() {
            let (_, value) = item?;
            plans.push(Self::deserialize::<TrainingPlanRecord>(&value)?);
        }
        plans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(plans)
    }

    /// 输出目录仍存在、且创建时间早于给定时刻的方案（供清理任务使用）
    pub fn list_plans_with_stale_output(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<TrainingPlanRecord>, StoreError> {
        Ok(self
            .list_plans()?
            .into_iter()
            .filter(|p| p.output_dir.is_some() && p.created_at < cutoff)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use tempfile::tempdir;

    use super::*;

    fn sample_plan(id: &str) -> TrainingPlanRecord {
        TrainingPlanRecord {
            id: id.to_string(),
            kind: PlanKind::Assessment,
            profile_id: Some("p1".to_string()),
            child_name: "小明".to_string(),
            child_age: 7,
            weeks: 1,
            plan: LessonPlan {
                lessons: vec![vec!["视觉广度L4-1.docx".to_string()]],
            },
            output_dir: Some("/tmp/plan-out".to_string()),
            created_by: "u1".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn create_and_get_plan() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("plans-db").to_str().unwrap()).unwrap();

        store.create_plan(&sample_plan("t1")).unwrap();
        let got = store.get_plan("t1").unwrap().unwrap();
        assert_eq!(got.child_name, "小明");
        assert_eq!(got.kind, PlanKind::Assessment);
    }

    #[test]
    fn stale_output_filter_respects_cutoff() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("plans-db2").to_str().unwrap()).unwrap();

        let mut old = sample_plan("old");
        old.created_at = Utc::now() - Duration::days(60);
        store.create_plan(&old).unwrap();

        let mut cleaned = sample_plan("cleaned");
        cleaned.created_at = Utc::now() - Duration::days(60);
        cleaned.output_dir = None;
        store.create_plan(&cleaned).unwrap();

        store.create_plan(&sample_plan("fresh")).unwrap();

        let stale = store
            .list_plans_with_stale_output(Utc::now() - Duration::days(30))
            .unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].id, "old");
    }

    #[test]
    fn update_missing_plan_is_not_found() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("plans-db3").to_str().unwrap()).unwrap();

        assert!(matches!(
            store.update_plan(&sample_plan("nope")).unwrap_err(),
            StoreError::NotFound { .. }
        ));
    }
}
