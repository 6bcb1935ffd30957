use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::keys;
use crate::store::operations::users::Role;
use crate::store::{Store, StoreError};

/// 权限变更审计日志（追加写，按时间倒序读取）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionLogEntry {
    pub id: String,
    pub target_user_id: String,
    pub target_username: String,
    /// None 表示账户创建
    pub old_role: Option<Role>,
    pub new_role: Role,
    pub operator_id: String,
    pub operator_username: String,
    pub operator_role: Role,
    pub created_at: DateTime<Utc>,
}

impl PermissionLogEntry {
    pub fn is_user_creation(&self) -> bool {
        self.old_role.is_none()
    }
}

impl Store {
    pub fn append_permission_log(&self, entry: &PermissionLogEntry) -> Result<(), StoreError> {
        let key = keys::permission_log_key(entry.created_at.timestamp_millis(), &entry.id);
        self.permission_logs
            .insert(key.as_bytes(), Self::serialize(entry)?)?;
        Ok(())
    }

    /// 最近的权限变更记录，最新在前
    pub fn list_permission_logs(&self, limit: usize) -> Result<Vec<PermissionLogEntry>, StoreError> {
        let mut entries = Vec::new();
        for item in self.permission_logs.iter() {
            if entries.len() >= limit {
                break;
            }
            let (_, value) = item?;
            entries.push(Self::deserialize::<PermissionLogEntry>(&value)?);
        }
        Ok(entries)
    }
}
