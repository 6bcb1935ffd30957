use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{LOCKOUT_DURATION_MINUTES, MAX_FAILED_LOGIN_ATTEMPTS};
use crate::store::keys;
use crate::store::{Store, StoreError};

/// 员工角色，老师 < 测评师 < 校长 < 管理员
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Teacher,
    Assessor,
    Principal,
    Admin,
}

impl Role {
    /// 权限级别，数字越大权限越高
    pub fn level(self) -> u8 {
        match self {
            Role::Teacher => 1,
            Role::Assessor => 2,
            Role::Principal => 3,
            Role::Admin => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Teacher => "teacher",
            Role::Assessor => "assessor",
            Role::Principal => "principal",
            Role::Admin => "admin",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Role::Teacher => "老师",
            Role::Assessor => "测评师",
            Role::Principal => "校长",
            Role::Admin => "管理员",
        }
    }

    pub fn at_least(self, required: Role) -> bool {
        self.level() >= required.level()
    }
}

/// 新建账户的默认角色
pub const DEFAULT_ROLE: Role = Role::Assessor;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub role: Role,
    pub training_center: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub failed_login_count: u32,
    #[serde(default)]
    pub locked_until: Option<DateTime<Utc>>,
}

impl Store {
    pub fn create_user(&self, user: &User) -> Result<(), StoreError> {
        let username_key = keys::user_username_index_key(&user.username);

        // Atomic compare-and-swap: only insert if the username key does not
        // exist, so two concurrent creations with the same username cannot
        // both pass the existence check.
        let cas_result = self
            .users
            .compare_and_swap(
                username_key.as_bytes(),
                None::<&[u8]>,
                Some(user.id.as_bytes().to_vec()),
            )
            .map_err(StoreError::Sled)?;

        if cas_result.is_err() {
            return Err(StoreError::Conflict {
                entity: "user_username".to_string(),
                key: user.username.clone(),
            });
        }

        let user_key = keys::user_key(&user.id);
        let user_bytes = Self::serialize(user)?;
        if let Err(e) = self.users.insert(user_key.as_bytes(), user_bytes) {
            let _ = self.users.remove(username_key.as_bytes());
            return Err(StoreError::Sled(e));
        }

        Ok(())
    }

    pub fn get_user_by_id(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        let key = keys::user_key(user_id);
        match self.users.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let index_key = keys::user_username_index_key(username);
        let Some(user_id_raw) = self.users.get(index_key.as_bytes())? else {
            return Ok(None);
        };
        let user_id = match String::from_utf8(user_id_raw.to_vec()) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid UTF-8 in username index");
                return Ok(None);
            }
        };
        self.get_user_by_id(&user_id)
    }

    /// 更新用户。登录名不可变更，索引无需搬移。
    pub fn update_user(&self, user: &User) -> Result<(), StoreError> {
        let existing = self
            .get_user_by_id(&user.id)?
            .ok_or_else(|| StoreError::NotFound {
                entity: "user".to_string(),
                key: user.id.clone(),
            })?;

        if existing.username != user.username {
            return Err(StoreError::Validation("登录名不可修改".to_string()));
        }

        let user_key = keys::user_key(&user.id);
        self.users
            .insert(user_key.as_bytes(), Self::serialize(user)?)?;
        Ok(())
    }

    pub fn delete_user(&self, user_id: &str) -> Result<(), StoreError> {
        let user = self
            .get_user_by_id(user_id)?
            .ok_or_else(|| StoreError::NotFound {
                entity: "user".to_string(),
                key: user_id.to_string(),
            })?;

        self.users
            .remove(keys::user_username_index_key(&user.username).as_bytes())?;
        self.users.remove(keys::user_key(user_id).as_bytes())?;
        let _ = self.delete_user_sessions(user_id);
        Ok(())
    }

    pub fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let mut users = Vec::new();
        for item in self.users.iter() {
            let (key, value) = item?;
            let key_str = String::from_utf8_lossy(&key);
            if key_str.starts_with("username:") {
                continue;
            }
            users.push(Self::deserialize::<User>(&value)?);
        }

        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    /// 库中是否已有管理员账户（启动引导用）
    pub fn any_admin_exists(&self) -> Result<bool, StoreError> {
        Ok(self.list_users()?.iter().any(|u| u.role == Role::Admin))
    }

    /// 记录一次登录失败，达到阈值后锁定账户
    pub fn record_failed_login(&self, user_id: &str) -> Result<(), StoreError> {
        let Some(mut user) = self.get_user_by_id(user_id)? else {
            return Ok(());
        };

        user.failed_login_count += 1;
        if user.failed_login_count >= MAX_FAILED_LOGIN_ATTEMPTS {
            user.locked_until = Some(Utc::now() + Duration::minutes(LOCKOUT_DURATION_MINUTES));
            tracing::warn!(
                user_id,
                attempts = user.failed_login_count,
                "账户因连续登录失败被临时锁定"
            );
        }
        user.updated_at = Utc::now();
        self.update_user(&user)
    }

    pub fn is_account_locked(&self, user_id: &str) -> Result<bool, StoreError> {
        let Some(user) = self.get_user_by_id(user_id)? else {
            return Ok(false);
        };
        Ok(matches!(user.locked_until, Some(until) if until > Utc::now()))
    }

    pub fn reset_login_attempts(&self, user_id: &str) -> Result<(), StoreError> {
        let Some(mut user) = self.get_user_by_id(user_id)? else {
            return Ok(());
        };
        if user.failed_login_count == 0 && user.locked_until.is_none() {
            return Ok(());
        }
        user.failed_login_count = 0;
        user.locked_until = None;
        user.updated_at = Utc::now();
        self.update_user(&user)
    }
}
