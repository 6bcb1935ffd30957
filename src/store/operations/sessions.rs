use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::keys;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token_hash: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
}

impl Store {
    pub fn create_session(&self, session: &Session) -> Result<(), StoreError> {
        let key = keys::session_key(&session.token_hash);
        let index_key = keys::session_user_index_key(&session.user_id, &session.token_hash);
        let session_bytes = Self::serialize(session)?;

        let key_bytes = key.as_bytes().to_vec();
        let index_key_bytes = index_key.as_bytes().to_vec();
        self.sessions
            .transaction(move |tx| {
                tx.insert(key_bytes.as_slice(), session_bytes.as_slice())?;
                tx.insert(index_key_bytes.as_slice(), &[] as &[u8])?;
                Ok(())
            })
            .map_err(|e: sled::transaction::TransactionError<()>| match e {
                sled::transaction::TransactionError::Abort(()) => {
                    StoreError::Sled(sled::Error::Unsupported("transaction aborted".into()))
                }
                sled::transaction::TransactionError::Storage(se) => StoreError::Sled(se),
            })?;
        Ok(())
    }

    /// 获取会话，如果已过期或已撤销则返回 None。
    /// 不产生删除副作用——过期会话的清理由专用后台任务 cleanup_expired_sessions 负责。
    pub fn get_session(&self, token_hash: &str) -> Result<Option<Session>, StoreError> {
        let key = keys::session_key(token_hash);
        let Some(raw) = self.sessions.get(key.as_bytes())? else {
            return Ok(None);
        };

        let session = Self::deserialize::<Session>(&raw)?;
        if session.revoked || session.expires_at <= Utc::now() {
            return Ok(None);
        }

        Ok(Some(session))
    }

    pub fn delete_session(&self, token_hash: &str) -> Result<(), StoreError> {
        let key = keys::session_key(token_hash);
        let raw = self.sessions.get(key.as_bytes())?;

        let session_key_bytes = key.as_bytes().to_vec();
        let index_key_bytes = raw
            .as_ref()
            .and_then(|r| Self::deserialize::<Session>(r).ok())
            .map(|session| {
                keys::session_user_index_key(&session.user_id, token_hash)
                    .as_bytes()
                    .to_vec()
            });

        self.sessions
            .transaction(move |tx| {
                if let Some(ref idx_key) = index_key_bytes {
                    tx.remove(idx_key.as_slice())?;
                }
                tx.remove(session_key_bytes.as_slice())?;
                Ok(())
            })
            .map_err(|e: sled::transaction::TransactionError<()>| match e {
                sled::transaction::TransactionError::Abort(()) => {
                    StoreError::Sled(sled::Error::Unsupported("transaction aborted".into()))
                }
                sled::transaction::TransactionError::Storage(se) => StoreError::Sled(se),
            })?;

        Ok(())
    }

    pub fn delete_user_sessions(&self, user_id: &str) -> Result<u32, StoreError> {
        let prefix = keys::session_user_index_prefix(user_id);
        let mut hashes = Vec::new();

        for item in self.sessions.scan_prefix(prefix.as_bytes()) {
            let (k, _) = item?;
            let key_str = match String::from_utf8(k.to_vec()) {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping session index key with invalid UTF-8");
                    continue;
                }
            };
            if let Some(hash) = key_str.rsplit(':').next() {
                hashes.push(hash.to_string());
            }
        }

        let count = hashes.len() as u32;
        for hash in hashes {
            self.delete_session(&hash)?;
        }
        Ok(count)
    }

    /// 如果用户会话数超过 max_sessions，按创建时间从旧到新清理多余会话
    pub fn cleanup_oldest_user_sessions(
        &self,
        user_id: &str,
        max_sessions: usize,
    ) -> Result<(), StoreError> {
        let prefix = keys::session_user_index_prefix(user_id);
        let mut sessions: Vec<(String, DateTime<Utc>)> = Vec::new();

        for item in self.sessions.scan_prefix(prefix.as_bytes()) {
            let (k, _) = item?;
            let key_str = match String::from_utf8(k.to_vec()) {
                Ok(s) => s,
                Err(_) => continue,
            };
            if let Some(hash) = key_str.rsplit(':').next() {
                let session_key = keys::session_key(hash);
                if let Some(raw) = self.sessions.get(session_key.as_bytes())? {
                    if let Ok(session) = Self::deserialize::<Session>(&raw) {
                        sessions.push((hash.to_string(), session.created_at));
                    }
                }
            }
        }

        if sessions.len() <= max_sessions {
            return Ok(());
        }

        sessions.sort_by_key(|(_, created_at)| *created_at);

        let to_remove = sessions.len() - max_sessions;
        for (hash, _) in sessions.into_iter().take(to_remove) {
            self.delete_session(&hash)?;
        }

        Ok(())
    }

    /// 清理过期会话，每批最多处理 1000 条，避免长时间阻塞。
    /// 返回本批次实际删除的会话数。
    pub fn cleanup_expired_sessions(&self) -> Result<u32, StoreError> {
        const MAX_BATCH_SIZE: usize = 1000;

        let mut expired = Vec::new();
        for item in self.sessions.iter() {
            let (k, v) = item?;
            let key_str = String::from_utf8_lossy(&k);
            if key_str.starts_with("user:") {
                continue;
            }
            let session: Session = Self::deserialize(&v)?;
            if session.expires_at <= Utc::now() || session.revoked {
                expired.push(session.token_hash);
                if expired.len() >= MAX_BATCH_SIZE {
                    break;
                }
            }
        }

        let count = expired.len() as u32;
        for token_hash in expired {
            self.delete_session(&token_hash)?;
        }

        Ok(count)
    }
}
