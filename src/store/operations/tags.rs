use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::keys;
use crate::store::{Store, StoreError};

/// 感统训练标签配置。标签名即主键；隐藏的标签不出现在选项里，
/// 但已有动作仍可引用。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub name: String,
    pub visible: bool,
    pub created_at: DateTime<Utc>,
}

impl Store {
    pub fn get_tag(&self, name: &str) -> Result<Option<Tag>, StoreError> {
        let key = keys::tag_key(name);
        match self.tags.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn add_tag(&self, name: &str) -> Result<Tag, StoreError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(StoreError::Validation("标签名不能为空".to_string()));
        }
        if self.get_tag(trimmed)?.is_some() {
            return Err(StoreError::Conflict {
                entity: "tag".to_string(),
                key: trimmed.to_string(),
            });
        }
        let tag = Tag {
            name: trimmed.to_string(),
            visible: true,
            created_at: Utc::now(),
        };
        self.tags
            .insert(keys::tag_key(trimmed).as_bytes(), Self::serialize(&tag)?)?;
        Ok(tag)
    }

    /// 迁移预置标签用，绕过冲突检查
    pub(crate) fn seed_tag(&self, name: &str) -> Result<(), StoreError> {
        let tag = Tag {
            name: name.to_string(),
            visible: true,
            created_at: Utc::now(),
        };
        self.tags
            .insert(keys::tag_key(name).as_bytes(), Self::serialize(&tag)?)?;
        Ok(())
    }

    pub fn set_tag_visibility(&self, name: &str, visible: bool) -> Result<Tag, StoreError> {
        let mut tag = self.get_tag(name)?.ok_or_else(|| StoreError::NotFound {
            entity: "tag".to_string(),
            key: name.to_string(),
        })?;
        tag.visible = visible;
        self.tags
            .insert(keys::tag_key(name).as_bytes(), Self::serialize(&tag)?)?;
        Ok(tag)
    }

    pub fn rename_tag(&self, old_name: &str, new_name: &str) -> Result<Tag, StoreError> {
        let trimmed = new_name.trim();
        if trimmed.is_empty() {
            return Err(StoreError::Validation("标签名不能为空".to_string()));
        }
        if trimmed != old_name && self.get_tag(trimmed)?.is_some() {
            return Err(StoreError::Conflict {
                entity: "tag".to_string(),
                key: trimmed.to_string(),
            });
        }
        let mut tag = self.get_tag(old_name)?.ok_or_else(|| StoreError::NotFound {
            entity: "tag".to_string(),
            key: old_name.to_string(),
        })?;

        tag.name = trimmed.to_string();
        self.tags.remove(keys::tag_key(old_name).as_bytes())?;
        self.tags
            .insert(keys::tag_key(trimmed).as_bytes(), Self::serialize(&tag)?)?;
        Ok(tag)
    }

    pub fn list_tags(&self) -> Result<Vec<Tag>, StoreError> {
        let mut tags = Vec::new();
        for item in self.tags.iter() {
            let (_, value) = item?;
            tags.push(Self::deserialize::<Tag>(&value)?);
        }
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    pub fn visible_tags(&self) -> Result<Vec<Tag>, StoreError> {
        Ok(self.list_tags()?.into_iter().filter(|t| t.visible).collect())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn open_store(name: &str) -> (tempfile::TempDir, Store) {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join(name).to_str().unwrap()).unwrap();
        (dir, store)
    }

    #[test]
    fn add_and_list_tags() {
        let (_dir, store) = open_store("tags-db");
        store.add_tag("平衡").unwrap();
        store.add_tag("协调").unwrap();
        let names: Vec<String> = store.list_tags().unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["协调".to_string(), "平衡".to_string()]);
    }

    #[test]
    fn duplicate_tag_conflicts() {
        let (_dir, store) = open_store("tags-db2");
        store.add_tag("平衡").unwrap();
        assert!(matches!(
            store.add_tag("平衡").unwrap_err(),
            StoreError::Conflict { .. }
        ));
    }

    #[test]
    fn hidden_tags_are_filtered() {
        let (_dir, store) = open_store("tags-db3");
        store.add_tag("平衡").unwrap();
        store.add_tag("协调").unwrap();
        store.set_tag_visibility("协调", false).unwrap();

        let visible: Vec<String> = store
            .visible_tags()
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(visible, vec!["平衡".to_string()]);
    }

    #[test]
    fn rename_moves_key() {
        let (_dir, store) = open_store("tags-db4");
        store.add_tag("平衡").unwrap();
        store.rename_tag("平衡", "平衡感").unwrap();
        assert!(store.get_tag("平衡").unwrap().is_none());
        assert!(store.get_tag("平衡感").unwrap().is_some());
    }

    #[test]
    fn rename_to_existing_conflicts() {
        let (_dir, store) = open_store("tags-db5");
        store.add_tag("平衡").unwrap();
        store.add_tag("协调").unwrap();
        assert!(matches!(
            store.rename_tag("平衡", "协调").unwrap_err(),
            StoreError::Conflict { .. }
        ));
    }

    #[test]
    fn empty_tag_name_rejected() {
        let (_dir, store) = open_store("tags-db6");
        assert!(matches!(
            store.add_tag("  ").unwrap_err(),
            StoreError::Validation(_)
        ));
    }
}
