use crate::engine::action_match::Action;
use crate::store::keys;
use crate::store::{Store, StoreError};

impl Store {
    /// 动作库全量读取（动作数量在几百以内，整表扫描足够）
    pub fn list_actions(&self) -> Result<Vec<Action>, StoreError> {
        let mut actions = Vec::new();
        for item in self.action_library.iter() {
            let (_, value) = item?;
            actions.push(Self::deserialize::<Action>(&value)?);
        }
        actions.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(actions)
    }

    /// 整库替换：动作库以文件形式维护，导入即覆盖
    pub fn replace_actions(&self, actions: &[Action]) -> Result<usize, StoreError> {
        for action in actions {
            if action.name.trim().is_empty() {
                return Err(StoreError::Validation("动作名称不能为空".to_string()));
            }
        }

        self.action_library.clear()?;
        for action in actions {
            let id = uuid::Uuid::new_v4().to_string();
            self.action_library
                .insert(keys::action_key(&id).as_bytes(), Self::serialize(action)?)?;
        }
        Ok(actions.len())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use crate::engine::action_match::AgeRange;

    use super::*;

    fn action(name: &str) -> Action {
        Action {
            name: name.to_string(),
            age_range: AgeRange::Young,
            tags: vec!["平衡".to_string()],
            description: None,
            materials: None,
            tips: None,
        }
    }

    #[test]
    fn replace_overwrites_existing_library() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("actions-db").to_str().unwrap()).unwrap();

        store.replace_actions(&[action("走平衡木"), action("拍球")]).unwrap();
        assert_eq!(store.list_actions().unwrap().len(), 2);

        store.replace_actions(&[action("跳绳")]).unwrap();
        let names: Vec<String> = store
            .list_actions()
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["跳绳".to_string()]);
    }

    #[test]
    fn nameless_action_is_rejected() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("actions-db2").to_str().unwrap()).unwrap();

        let err = store.replace_actions(&[action("  ")]).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }
}
