//! 训练题目索引：从文件名解析难度标签（L1～L9）与所属能力关键词，
//! 按 (能力, 难度) 组织题目池。索引建好后只读。

use std::collections::BTreeMap;

use super::types::Ability;

/// 解析单个题目标识：提取难度（"L"/"l" 后可带空白的 1-9 数字）与所有
/// 匹配的能力关键词。没有难度标签或不含任何关键词的标识解析为空。
pub fn parse_identifier(identifier: &str) -> Vec<(Ability, u8)> {
    let stem = identifier
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(identifier);

    let Some(level) = find_difficulty(stem) else {
        return Vec::new();
    };

    Ability::ALL
        .iter()
        .filter(|ability| stem.contains(ability.keyword()))
        .map(|&ability| (ability, level))
        .collect()
}

/// 找到第一个 "L<数字>" 难度标记，允许字母与数字之间有空白
fn find_difficulty(stem: &str) -> Option<u8> {
    let chars: Vec<char> = stem.chars().collect();
    for (pos, c) in chars.iter().enumerate() {
        if *c != 'l' && *c != 'L' {
            continue;
        }
        let mut next = pos + 1;
        while next < chars.len() && chars[next].is_whitespace() {
            next += 1;
        }
        if next < chars.len() {
            if let Some(digit) = chars[next].to_digit(10) {
                if (1..=9).contains(&digit) {
                    return Some(digit as u8);
                }
            }
        }
    }
    None
}

/// 按 (能力, 难度) 组织的题目池。一个题目可同时挂在多个能力下。
#[derive(Debug, Clone, Default)]
pub struct ItemIndex {
    pools: BTreeMap<Ability, BTreeMap<u8, Vec<String>>>,
    all: Vec<String>,
}

impl ItemIndex {
    /// 扫描一批题目标识构建索引
    pub fn build<I>(identifiers: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut pools: BTreeMap<Ability, BTreeMap<u8, Vec<String>>> = BTreeMap::new();
        for identifier in identifiers {
            let identifier = identifier.as_ref();
            for (ability, level) in parse_identifier(identifier) {
                pools
                    .entry(ability)
                    .or_default()
                    .entry(level)
                    .or_default()
                    .push(identifier.to_string());
            }
        }

        // 兜底池：所有已入索引的题目，跨多个能力的题目按挂载次数重复出现
        let all = pools
            .values()
            .flat_map(|by_level| by_level.values())
            .flatten()
            .cloned()
            .collect();

        Self { pools, all }
    }

    pub fn pool(&self, ability: Ability, level: u8) -> &[String] {
        self.pools
            .get(&ability)
            .and_then(|by_level| by_level.get(&level))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// 全量兜底池，供按能力抽取不足时补抽
    pub fn all_items(&self) -> &[String] {
        &self.all
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }
}
