//! 感统训练排课：按学员年龄段过滤动作库，按所选标签的匹配度打分排序，
//! 组出 12 节课 × 每课 3 个动作的训练方案。动作不足时允许跨课重复，
//! 但单节课内不出现重复动作。

use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{ACTIONS_PER_LESSON, ACTION_PLAN_LESSONS};

/// 动作库年龄段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeRange {
    #[serde(rename = "4-6")]
    Young,
    #[serde(rename = "7-9")]
    Middle,
    #[serde(rename = "10-12")]
    Senior,
}

impl AgeRange {
    pub fn for_age(age: u32) -> Option<AgeRange> {
        match age {
            4..=6 => Some(AgeRange::Young),
            7..=9 => Some(AgeRange::Middle),
            10..=12 => Some(AgeRange::Senior),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AgeRange::Young => "4-6",
            AgeRange::Middle => "7-9",
            AgeRange::Senior => "10-12",
        }
    }
}

/// 动作库里的一个训练动作
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub name: String,
    pub age_range: AgeRange,
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub materials: Option<String>,
    #[serde(default)]
    pub tips: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionPlanError {
    #[error("无法确定年龄范围，请确保年龄在4-12岁之间（当前 {age} 岁）")]
    AgeOutOfRange { age: u32 },
    #[error("动作库中没有匹配所选标签和年龄段的训练动作")]
    NoMatchingActions,
}

/// 标签匹配打分：完全一致 100 分，单标签对单标签 90 分，
/// 其余按动作侧/用户侧匹配占比加权再加匹配个数加成。
pub fn match_score(action_tags: &[String], selected_tags: &[String]) -> f64 {
    if action_tags.is_empty() || selected_tags.is_empty() {
        return 0.0;
    }

    let action_set: BTreeSet<&str> = action_tags.iter().map(String::as_str).collect();
    let selected_set: BTreeSet<&str> = selected_tags.iter().map(String::as_str).collect();
    let matching = action_set.intersection(&selected_set).count();

    if action_set == selected_set {
        return 100.0;
    }

    if selected_set.len() == 1 && action_set.len() == 1 && matching == 1 {
        return 90.0;
    }

    let action_ratio = matching as f64 / action_set.len() as f64;
    let user_ratio = matching as f64 / selected_set.len() as f64;
    action_ratio * 30.0 + user_ratio * 30.0 + matching as f64 * 10.0
}

/// 生成感统训练方案：12 节课，每课 3 个动作
pub fn plan_actions<R: Rng + ?Sized>(
    rng: &mut R,
    actions: &[Action],
    age: u32,
    selected_tags: &[String],
) -> Result<Vec<Vec<Action>>, ActionPlanError> {
    let range = AgeRange::for_age(age).ok_or(ActionPlanError::AgeOutOfRange { age })?;

    let mut scored: Vec<(f64, &Action)> = actions
        .iter()
        .filter(|action| action.age_range == range)
        .map(|action| (match_score(&action.tags, selected_tags), action))
        .filter(|(score, _)| *score > 0.0)
        .collect();

    if scored.is_empty() {
        return Err(ActionPlanError::NoMatchingActions);
    }

    // 匹配度高的动作优先入选
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    let mut available: Vec<Action> = scored.into_iter().map(|(_, a)| a.clone()).collect();

    let required = ACTION_PLAN_LESSONS * ACTIONS_PER_LESSON;
    if available.len() < required {
        return Ok(plan_with_repeats(rng, &available));
    }

    available.shuffle(rng);
    Ok(available
        .chunks(ACTIONS_PER_LESSON)
        .take(ACTION_PLAN_LESSONS)
        .map(|chunk| chunk.to_vec())
        .collect())
}

/// 动作不足 36 个时逐课组队：每课从候选池随机取 3 个互不相同的动作，
/// 池子耗尽就用未入本课的动作补充
fn plan_with_repeats<R: Rng + ?Sized>(rng: &mut R, available: &[Action]) -> Vec<Vec<Action>> {
    let mut lessons = Vec::with_capacity(ACTION_PLAN_LESSONS);

    for _ in 0..ACTION_PLAN_LESSONS {
        let mut lesson: Vec<Action> = Vec::with_capacity(ACTIONS_PER_LESSON);
        let mut pool: Vec<Action> = available.to_vec();

        for _ in 0..ACTIONS_PER_LESSON {
            if pool.is_empty() {
                pool = available
                    .iter()
                    .filter(|a| !lesson.contains(a))
                    .cloned()
                    .collect();
            }
            if pool.is_empty() {
                break;
            }
            let picked = pool.remove(rng.gen_range(0..pool.len()));
            lesson.push(picked);
        }

        lessons.push(lesson);
    }

    lessons
}
