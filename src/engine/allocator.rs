//! 课时分配：由各能力当前评级推导目标难度与权重，按权重切分题目配额，
//! 从题目索引抽题（不足时兜底补抽），最后打乱分组为固定大小的课次。
//!
//! 单趟无状态流水线：难度 → 权重 → 配额 → 抽题 → 兜底 → 分组。
//! 随机源由调用方显式传入，测试用固定种子即可复现抽样路径。

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::item_index::ItemIndex;
use super::types::{Ability, Rating};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    /// 连兜底池都是空的，无法产出任何方案——唯一致命错误
    #[error("没有任何可用题目，请检查题库文件命名格式")]
    NoAvailableItems,
    /// 没有一项可用的能力评级
    #[error("没有可用的能力评级，至少需要一项")]
    EmptyRatings,
}

/// 一次排课请求
#[derive(Debug, Clone)]
pub struct AllocationRequest<'a> {
    pub child_age: u32,
    pub ratings: &'a BTreeMap<Ability, Rating>,
    pub index: &'a ItemIndex,
    pub lessons: usize,
    pub items_per_lesson: usize,
}

/// 排课结果：课次的有序列表，每课一组题目标识
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonPlan {
    pub lessons: Vec<Vec<String>>,
}

impl LessonPlan {
    pub fn total_items(&self) -> usize {
        self.lessons.iter().map(Vec::len).sum()
    }
}

/// 按测评评级排课：薄弱项分到更多题目
pub fn allocate<R: Rng + ?Sized>(
    rng: &mut R,
    req: &AllocationRequest<'_>,
) -> Result<LessonPlan, AllocationError> {
    if req.ratings.is_empty() {
        return Err(AllocationError::EmptyRatings);
    }

    let difficulties = target_difficulties(req.child_age, req.ratings);
    let weights = rating_weights(req.ratings);
    run_pipeline(
        rng,
        req.index,
        req.lessons,
        req.items_per_lesson,
        &difficulties,
        &weights,
    )
}

/// 按用户直接指定的难度排课（无测评流程）：各能力权重均分
pub fn allocate_direct<R: Rng + ?Sized>(
    rng: &mut R,
    index: &ItemIndex,
    difficulties: &BTreeMap<Ability, u8>,
    lessons: usize,
    items_per_lesson: usize,
) -> Result<LessonPlan, AllocationError> {
    if difficulties.is_empty() {
        return Err(AllocationError::EmptyRatings);
    }

    let uniform = 1.0 / difficulties.len() as f64;
    let weights: BTreeMap<Ability, f64> = difficulties
        .keys()
        .map(|&ability| (ability, uniform))
        .collect();
    run_pipeline(rng, index, lessons, items_per_lesson, difficulties, &weights)
}

fn run_pipeline<R: Rng + ?Sized>(
    rng: &mut R,
    index: &ItemIndex,
    lessons: usize,
    items_per_lesson: usize,
    difficulties: &BTreeMap<Ability, u8>,
    weights: &BTreeMap<Ability, f64>,
) -> Result<LessonPlan, AllocationError> {
    let total_needed = lessons * items_per_lesson;
    let quotas = reconcile_quotas(weights, total_needed);

    let mut selection = sample_by_quota(rng, index, difficulties, &quotas);
    backfill(rng, index, &mut selection, total_needed)?;
    selection.truncate(total_needed);

    Ok(partition(rng, selection, lessons, items_per_lesson))
}

/// 目标难度：max(1, 年龄 + 评级修正 - 3)。
/// 4-5 周岁且评级为极差/不合格的孩子固定用 L1，不会被公式算到更低档。
/// 没有上限钳制：算出的档位超过 L9 时对应题目池必然为空，走兜底补抽。
pub fn target_difficulties(
    child_age: u32,
    ratings: &BTreeMap<Ability, Rating>,
) -> BTreeMap<Ability, u8> {
    ratings
        .iter()
        .map(|(&ability, &rating)| {
            let level = if (4..=5).contains(&child_age)
                && matches!(rating, Rating::Poor | Rating::Fail)
            {
                1
            } else {
                (child_age as i64 + rating.offset() as i64 - 3).max(1) as u8
            };
            (ability, level)
        })
        .collect()
}

/// 归一化权重：raw = 5 - rank，评级越差权重越高。
/// rank ≤ 4 保证 raw ≥ 1，权重恒为正且总和为 1。
pub fn rating_weights(ratings: &BTreeMap<Ability, Rating>) -> BTreeMap<Ability, f64> {
    let raw: BTreeMap<Ability, u32> = ratings
        .iter()
        .map(|(&ability, &rating)| (ability, 5 - rating.rank()))
        .collect();
    let total: u32 = raw.values().sum();
    raw.into_iter()
        .map(|(ability, value)| (ability, value as f64 / total as f64))
        .collect()
}

/// 按权重取整切分配额，并把取整误差收敛到恰好等于 total_needed：
/// 差多少就给最高权重项加，多多少就从最高配额项减；没有可减项时提前
/// 退出（接受误差，不报错）。迭代次数有上限兜底。
pub fn reconcile_quotas(
    weights: &BTreeMap<Ability, f64>,
    total_needed: usize,
) -> BTreeMap<Ability, usize> {
    let mut quotas: BTreeMap<Ability, i64> = weights
        .iter()
        .map(|(&ability, &weight)| (ability, (total_needed as f64 * weight).round() as i64))
        .collect();

    let mut diff = total_needed as i64 - quotas.values().sum::<i64>();
    let max_iterations = total_needed + weights.len() + 1;

    for _ in 0..max_iterations {
        if diff == 0 {
            break;
        }
        if diff > 0 {
            match max_key(weights).and_then(|heaviest| quotas.get_mut(&heaviest)) {
                Some(quota) => {
                    *quota += 1;
                    diff -= 1;
                }
                None => break,
            }
        } else {
            match max_key(&quotas).and_then(|largest| quotas.get_mut(&largest)) {
                Some(quota) if *quota > 0 => {
                    *quota -= 1;
                    diff += 1;
                }
                _ => break,
            }
        }
    }

    quotas
        .into_iter()
        .map(|(ability, quota)| (ability, quota.max(0) as usize))
        .collect()
}

/// 第一个取到最大值的键（迭代序确定，平手取序靠前的能力）
fn max_key<V: PartialOrd + Copy>(map: &BTreeMap<Ability, V>) -> Option<Ability> {
    let mut best: Option<(Ability, V)> = None;
    for (&ability, &value) in map {
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((ability, value)),
        }
    }
    best.map(|(ability, _)| ability)
}

fn sample_by_quota<R: Rng + ?Sized>(
    rng: &mut R,
    index: &ItemIndex,
    difficulties: &BTreeMap<Ability, u8>,
    quotas: &BTreeMap<Ability, usize>,
) -> Vec<String> {
    let mut selection = Vec::new();

    for (&ability, &level) in difficulties {
        let need = quotas.get(&ability).copied().unwrap_or(0);
        if need == 0 {
            continue;
        }

        let pool = index.pool(ability, level);
        if pool.is_empty() {
            tracing::warn!(
                ability = %ability,
                level,
                "该能力在目标难度下没有可用题目，跳过"
            );
            continue;
        }

        selection.extend(draw(rng, pool, need));
    }

    selection
}

/// 池子够大时不放回抽样（单能力内不重复），不够时放回抽样补足
fn draw<R: Rng + ?Sized>(rng: &mut R, pool: &[String], need: usize) -> Vec<String> {
    if pool.len() < need {
        (0..need)
            .filter_map(|_| pool.choose(rng).cloned())
            .collect()
    } else {
        pool.choose_multiple(rng, need).cloned().collect()
    }
}

/// 全局兜底：各能力抽完仍不足时，从全量池放回补抽；
/// 全量池也为空则是唯一的致命错误。
fn backfill<R: Rng + ?Sized>(
    rng: &mut R,
    index: &ItemIndex,
    selection: &mut Vec<String>,
    total_needed: usize,
) -> Result<(), AllocationError> {
    if selection.len() >= total_needed {
        return Ok(());
    }

    let all = index.all_items();
    if all.is_empty() {
        return Err(AllocationError::NoAvailableItems);
    }

    let shortfall = total_needed - selection.len();
    tracing::warn!(shortfall, "按能力抽题不足，从全量题库兜底补抽");
    selection.extend(draw_with_replacement(rng, all, shortfall));
    Ok(())
}

fn draw_with_replacement<R: Rng + ?Sized>(
    rng: &mut R,
    pool: &[String],
    need: usize,
) -> Vec<String> {
    (0..need)
        .filter_map(|_| pool.choose(rng).cloned())
        .collect()
}

/// 打乱后按每课题数切组，末组不足时从已选池放回补齐
fn partition<R: Rng + ?Sized>(
    rng: &mut R,
    mut selection: Vec<String>,
    lessons: usize,
    items_per_lesson: usize,
) -> LessonPlan {
    selection.shuffle(rng);

    let mut groups: Vec<Vec<String>> = Vec::with_capacity(lessons);
    for i in 0..lessons {
        let start = (i * items_per_lesson).min(selection.len());
        let end = ((i + 1) * items_per_lesson).min(selection.len());
        groups.push(selection[start..end].to_vec());
    }

    for group in &mut groups {
        while group.len() < items_per_lesson {
            match selection.choose(rng) {
                Some(item) => group.push(item.clone()),
                None => break,
            }
        }
    }

    LessonPlan { lessons: groups }
}
