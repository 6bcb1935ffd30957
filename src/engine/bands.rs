//! 各能力的评级分档表。按能力（部分按年龄）给出连续的分数区间与评级，
//! 分档逻辑本身在 `rating` 模块，这里只有数据。
//!
//! 区间为闭区间 [min, max]，max 可为正无穷。视觉广度的得分是用时（秒），
//! 数值越小越好，因此优秀档在数轴低端；其余能力均为得分越高越好。

use super::types::{Ability, Rating};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub rating: Rating,
    pub min: f64,
    pub max: f64,
}

const fn band(rating: Rating, min: f64, max: f64) -> Band {
    Band { rating, min, max }
}

const INF: f64 = f64::INFINITY;

const VISUAL_BREADTH_UNDER_7: [Band; 4] = [
    band(Rating::Excellent, 0.0, 179.0),
    band(Rating::Pass, 180.0, 240.0),
    band(Rating::Fail, 241.0, 360.0),
    band(Rating::Poor, 361.0, INF),
];

const VISUAL_BREADTH_7_AND_UP: [Band; 4] = [
    band(Rating::Excellent, 0.0, 119.0),
    band(Rating::Pass, 120.0, 180.0),
    band(Rating::Fail, 181.0, 300.0),
    band(Rating::Poor, 301.0, INF),
];

const VISUAL_DISCRIMINATION: [Band; 4] = [
    band(Rating::Excellent, 0.0, 2.0),
    band(Rating::Pass, 3.0, 4.0),
    band(Rating::Fail, 5.0, 8.0),
    band(Rating::Poor, 9.0, INF),
];

const VISUO_MOTOR_BY_AGE: [(u32, [Band; 4]); 5] = [
    (
        4,
        [
            band(Rating::Poor, 0.0, 5.0),
            band(Rating::Fail, 6.0, 7.0),
            band(Rating::Pass, 8.0, 10.0),
            band(Rating::Excellent, 11.0, INF),
        ],
    ),
    (
        5,
        [
            band(Rating::Poor, 0.0, 8.0),
            band(Rating::Fail, 9.0, 10.0),
            band(Rating::Pass, 11.0, 13.0),
            band(Rating::Excellent, 14.0, INF),
        ],
    ),
    (
        6,
        [
            band(Rating::Poor, 0.0, 11.0),
            band(Rating::Fail, 12.0, 13.0),
            band(Rating::Pass, 14.0, 15.0),
            band(Rating::Excellent, 16.0, INF),
        ],
    ),
    (
        7,
        [
            band(Rating::Poor, 0.0, 13.0),
            band(Rating::Fail, 14.0, 15.0),
            band(Rating::Pass, 16.0, 17.0),
            band(Rating::Excellent, 18.0, INF),
        ],
    ),
    (
        8,
        [
            band(Rating::Poor, 0.0, 15.0),
            band(Rating::Fail, 16.0, 17.0),
            band(Rating::Pass, 18.0, 19.0),
            band(Rating::Excellent, 20.0, INF),
        ],
    ),
];

const VISUAL_MEMORY: [Band; 4] = [
    band(Rating::Excellent, 4.0, INF),
    band(Rating::Pass, 3.0, 3.0),
    band(Rating::Fail, 2.0, 2.0),
    band(Rating::Poor, 0.0, 1.0),
];

const AUDITORY_BREADTH_BY_AGE: [(u32, [Band; 4]); 9] = [
    (
        4,
        [
            band(Rating::Poor, 0.0, 1.0),
            band(Rating::Fail, 2.0, 3.0),
            band(Rating::Pass, 4.0, 4.0),
            band(Rating::Excellent, 5.0, INF),
        ],
    ),
    (
        5,
        [
            band(Rating::Poor, 0.0, 2.0),
            band(Rating::Fail, 3.0, 4.0),
            band(Rating::Pass, 5.0, 5.0),
            band(Rating::Excellent, 6.0, INF),
        ],
    ),
    (
        6,
        [
            band(Rating::Poor, 0.0, 3.0),
            band(Rating::Fail, 4.0, 5.0),
            band(Rating::Pass, 6.0, 6.0),
            band(Rating::Excellent, 7.0, INF),
        ],
    ),
    (
        7,
        [
            band(Rating::Poor, 0.0, 4.0),
            band(Rating::Fail, 5.0, 6.0),
            band(Rating::Pass, 7.0, 7.0),
            band(Rating::Excellent, 8.0, INF),
        ],
    ),
    (
        8,
        [
            band(Rating::Poor, 0.0, 4.0),
            band(Rating::Fail, 5.0, 6.0),
            band(Rating::Pass, 7.0, 7.0),
            band(Rating::Excellent, 8.0, INF),
        ],
    ),
    (
        9,
        [
            band(Rating::Poor, 0.0, 4.0),
            band(Rating::Fail, 5.0, 6.0),
            band(Rating::Pass, 7.0, 7.0),
            band(Rating::Excellent, 8.0, INF),
        ],
    ),
    (
        10,
        [
            band(Rating::Poor, 0.0, 5.0),
            band(Rating::Fail, 6.0, 7.0),
            band(Rating::Pass, 8.0, 8.0),
            band(Rating::Excellent, 9.0, INF),
        ],
    ),
    (
        11,
        [
            band(Rating::Poor, 0.0, 6.0),
            band(Rating::Fail, 7.0, 8.0),
            band(Rating::Pass, 9.0, 9.0),
            band(Rating::Excellent, 10.0, INF),
        ],
    ),
    (
        12,
        [
            band(Rating::Poor, 0.0, 7.0),
            band(Rating::Fail, 8.0, 9.0),
            band(Rating::Pass, 10.0, 10.0),
            band(Rating::Excellent, 11.0, INF),
        ],
    ),
];

const AUDITORY_DISCRIMINATION: [Band; 4] = [
    band(Rating::Excellent, 0.0, 0.0),
    band(Rating::Pass, 1.0, 1.0),
    band(Rating::Fail, 2.0, 2.0),
    band(Rating::Poor, 3.0, INF),
];

// 听动统合量表满分 20 / 30，超出满分的得分不会出现
const AUDIO_MOTOR_UNDER_6: [Band; 4] = [
    band(Rating::Excellent, 19.0, 20.0),
    band(Rating::Pass, 17.0, 18.0),
    band(Rating::Fail, 15.0, 16.0),
    band(Rating::Poor, 0.0, 14.0),
];

const AUDIO_MOTOR_6_AND_UP: [Band; 4] = [
    band(Rating::Excellent, 29.0, 30.0),
    band(Rating::Pass, 26.0, 28.0),
    band(Rating::Fail, 22.0, 25.0),
    band(Rating::Poor, 0.0, 21.0),
];

// 4 岁量表没有极差档
const AUDITORY_MEMORY_AGE_4: [Band; 3] = [
    band(Rating::Fail, 0.0, 1.0),
    band(Rating::Pass, 2.0, 2.0),
    band(Rating::Excellent, 3.0, INF),
];

const AUDITORY_MEMORY_BY_AGE: [(u32, [Band; 4]); 8] = [
    (
        5,
        [
            band(Rating::Poor, 0.0, 1.0),
            band(Rating::Fail, 2.0, 2.0),
            band(Rating::Pass, 3.0, 3.0),
            band(Rating::Excellent, 4.0, INF),
        ],
    ),
    (
        6,
        [
            band(Rating::Poor, 0.0, 1.0),
            band(Rating::Fail, 2.0, 2.0),
            band(Rating::Pass, 3.0, 3.0),
            band(Rating::Excellent, 4.0, INF),
        ],
    ),
    (
        7,
        [
            band(Rating::Poor, 0.0, 1.0),
            band(Rating::Fail, 2.0, 2.0),
            band(Rating::Pass, 3.0, 3.0),
            band(Rating::Excellent, 4.0, INF),
        ],
    ),
    (
        8,
        [
            band(Rating::Poor, 0.0, 2.0),
            band(Rating::Fail, 3.0, 3.0),
            band(Rating::Pass, 4.0, 4.0),
            band(Rating::Excellent, 5.0, INF),
        ],
    ),
    (
        9,
        [
            band(Rating::Poor, 0.0, 2.0),
            band(Rating::Fail, 3.0, 3.0),
            band(Rating::Pass, 4.0, 4.0),
            band(Rating::Excellent, 5.0, INF),
        ],
    ),
    (
        10,
        [
            band(Rating::Poor, 0.0, 3.0),
            band(Rating::Fail, 4.0, 4.0),
            band(Rating::Pass, 5.0, 5.0),
            band(Rating::Excellent, 6.0, INF),
        ],
    ),
    (
        11,
        [
            band(Rating::Poor, 0.0, 3.0),
            band(Rating::Fail, 4.0, 4.0),
            band(Rating::Pass, 5.0, 5.0),
            band(Rating::Excellent, 6.0, INF),
        ],
    ),
    (
        12,
        [
            band(Rating::Poor, 0.0, 4.0),
            band(Rating::Fail, 5.0, 5.0),
            band(Rating::Pass, 6.0, 6.0),
            band(Rating::Excellent, 7.0, INF),
        ],
    ),
];

fn lookup_by_age(table: &'static [(u32, [Band; 4])], age: u32) -> &'static [Band] {
    // 超出定义范围的年龄就近取最老/最年轻的量表，不报错
    let clamped = age.clamp(table[0].0, table[table.len() - 1].0);
    table
        .iter()
        .find(|(a, _)| *a == clamped)
        .map(|(_, bands)| bands.as_slice())
        .unwrap_or_else(|| table[table.len() - 1].1.as_slice())
}

/// 取某能力在某年龄下的分档表
pub fn bands_for(ability: Ability, age: u32) -> &'static [Band] {
    match ability {
        Ability::VisualBreadth => {
            if age < 7 {
                &VISUAL_BREADTH_UNDER_7
            } else {
                &VISUAL_BREADTH_7_AND_UP
            }
        }
        Ability::VisualDiscrimination => &VISUAL_DISCRIMINATION,
        Ability::VisuoMotor => lookup_by_age(&VISUO_MOTOR_BY_AGE, age),
        Ability::VisualMemory => &VISUAL_MEMORY,
        Ability::AuditoryBreadth => lookup_by_age(&AUDITORY_BREADTH_BY_AGE, age),
        Ability::AuditoryDiscrimination => &AUDITORY_DISCRIMINATION,
        Ability::AudioMotor => {
            if age < 6 {
                &AUDIO_MOTOR_UNDER_6
            } else {
                &AUDIO_MOTOR_6_AND_UP
            }
        }
        Ability::AuditoryMemory => {
            if age <= 4 {
                &AUDITORY_MEMORY_AGE_4
            } else {
                lookup_by_age(&AUDITORY_MEMORY_BY_AGE, age)
            }
        }
    }
}
