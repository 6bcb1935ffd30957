use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 八项视听知觉能力
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ability {
    VisualBreadth,
    VisualDiscrimination,
    VisuoMotor,
    VisualMemory,
    AuditoryBreadth,
    AuditoryDiscrimination,
    #[serde(alias = "auditory_motor")]
    AudioMotor,
    AuditoryMemory,
}

#[derive(Debug, Clone, Error)]
#[error("unknown ability type: {0}")]
pub struct UnknownAbilityError(pub String);

impl Ability {
    pub const ALL: [Ability; 8] = [
        Ability::VisualBreadth,
        Ability::VisualDiscrimination,
        Ability::VisuoMotor,
        Ability::VisualMemory,
        Ability::AuditoryBreadth,
        Ability::AuditoryDiscrimination,
        Ability::AudioMotor,
        Ability::AuditoryMemory,
    ];

    /// 视觉类能力，视觉训练排课只消费这四项
    pub const VISUAL: [Ability; 4] = [
        Ability::VisualBreadth,
        Ability::VisualDiscrimination,
        Ability::VisuoMotor,
        Ability::VisualMemory,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Ability::VisualBreadth => "visual_breadth",
            Ability::VisualDiscrimination => "visual_discrimination",
            Ability::VisuoMotor => "visuo_motor",
            Ability::VisualMemory => "visual_memory",
            Ability::AuditoryBreadth => "auditory_breadth",
            Ability::AuditoryDiscrimination => "auditory_discrimination",
            Ability::AudioMotor => "audio_motor",
            Ability::AuditoryMemory => "auditory_memory",
        }
    }

    /// 题目文件名中标注该能力的中文关键词
    pub fn keyword(self) -> &'static str {
        match self {
            Ability::VisualBreadth => "视觉广度",
            Ability::VisualDiscrimination => "视觉分辨",
            Ability::VisuoMotor => "视动统合",
            Ability::VisualMemory => "视觉记忆",
            Ability::AuditoryBreadth => "听觉广度",
            Ability::AuditoryDiscrimination => "听觉分辨",
            Ability::AudioMotor => "听动统合",
            Ability::AuditoryMemory => "听觉记忆",
        }
    }

    /// 测评报告中各能力的字段前缀
    pub fn report_prefix(self) -> &'static str {
        match self {
            Ability::VisualBreadth => "vb",
            Ability::VisualDiscrimination => "vd",
            Ability::VisuoMotor => "vm",
            Ability::VisualMemory => "vm2",
            Ability::AuditoryBreadth => "ab",
            Ability::AuditoryDiscrimination => "ad",
            Ability::AudioMotor => "am",
            Ability::AuditoryMemory => "am2",
        }
    }

    pub fn is_visual(self) -> bool {
        Self::VISUAL.contains(&self)
    }
}

impl FromStr for Ability {
    type Err = UnknownAbilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "visual_breadth" => Ok(Ability::VisualBreadth),
            "visual_discrimination" => Ok(Ability::VisualDiscrimination),
            "visuo_motor" => Ok(Ability::VisuoMotor),
            "visual_memory" => Ok(Ability::VisualMemory),
            "auditory_breadth" => Ok(Ability::AuditoryBreadth),
            "auditory_discrimination" => Ok(Ability::AuditoryDiscrimination),
            // 听动统合在历史表单中写作 auditory_motor
            "audio_motor" | "auditory_motor" => Ok(Ability::AudioMotor),
            "auditory_memory" => Ok(Ability::AuditoryMemory),
            other => Err(UnknownAbilityError(other.to_string())),
        }
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 评级序：极差 < 不合格 < 合格 < 优秀
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rating {
    #[serde(rename = "极差")]
    Poor,
    #[serde(rename = "不合格")]
    Fail,
    #[serde(rename = "合格")]
    Pass,
    #[serde(rename = "优秀")]
    Excellent,
}

impl Rating {
    pub fn label(self) -> &'static str {
        match self {
            Rating::Poor => "极差",
            Rating::Fail => "不合格",
            Rating::Pass => "合格",
            Rating::Excellent => "优秀",
        }
    }

    /// 权重计算用名次：极差=1 … 优秀=4
    pub fn rank(self) -> u32 {
        match self {
            Rating::Poor => 1,
            Rating::Fail => 2,
            Rating::Pass => 3,
            Rating::Excellent => 4,
        }
    }

    /// 目标难度公式中的评级修正量
    pub fn offset(self) -> i32 {
        match self {
            Rating::Poor => -2,
            Rating::Fail => -1,
            Rating::Pass => 0,
            Rating::Excellent => 1,
        }
    }

    /// 目标评级：极差/不合格 → 合格，合格 → 优秀，优秀保持不变
    pub fn target(self) -> Rating {
        match self {
            Rating::Poor | Rating::Fail => Rating::Pass,
            Rating::Pass => Rating::Excellent,
            Rating::Excellent => Rating::Excellent,
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 对外呈现的评级标签，未识别的能力或分档落空时为未知。
/// 未知是终态：不参与目标推导，也不能进入排课。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RatingLabel {
    #[serde(rename = "极差")]
    Poor,
    #[serde(rename = "不合格")]
    Fail,
    #[serde(rename = "合格")]
    Pass,
    #[serde(rename = "优秀")]
    Excellent,
    #[serde(rename = "未知")]
    Unknown,
}

impl RatingLabel {
    pub fn label(self) -> &'static str {
        match self {
            RatingLabel::Poor => "极差",
            RatingLabel::Fail => "不合格",
            RatingLabel::Pass => "合格",
            RatingLabel::Excellent => "优秀",
            RatingLabel::Unknown => "未知",
        }
    }

    pub fn as_rating(self) -> Option<Rating> {
        match self {
            RatingLabel::Poor => Some(Rating::Poor),
            RatingLabel::Fail => Some(Rating::Fail),
            RatingLabel::Pass => Some(Rating::Pass),
            RatingLabel::Excellent => Some(Rating::Excellent),
            RatingLabel::Unknown => None,
        }
    }
}

impl From<Rating> for RatingLabel {
    fn from(value: Rating) -> Self {
        match value {
            Rating::Poor => RatingLabel::Poor,
            Rating::Fail => RatingLabel::Fail,
            Rating::Pass => RatingLabel::Pass,
            Rating::Excellent => RatingLabel::Excellent,
        }
    }
}

impl fmt::Display for RatingLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 单项能力的分档结果
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub current_rating: RatingLabel,
    pub target_score: f64,
    pub target_rating: RatingLabel,
}

impl Classification {
    /// 未知能力的哨兵结果：评级未知，目标分数保持原始得分
    pub fn unknown(score: f64) -> Self {
        Self {
            current_rating: RatingLabel::Unknown,
            target_score: score,
            target_rating: RatingLabel::Unknown,
        }
    }
}
