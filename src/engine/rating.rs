//! 评级分档：将 (能力, 年龄, 原始得分) 映射为当前评级、目标分数与目标评级。
//! 纯函数，结果只取决于三个输入。

use super::bands::bands_for;
use super::types::{Ability, Classification, Rating};

/// 视动统合已达优秀时的固定目标分数（量表约定，勿推广到其他能力）
const VISUO_MOTOR_EXCELLENT_TARGET: f64 = 27.0;

/// 对一个已识别的能力分档。
///
/// 分档表按作者给定顺序扫描，取第一个覆盖得分的闭区间。表覆盖范围之外的
/// 得分（只会出现在超量表满分的畸形输入上）评级为未知，未知是终态，
/// 不再推导目标。
pub fn classify(ability: Ability, age: u32, score: f64) -> Classification {
    let bands = bands_for(ability, age);

    let Some(current) = bands
        .iter()
        .find(|b| b.min <= score && score <= b.max)
        .map(|b| b.rating)
    else {
        return Classification::unknown(score);
    };

    let target = current.target();

    let mut target_score = bands
        .iter()
        .find(|b| b.rating == target)
        .map(|b| b.min)
        .unwrap_or(score);

    // 视觉广度计时越短越好：目标为优秀时取优秀档上界（最慢可接受用时），
    // 上界为无穷时保持下界
    if ability == Ability::VisualBreadth && target == Rating::Excellent {
        if let Some(excellent) = bands.iter().find(|b| b.rating == Rating::Excellent) {
            if excellent.max.is_finite() {
                target_score = excellent.max;
            }
        }
    }

    // 视动统合当前已优秀：目标分数固定 27
    if ability == Ability::VisuoMotor && current == Rating::Excellent {
        target_score = VISUO_MOTOR_EXCELLENT_TARGET;
    }

    Classification {
        current_rating: current.into(),
        target_rating: target.into(),
        target_score,
    }
}

/// 按能力名分档，容忍未知能力名：返回哨兵结果而不是报错，
/// 单项异常不应拖垮同一次测评里的其他能力。
pub fn classify_named(ability_name: &str, age: u32, score: f64) -> Classification {
    match ability_name.parse::<Ability>() {
        Ok(ability) => classify(ability, age, score),
        Err(err) => {
            tracing::warn!(ability = ability_name, error = %err, "测评数据包含未知能力，按未知评级处理");
            Classification::unknown(score)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::types::RatingLabel;
    use super::*;

    fn assert_classified(
        ability: Ability,
        age: u32,
        score: f64,
        current: RatingLabel,
        target_score: f64,
        target: RatingLabel,
    ) {
        let got = classify(ability, age, score);
        assert_eq!(
            got,
            Classification {
                current_rating: current,
                target_score,
                target_rating: target,
            },
            "{ability} age {age} score {score}"
        );
    }

    #[test]
    fn visual_breadth_age_7_score_300() {
        assert_classified(
            Ability::VisualBreadth,
            7,
            300.0,
            RatingLabel::Fail,
            120.0,
            RatingLabel::Pass,
        );
    }

    #[test]
    fn visual_breadth_excellent_targets_upper_bound() {
        assert_classified(
            Ability::VisualBreadth,
            7,
            179.0,
            RatingLabel::Excellent,
            119.0,
            RatingLabel::Excellent,
        );
    }

    #[test]
    fn visual_breadth_age_6_pass_targets_excellent_upper_bound() {
        assert_classified(
            Ability::VisualBreadth,
            6,
            188.0,
            RatingLabel::Pass,
            179.0,
            RatingLabel::Excellent,
        );
    }

    #[test]
    fn visuo_motor_pass_targets_excellent_lower_bound() {
        assert_classified(
            Ability::VisuoMotor,
            7,
            16.0,
            RatingLabel::Pass,
            18.0,
            RatingLabel::Excellent,
        );
    }

    #[test]
    fn visuo_motor_fail_targets_pass() {
        assert_classified(
            Ability::VisuoMotor,
            6,
            15.0,
            RatingLabel::Fail,
            16.0,
            RatingLabel::Pass,
        );
    }

    #[test]
    fn visuo_motor_excellent_targets_fixed_27() {
        assert_classified(
            Ability::VisuoMotor,
            7,
            20.0,
            RatingLabel::Excellent,
            27.0,
            RatingLabel::Excellent,
        );
    }

    #[test]
    fn visual_memory_fail_targets_pass() {
        assert_classified(
            Ability::VisualMemory,
            6,
            2.0,
            RatingLabel::Fail,
            3.0,
            RatingLabel::Pass,
        );
    }

    #[test]
    fn auditory_breadth_age_6_score_4() {
        assert_classified(
            Ability::AuditoryBreadth,
            6,
            4.0,
            RatingLabel::Fail,
            6.0,
            RatingLabel::Pass,
        );
    }

    #[test]
    fn auditory_discrimination_pass_targets_zero_errors() {
        assert_classified(
            Ability::AuditoryDiscrimination,
            5,
            1.0,
            RatingLabel::Pass,
            0.0,
            RatingLabel::Excellent,
        );
    }

    #[test]
    fn audio_motor_age_7_score_25() {
        assert_classified(
            Ability::AudioMotor,
            7,
            25.0,
            RatingLabel::Fail,
            26.0,
            RatingLabel::Pass,
        );
    }

    #[test]
    fn auditory_memory_age_8_score_3() {
        assert_classified(
            Ability::AuditoryMemory,
            8,
            3.0,
            RatingLabel::Fail,
            4.0,
            RatingLabel::Pass,
        );
    }

    #[test]
    fn excellent_current_keeps_excellent_target() {
        for ability in Ability::ALL {
            for age in 4..=12 {
                let bands = super::bands_for(ability, age);
                let excellent = bands
                    .iter()
                    .find(|b| b.rating == Rating::Excellent)
                    .unwrap();
                let got = classify(ability, age, excellent.min);
                assert_eq!(got.current_rating, RatingLabel::Excellent);
                assert_eq!(got.target_rating, RatingLabel::Excellent);
            }
        }
    }

    #[test]
    fn unknown_ability_name_yields_sentinel() {
        let got = classify_named("telekinesis", 7, 42.0);
        assert_eq!(got, Classification::unknown(42.0));
        assert_eq!(got.target_score, 42.0);
    }

    #[test]
    fn named_classification_matches_typed() {
        assert_eq!(
            classify_named("visual_breadth", 7, 300.0),
            classify(Ability::VisualBreadth, 7, 300.0)
        );
        assert_eq!(
            classify_named("auditory_motor", 7, 25.0),
            classify(Ability::AudioMotor, 7, 25.0)
        );
    }

    #[test]
    fn out_of_scale_audio_motor_is_unknown_and_terminal() {
        let got = classify(Ability::AudioMotor, 7, 31.0);
        assert_eq!(got.current_rating, RatingLabel::Unknown);
        assert_eq!(got.target_rating, RatingLabel::Unknown);
        assert_eq!(got.target_score, 31.0);
    }
}
