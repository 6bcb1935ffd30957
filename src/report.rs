//! 测评报告数据组装：把学生档案展平成报告模板使用的字段集。
//! Word 渲染由前端/文档服务完成，这里只负责数据。

use serde_json::{Map, Number, Value};

use crate::engine::types::Ability;
use crate::store::operations::profiles::StudentProfile;

fn number(value: f64) -> Value {
    Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// 报告字段：基础信息 + 每项能力四个字段
/// （`{前缀}` 得分、`{前缀}_eval` 当前评级、`{前缀}_target` 目标分、
/// `{前缀}_target_eval` 目标评级）。未识别的能力名没有前缀约定，跳过。
pub fn report_payload(profile: &StudentProfile) -> Value {
    let mut fields = Map::new();
    fields.insert("childName".to_string(), Value::String(profile.name.clone()));
    fields.insert("childAge".to_string(), Value::Number(profile.age.into()));
    fields.insert(
        "measureDate".to_string(),
        Value::String(profile.test_date.to_string()),
    );
    fields.insert(
        "trainingCenter".to_string(),
        Value::String(profile.training_center.clone()),
    );
    fields.insert(
        "assessor".to_string(),
        Value::String(profile.assessor.clone()),
    );

    for (ability_name, result) in &profile.ratings {
        let Ok(ability) = ability_name.parse::<Ability>() else {
            continue;
        };
        let prefix = ability.report_prefix();
        fields.insert(prefix.to_string(), number(result.current_score));
        fields.insert(
            format!("{prefix}_eval"),
            Value::String(result.current_rating.label().to_string()),
        );
        fields.insert(format!("{prefix}_target"), number(result.target_score));
        fields.insert(
            format!("{prefix}_target_eval"),
            Value::String(result.target_rating.label().to_string()),
        );
    }

    Value::Object(fields)
}
