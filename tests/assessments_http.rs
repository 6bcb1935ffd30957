mod common;

use axum::http::{Method, StatusCode};

use common::app::spawn_test_app;
use common::auth::{auth_header, login};
use common::http::{
    assert_json_error, assert_status_ok_json, request, response_json, response_text,
};

fn sample_submission(name: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "dob": "2018-05-01",
        "testDate": "2025-06-01",
        "trainingCenter": "东区",
        "assessor": "王老师",
        "scores": {
            "visual_breadth": 300,
            "visual_discrimination": 5,
            "visuo_motor": 20,
            "visual_memory": 3,
            "auditory_breadth": 4,
            "auditory_motor": 25,
        }
    })
}

#[tokio::test]
async fn it_submit_assessment_classifies_each_ability() {
    let app = spawn_test_app().await;
    let token = login(&app.app, "assessor1").await;

    let response = request(
        &app.app,
        Method::POST,
        "/api/assessments",
        Some(sample_submission("小明")),
        &[("authorization", auth_header(&token))],
    )
    .await;

    let (status, _, body) = response_json(response).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["age"], 7);

    let results = &body["data"]["results"];
    // 7 岁视觉广度 300 秒 → 不合格，目标 120 秒（合格档下界）
    assert_eq!(results["visual_breadth"]["currentRating"], "不合格");
    assert_eq!(results["visual_breadth"]["targetScore"], 120.0);
    assert_eq!(results["visual_breadth"]["targetRating"], "合格");
    // 视动统合当前优秀 → 固定目标 27 分
    assert_eq!(results["visuo_motor"]["currentRating"], "优秀");
    assert_eq!(results["visuo_motor"]["targetScore"], 27.0);
    // auditory_motor 别名归入听动统合
    assert_eq!(results["auditory_motor"]["currentRating"], "不合格");
    assert_eq!(results["auditory_motor"]["targetScore"], 26.0);
}

#[tokio::test]
async fn it_unknown_ability_gets_sentinel_rating() {
    let app = spawn_test_app().await;
    let token = login(&app.app, "assessor1").await;

    let response = request(
        &app.app,
        Method::POST,
        "/api/assessments",
        Some(serde_json::json!({
            "name": "小红",
            "dob": "2019-01-01",
            "testDate": "2025-06-01",
            "scores": { "读心术": 5, "visual_memory": 4 }
        })),
        &[("authorization", auth_header(&token))],
    )
    .await;

    let (status, _, body) = response_json(response).await;
    assert_eq!(status, StatusCode::CREATED);
    let results = &body["data"]["results"];
    // 未知能力不阻断其他项
    assert_eq!(results["读心术"]["currentRating"], "未知");
    assert_eq!(results["读心术"]["targetRating"], "未知");
    assert_eq!(results["visual_memory"]["currentRating"], "优秀");
}

#[tokio::test]
async fn it_teacher_cannot_submit_assessment() {
    let app = spawn_test_app().await;
    let token = login(&app.app, "teacher1").await;

    let response = request(
        &app.app,
        Method::POST,
        "/api/assessments",
        Some(sample_submission("小明")),
        &[("authorization", auth_header(&token))],
    )
    .await;

    let (status, _, body) = response_json(response).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_json_error(&body, "FORBIDDEN");
}

#[tokio::test]
async fn it_invalid_dates_are_rejected() {
    let app = spawn_test_app().await;
    let token = login(&app.app, "assessor1").await;

    let response = request(
        &app.app,
        Method::POST,
        "/api/assessments",
        Some(serde_json::json!({
            "name": "小明",
            "dob": "01/05/2018",
            "testDate": "2025-06-01",
            "scores": { "visual_memory": 3 }
        })),
        &[("authorization", auth_header(&token))],
    )
    .await;

    let (status, _, body) = response_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_json_error(&body, "INVALID_DATE");
}

#[tokio::test]
async fn it_empty_scores_are_rejected() {
    let app = spawn_test_app().await;
    let token = login(&app.app, "assessor1").await;

    let response = request(
        &app.app,
        Method::POST,
        "/api/assessments",
        Some(serde_json::json!({
            "name": "小明",
            "dob": "2018-05-01",
            "testDate": "2025-06-01",
            "scores": {}
        })),
        &[("authorization", auth_header(&token))],
    )
    .await;

    let (status, _, body) = response_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_json_error(&body, "EMPTY_SCORES");
}

#[tokio::test]
async fn it_report_payload_flattens_ability_fields() {
    let app = spawn_test_app().await;
    let token = login(&app.app, "assessor1").await;

    let response = request(
        &app.app,
        Method::POST,
        "/api/assessments",
        Some(sample_submission("小明")),
        &[("authorization", auth_header(&token))],
    )
    .await;
    let (_, _, body) = response_json(response).await;
    let profile_id = body["data"]["profileId"].as_str().unwrap().to_string();

    let response = request(
        &app.app,
        Method::GET,
        &format!("/api/assessments/{profile_id}/report"),
        None,
        &[("authorization", auth_header(&token))],
    )
    .await;

    let (status, _, body) = response_json(response).await;
    assert_status_ok_json(status, &body);
    assert_eq!(body["data"]["childName"], "小明");
    assert_eq!(body["data"]["vb"], 300.0);
    assert_eq!(body["data"]["vb_eval"], "不合格");
    assert_eq!(body["data"]["vb_target"], 120.0);
    assert_eq!(body["data"]["vm_target_eval"], "优秀");
}

#[tokio::test]
async fn it_profiles_are_visible_per_role() {
    let app = spawn_test_app().await;
    let assessor1 = login(&app.app, "assessor1").await;
    let assessor2 = login(&app.app, "assessor2").await;
    let admin = login(&app.app, "admin").await;

    let response = request(
        &app.app,
        Method::POST,
        "/api/assessments",
        Some(sample_submission("东区小明")),
        &[("authorization", auth_header(&assessor1))],
    )
    .await;
    let (_, _, body) = response_json(response).await;
    let profile_id = body["data"]["profileId"].as_str().unwrap().to_string();

    // 其他测评师看不到
    let response = request(
        &app.app,
        Method::GET,
        &format!("/api/assessments/{profile_id}"),
        None,
        &[("authorization", auth_header(&assessor2))],
    )
    .await;
    let (status, _, _) = response_json(response).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // 管理员全量可见（查询参数需 percent 编码：小明）
    let response = request(
        &app.app,
        Method::GET,
        "/api/profiles?searchName=%E5%B0%8F%E6%98%8E",
        None,
        &[("authorization", auth_header(&admin))],
    )
    .await;
    let (status, _, body) = response_json(response).await;
    assert_status_ok_json(status, &body);
    assert_eq!(body["data"]["total"], 1);

    // 自己的列表包含该档案
    let response = request(
        &app.app,
        Method::GET,
        "/api/profiles",
        None,
        &[("authorization", auth_header(&assessor1))],
    )
    .await;
    let (_, _, body) = response_json(response).await;
    assert_eq!(body["data"]["total"], 1);

    // 别的测评师列表为空
    let response = request(
        &app.app,
        Method::GET,
        "/api/profiles",
        None,
        &[("authorization", auth_header(&assessor2))],
    )
    .await;
    let (_, _, body) = response_json(response).await;
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn it_csv_export_returns_csv() {
    let app = spawn_test_app().await;
    let token = login(&app.app, "assessor1").await;

    let _ = request(
        &app.app,
        Method::POST,
        "/api/assessments",
        Some(sample_submission("导出小明")),
        &[("authorization", auth_header(&token))],
    )
    .await;

    let response = request(
        &app.app,
        Method::GET,
        "/api/profiles/export",
        None,
        &[("authorization", auth_header(&token))],
    )
    .await;

    let (status, headers, text) = response_text(response).await;
    assert_eq!(status, StatusCode::OK);
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(content_type.starts_with("text/csv"));
    assert!(text.contains("姓名"));
    assert!(text.contains("导出小明"));
}
