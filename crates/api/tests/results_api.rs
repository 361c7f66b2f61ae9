//! Router tests for the result endpoints

use api::{create_router, AppState, ServerConfig};
use grading::ValidationConfig;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use storage::ResultRepository;
use tower::ServiceExt;

fn app() -> Router {
    create_router(Arc::new(AppState::new()))
}

fn app_without_verification() -> Router {
    let config = ServerConfig {
        verify_derived: false,
        ..Default::default()
    };
    let state = AppState::with_repository(Arc::new(ResultRepository::new()), &config);
    create_router(Arc::new(state))
}

fn result_body(roll: &str, marks: [u32; 5], total: u32, average: f64, grade: &str) -> Value {
    json!({
        "rollNumber": roll,
        "studentName": format!("Student {roll}"),
        "maths": marks[0],
        "science": marks[1],
        "english": marks[2],
        "tamil": marks[3],
        "computerScience": marks[4],
        "total": total,
        "average": average,
        "grade": grade,
        "timestamp": 1_700_000_000_000i64,
    })
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn add_then_list_in_id_order() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/results",
        Some(result_body("R1", [90, 90, 90, 90, 90], 450, 90.0, "A")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 0);

    let (_, body) = send(
        &app,
        Method::POST,
        "/api/v1/results",
        Some(result_body("R2", [40, 40, 40, 40, 40], 200, 40.0, "C")),
    )
    .await;
    assert_eq!(body["id"], 1);

    let (status, body) = send(&app, Method::GET, "/api/v1/results", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["data"][0]["id"], 0);
    assert_eq!(body["data"][0]["rollNumber"], "R1");
    assert_eq!(body["data"][1]["id"], 1);
    assert_eq!(body["data"][1]["grade"], "C");
    assert_eq!(body["data"][1]["timestamp"], 1_700_000_000_000i64);
}

#[tokio::test]
async fn delete_then_missing() {
    let app = app();
    send(
        &app,
        Method::POST,
        "/api/v1/results",
        Some(result_body("R1", [60, 60, 60, 60, 60], 300, 60.0, "B")),
    )
    .await;

    let (status, _) = send(&app, Method::DELETE, "/api/v1/results/0", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, Method::DELETE, "/api/v1/results/0", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Record 0 does not exist");

    let (_, body) = send(&app, Method::GET, "/api/v1/results", None).await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn delete_unknown_leaves_others() {
    let app = app();
    send(
        &app,
        Method::POST,
        "/api/v1/results",
        Some(result_body("R1", [60, 60, 60, 60, 60], 300, 60.0, "B")),
    )
    .await;

    let (status, _) = send(&app, Method::DELETE, "/api/v1/results/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, Method::GET, "/api/v1/results", None).await;
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn clear_all_restarts_ids() {
    let app = app();
    for roll in ["R1", "R2", "R3"] {
        send(
            &app,
            Method::POST,
            "/api/v1/results",
            Some(result_body(roll, [80, 80, 80, 80, 80], 400, 80.0, "A")),
        )
        .await;
    }

    let (status, _) = send(&app, Method::DELETE, "/api/v1/results", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, Method::GET, "/api/v1/results", None).await;
    assert_eq!(body["count"], 0);

    let (_, body) = send(
        &app,
        Method::POST,
        "/api/v1/results",
        Some(result_body("R4", [80, 80, 80, 80, 80], 400, 80.0, "A")),
    )
    .await;
    assert_eq!(body["id"], 0);
}

#[tokio::test]
async fn inconsistent_grade_rejected() {
    let app = app();

    // one mark below 35 must be Fail regardless of the average
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/results",
        Some(result_body("R1", [34, 90, 90, 90, 90], 394, 78.8, "B")),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["expected"]["grade"], "Fail");

    let (_, body) = send(&app, Method::GET, "/api/v1/results", None).await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn out_of_range_mark_rejected() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/results",
        Some(result_body("R1", [120, 90, 90, 90, 90], 480, 96.0, "A")),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["fields"][0]["field"], "maths");
}

#[tokio::test]
async fn unverified_store_trusts_caller() {
    let app = app_without_verification();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/results",
        Some(result_body("R1", [10, 10, 10, 10, 10], 999, 1.5, "A")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 0);

    let (_, body) = send(&app, Method::GET, "/api/v1/results", None).await;
    assert_eq!(body["data"][0]["total"], 999);
}

#[tokio::test]
async fn missing_timestamp_uses_server_clock() {
    let app = app();
    let mut body = result_body("R1", [70, 70, 70, 70, 70], 350, 70.0, "B");
    body.as_object_mut().unwrap().remove("timestamp");

    let before = now_ms();
    let (status, _) = send(&app, Method::POST, "/api/v1/results", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, listed) = send(&app, Method::GET, "/api/v1/results", None).await;
    let stamp = listed["data"][0]["timestamp"].as_i64().unwrap();
    assert!(stamp >= before);
}

#[tokio::test]
async fn unknown_grade_string_rejected() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/results",
        Some(result_body("R1", [70, 70, 70, 70, 70], 350, 70.0, "D")),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("unknown variant"));
}

#[tokio::test]
async fn missing_mark_reported_per_field() {
    let app = app();
    let mut body = result_body("R1", [70, 70, 70, 70, 70], 350, 70.0, "B");
    body.as_object_mut().unwrap().remove("maths");

    let (status, body) = send(&app, Method::POST, "/api/v1/results", Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["fields"][0]["field"], "maths");
    assert_eq!(body["fields"][0]["message"], "maths mark is required");
}

#[tokio::test]
async fn negative_mark_reported_per_field() {
    for app in [app(), app_without_verification()] {
        let mut body = result_body("R1", [70, 70, 70, 70, 70], 350, 70.0, "B");
        body["maths"] = json!(-1);

        let (status, body) = send(&app, Method::POST, "/api/v1/results", Some(body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["fields"][0]["field"], "maths");
        assert!(body["error"].is_string());

        let (_, listed) = send(&app, Method::GET, "/api/v1/results", None).await;
        assert_eq!(listed["count"], 0);
    }
}

#[tokio::test]
async fn missing_derived_field_is_json_error() {
    let app = app();
    let mut body = result_body("R1", [70, 70, 70, 70, 70], 350, 70.0, "B");
    body.as_object_mut().unwrap().remove("total");

    let (status, body) = send(&app, Method::POST, "/api/v1/results", Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("total"));
}

#[tokio::test]
async fn malformed_body_is_json_error() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/results")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"rollNumber\": "))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn non_numeric_id_is_json_bad_request() {
    let app = app();
    let (status, body) = send(&app, Method::DELETE, "/api/v1/results/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("abc"));
}

#[tokio::test]
async fn caller_header_is_accepted() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/results")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-caller-id", "principal")
        .body(Body::from(
            result_body("R1", [50, 50, 50, 50, 50], 250, 50.0, "C").to_string(),
        ))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn grade_preview() {
    let app = app();
    let form = json!({
        "rollNumber": " R-5 ",
        "studentName": "Meena",
        "maths": "34",
        "science": "90",
        "english": "90",
        "tamil": "90",
        "computerScience": "90",
    });

    let (status, body) = send(&app, Method::POST, "/api/v1/grade", Some(form)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rollNumber"], "R-5");
    assert_eq!(body["total"], 394);
    assert_eq!(body["grade"], "Fail");
}

#[tokio::test]
async fn grade_preview_reports_each_field() {
    let app = app();
    let form = json!({
        "rollNumber": "",
        "studentName": "Meena",
        "maths": "ninety",
        "science": "",
        "english": "101",
        "tamil": "90",
        "computerScience": "90",
    });

    let (status, body) = send(&app, Method::POST, "/api/v1/grade", Some(form)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["rollNumber", "maths", "science", "english"]);
}

#[tokio::test]
async fn grade_preview_accepts_numeric_marks() {
    let app = app();
    let form = json!({
        "rollNumber": "R-6",
        "studentName": "Meena",
        "maths": 90,
        "science": 80,
        "english": "70",
        "tamil": 60,
        "computerScience": 50,
    });

    let (status, body) = send(&app, Method::POST, "/api/v1/grade", Some(form)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["maths"], 90);
    assert_eq!(body["total"], 350);
    assert_eq!(body["grade"], "B");
}

#[tokio::test]
async fn grade_preview_fractional_mark_rejected() {
    let app = app();
    let form = json!({
        "rollNumber": "R-6",
        "studentName": "Meena",
        "maths": 90.5,
        "science": 80,
        "english": 70,
        "tamil": 60,
        "computerScience": 50,
    });

    let (status, body) = send(&app, Method::POST, "/api/v1/grade", Some(form)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["fields"][0]["field"], "maths");
}

#[tokio::test]
async fn configured_mark_range_applies() {
    let config = ServerConfig {
        validation: ValidationConfig {
            min_mark: 0,
            max_mark: 50,
        },
        ..Default::default()
    };
    let state = AppState::with_repository(Arc::new(ResultRepository::new()), &config);
    let app = create_router(Arc::new(state));

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/results",
        Some(result_body("R1", [60, 40, 40, 40, 40], 220, 44.0, "C")),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["fields"][0]["field"], "maths");
}

#[tokio::test]
async fn health_reports_store() {
    let app = app();
    send(
        &app,
        Method::POST,
        "/api/v1/results",
        Some(result_body("R1", [90, 90, 90, 90, 90], 450, 90.0, "A")),
    )
    .await;

    let (status, body) = send(&app, Method::GET, "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"]["record_count"], 1);
    assert_eq!(body["store"]["next_id"], 1);
}

#[tokio::test]
async fn metrics_disabled_without_exporter() {
    let app = app();
    let (status, _) = send(&app, Method::GET, "/metrics", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
