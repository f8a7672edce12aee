use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value as JsonValue};
use skilltest_backend::{
    middleware::auth::Claims, policy::RolePolicy, repository::MemoryRepository, routes, AppState,
};
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "test_secret_key";

fn app() -> Router {
    let state = AppState::new(MemoryRepository::new(), Arc::new(RolePolicy), SECRET);
    routes::router(state)
}

fn token(user: Uuid, role: &str) -> String {
    let exp = (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize;
    let claims = Claims {
        sub: user.to_string(),
        exp,
        role: Some(role.to_string()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("encode token")
}

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    bearer: Option<&str>,
    body: Option<JsonValue>,
) -> (StatusCode, JsonValue) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = bearer {
        builder = builder.header("Authorization", format!("Bearer {}", t));
    }
    let request = match body {
        Some(b) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn health_is_public() {
    let app = app();
    let (status, body) = call(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn authoring_requires_valid_token() {
    let app = app();
    let (status, body) = call(&app, "GET", "/api/tests?status=draft", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing_authorization");

    let (status, body) = call(&app, "GET", "/api/tests?status=draft", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_token");
}

#[tokio::test]
async fn authoring_flow_end_to_end() {
    let app = app();
    let hr = token(Uuid::new_v4(), "hr");
    let hr = Some(hr.as_str());

    let (status, test) = call(
        &app,
        "POST",
        "/api/tests",
        hr,
        Some(json!({ "name": "JS Basics", "passing_score": 70 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(test["status"], "draft");
    assert_eq!(test["max_attempts"], 1);
    assert_eq!(test["show_correct_answers"], true);
    let test_id = test["id"].as_str().unwrap().to_string();

    // Publishing an empty test fails.
    let (status, body) = call(&app, "POST", &format!("/api/tests/{}/publish", test_id), hr, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cannot publish test without at least one question.");

    let mut ids = Vec::new();
    for text in ["one", "two", "three"] {
        let (status, question) = call(
            &app,
            "POST",
            &format!("/api/tests/{}/questions", test_id),
            hr,
            Some(json!({
                "type": "single_answer",
                "question_text": text,
                "options": [
                    { "option_text": "4", "is_correct": true },
                    { "option_text": "5", "is_correct": false }
                ]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(question["points"], 1);
        ids.push(question["id"].as_str().unwrap().to_string());
    }

    let (status, reordered) = call(
        &app,
        "PUT",
        &format!("/api/tests/{}/questions/order", test_id),
        hr,
        Some(json!({ "question_ids": [ids[2], ids[0], ids[1]] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let order: Vec<(&str, i64)> = reordered
        .as_array()
        .unwrap()
        .iter()
        .map(|q| (q["id"].as_str().unwrap(), q["order"].as_i64().unwrap()))
        .collect();
    assert_eq!(
        order,
        vec![(ids[2].as_str(), 1), (ids[0].as_str(), 2), (ids[1].as_str(), 3)]
    );

    let (status, stats) = call(&app, "GET", &format!("/api/tests/{}/stats", test_id), hr, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["question_count"], 3);
    assert_eq!(stats["total_points"], 3);

    let (status, published) =
        call(&app, "POST", &format!("/api/tests/{}/publish", test_id), hr, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(published["status"], "published");
    assert!(published["published_at"].is_string());

    let (status, listed) = call(&app, "GET", "/api/tests?status=published", hr, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    // Published tests are frozen.
    let (status, _) = call(
        &app,
        "PATCH",
        &format!("/api/questions/{}", ids[0]),
        hr,
        Some(json!({ "question_text": "changed" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, archived) =
        call(&app, "POST", &format!("/api/tests/{}/archive", test_id), hr, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(archived["status"], "archived");
}

#[tokio::test]
async fn validation_errors_are_bad_requests() {
    let app = app();
    let hr = token(Uuid::new_v4(), "hr");
    let hr = Some(hr.as_str());

    let (status, body) = call(
        &app,
        "POST",
        "/api/tests",
        hr,
        Some(json!({ "name": "Bad score", "passing_score": 120 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Passing score must be between 0 and 100.");

    let (_, test) = call(
        &app,
        "POST",
        "/api/tests",
        hr,
        Some(json!({ "name": "Essays", "passing_score": 50 })),
    )
    .await;
    let test_id = test["id"].as_str().unwrap();

    let (status, body) = call(
        &app,
        "POST",
        &format!("/api/tests/{}/questions", test_id),
        hr,
        Some(json!({
            "type": "text",
            "question_text": "Describe closures",
            "text_config": {
                "expected_answer_guidelines": "Mentions captures",
                "min_characters": 500,
                "max_characters": 100
            }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Minimum character limit cannot be greater than maximum"));

    let (status, body) = call(
        &app,
        "POST",
        "/api/tests",
        hr,
        Some(json!({ "name": "  Essays  ", "passing_score": 50 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "A test with this name already exists.");

    let (status, body) = call(&app, "GET", "/api/tests?status=pending", hr, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid status");
}

#[tokio::test]
async fn other_users_tests_are_forbidden() {
    let app = app();
    let owner = token(Uuid::new_v4(), "hr");
    let intruder = token(Uuid::new_v4(), "hr");
    let employee = token(Uuid::new_v4(), "employee");

    let (status, _) = call(
        &app,
        "POST",
        "/api/tests",
        Some(&employee),
        Some(json!({ "name": "Nope", "passing_score": 50 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, test) = call(
        &app,
        "POST",
        "/api/tests",
        Some(&owner),
        Some(json!({ "name": "Owned", "passing_score": 50 })),
    )
    .await;
    let test_id = test["id"].as_str().unwrap();

    let (status, _) = call(&app, "DELETE", &format!("/api/tests/{}", test_id), Some(&intruder), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&app, "DELETE", &format!("/api/tests/{}", test_id), Some(&owner), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(&app, "GET", &format!("/api/tests/{}", test_id), Some(&owner), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_and_inspect_question() {
    let app = app();
    let hr = token(Uuid::new_v4(), "hr");
    let hr = Some(hr.as_str());

    let (_, source) = call(
        &app,
        "POST",
        "/api/tests",
        hr,
        Some(json!({ "name": "Source", "passing_score": 50 })),
    )
    .await;
    let (_, target) = call(
        &app,
        "POST",
        "/api/tests",
        hr,
        Some(json!({ "name": "Target", "passing_score": 50 })),
    )
    .await;

    let (_, question) = call(
        &app,
        "POST",
        &format!("/api/tests/{}/questions", source["id"].as_str().unwrap()),
        hr,
        Some(json!({
            "type": "mcq",
            "question_text": "Pick primes",
            "points": 3,
            "options": [
                { "option_text": "2", "is_correct": true },
                { "option_text": "3", "is_correct": true },
                { "option_text": "4", "is_correct": false }
            ]
        })),
    )
    .await;
    let question_id = question["id"].as_str().unwrap();

    let (status, copy) = call(
        &app,
        "POST",
        &format!("/api/questions/{}/duplicate", question_id),
        hr,
        Some(json!({ "target_test_id": target["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_ne!(copy["id"], question["id"]);
    assert_eq!(copy["test_id"], target["id"]);
    assert_eq!(copy["order"], 1);
    assert_eq!(copy["points"], 3);

    let (status, stats) =
        call(&app, "GET", &format!("/api/questions/{}/stats", question_id), hr, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["option_count"], 3);
    assert_eq!(stats["correct_option_count"], 2);

    let (status, report) =
        call(&app, "GET", &format!("/api/questions/{}/validation", question_id), hr, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["valid"], true);

    let (status, _) = call(&app, "DELETE", &format!("/api/questions/{}", question_id), hr, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&app, "DELETE", &format!("/api/questions/{}", question_id), hr, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
