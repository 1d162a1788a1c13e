#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::Value as JsonValue;
use tower::ServiceExt;

use survey_backend::{
    database::{catalog::AuthoringStore, memory::MemoryCatalogStore},
    middleware::auth::{Claims, JwtKeys},
    models::{
        question::{NewQuestion, Question, QuestionType},
        survey::Survey,
        user::{NewUser, User},
    },
    routes::api_router,
    AppState,
};

pub const SECRET: &str = "test_secret_key";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryCatalogStore>,
}

pub fn app() -> TestApp {
    let store = Arc::new(MemoryCatalogStore::new());
    let state = AppState::new(store.clone(), JwtKeys::new(SECRET));
    TestApp {
        router: api_router(state, 10_000),
        store,
    }
}

pub fn token_for(user_id: i64) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (Utc::now() + Duration::minutes(10)).timestamp() as usize,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("sign token")
}

pub async fn user(store: &MemoryCatalogStore, name: &str) -> User {
    store
        .create_user(NewUser {
            username: name.into(),
            email: format!("{name}@example.com"),
            password_hash: "unused".into(),
        })
        .await
        .expect("seed user")
}

/// Published survey "S": Q1 objective a/b/c (correct "b", 5 points), Q2 free text.
pub async fn published_survey(
    store: &MemoryCatalogStore,
    owner: &User,
    title: &str,
) -> (Survey, Vec<Question>) {
    let survey = store
        .create_survey(
            owner.id,
            title,
            vec![
                NewQuestion {
                    question: "Pick one".into(),
                    question_type: QuestionType::Objective,
                    score_of_objective: Some(5),
                    options: Some(vec!["a".into(), "b".into(), "c".into()]),
                    correct_answer: Some("b".into()),
                },
                NewQuestion {
                    question: "Why?".into(),
                    question_type: QuestionType::Other,
                    ..Default::default()
                },
            ],
        )
        .await
        .expect("seed survey");
    let survey = store.publish_survey(survey.id).await.expect("publish");
    let questions = store.list_questions(survey.id).await.expect("questions");
    (survey, questions)
}

pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<JsonValue>,
) -> (StatusCode, JsonValue) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");

    let response = router.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body");
    let json = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null)
    };
    (status, json)
}
