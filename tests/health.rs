mod common;

use axum::{extract::State, http::StatusCode};
use minishop_api::routes::health::health_check;

use common::{RequestSpec, app_for, offline_state, send};

#[tokio::test]
async fn health_check_returns_ok() {
    let response = health_check(State(offline_state())).await;
    assert_eq!(response.0.message, "Health check");

    let data = response.0.data.expect("health data");
    assert_eq!(data.status, "ok");
    assert_eq!(data.images, "local");
}

#[tokio::test]
async fn health_is_served_with_a_session_header() {
    let app = app_for(offline_state());

    let resp = send(&app, RequestSpec::new("GET", "/health").build()).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["success"], true);
    assert!(resp.session_id().is_some());
}
