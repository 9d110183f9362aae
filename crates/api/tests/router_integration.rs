//! Routing, middleware and validation behaviour that needs no database.

mod common;

use axum::http::{Method, StatusCode};
use common::{json_request, lazy_app, lazy_app_with, send, test_config, token_for};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

#[tokio::test]
async fn test_liveness_probe() {
    let app = lazy_app();
    let (status, body) = send(&app, json_request(Method::GET, "/api/health/live", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "alive");
}

#[tokio::test]
async fn test_readiness_fails_without_database() {
    let app = lazy_app();
    let response = app
        .oneshot(json_request(Method::GET, "/api/health/ready", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_metrics_exposition() {
    ceres_api::middleware::init_metrics().unwrap();
    let app = lazy_app();

    let response = app
        .oneshot(json_request(Method::GET, "/metrics", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
}

#[tokio::test]
async fn test_request_id_and_security_headers() {
    let app = lazy_app();
    let mut request = json_request(Method::GET, "/api/health/live", None, None);
    request
        .headers_mut()
        .insert("x-request-id", "vecino-42".parse().unwrap());

    let response = app.oneshot(request).await.unwrap();
    let headers = response.headers();
    assert_eq!(headers["x-request-id"], "vecino-42");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = lazy_app();
    for (method, uri) in [
        (Method::GET, "/api/v1/auth/me"),
        (Method::GET, "/api/v1/professionals/me"),
        (Method::PUT, "/api/v1/professionals/me/schedule"),
        (Method::POST, "/api/v1/professionals/me/image"),
        (Method::DELETE, "/api/v1/reviews/8d5a1a54-7a52-4df0-9d8e-2b3b4a9f2a10"),
        (Method::GET, "/api/v1/admin/stats"),
    ] {
        let (status, body) = send(&app, json_request(method.clone(), uri, None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(body["error"], "unauthorized");
    }
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let app = lazy_app();
    let (status, _) = send(
        &app,
        json_request(Method::GET, "/api/v1/auth/me", None, Some("not-a-jwt")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_reject_other_roles() {
    let app = lazy_app();
    for role in ["citizen", "professional"] {
        let token = token_for(Uuid::new_v4(), role);
        let (status, body) = send(
            &app,
            json_request(Method::GET, "/api/v1/admin/jobs/stats", None, Some(&token)),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{role}");
        assert_eq!(body["error"], "forbidden");
    }
}

#[tokio::test]
async fn test_register_validation_details() {
    let app = lazy_app();
    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/auth/register",
            Some(json!({
                "email": "no-es-un-email",
                "password": "corta",
                "name": "Ana",
            })),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    let fields: Vec<_> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap().to_string())
        .collect();
    assert!(fields.contains(&"email".to_string()));
    assert!(fields.contains(&"password".to_string()));
}

#[tokio::test]
async fn test_search_rejects_incomplete_origin() {
    let app = lazy_app();
    let (status, body) = send(
        &app,
        json_request(Method::GET, "/api/v1/search?lat=-29.88&radius_km=10", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_search_rejects_out_of_range_radius() {
    let app = lazy_app();
    let (status, _) = send(
        &app,
        json_request(
            Method::GET,
            "/api/v1/search?lat=-29.88&lng=-61.94&radius_km=9000",
            None,
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = lazy_app();
    let response = app
        .oneshot(json_request(Method::GET, "/api/v1/no-existe", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_auth_rate_limit_ignores_spoofed_forwarded_for() {
    let mut config = test_config();
    config.security.auth_rate_limit_per_minute = 1;
    let app = lazy_app_with(config);

    let mut limited = 0;
    for i in 0..5 {
        let mut request = json_request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "email": "vecino@ceresenred.test", "password": "ceres2024segura" })),
            None,
        );
        request
            .headers_mut()
            .insert("x-forwarded-for", format!("203.0.113.{i}").parse().unwrap());
        let (status, _) = send(&app, request).await;
        if status == StatusCode::TOO_MANY_REQUESTS {
            limited += 1;
        }
    }

    assert_eq!(limited, 4);
}
