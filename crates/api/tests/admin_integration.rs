//! Moderation and back-office endpoints against a real database.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::{create_professional, json_request, register, register_admin, send, test_pool};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_stale_admin_token_is_rejected() {
    let Some(pool) = test_pool().await else { return };
    let app = common::app_with(&pool);
    let admin = register_admin(&app, &pool).await;

    sqlx::query("UPDATE users SET role = 'citizen' WHERE id = $1")
        .bind(admin.id)
        .execute(&pool)
        .await
        .unwrap();

    let (status, _) = send(
        &app,
        json_request(Method::GET, "/api/v1/admin/stats", None, Some(&admin.access_token)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_user_moderation() {
    let Some(pool) = test_pool().await else { return };
    let app = common::app_with(&pool);
    let admin = register_admin(&app, &pool).await;
    let citizen = register(&app, "Tomas Moderado").await;

    let (status, page) = send(
        &app,
        json_request(
            Method::GET,
            &format!(
                "/api/v1/admin/users?q={}&per_page=5",
                citizen.email.replace('+', "%2B")
            ),
            None,
            Some(&admin.access_token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{page}");
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["id"], citizen.id.to_string());

    let uri = format!("/api/v1/admin/users/{}", citizen.id);
    let (status, updated) = send(
        &app,
        json_request(Method::PATCH, &uri, Some(json!({ "status": "suspended" })), Some(&admin.access_token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "suspended");

    let own = format!("/api/v1/admin/users/{}", admin.id);
    let (status, _) = send(
        &app,
        json_request(Method::PATCH, &own, Some(json!({ "role": "citizen" })), Some(&admin.access_token)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_professional_rejection_emails_owner() {
    let Some(pool) = test_pool().await else { return };
    let app = common::app_with(&pool);
    let admin = register_admin(&app, &pool).await;
    let (pro, profile) = create_professional(&app, "Nora Rechazada", "Ceres").await;

    let (status, pending) = send(
        &app,
        json_request(
            Method::GET,
            "/api/v1/admin/professionals?status=pending&per_page=100",
            None,
            Some(&admin.access_token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(pending["total"].as_i64().unwrap() >= 1);

    let uri = format!("/api/v1/admin/professionals/{}/reject", profile["id"].as_str().unwrap());
    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            &uri,
            Some(json!({ "reason": "Falta documentacion" })),
            Some(&admin.access_token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "rejected");
    assert_eq!(body["rejection_reason"], "Falta documentacion");
    assert_eq!(common::count_jobs(&pool, "send_email", "Falta documentacion").await, 1);

    let public = format!("/api/v1/professionals/{}", profile["id"].as_str().unwrap());
    let (status, _) = send(&app, json_request(Method::GET, &public, None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, mine) = send(
        &app,
        json_request(Method::GET, "/api/v1/professionals/me", None, Some(&pro.access_token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["status"], "rejected");
}

#[tokio::test]
async fn test_certification_review() {
    let Some(pool) = test_pool().await else { return };
    let app = common::app_with(&pool);
    let admin = register_admin(&app, &pool).await;
    let (pro, _) = create_professional(&app, "Elsa Matriculada", "Ceres").await;

    let (status, cert) = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/professionals/me/certifications",
            Some(json!({ "title": "Matricula de gasista", "issuer": "ENARGAS" })),
            Some(&pro.access_token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{cert}");
    assert_eq!(cert["status"], "pending");

    let cert_id = cert["id"].as_str().unwrap();
    let (status, approved) = send(
        &app,
        json_request(
            Method::POST,
            &format!("/api/v1/admin/certifications/{cert_id}/approve"),
            None,
            Some(&admin.access_token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{approved}");
    assert_eq!(approved["status"], "approved");

    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            &format!("/api/v1/admin/certifications/{cert_id}/reject"),
            Some(json!({ "reason": "Ya revisada" })),
            Some(&admin.access_token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        json_request(
            Method::DELETE,
            &format!("/api/v1/professionals/me/certifications/{cert_id}"),
            None,
            Some(&pro.access_token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_job_stats_and_retry() {
    let Some(pool) = test_pool().await else { return };
    let app = common::app_with(&pool);
    let admin = register_admin(&app, &pool).await;

    let (status, stats) = send(
        &app,
        json_request(Method::GET, "/api/v1/admin/jobs/stats", None, Some(&admin.access_token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(stats["queues"].as_array().is_some());

    let failed_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO jobs (queue, kind, payload, status, attempts, last_error, run_at)
        VALUES ('slack', 'slack_alert', '{"kind": "slack_alert", "text": "x"}', 'failed', 5,
                'webhook rejected', NOW() + INTERVAL '1 day')
        RETURNING id
        "#,
    )
    .fetch_one(&pool)
    .await
    .unwrap();

    let uri = format!("/api/v1/admin/jobs/{failed_id}/retry");
    let (status, job) = send(&app, json_request(Method::POST, &uri, None, Some(&admin.access_token))).await;
    assert_eq!(status, StatusCode::OK, "{job}");
    assert_eq!(job["status"], "pending");
    assert_eq!(job["attempts"], 0);

    let (status, _) = send(&app, json_request(Method::POST, &uri, None, Some(&admin.access_token))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let missing = format!("/api/v1/admin/jobs/{}/retry", Uuid::new_v4());
    let (status, _) = send(&app, json_request(Method::POST, &missing, None, Some(&admin.access_token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn multipart_upload(uri: &str, token: &str, filename: &str, bytes: &[u8]) -> Request<Body> {
    let boundary = "ceres-boundary-7d1f";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_uploads_are_sniffed_and_queued() {
    let Some(pool) = test_pool().await else { return };
    let app = common::app_with(&pool);
    let (pro, profile) = create_professional(&app, "Ivan Subidas", "Ceres").await;

    let mut png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    png.extend_from_slice(&[0u8; 64]);
    let (status, body) = send(
        &app,
        multipart_upload("/api/v1/professionals/me/image", &pro.access_token, "foto.png", &png),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED, "{body}");
    assert_eq!(body["mime_type"], "image/png");
    assert!(body["url"].as_str().unwrap().ends_with(".png"));
    let profile_id = profile["id"].as_str().unwrap();
    assert_eq!(common::count_jobs(&pool, "process_image", profile_id).await, 1);

    // A PNG is not an acceptable CV.
    let (status, _) = send(
        &app,
        multipart_upload("/api/v1/professionals/me/cv", &pro.access_token, "cv.pdf", &png),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let pdf = b"%PDF-1.4\n1 0 obj\n<<>>\nendobj\ntrailer\n<<>>\n%%EOF\n";
    let (status, body) = send(
        &app,
        multipart_upload("/api/v1/professionals/me/cv", &pro.access_token, "cv.pdf", pdf),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED, "{body}");
    assert_eq!(body["mime_type"], "application/pdf");
    assert_eq!(common::count_jobs(&pool, "check_file_size", profile_id).await, 1);
}

#[tokio::test]
async fn test_replacing_uploads_removes_previous_files() {
    let Some(pool) = test_pool().await else { return };
    let app = common::app_with(&pool);
    let config = common::test_config();
    let (pro, _) = create_professional(&app, "Olga Reemplazos", "Ceres").await;

    let stored_path = |body: &serde_json::Value| {
        let url = body["url"].as_str().unwrap();
        let relative = config.upload_relative_path(url).unwrap();
        config.storage.upload_dir.join(relative)
    };

    let mut png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    png.extend_from_slice(&[0u8; 64]);
    let image_uri = "/api/v1/professionals/me/image";
    let (_, first) = send(&app, multipart_upload(image_uri, &pro.access_token, "a.png", &png)).await;
    let first_image = stored_path(&first);
    assert!(first_image.exists());

    let (status, second) = send(&app, multipart_upload(image_uri, &pro.access_token, "b.png", &png)).await;
    assert_eq!(status, StatusCode::ACCEPTED, "{second}");
    assert!(!first_image.exists());
    assert!(stored_path(&second).exists());

    let pdf = b"%PDF-1.4\n1 0 obj\n<<>>\nendobj\ntrailer\n<<>>\n%%EOF\n";
    let cv_uri = "/api/v1/professionals/me/cv";
    let (_, first) = send(&app, multipart_upload(cv_uri, &pro.access_token, "a.pdf", pdf)).await;
    let first_cv = stored_path(&first);
    let (_, second) = send(&app, multipart_upload(cv_uri, &pro.access_token, "b.pdf", pdf)).await;
    assert!(!first_cv.exists());
    assert!(stored_path(&second).exists());
}
