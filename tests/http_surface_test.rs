mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use common::{json_body, router, test_config, TEST_SECRET};
use study_tutor_backend::utils::token::create_access_token;

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_with_bearer(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

fn multipart_file(uri: &str, token: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    let boundary = "XTESTBOUNDARYX";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        b"Content-Disposition: form-data; name=\"file\"; filename=\"aula.pdf\"\r\n",
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn valid_token() -> String {
    create_access_token(&Uuid::new_v4().to_string(), TEST_SECRET, 5).unwrap()
}

#[tokio::test]
async fn health_and_root_are_public() {
    let app = router(test_config());

    let res = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await, json!({"status": "ok"}));

    let res = app.oneshot(get("/")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["name"], "Assistente de Redação PT-BR");
    assert_eq!(body["env"], "test");
}

#[tokio::test]
async fn protected_route_without_token_redirects_to_login() {
    let app = router(test_config());
    let res = app.oneshot(get("/tutor")).await.unwrap();
    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(res.headers()[header::LOCATION], "/ui");
}

#[tokio::test]
async fn protected_route_with_bad_token_is_unauthorized() {
    let app = router(test_config());

    let res = app
        .clone()
        .oneshot(get_with_bearer("/documents/00000000-0000-0000-0000-000000000000", "garbage"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(res).await, json!({"error": "invalid_token"}));

    let forged = create_access_token("someone", "another_secret", 5).unwrap();
    let req = Request::builder()
        .uri("/tutor")
        .header(header::COOKIE, format!("ar_jwt={}", forged))
        .body(Body::empty())
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_clears_session_cookie() {
    let app = router(test_config());
    let req = Request::builder()
        .method("POST")
        .uri("/auth/logout")
        .body(Body::empty())
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let cookie = res.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
    assert!(cookie.starts_with("ar_jwt="));
    assert!(cookie.contains("Max-Age=0"));
    assert_eq!(json_body(res).await, json!({"ok": true}));
}

#[tokio::test]
async fn register_rejects_invalid_payload_before_touching_storage() {
    let app = router(test_config());
    let req = Request::builder()
        .method("POST")
        .uri("/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"name": "Ana", "email": "não-é-email", "password": "123456"}).to_string(),
        ))
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(res).await["error"].as_str().unwrap().contains("email"));
}

#[tokio::test]
async fn pdf_upload_rejects_other_content_types() {
    let app = router(test_config());
    let req = multipart_file("/upload/pdf", &valid_token(), "text/plain", b"ola");
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn pdf_upload_over_limit_is_payload_too_large() {
    let app = router(test_config());
    let oversized = vec![b'x'; 1024 * 1024 + 512];
    let req = multipart_file("/upload/pdf", &valid_token(), "application/pdf", &oversized);
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
