mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;

use common::{from_addr, json_body, router, test_config, TEST_SECRET};
use study_tutor_backend::config::Config;
use study_tutor_backend::utils::token::create_access_token;

fn limited_config(max_calls: usize) -> Config {
    Config {
        rate_limit_max_calls: max_calls,
        rate_limit_window_seconds: 60,
        rate_limit_paths: vec!["/health".into()],
        ..test_config()
    }
}

fn health(addr: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri("/health");
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    from_addr(builder.body(Body::empty()).unwrap(), addr)
}

#[tokio::test]
async fn same_subject_shares_a_bucket_across_addresses() {
    let app = router(limited_config(1));
    let token = create_access_token("user-42", TEST_SECRET, 5).unwrap();

    let first = app
        .clone()
        .oneshot(health("10.0.0.1:5000", Some(&token)))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(health("10.0.0.2:6000", Some(&token)))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json_body(second).await["key"], "user:user-42");
}

#[tokio::test]
async fn invalid_token_falls_back_to_address_without_rejection() {
    let app = router(limited_config(1));

    let res = app
        .clone()
        .oneshot(health("10.0.0.1:5000", Some("not-a-jwt")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let other_addr = app
        .clone()
        .oneshot(health("10.0.0.2:5000", Some("not-a-jwt")))
        .await
        .unwrap();
    assert_eq!(other_addr.status(), StatusCode::OK);

    let repeat = app
        .oneshot(health("10.0.0.1:7000", Some("not-a-jwt")))
        .await
        .unwrap();
    assert_eq!(repeat.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json_body(repeat).await["key"], "ip:10.0.0.1");
}

#[tokio::test]
async fn rejection_carries_structured_body_and_retry_after() {
    let app = router(limited_config(2));
    for _ in 0..2 {
        let res = app.clone().oneshot(health("192.168.1.9:1", None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    let res = app.oneshot(health("192.168.1.9:1", None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);

    let retry_after: u64 = res.headers()[header::RETRY_AFTER]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=60).contains(&retry_after));

    let body = json_body(res).await;
    assert_eq!(body["detail"], "Too Many Requests");
    assert_eq!(body["key"], "ip:192.168.1.9");
    assert_eq!(body["window_seconds"], 60);
    assert_eq!(body["max_calls"], 2);
    assert_eq!(body["try_again_in"], retry_after);
}

#[tokio::test]
async fn unguarded_paths_are_never_throttled() {
    let app = router(limited_config(1));
    for _ in 0..5 {
        let req = from_addr(
            Request::builder().uri("/").body(Body::empty()).unwrap(),
            "10.9.9.9:1",
        );
        let res = app.clone().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn missing_peer_address_is_keyed_as_unknown() {
    let app = router(limited_config(1));
    let bare = || Request::builder().uri("/health").body(Body::empty()).unwrap();

    assert_eq!(app.clone().oneshot(bare()).await.unwrap().status(), StatusCode::OK);
    let res = app.oneshot(bare()).await.unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json_body(res).await["key"], "ip:unknown");
}
