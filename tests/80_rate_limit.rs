mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;
use tokio::time::Duration;

use asso_admin_api::config::RateLimitTier;

use common::{test_config, TestApp, PASSWORD};

fn limited_app(strict: u32, generic: u32) -> TestApp {
    let mut config = test_config();
    config.api.enable_rate_limiting = true;
    config.api.trust_forwarded_for = true;
    config.api.strict_limit = RateLimitTier { max_requests: strict, window_secs: 900 };
    config.api.generic_limit = RateLimitTier { max_requests: generic, window_secs: 60 };
    TestApp::with_config(config)
}

#[tokio::test]
async fn login_is_on_the_strict_tier() -> Result<()> {
    let app = limited_app(2, 100);
    app.master().await?;
    let body = json!({ "email": "master@asso.test", "password": "wrong-password" });

    for _ in 0..2 {
        let res = app.send(Method::POST, "/api/auth/login", None, Some(body.clone())).await?;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    }

    // Even the right password is refused once the window is spent
    let res = app
        .send(Method::POST, "/api/auth/login", None, Some(json!({ "email": "master@asso.test", "password": PASSWORD })))
        .await?;
    assert_eq!(res.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(res.json()["success"], false);
    let retry_after: u64 = res.header("retry-after").and_then(|v| v.parse().ok()).unwrap_or(0);
    assert!((1..=900).contains(&retry_after), "retry-after {}", retry_after);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn generic_traffic_does_not_reset_the_login_window() -> Result<()> {
    let app = limited_app(2, 100);
    app.master().await?;
    let wrong = json!({ "email": "master@asso.test", "password": "wrong-password" });

    for _ in 0..2 {
        let res = app.send(Method::POST, "/api/auth/login", None, Some(wrong.clone())).await?;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    }

    // Past the generic window, well inside the strict one
    tokio::time::advance(Duration::from_secs(61)).await;
    let res = app.send(Method::GET, "/api/public/bureau", None, None).await?;
    assert_eq!(res.status, StatusCode::OK);

    let res = app.send(Method::POST, "/api/auth/login", None, Some(wrong)).await?;
    assert_eq!(res.status, StatusCode::TOO_MANY_REQUESTS);
    Ok(())
}

#[tokio::test]
async fn public_bureau_only_counts_against_the_generic_tier() -> Result<()> {
    let app = limited_app(1, 3);

    for _ in 0..3 {
        let res = app.send(Method::GET, "/api/public/bureau", None, None).await?;
        assert_eq!(res.status, StatusCode::OK);
    }
    let res = app.send(Method::GET, "/api/public/bureau", None, None).await?;
    assert_eq!(res.status, StatusCode::TOO_MANY_REQUESTS);
    Ok(())
}

#[tokio::test]
async fn clients_are_keyed_by_forwarded_address() -> Result<()> {
    let app = limited_app(1, 100);
    let contact = json!({ "nom": "Test", "email": "test@example.org", "message": "Un message assez long." });

    let first = app.send_from("198.51.100.1", Method::POST, "/api/public/contact", contact.clone()).await?;
    assert_eq!(first.status, StatusCode::OK, "{}", first.json());
    let again = app.send_from("198.51.100.1", Method::POST, "/api/public/contact", contact.clone()).await?;
    assert_eq!(again.status, StatusCode::TOO_MANY_REQUESTS);
    let other = app.send_from("198.51.100.2, 10.0.0.1", Method::POST, "/api/public/contact", contact).await?;
    assert_eq!(other.status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn forwarded_address_is_ignored_unless_trusted() -> Result<()> {
    let mut config = test_config();
    config.api.enable_rate_limiting = true;
    config.api.strict_limit = RateLimitTier { max_requests: 1, window_secs: 900 };
    let app = TestApp::with_config(config);
    let contact = json!({ "nom": "Test", "email": "test@example.org", "message": "Un message assez long." });

    let first = app.send_from("198.51.100.1", Method::POST, "/api/public/contact", contact.clone()).await?;
    assert_eq!(first.status, StatusCode::OK);
    let rotated = app.send_from("198.51.100.2", Method::POST, "/api/public/contact", contact).await?;
    assert_eq!(rotated.status, StatusCode::TOO_MANY_REQUESTS);
    Ok(())
}
