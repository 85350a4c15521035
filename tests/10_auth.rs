mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use serde_json::json;

use asso_admin_api::database::Repository;

use common::{TestApp, PASSWORD};

#[tokio::test]
async fn login_returns_token_and_effective_modules() -> Result<()> {
    let app = TestApp::new();
    let (master, _) = app.master().await?;

    let res = app
        .send(Method::POST, "/api/auth/login", None, Some(json!({ "email": "MASTER@asso.test", "password": PASSWORD })))
        .await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.json());

    let data = res.data();
    assert!(data["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(data["admin"]["id"], master.id.to_string());
    assert!(data["admin"].get("password_hash").is_none());
    assert_eq!(data["modules"].as_array().map(Vec::len), Some(7));

    let stored = app.state.repos.admins.select_404(master.id).await?;
    assert!(stored.last_login_at.is_some());
    Ok(())
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() -> Result<()> {
    let app = TestApp::new();
    app.master().await?;

    for body in [
        json!({ "email": "master@asso.test", "password": "nope-nope" }),
        json!({ "email": "ghost@asso.test", "password": PASSWORD }),
    ] {
        let res = app.send(Method::POST, "/api/auth/login", None, Some(body)).await?;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
        assert_eq!(res.json()["success"], false);
        assert_eq!(res.json()["message"], "Invalid credentials");
    }
    Ok(())
}

#[tokio::test]
async fn login_by_member_number() -> Result<()> {
    let app = TestApp::new();
    let mut admin = app.seed_admin("numero@asso.test", false).await?;
    admin.numero_membre = Some("ADH-2024-0007".to_string());
    app.state.repos.admins.update(&admin).await?;

    let res = app
        .send(Method::POST, "/api/auth/login", None, Some(json!({ "numero_membre": "ADH-2024-0007", "password": PASSWORD })))
        .await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.json());
    assert_eq!(res.data()["admin"]["email"], "numero@asso.test");
    Ok(())
}

#[tokio::test]
async fn suspended_account_is_locked_until_the_date() -> Result<()> {
    let app = TestApp::new();
    let mut admin = app.seed_admin("suspendu@asso.test", false).await?;
    admin.disabled_until = Some(Utc::now() + Duration::days(3));
    app.state.repos.admins.update(&admin).await?;

    let res = app
        .send(Method::POST, "/api/auth/login", None, Some(json!({ "email": "suspendu@asso.test", "password": PASSWORD })))
        .await?;
    assert_eq!(res.status, StatusCode::LOCKED);
    let message = res.json()["message"].as_str().unwrap_or_default().to_string();
    assert!(message.starts_with("Account suspended until "), "{}", message);
    assert!(message.ends_with(" UTC"), "{}", message);
    Ok(())
}

#[tokio::test]
async fn expired_suspension_is_cleared_on_login() -> Result<()> {
    let app = TestApp::new();
    let mut admin = app.seed_admin("revenu@asso.test", false).await?;
    admin.disabled_until = Some(Utc::now() - Duration::hours(1));
    admin.disabled_reason = Some("absences".to_string());
    app.state.repos.admins.update(&admin).await?;

    let res = app
        .send(Method::POST, "/api/auth/login", None, Some(json!({ "email": "revenu@asso.test", "password": PASSWORD })))
        .await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.json());

    let stored = app.state.repos.admins.select_404(admin.id).await?;
    assert!(stored.disabled_until.is_none());
    assert!(stored.disabled_reason.is_none());
    Ok(())
}

#[tokio::test]
async fn deactivated_account_cannot_log_in() -> Result<()> {
    let app = TestApp::new();
    let mut admin = app.seed_admin("parti@asso.test", false).await?;
    admin.is_active = false;
    app.state.repos.admins.update(&admin).await?;

    let res = app
        .send(Method::POST, "/api/auth/login", None, Some(json!({ "email": "parti@asso.test", "password": PASSWORD })))
        .await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.json()["message"], "Account is deactivated");
    Ok(())
}

#[tokio::test]
async fn me_requires_a_valid_token() -> Result<()> {
    let app = TestApp::new();
    let (_, token) = app.master().await?;

    let res = app.send(Method::GET, "/api/auth/me", None, None).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app.get("/api/auth/me", "not-a-jwt").await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app.get("/api/auth/me", &token).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["admin"]["email"], "master@asso.test");
    Ok(())
}

#[tokio::test]
async fn health_and_unknown_routes() -> Result<()> {
    let app = TestApp::new();

    let res = app.send(Method::GET, "/health", None, None).await?;
    assert_eq!(res.status, StatusCode::OK);

    let res = app.send(Method::GET, "/api/nowhere", None, None).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.json()["success"], false);
    Ok(())
}
