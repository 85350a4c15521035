#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use once_cell::sync::Lazy;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use asso_admin_api::app::app;
use asso_admin_api::auth::{generate_jwt, hash_password, Claims};
use asso_admin_api::config::AppConfig;
use asso_admin_api::database::Repository;
use asso_admin_api::effects::notifier::MemoryNotifier;
use asso_admin_api::models::adhesion::{Member, MemberStatus};
use asso_admin_api::models::admin::{Admin, AdminModule, Droit, ModuleName, RoleType};
use asso_admin_api::state::AppState;

pub const PASSWORD: &str = "correct-horse-battery";
pub const JWT_SECRET: &str = "integration-test-secret";

// Argon2 is slow on purpose; hash once for every seeded admin
static PASSWORD_HASH: Lazy<String> = Lazy::new(|| hash_password(PASSWORD).expect("hash test password"));

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.security.jwt_secret = JWT_SECRET.to_string();
    config.api.enable_rate_limiting = false;
    config
}

/// In-process application over the memory store
pub struct TestApp {
    pub state: AppState,
    pub notifier: MemoryNotifier,
    router: Router,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub bytes: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.bytes).unwrap_or(Value::Null)
    }

    pub fn data(&self) -> Value {
        self.json()["data"].clone()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let notifier = MemoryNotifier::new();
        let state = AppState::memory(config, Arc::new(notifier.clone()));
        let router = app(state.clone());
        Self { state, notifier, router }
    }

    pub async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Result<TestResponse> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.dispatch(builder, body).await
    }

    /// Anonymous request arriving through a proxy
    pub async fn send_from(&self, forwarded_for: &str, method: Method, uri: &str, body: Value) -> Result<TestResponse> {
        let builder = Request::builder().method(method).uri(uri).header("x-forwarded-for", forwarded_for);
        self.dispatch(builder, Some(body)).await
    }

    async fn dispatch(&self, builder: axum::http::request::Builder, body: Option<Value>) -> Result<TestResponse> {
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await.context("router call failed")?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?.to_vec();
        Ok(TestResponse { status, headers, bytes })
    }

    pub async fn get(&self, uri: &str, token: &str) -> Result<TestResponse> {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> Result<TestResponse> {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> Result<TestResponse> {
        self.send(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> Result<TestResponse> {
        self.send(Method::DELETE, uri, Some(token), None).await
    }

    pub async fn public_post(&self, uri: &str, body: Value) -> Result<TestResponse> {
        self.send(Method::POST, uri, None, Some(body)).await
    }

    pub async fn seed_admin(&self, email: &str, is_master: bool) -> Result<Admin> {
        let now = Utc::now();
        let admin = Admin {
            id: Uuid::new_v4(),
            email: email.to_string(),
            numero_membre: None,
            password_hash: PASSWORD_HASH.clone(),
            prenom: "Test".to_string(),
            nom: email.split('@').next().unwrap_or("admin").to_string(),
            role_type: RoleType::Admin,
            is_master,
            super_scope: vec![],
            is_active: true,
            disabled_until: None,
            disabled_reason: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        Ok(self.state.repos.admins.insert(&admin).await?)
    }

    pub async fn master(&self) -> Result<(Admin, String)> {
        let admin = self.seed_admin("master@asso.test", true).await?;
        let token = token_for(&admin)?;
        Ok((admin, token))
    }

    /// Plain admin holding exactly the given grants
    pub async fn admin_with(&self, email: &str, grants: &[(ModuleName, Droit)]) -> Result<(Admin, String)> {
        let admin = self.seed_admin(email, false).await?;
        for (module, droit) in grants {
            self.state
                .repos
                .admin_modules
                .insert(&AdminModule {
                    id: Uuid::new_v4(),
                    admin_id: admin.id,
                    module: *module,
                    droit: *droit,
                    created_at: Utc::now(),
                })
                .await?;
        }
        let token = token_for(&admin)?;
        Ok((admin, token))
    }

    pub async fn seed_member(&self, prenom: &str, nom: &str, pays: Option<&str>, statut: MemberStatus) -> Result<Member> {
        let now = Utc::now();
        let member = Member {
            id: Uuid::new_v4(),
            prenom: prenom.to_string(),
            nom: nom.to_string(),
            email: format!("{}.{}@membres.test", prenom.to_lowercase(), nom.to_lowercase()),
            telephone: None,
            pays: pays.map(str::to_string),
            ville: None,
            niveau_etudes: None,
            domaine_etudes: None,
            etablissement: None,
            statut,
            numero_membre: None,
            motif_rejet: None,
            approved_at: None,
            approved_by: None,
            created_at: now,
            updated_at: now,
        };
        Ok(self.state.repos.members.insert(&member).await?)
    }
}

pub fn token_for(admin: &Admin) -> Result<String> {
    Ok(generate_jwt(&Claims::for_admin(admin, 1), JWT_SECRET)?)
}

/// `data.id` of a created resource
pub fn id_of(response: &TestResponse) -> Result<String> {
    response.data()["id"]
        .as_str()
        .map(str::to_string)
        .with_context(|| format!("no id in {}", response.json()))
}
