use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::{generate_jwt, verify_password, Claims};
use crate::error::ApiError;
use crate::filter::Filter;
use crate::models::admin::{Admin, AdminModule, AdminProfile, Droit, ModuleName, RoleType};
use crate::services::normalize_email;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub numero_membre: Option<String>,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// A module the admin may open, with the effective rights level
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleGrant {
    pub module: ModuleName,
    pub droit: Droit,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: u64,
    pub admin: AdminProfile,
    pub modules: Vec<ModuleGrant>,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub admin: AdminProfile,
    pub modules: Vec<ModuleGrant>,
}

pub struct AuthService {
    state: AppState,
}

impl AuthService {
    pub fn new(state: &AppState) -> Self {
        Self { state: state.clone() }
    }

    async fn find_admin(&self, request: &LoginRequest) -> Result<Option<Admin>, ApiError> {
        let admins = &self.state.repos.admins;
        if let Some(email) = request.email.as_deref().map(normalize_email).filter(|e| !e.is_empty()) {
            if let Some(admin) = admins.select_one(&Filter::new().eq("email", &email)).await? {
                return Ok(Some(admin));
            }
        }

        // The identifier field doubles as a member number
        let numero = request
            .numero_membre
            .as_deref()
            .or(request.email.as_deref())
            .map(str::trim)
            .filter(|n| !n.is_empty());
        match numero {
            Some(numero) => Ok(admins.select_one(&Filter::new().eq("numero_membre", numero)).await?),
            None => Ok(None),
        }
    }

    pub async fn login(&self, request: LoginRequest, now: DateTime<Utc>) -> Result<LoginResponse, ApiError> {
        if request.email.as_deref().unwrap_or("").trim().is_empty()
            && request.numero_membre.as_deref().unwrap_or("").trim().is_empty()
        {
            return Err(ApiError::invalid_field("email", "Email or numero_membre is required"));
        }

        let invalid = || ApiError::unauthorized("Invalid credentials");
        let mut admin = self.find_admin(&request).await?.ok_or_else(invalid)?;

        if !verify_password(&request.password, &admin.password_hash)? {
            tracing::info!(admin = %admin.email, "Login rejected: wrong password");
            return Err(invalid());
        }

        if !admin.is_active {
            tracing::info!(admin = %admin.email, "Login rejected: account deactivated");
            return Err(ApiError::unauthorized("Account is deactivated"));
        }

        if let Some(until) = admin.disabled_until {
            if until > now {
                return Err(ApiError::locked(format!(
                    "Account suspended until {}",
                    until.format("%Y-%m-%d %H:%M UTC")
                )));
            }
            tracing::info!(admin = %admin.email, "Suspension expired on {}, clearing it", until);
            admin.disabled_until = None;
            admin.disabled_reason = None;
        }

        admin.last_login_at = Some(now);
        admin.updated_at = now;
        let admin = self.state.repos.admins.update(&admin).await?;

        let security = &self.state.config.security;
        let token = generate_jwt(&Claims::for_admin(&admin, security.jwt_expiry_hours), &security.jwt_secret)?;
        let modules = self.effective_modules(&admin).await?;
        tracing::info!(admin = %admin.email, "Admin logged in");

        Ok(LoginResponse {
            token,
            expires_in: security.jwt_expiry_hours * 3600,
            admin: AdminProfile::from(&admin),
            modules,
        })
    }

    pub async fn me(&self, admin: &Admin) -> Result<MeResponse, ApiError> {
        Ok(MeResponse { admin: AdminProfile::from(admin), modules: self.effective_modules(admin).await? })
    }

    /// Modules reachable by this admin, implicit access expanded to full rights
    pub async fn effective_modules(&self, admin: &Admin) -> Result<Vec<ModuleGrant>, ApiError> {
        let full = |modules: &[ModuleName]| {
            modules.iter().map(|&module| ModuleGrant { module, droit: Droit::Admin }).collect::<Vec<_>>()
        };

        if admin.is_master || (admin.role_type == RoleType::Superadmin && admin.super_scope.is_empty()) {
            return Ok(full(&ModuleName::ALL));
        }
        if admin.role_type == RoleType::Superadmin {
            return Ok(full(&admin.super_scope));
        }

        let grants: Vec<AdminModule> = self
            .state
            .repos
            .admin_modules
            .select_any(&Filter::new().eq("admin_id", admin.id).order_asc("module"))
            .await?;
        Ok(grants.into_iter().map(|g| ModuleGrant { module: g.module, droit: g.droit }).collect())
    }
}
