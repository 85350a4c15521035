use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::hash_password;
use crate::error::ApiError;
use crate::filter::Filter;
use crate::models::admin::{Admin, AdminModule, AdminProfile, Droit, ModuleName, RoleType};
use crate::models::{PageRequest, Paginated};
use crate::services::audit_service::{record, AuditEvent};
use crate::services::{double_option, normalize_email, Actor};
use crate::state::AppState;

pub const MIN_PASSWORD_LENGTH: u64 = 8;

#[derive(Debug, Default, Deserialize)]
pub struct AdminFilters {
    pub role_type: Option<RoleType>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GrantInput {
    pub module: ModuleName,
    pub droit: Droit,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAdminRequest {
    #[validate(email(message = "Must be a valid email address"))]
    pub email: String,
    pub numero_membre: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "This field is required"))]
    pub prenom: String,
    #[validate(length(min = 1, message = "This field is required"))]
    pub nom: String,
    pub role_type: Option<RoleType>,
    #[serde(default)]
    pub is_master: bool,
    #[serde(default)]
    pub super_scope: Vec<ModuleName>,
    pub modules: Option<Vec<GrantInput>>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateAdminRequest {
    #[validate(email(message = "Must be a valid email address"))]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub numero_membre: Option<Option<String>>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
    #[validate(length(min = 1, message = "This field is required"))]
    pub prenom: Option<String>,
    #[validate(length(min = 1, message = "This field is required"))]
    pub nom: Option<String>,
    pub role_type: Option<RoleType>,
    pub is_master: Option<bool>,
    pub super_scope: Option<Vec<ModuleName>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct SuspendRequest {
    pub until: DateTime<Utc>,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdminDetail {
    #[serde(flatten)]
    pub admin: AdminProfile,
    pub modules: Vec<AdminModule>,
}

pub struct AdminService {
    state: AppState,
}

impl AdminService {
    pub fn new(state: &AppState) -> Self {
        Self { state: state.clone() }
    }

    pub async fn list(&self, filters: AdminFilters, page: PageRequest) -> Result<Paginated<AdminProfile>, ApiError> {
        let filter = Filter::new()
            .eq_opt("role_type", filters.role_type)
            .eq_opt("is_active", filters.is_active)
            .search(&["email", "prenom", "nom", "numero_membre"], filters.search.as_deref())
            .order_asc("nom");
        let (rows, total) = self.state.repos.admins.select_page(&filter, page.limit, page.offset()).await?;
        Ok(Paginated::new(rows, page, total).map(|a| AdminProfile::from(&a)))
    }

    pub async fn get(&self, id: Uuid) -> Result<AdminDetail, ApiError> {
        let admin = self.state.repos.admins.select_404(id).await?;
        let modules = self.grants_of(id).await?;
        Ok(AdminDetail { admin: AdminProfile::from(&admin), modules })
    }

    async fn grants_of(&self, admin_id: Uuid) -> Result<Vec<AdminModule>, ApiError> {
        Ok(self
            .state
            .repos
            .admin_modules
            .select_any(&Filter::new().eq("admin_id", admin_id).order_asc("module"))
            .await?)
    }

    async fn ensure_unique(&self, email: Option<&str>, numero: Option<&str>, except: Option<Uuid>) -> Result<(), ApiError> {
        let admins = &self.state.repos.admins;
        let other = |filter: Filter| match except {
            Some(id) => filter.neq("id", id),
            None => filter,
        };
        if let Some(email) = email {
            if admins.exists(&other(Filter::new().eq("email", email))).await? {
                return Err(ApiError::conflict(format!("An admin with email '{}' already exists", email)));
            }
        }
        if let Some(numero) = numero {
            if admins.exists(&other(Filter::new().eq("numero_membre", numero))).await? {
                return Err(ApiError::conflict(format!("An admin with numero_membre '{}' already exists", numero)));
            }
        }
        Ok(())
    }

    pub async fn create(&self, actor: &Actor, request: CreateAdminRequest) -> Result<AdminDetail, ApiError> {
        let email = normalize_email(&request.email);
        let numero = request.numero_membre.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        self.ensure_unique(Some(&email), numero.as_deref(), None).await?;

        let now = Utc::now();
        let admin = Admin {
            id: Uuid::new_v4(),
            email,
            numero_membre: numero,
            password_hash: hash_password(&request.password)?,
            prenom: request.prenom.trim().to_string(),
            nom: request.nom.trim().to_string(),
            role_type: request.role_type.unwrap_or(RoleType::Admin),
            is_master: request.is_master,
            super_scope: request.super_scope,
            is_active: true,
            disabled_until: None,
            disabled_reason: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        let admin = self.state.repos.admins.insert(&admin).await?;

        if let Some(grants) = request.modules {
            self.replace_grants(admin.id, &grants).await?;
        }

        let detail = self.get(admin.id).await?;
        let profile = AdminProfile::from(&admin);
        record(&self.state, actor, AuditEvent::new("create", "admin", admin.id, &admin.email), None, Some(&profile));
        tracing::info!(admin = %admin.email, by = %actor.email, "Admin created");
        Ok(detail)
    }

    pub async fn update(&self, actor: &Actor, id: Uuid, request: UpdateAdminRequest) -> Result<AdminDetail, ApiError> {
        let mut admin = self.state.repos.admins.select_404(id).await?;
        let before = AdminProfile::from(&admin);

        let email = request.email.as_deref().map(normalize_email).filter(|e| *e != admin.email);
        let numero = match &request.numero_membre {
            Some(Some(n)) if admin.numero_membre.as_deref() != Some(n.trim()) => Some(n.trim().to_string()),
            _ => None,
        };
        self.ensure_unique(email.as_deref(), numero.as_deref(), Some(id)).await?;

        if id == actor.id && (request.is_active == Some(false) || request.is_master == Some(false)) && admin.is_master {
            return Err(ApiError::bad_request("A master admin cannot deactivate or demote itself"));
        }

        if let Some(email) = email {
            admin.email = email;
        }
        if let Some(numero_membre) = request.numero_membre {
            admin.numero_membre = numero_membre.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        }
        if let Some(password) = request.password.as_deref() {
            admin.password_hash = hash_password(password)?;
        }
        if let Some(prenom) = request.prenom {
            admin.prenom = prenom.trim().to_string();
        }
        if let Some(nom) = request.nom {
            admin.nom = nom.trim().to_string();
        }
        if let Some(role_type) = request.role_type {
            admin.role_type = role_type;
        }
        if let Some(is_master) = request.is_master {
            admin.is_master = is_master;
        }
        if let Some(scope) = request.super_scope {
            admin.super_scope = scope;
        }
        if let Some(is_active) = request.is_active {
            admin.is_active = is_active;
        }
        admin.updated_at = Utc::now();

        let admin = self.state.repos.admins.update(&admin).await?;
        let after = AdminProfile::from(&admin);
        let detail = self.get(id).await?;
        record(&self.state, actor, AuditEvent::new("update", "admin", id, &admin.email), Some(&before), Some(&after));
        Ok(detail)
    }

    /// Soft delete: the row stays, `is_active` goes false
    pub async fn deactivate(&self, actor: &Actor, id: Uuid) -> Result<AdminProfile, ApiError> {
        if id == actor.id {
            return Err(ApiError::bad_request("You cannot deactivate your own account"));
        }
        let mut admin = self.state.repos.admins.select_404(id).await?;
        let before = AdminProfile::from(&admin);
        admin.is_active = false;
        admin.updated_at = Utc::now();
        let admin = self.state.repos.admins.update(&admin).await?;

        let after = AdminProfile::from(&admin);
        record(&self.state, actor, AuditEvent::new("deactivate", "admin", id, &admin.email), Some(&before), Some(&after));
        tracing::info!(admin = %admin.email, by = %actor.email, "Admin deactivated");
        Ok(after)
    }

    pub async fn suspend(&self, actor: &Actor, id: Uuid, request: SuspendRequest) -> Result<AdminProfile, ApiError> {
        if id == actor.id {
            return Err(ApiError::bad_request("You cannot suspend your own account"));
        }
        if request.until <= Utc::now() {
            return Err(ApiError::invalid_field("until", "Suspension end must be in the future"));
        }
        let mut admin = self.state.repos.admins.select_404(id).await?;
        let before = AdminProfile::from(&admin);
        admin.disabled_until = Some(request.until);
        admin.disabled_reason = request.reason.filter(|r| !r.trim().is_empty());
        admin.updated_at = Utc::now();
        let admin = self.state.repos.admins.update(&admin).await?;

        let after = AdminProfile::from(&admin);
        record(&self.state, actor, AuditEvent::new("suspend", "admin", id, &admin.email), Some(&before), Some(&after));
        Ok(after)
    }

    pub async fn reactivate(&self, actor: &Actor, id: Uuid) -> Result<AdminProfile, ApiError> {
        let mut admin = self.state.repos.admins.select_404(id).await?;
        let before = AdminProfile::from(&admin);
        admin.is_active = true;
        admin.disabled_until = None;
        admin.disabled_reason = None;
        admin.updated_at = Utc::now();
        let admin = self.state.repos.admins.update(&admin).await?;

        let after = AdminProfile::from(&admin);
        record(&self.state, actor, AuditEvent::new("reactivate", "admin", id, &admin.email), Some(&before), Some(&after));
        Ok(after)
    }

    /// Replace the whole grant set of one admin
    pub async fn set_modules(&self, actor: &Actor, id: Uuid, grants: Vec<GrantInput>) -> Result<Vec<AdminModule>, ApiError> {
        let admin = self.state.repos.admins.select_404(id).await?;
        let before = self.grants_of(id).await?;
        self.replace_grants(id, &grants).await?;
        let after = self.grants_of(id).await?;

        record(&self.state, actor, AuditEvent::new("set_modules", "admin", id, &admin.email), Some(&before), Some(&after));
        Ok(after)
    }

    async fn replace_grants(&self, admin_id: Uuid, grants: &[GrantInput]) -> Result<(), ApiError> {
        let mut seen = HashSet::new();
        if let Some(dup) = grants.iter().find(|g| !seen.insert(g.module)) {
            return Err(ApiError::invalid_field("modules", format!("Module '{}' is listed twice", dup.module)));
        }

        let repo = &self.state.repos.admin_modules;
        repo.delete_where(&Filter::new().eq("admin_id", admin_id)).await?;
        let now = Utc::now();
        for grant in grants {
            repo.insert(&AdminModule { id: Uuid::new_v4(), admin_id, module: grant.module, droit: grant.droit, created_at: now })
                .await?;
        }
        Ok(())
    }
}
