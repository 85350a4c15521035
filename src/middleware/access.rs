use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;
use crate::filter::Filter;
use crate::middleware::auth::AuthAdmin;
use crate::models::admin::{Admin, AdminModule, Droit, ModuleName, RoleType};
use crate::state::AppState;

/// Access granted without consulting `admins_modules`, if any
fn implicit_access(admin: &Admin, module: ModuleName) -> Option<bool> {
    if admin.is_master {
        return Some(true);
    }
    if admin.role_type == RoleType::Superadmin {
        return Some(admin.super_scope.is_empty() || admin.super_scope.contains(&module));
    }
    None
}

fn is_safe(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD)
}

/// Decide one request against an admin, a module and the admin's grant on it
pub fn check_module_access(
    admin: &Admin,
    module: ModuleName,
    grant: Option<Droit>,
    method: &Method,
) -> Result<(), ApiError> {
    match implicit_access(admin, module) {
        Some(true) => return Ok(()),
        Some(false) => return Err(ApiError::forbidden(format!("Module '{}' is outside your scope", module))),
        None => {}
    }

    match grant {
        None => Err(ApiError::forbidden(format!("No access to module '{}'", module))),
        Some(droit) if !is_safe(method) && !droit.allows_write() => {
            Err(ApiError::forbidden(format!("Read-only access to module '{}'", module)))
        }
        Some(_) => Ok(()),
    }
}

/// Module gate; state is `(AppState, module)` so one function serves every router
pub async fn require_module(
    State((state, module)): State<(AppState, ModuleName)>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = request
        .extensions()
        .get::<AuthAdmin>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    let grant = match implicit_access(&auth.admin, module) {
        Some(_) => None,
        None => state
            .repos
            .admin_modules
            .select_one(&Filter::new().eq("admin_id", auth.admin.id).eq("module", module))
            .await?
            .map(|g: AdminModule| g.droit),
    };

    if let Err(e) = check_module_access(&auth.admin, module, grant, request.method()) {
        tracing::info!(admin = %auth.admin.email, module = %module, "Module access denied");
        return Err(e);
    }

    Ok(next.run(request).await)
}

pub async fn require_master(request: Request, next: Next) -> Result<Response, ApiError> {
    let auth = request
        .extensions()
        .get::<AuthAdmin>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;
    if !auth.admin.is_master {
        return Err(ApiError::forbidden("Master admin required"));
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn admin(role_type: RoleType, is_master: bool, super_scope: Vec<ModuleName>) -> Admin {
        Admin {
            id: Uuid::new_v4(),
            email: "a@x.com".into(),
            numero_membre: None,
            password_hash: String::new(),
            prenom: "A".into(),
            nom: "B".into(),
            role_type,
            is_master,
            super_scope,
            is_active: true,
            disabled_until: None,
            disabled_reason: None,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn master_passes_every_module_without_grants() {
        let master = admin(RoleType::Admin, true, vec![]);
        for module in ModuleName::ALL {
            assert!(check_module_access(&master, module, None, &Method::DELETE).is_ok());
        }
    }

    #[test]
    fn superadmin_scope_is_exact() {
        let scoped = admin(RoleType::Superadmin, false, vec![ModuleName::Tresorerie]);
        for module in ModuleName::ALL {
            let allowed = check_module_access(&scoped, module, Some(Droit::Admin), &Method::GET).is_ok();
            assert_eq!(allowed, module == ModuleName::Tresorerie);
        }

        let unscoped = admin(RoleType::Superadmin, false, vec![]);
        for module in ModuleName::ALL {
            assert!(check_module_access(&unscoped, module, None, &Method::POST).is_ok());
        }
    }

    #[test]
    fn plain_admin_needs_a_grant_and_write_rights() {
        let plain = admin(RoleType::Admin, false, vec![]);
        let m = ModuleName::Webinaire;
        assert!(check_module_access(&plain, m, None, &Method::GET).is_err());
        assert!(check_module_access(&plain, m, Some(Droit::Lecture), &Method::GET).is_ok());
        assert!(check_module_access(&plain, m, Some(Droit::Lecture), &Method::POST).is_err());
        assert!(check_module_access(&plain, m, Some(Droit::Ecriture), &Method::PUT).is_ok());
    }
}
