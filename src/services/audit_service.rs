use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::filter::Filter;
use crate::models::audit::AuditLogEntry;
use crate::models::{PageRequest, Paginated};
use crate::services::Actor;
use crate::state::AppState;

/// What happened to which entity
#[derive(Debug, Clone)]
pub struct AuditEvent<'a> {
    pub action: &'a str,
    pub entity_type: &'a str,
    pub entity_id: Uuid,
    pub entity_name: String,
}

impl<'a> AuditEvent<'a> {
    pub fn new(action: &'a str, entity_type: &'a str, entity_id: Uuid, entity_name: impl Into<String>) -> Self {
        Self { action, entity_type, entity_id, entity_name: entity_name.into() }
    }
}

/// Enqueue an audit entry; returns immediately, the write happens on the side-effect worker
pub fn record<T: Serialize>(state: &AppState, actor: &Actor, event: AuditEvent<'_>, before: Option<&T>, after: Option<&T>) {
    if !state.config.security.enable_audit_logging {
        return;
    }

    let snapshot = |value: Option<&T>| value.and_then(|v| serde_json::to_value(v).ok());
    state.effects.audit(AuditLogEntry {
        id: Uuid::new_v4(),
        admin_id: Some(actor.id),
        admin_email: Some(actor.email.clone()),
        action_type: event.action.to_string(),
        entity_type: event.entity_type.to_string(),
        entity_id: Some(event.entity_id),
        entity_name: Some(event.entity_name),
        before: snapshot(before),
        after: snapshot(after),
        ip: actor.ip.clone(),
        created_at: Utc::now(),
    });
}

#[derive(Debug, Default, Deserialize)]
pub struct AuditFilters {
    pub admin_id: Option<Uuid>,
    pub entity_type: Option<String>,
    pub action_type: Option<String>,
    pub entity_id: Option<Uuid>,
}

pub struct AuditService {
    state: AppState,
}

impl AuditService {
    pub fn new(state: &AppState) -> Self {
        Self { state: state.clone() }
    }

    pub async fn list(&self, filters: AuditFilters, page: PageRequest) -> Result<Paginated<AuditLogEntry>, ApiError> {
        let filter = Filter::new()
            .eq_opt("admin_id", filters.admin_id)
            .eq_opt("entity_type", filters.entity_type)
            .eq_opt("action_type", filters.action_type)
            .eq_opt("entity_id", filters.entity_id)
            .order_desc("created_at");
        let (rows, total) = self.state.repos.audit_logs.select_page(&filter, page.limit, page.offset()).await?;
        Ok(Paginated::new(rows, page, total))
    }
}
