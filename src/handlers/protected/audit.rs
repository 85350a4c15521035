use axum::extract::State;

use crate::middleware::{ApiResponse, ApiResult, AppQuery, Pagination};
use crate::models::audit::AuditLogEntry;
use crate::services::audit_service::{AuditFilters, AuditService};
use crate::state::AppState;

/// GET /api/audit - master only
pub async fn list(
    State(state): State<AppState>,
    AppQuery(filters): AppQuery<AuditFilters>,
    Pagination(page): Pagination,
) -> ApiResult<Vec<AuditLogEntry>> {
    Ok(ApiResponse::paginated(AuditService::new(&state).list(filters, page).await?))
}
