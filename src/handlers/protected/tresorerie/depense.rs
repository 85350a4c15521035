use axum::extract::State;
use serde_json::Value;
use uuid::Uuid;

use crate::middleware::{ApiResponse, ApiResult, AppPath, AppQuery, AuthAdmin, Pagination, ValidatedJson};
use crate::models::tresorerie::{Depense, DepenseStatus};
use crate::services::tresorerie_service::{CreateDepenseRequest, LedgerFilters, TresorerieService};
use crate::services::Actor;
use crate::state::AppState;

/// GET /api/tresorerie/depenses
pub async fn list(
    State(state): State<AppState>,
    AppQuery(filters): AppQuery<LedgerFilters<DepenseStatus>>,
    Pagination(page): Pagination,
) -> ApiResult<Vec<Depense>> {
    Ok(ApiResponse::paginated(TresorerieService::new(&state).list_depenses(filters, page).await?))
}

/// GET /api/tresorerie/depenses/:id
pub async fn get(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<Depense> {
    Ok(ApiResponse::success(TresorerieService::new(&state).get_depense(id).await?))
}

/// POST /api/tresorerie/depenses
pub async fn post(
    State(state): State<AppState>,
    auth: AuthAdmin,
    ValidatedJson(request): ValidatedJson<CreateDepenseRequest>,
) -> ApiResult<Depense> {
    Ok(ApiResponse::created(TresorerieService::new(&state).create_depense(&Actor::from(&auth), request).await?))
}

/// POST /api/tresorerie/depenses/:id/validate
pub async fn validate(State(state): State<AppState>, auth: AuthAdmin, AppPath(id): AppPath<Uuid>) -> ApiResult<Depense> {
    Ok(ApiResponse::success(TresorerieService::new(&state).validate_depense(&Actor::from(&auth), id).await?))
}

/// POST /api/tresorerie/depenses/:id/reject
pub async fn reject(State(state): State<AppState>, auth: AuthAdmin, AppPath(id): AppPath<Uuid>) -> ApiResult<Depense> {
    Ok(ApiResponse::success(TresorerieService::new(&state).reject_depense(&Actor::from(&auth), id).await?))
}

/// POST /api/tresorerie/depenses/:id/cancel
pub async fn cancel(State(state): State<AppState>, auth: AuthAdmin, AppPath(id): AppPath<Uuid>) -> ApiResult<Depense> {
    Ok(ApiResponse::success(TresorerieService::new(&state).cancel_depense(&Actor::from(&auth), id).await?))
}

/// DELETE /api/tresorerie/depenses/:id - refused once validated
pub async fn delete(State(state): State<AppState>, auth: AuthAdmin, AppPath(id): AppPath<Uuid>) -> ApiResult<Value> {
    TresorerieService::new(&state).delete_depense(&Actor::from(&auth), id).await?;
    Ok(ApiResponse::message("Depense deleted"))
}
