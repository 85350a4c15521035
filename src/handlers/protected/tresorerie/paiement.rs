use axum::extract::State;
use serde_json::Value;
use uuid::Uuid;

use crate::middleware::{ApiResponse, ApiResult, AppPath, AppQuery, AuthAdmin, Pagination, ValidatedJson};
use crate::models::tresorerie::{Paiement, PaiementStatus};
use crate::services::tresorerie_service::{CreatePaiementRequest, LedgerFilters, TresorerieService};
use crate::services::Actor;
use crate::state::AppState;

/// GET /api/tresorerie/paiements
pub async fn list(
    State(state): State<AppState>,
    AppQuery(filters): AppQuery<LedgerFilters<PaiementStatus>>,
    Pagination(page): Pagination,
) -> ApiResult<Vec<Paiement>> {
    Ok(ApiResponse::paginated(TresorerieService::new(&state).list_paiements(filters, page).await?))
}

/// GET /api/tresorerie/paiements/:id
pub async fn get(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<Paiement> {
    Ok(ApiResponse::success(TresorerieService::new(&state).get_paiement(id).await?))
}

/// POST /api/tresorerie/paiements
pub async fn post(
    State(state): State<AppState>,
    auth: AuthAdmin,
    ValidatedJson(request): ValidatedJson<CreatePaiementRequest>,
) -> ApiResult<Paiement> {
    Ok(ApiResponse::created(TresorerieService::new(&state).create_paiement(&Actor::from(&auth), request).await?))
}

/// POST /api/tresorerie/paiements/:id/validate
pub async fn validate(State(state): State<AppState>, auth: AuthAdmin, AppPath(id): AppPath<Uuid>) -> ApiResult<Paiement> {
    Ok(ApiResponse::success(TresorerieService::new(&state).validate_paiement(&Actor::from(&auth), id).await?))
}

/// POST /api/tresorerie/paiements/:id/reject
pub async fn reject(State(state): State<AppState>, auth: AuthAdmin, AppPath(id): AppPath<Uuid>) -> ApiResult<Paiement> {
    Ok(ApiResponse::success(TresorerieService::new(&state).reject_paiement(&Actor::from(&auth), id).await?))
}

/// POST /api/tresorerie/paiements/:id/cancel
pub async fn cancel(State(state): State<AppState>, auth: AuthAdmin, AppPath(id): AppPath<Uuid>) -> ApiResult<Paiement> {
    Ok(ApiResponse::success(TresorerieService::new(&state).cancel_paiement(&Actor::from(&auth), id).await?))
}

/// DELETE /api/tresorerie/paiements/:id - refused once validated
pub async fn delete(State(state): State<AppState>, auth: AuthAdmin, AppPath(id): AppPath<Uuid>) -> ApiResult<Value> {
    TresorerieService::new(&state).delete_paiement(&Actor::from(&auth), id).await?;
    Ok(ApiResponse::message("Paiement deleted"))
}
