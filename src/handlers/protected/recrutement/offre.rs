use axum::extract::State;
use serde_json::Value;
use uuid::Uuid;

use crate::middleware::{ApiResponse, ApiResult, AppPath, AppQuery, AuthAdmin, Pagination, ValidatedJson};
use crate::models::recrutement::Offre;
use crate::services::recrutement_service::{
    CreateOffreRequest, OffreFilters, RecrutementService, RecrutementStats, UpdateOffreRequest,
};
use crate::services::Actor;
use crate::state::AppState;

/// GET /api/recrutement/offres
pub async fn list(
    State(state): State<AppState>,
    AppQuery(filters): AppQuery<OffreFilters>,
    Pagination(page): Pagination,
) -> ApiResult<Vec<Offre>> {
    Ok(ApiResponse::paginated(RecrutementService::new(&state).list_offres(filters, page).await?))
}

/// GET /api/recrutement/offres/:id
pub async fn get(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<Offre> {
    Ok(ApiResponse::success(RecrutementService::new(&state).get_offre(id).await?))
}

/// POST /api/recrutement/offres
pub async fn post(
    State(state): State<AppState>,
    auth: AuthAdmin,
    ValidatedJson(request): ValidatedJson<CreateOffreRequest>,
) -> ApiResult<Offre> {
    Ok(ApiResponse::created(RecrutementService::new(&state).create_offre(&Actor::from(&auth), request).await?))
}

/// PUT /api/recrutement/offres/:id
pub async fn put(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath(id): AppPath<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateOffreRequest>,
) -> ApiResult<Offre> {
    Ok(ApiResponse::success(RecrutementService::new(&state).update_offre(&Actor::from(&auth), id, request).await?))
}

/// DELETE /api/recrutement/offres/:id
pub async fn delete(State(state): State<AppState>, auth: AuthAdmin, AppPath(id): AppPath<Uuid>) -> ApiResult<Value> {
    RecrutementService::new(&state).delete_offre(&Actor::from(&auth), id).await?;
    Ok(ApiResponse::message("Offre deleted"))
}

/// GET /api/recrutement/stats
pub async fn stats(State(state): State<AppState>) -> ApiResult<RecrutementStats> {
    Ok(ApiResponse::success(RecrutementService::new(&state).stats().await?))
}
