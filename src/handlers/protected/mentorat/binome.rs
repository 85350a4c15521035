use axum::extract::State;
use serde_json::Value;
use uuid::Uuid;

use crate::middleware::{ApiResponse, ApiResult, AppJson, AppPath, AppQuery, AuthAdmin, Pagination};
use crate::models::mentorat::Binome;
use crate::services::mentorat_service::{BinomeFilters, BinomeStatusRequest, CreateBinomeRequest, MentoratService, MentoratStats};
use crate::services::Actor;
use crate::state::AppState;

/// GET /api/mentorat/binomes
pub async fn list(
    State(state): State<AppState>,
    AppQuery(filters): AppQuery<BinomeFilters>,
    Pagination(page): Pagination,
) -> ApiResult<Vec<Binome>> {
    Ok(ApiResponse::paginated(MentoratService::new(&state).list_binomes(filters, page).await?))
}

/// GET /api/mentorat/binomes/:id
pub async fn get(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<Binome> {
    Ok(ApiResponse::success(MentoratService::new(&state).get_binome(id).await?))
}

/// POST /api/mentorat/binomes - pairs a mentor with a waiting mentore
pub async fn post(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppJson(request): AppJson<CreateBinomeRequest>,
) -> ApiResult<Binome> {
    Ok(ApiResponse::created(MentoratService::new(&state).create_binome(&Actor::from(&auth), request).await?))
}

/// PUT /api/mentorat/binomes/:id/statut
pub async fn put_statut(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath(id): AppPath<Uuid>,
    AppJson(request): AppJson<BinomeStatusRequest>,
) -> ApiResult<Binome> {
    let binome = MentoratService::new(&state).update_binome_status(&Actor::from(&auth), id, request).await?;
    Ok(ApiResponse::success(binome))
}

/// DELETE /api/mentorat/binomes/:id
pub async fn delete(State(state): State<AppState>, auth: AuthAdmin, AppPath(id): AppPath<Uuid>) -> ApiResult<Value> {
    MentoratService::new(&state).delete_binome(&Actor::from(&auth), id).await?;
    Ok(ApiResponse::message("Binome deleted"))
}

/// GET /api/mentorat/stats
pub async fn stats(State(state): State<AppState>) -> ApiResult<MentoratStats> {
    Ok(ApiResponse::success(MentoratService::new(&state).stats().await?))
}
