use axum::extract::State;
use serde_json::Value;
use uuid::Uuid;

use crate::middleware::{ApiResponse, ApiResult, AppPath, AppQuery, AuthAdmin, Pagination, ValidatedJson};
use crate::models::webinaire::{Webinaire, WebinaireStats};
use crate::services::webinaire_service::{
    CreateWebinaireRequest, UpdateWebinaireRequest, WebinaireFilters, WebinaireGlobalStats, WebinaireService,
};
use crate::services::Actor;
use crate::state::AppState;

/// GET /api/webinaire/webinaires
pub async fn list(
    State(state): State<AppState>,
    AppQuery(filters): AppQuery<WebinaireFilters>,
    Pagination(page): Pagination,
) -> ApiResult<Vec<Webinaire>> {
    Ok(ApiResponse::paginated(WebinaireService::new(&state).list(filters, page).await?))
}

/// GET /api/webinaire/webinaires/:id
pub async fn get(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<Webinaire> {
    Ok(ApiResponse::success(WebinaireService::new(&state).get(id).await?))
}

/// POST /api/webinaire/webinaires
pub async fn post(
    State(state): State<AppState>,
    auth: AuthAdmin,
    ValidatedJson(request): ValidatedJson<CreateWebinaireRequest>,
) -> ApiResult<Webinaire> {
    Ok(ApiResponse::created(WebinaireService::new(&state).create(&Actor::from(&auth), request).await?))
}

/// PUT /api/webinaire/webinaires/:id
pub async fn put(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath(id): AppPath<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateWebinaireRequest>,
) -> ApiResult<Webinaire> {
    Ok(ApiResponse::success(WebinaireService::new(&state).update(&Actor::from(&auth), id, request).await?))
}

/// DELETE /api/webinaire/webinaires/:id - refused while inscriptions exist
pub async fn delete(State(state): State<AppState>, auth: AuthAdmin, AppPath(id): AppPath<Uuid>) -> ApiResult<Value> {
    WebinaireService::new(&state).delete(&Actor::from(&auth), id).await?;
    Ok(ApiResponse::message("Webinaire deleted"))
}

/// GET /api/webinaire/webinaires/:id/stats
pub async fn webinaire_stats(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<WebinaireStats> {
    Ok(ApiResponse::success(WebinaireService::new(&state).webinaire_stats(id).await?))
}

/// GET /api/webinaire/stats
pub async fn stats(State(state): State<AppState>) -> ApiResult<WebinaireGlobalStats> {
    Ok(ApiResponse::success(WebinaireService::new(&state).stats().await?))
}
