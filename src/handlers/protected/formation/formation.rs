use axum::extract::State;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::middleware::{ApiResponse, ApiResult, AppPath, AppQuery, AuthAdmin, Pagination, ValidatedJson};
use crate::models::formation::Formation;
use crate::services::formation_service::{
    CreateFormationRequest, DeleteOutcome, FormationFilters, FormationService, FormationStats, UpdateFormationRequest,
};
use crate::services::Actor;
use crate::state::AppState;

/// GET /api/formation/formations
pub async fn list(
    State(state): State<AppState>,
    AppQuery(filters): AppQuery<FormationFilters>,
    Pagination(page): Pagination,
) -> ApiResult<Vec<Formation>> {
    Ok(ApiResponse::paginated(FormationService::new(&state).list(filters, page).await?))
}

/// GET /api/formation/formations/:id
pub async fn get(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<Formation> {
    Ok(ApiResponse::success(FormationService::new(&state).get(id).await?))
}

/// POST /api/formation/formations
pub async fn post(
    State(state): State<AppState>,
    auth: AuthAdmin,
    ValidatedJson(request): ValidatedJson<CreateFormationRequest>,
) -> ApiResult<Formation> {
    Ok(ApiResponse::created(FormationService::new(&state).create(&Actor::from(&auth), request).await?))
}

/// PUT /api/formation/formations/:id
pub async fn put(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath(id): AppPath<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateFormationRequest>,
) -> ApiResult<Formation> {
    Ok(ApiResponse::success(FormationService::new(&state).update(&Actor::from(&auth), id, request).await?))
}

/// DELETE /api/formation/formations/:id - deactivates instead when inscriptions exist
pub async fn delete(State(state): State<AppState>, auth: AuthAdmin, AppPath(id): AppPath<Uuid>) -> ApiResult<Value> {
    let outcome = FormationService::new(&state).delete(&Actor::from(&auth), id).await?;
    let message = match outcome {
        DeleteOutcome::Deleted => "Formation deleted",
        DeleteOutcome::Deactivated => "Formation has inscriptions and was deactivated",
    };
    Ok(ApiResponse::success(json!({ "outcome": outcome })).with_message(message))
}

/// GET /api/formation/stats
pub async fn stats(State(state): State<AppState>) -> ApiResult<FormationStats> {
    Ok(ApiResponse::success(FormationService::new(&state).stats().await?))
}
