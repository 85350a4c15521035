use axum::extract::State;
use serde_json::Value;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AppPath, AppQuery, AuthAdmin, Pagination, PdfAttachment, ValidatedJson};
use crate::models::secretariat::Reunion;
use crate::services::secretariat_service::{
    CreateReunionRequest, ReunionDetail, ReunionFilters, SecretariatService, SecretariatStats, UpdateReunionRequest,
};
use crate::services::Actor;
use crate::state::AppState;

/// GET /api/secretariat/reunions
pub async fn list(
    State(state): State<AppState>,
    AppQuery(filters): AppQuery<ReunionFilters>,
    Pagination(page): Pagination,
) -> ApiResult<Vec<Reunion>> {
    Ok(ApiResponse::paginated(SecretariatService::new(&state).list_reunions(filters, page).await?))
}

/// GET /api/secretariat/reunions/:id - meeting with roster, minutes, actions and documents
pub async fn get(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<ReunionDetail> {
    Ok(ApiResponse::success(SecretariatService::new(&state).reunion_detail(id).await?))
}

/// POST /api/secretariat/reunions - group members are invited automatically
pub async fn post(
    State(state): State<AppState>,
    auth: AuthAdmin,
    ValidatedJson(request): ValidatedJson<CreateReunionRequest>,
) -> ApiResult<ReunionDetail> {
    Ok(ApiResponse::created(SecretariatService::new(&state).create_reunion(&Actor::from(&auth), request).await?))
}

/// PUT /api/secretariat/reunions/:id
pub async fn put(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath(id): AppPath<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateReunionRequest>,
) -> ApiResult<Reunion> {
    Ok(ApiResponse::success(SecretariatService::new(&state).update_reunion(&Actor::from(&auth), id, request).await?))
}

/// DELETE /api/secretariat/reunions/:id
pub async fn delete(State(state): State<AppState>, auth: AuthAdmin, AppPath(id): AppPath<Uuid>) -> ApiResult<Value> {
    SecretariatService::new(&state).delete_reunion(&Actor::from(&auth), id).await?;
    Ok(ApiResponse::message("Reunion deleted"))
}

/// GET /api/secretariat/reunions/:id/pdf
pub async fn pdf(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> Result<PdfAttachment, ApiError> {
    let (filename, bytes) = SecretariatService::new(&state).reunion_pdf(id).await?;
    Ok(PdfAttachment { filename, bytes })
}

/// GET /api/secretariat/stats
pub async fn stats(State(state): State<AppState>) -> ApiResult<SecretariatStats> {
    Ok(ApiResponse::success(SecretariatService::new(&state).stats().await?))
}
