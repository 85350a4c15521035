use axum::extract::State;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AppJson, AppPath, AuthAdmin, Pagination, PdfAttachment};
use crate::models::secretariat::RapportPresidence;
use crate::services::rapport_service::{CreateRapportRequest, RapportService};
use crate::services::Actor;
use crate::state::AppState;

/// GET /api/secretariat/rapports
pub async fn list(State(state): State<AppState>, Pagination(page): Pagination) -> ApiResult<Vec<RapportPresidence>> {
    Ok(ApiResponse::paginated(RapportService::new(&state).list(page).await?))
}

/// GET /api/secretariat/rapports/:id
pub async fn get(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<RapportPresidence> {
    Ok(ApiResponse::success(RapportService::new(&state).get(id).await?))
}

/// POST /api/secretariat/rapports - computes the period, renders and stores the PDF
pub async fn post(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppJson(request): AppJson<CreateRapportRequest>,
) -> ApiResult<RapportPresidence> {
    let rapport = RapportService::new(&state).create(&Actor::from(&auth), request).await?;
    Ok(ApiResponse::created(rapport).with_message("Report generated"))
}

/// GET /api/secretariat/rapports/:id/pdf
pub async fn pdf(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> Result<PdfAttachment, ApiError> {
    let (filename, bytes) = RapportService::new(&state).pdf(id).await?;
    Ok(PdfAttachment { filename, bytes })
}
