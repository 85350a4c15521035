use axum::extract::State;
use serde_json::Value;
use uuid::Uuid;

use crate::middleware::{ApiResponse, ApiResult, AppJson, AppPath, AppQuery, AuthAdmin, Pagination, ValidatedJson};
use crate::models::recrutement::Candidature;
use crate::services::recrutement_service::{
    CandidatureFilters, CandidatureStatusRequest, CreateCandidatureRequest, RecrutementService,
};
use crate::services::Actor;
use crate::state::AppState;

/// GET /api/recrutement/candidatures
pub async fn list(
    State(state): State<AppState>,
    AppQuery(filters): AppQuery<CandidatureFilters>,
    Pagination(page): Pagination,
) -> ApiResult<Vec<Candidature>> {
    Ok(ApiResponse::paginated(RecrutementService::new(&state).list_candidatures(filters, page).await?))
}

/// GET /api/recrutement/candidatures/:id
pub async fn get(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<Candidature> {
    Ok(ApiResponse::success(RecrutementService::new(&state).get_candidature(id).await?))
}

/// POST /api/recrutement/offres/:id/candidatures - back-office entry, ignores the offer deadline
pub async fn post(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath(offre_id): AppPath<Uuid>,
    ValidatedJson(request): ValidatedJson<CreateCandidatureRequest>,
) -> ApiResult<Candidature> {
    let actor = Actor::from(&auth);
    let candidature = RecrutementService::new(&state).create_candidature(Some(&actor), offre_id, request).await?;
    Ok(ApiResponse::created(candidature))
}

/// PUT /api/recrutement/candidatures/:id/statut
pub async fn put_statut(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath(id): AppPath<Uuid>,
    AppJson(request): AppJson<CandidatureStatusRequest>,
) -> ApiResult<Candidature> {
    let candidature = RecrutementService::new(&state).update_candidature_status(&Actor::from(&auth), id, request).await?;
    Ok(ApiResponse::success(candidature))
}

/// DELETE /api/recrutement/candidatures/:id
pub async fn delete(State(state): State<AppState>, auth: AuthAdmin, AppPath(id): AppPath<Uuid>) -> ApiResult<Value> {
    RecrutementService::new(&state).delete_candidature(&Actor::from(&auth), id).await?;
    Ok(ApiResponse::message("Candidature deleted"))
}
