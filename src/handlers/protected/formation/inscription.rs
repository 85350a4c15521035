use axum::extract::State;
use serde_json::Value;
use uuid::Uuid;

use crate::middleware::{ApiResponse, ApiResult, AppJson, AppPath, AppQuery, AuthAdmin, Pagination, ValidatedJson};
use crate::models::formation::FormationInscription;
use crate::services::formation_service::{
    CreateInscriptionRequest, FormationService, InscriptionFilters, InscriptionStatusRequest,
};
use crate::services::Actor;
use crate::state::AppState;

/// GET /api/formation/inscriptions
pub async fn list(
    State(state): State<AppState>,
    AppQuery(filters): AppQuery<InscriptionFilters>,
    Pagination(page): Pagination,
) -> ApiResult<Vec<FormationInscription>> {
    Ok(ApiResponse::paginated(FormationService::new(&state).list_inscriptions(filters, page).await?))
}

/// POST /api/formation/formations/:id/inscriptions
pub async fn post(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath(id): AppPath<Uuid>,
    ValidatedJson(request): ValidatedJson<CreateInscriptionRequest>,
) -> ApiResult<FormationInscription> {
    let actor = Actor::from(&auth);
    let inscription = FormationService::new(&state).create_inscription(Some(&actor), id, request).await?;
    Ok(ApiResponse::created(inscription))
}

/// PUT /api/formation/inscriptions/:id/statut - confirming re-checks capacity
pub async fn put_statut(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath(id): AppPath<Uuid>,
    AppJson(request): AppJson<InscriptionStatusRequest>,
) -> ApiResult<FormationInscription> {
    let inscription = FormationService::new(&state).update_inscription_status(&Actor::from(&auth), id, request).await?;
    Ok(ApiResponse::success(inscription))
}

/// DELETE /api/formation/inscriptions/:id
pub async fn delete(State(state): State<AppState>, auth: AuthAdmin, AppPath(id): AppPath<Uuid>) -> ApiResult<Value> {
    FormationService::new(&state).delete_inscription(&Actor::from(&auth), id).await?;
    Ok(ApiResponse::message("Inscription deleted"))
}
