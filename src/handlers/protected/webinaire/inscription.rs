use axum::extract::State;
use serde_json::Value;
use uuid::Uuid;

use crate::middleware::{ApiResponse, ApiResult, AppJson, AppPath, AppQuery, AuthAdmin, Pagination, ValidatedJson};
use crate::models::webinaire::WebinaireInscription;
use crate::services::webinaire_service::{
    AttendanceRequest, CreateWebinaireInscriptionRequest, WebinaireInscriptionFilters,
    WebinaireInscriptionStatusRequest, WebinaireService,
};
use crate::services::Actor;
use crate::state::AppState;

/// GET /api/webinaire/webinaires/:id/inscriptions
pub async fn list(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppQuery(filters): AppQuery<WebinaireInscriptionFilters>,
    Pagination(page): Pagination,
) -> ApiResult<Vec<WebinaireInscription>> {
    Ok(ApiResponse::paginated(WebinaireService::new(&state).list_inscriptions(id, filters, page).await?))
}

/// POST /api/webinaire/webinaires/:id/inscriptions
pub async fn post(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath(id): AppPath<Uuid>,
    ValidatedJson(request): ValidatedJson<CreateWebinaireInscriptionRequest>,
) -> ApiResult<WebinaireInscription> {
    let actor = Actor::from(&auth);
    let inscription = WebinaireService::new(&state).create_inscription(Some(&actor), id, request).await?;
    Ok(ApiResponse::created(inscription))
}

/// PUT /api/webinaire/webinaires/:id/inscriptions/:inscription_id/statut
pub async fn put_statut(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath((id, inscription_id)): AppPath<(Uuid, Uuid)>,
    AppJson(request): AppJson<WebinaireInscriptionStatusRequest>,
) -> ApiResult<WebinaireInscription> {
    let inscription = WebinaireService::new(&state)
        .update_inscription_status(&Actor::from(&auth), id, inscription_id, request)
        .await?;
    Ok(ApiResponse::success(inscription))
}

/// PUT /api/webinaire/webinaires/:id/inscriptions/:inscription_id/presence
pub async fn put_presence(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath((id, inscription_id)): AppPath<(Uuid, Uuid)>,
    AppJson(request): AppJson<AttendanceRequest>,
) -> ApiResult<WebinaireInscription> {
    let inscription = WebinaireService::new(&state)
        .mark_attendance(&Actor::from(&auth), id, inscription_id, request)
        .await?;
    Ok(ApiResponse::success(inscription))
}

/// DELETE /api/webinaire/webinaires/:id/inscriptions/:inscription_id
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath((id, inscription_id)): AppPath<(Uuid, Uuid)>,
) -> ApiResult<Value> {
    WebinaireService::new(&state).delete_inscription(&Actor::from(&auth), id, inscription_id).await?;
    Ok(ApiResponse::message("Inscription deleted"))
}
