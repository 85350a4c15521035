use axum::extract::State;
use serde_json::Value;
use uuid::Uuid;

use crate::middleware::{ApiResponse, ApiResult, AppPath, AuthAdmin, ValidatedJson};
use crate::models::webinaire::Presentateur;
use crate::services::webinaire_service::{CreatePresentateurRequest, UpdatePresentateurRequest, WebinaireService};
use crate::services::Actor;
use crate::state::AppState;

/// GET /api/webinaire/webinaires/:id/presentateurs
pub async fn list(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<Vec<Presentateur>> {
    Ok(ApiResponse::success(WebinaireService::new(&state).list_presentateurs(id).await?))
}

/// POST /api/webinaire/webinaires/:id/presentateurs
pub async fn post(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath(id): AppPath<Uuid>,
    ValidatedJson(request): ValidatedJson<CreatePresentateurRequest>,
) -> ApiResult<Presentateur> {
    let presentateur = WebinaireService::new(&state).create_presentateur(&Actor::from(&auth), id, request).await?;
    Ok(ApiResponse::created(presentateur))
}

/// PUT /api/webinaire/webinaires/:id/presentateurs/:presentateur_id
pub async fn put(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath((id, presentateur_id)): AppPath<(Uuid, Uuid)>,
    ValidatedJson(request): ValidatedJson<UpdatePresentateurRequest>,
) -> ApiResult<Presentateur> {
    let presentateur = WebinaireService::new(&state)
        .update_presentateur(&Actor::from(&auth), id, presentateur_id, request)
        .await?;
    Ok(ApiResponse::success(presentateur))
}

/// DELETE /api/webinaire/webinaires/:id/presentateurs/:presentateur_id
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath((id, presentateur_id)): AppPath<(Uuid, Uuid)>,
) -> ApiResult<Value> {
    WebinaireService::new(&state).delete_presentateur(&Actor::from(&auth), id, presentateur_id).await?;
    Ok(ApiResponse::message("Presentateur deleted"))
}
