use axum::extract::State;
use uuid::Uuid;

use crate::middleware::{ApiResponse, ApiResult, AppJson, AppPath, AuthAdmin};
use crate::models::secretariat::CompteRendu;
use crate::services::secretariat_service::{SaveCompteRenduRequest, SecretariatService};
use crate::services::Actor;
use crate::state::AppState;

/// GET /api/secretariat/reunions/:id/compte-rendu
pub async fn get(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<CompteRendu> {
    Ok(ApiResponse::success(SecretariatService::new(&state).get_compte_rendu(id).await?))
}

/// PUT /api/secretariat/reunions/:id/compte-rendu - upsert
pub async fn put(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath(id): AppPath<Uuid>,
    AppJson(request): AppJson<SaveCompteRenduRequest>,
) -> ApiResult<CompteRendu> {
    let compte_rendu = SecretariatService::new(&state).save_compte_rendu(&Actor::from(&auth), id, request).await?;
    Ok(ApiResponse::success(compte_rendu).with_message("Compte-rendu saved"))
}
