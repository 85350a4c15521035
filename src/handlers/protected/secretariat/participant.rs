use axum::extract::State;
use serde_json::Value;
use uuid::Uuid;

use crate::middleware::{ApiResponse, ApiResult, AppJson, AppPath, AuthAdmin};
use crate::models::secretariat::ParticipantReunion;
use crate::services::secretariat_service::{
    AddParticipantRequest, InvitationRequest, ParticipantView, PresenceRequest, SecretariatService,
};
use crate::services::Actor;
use crate::state::AppState;

/// GET /api/secretariat/reunions/:id/participants
pub async fn list(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<Vec<ParticipantView>> {
    let service = SecretariatService::new(&state);
    service.get_reunion(id).await?;
    Ok(ApiResponse::success(service.list_participants(id).await?))
}

/// POST /api/secretariat/reunions/:id/participants
pub async fn post(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath(id): AppPath<Uuid>,
    AppJson(request): AppJson<AddParticipantRequest>,
) -> ApiResult<ParticipantReunion> {
    let participant = SecretariatService::new(&state).add_participant(&Actor::from(&auth), id, request).await?;
    Ok(ApiResponse::created(participant))
}

/// PUT /api/secretariat/reunions/:id/participants/:participant_id/invitation
pub async fn put_invitation(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath((id, participant_id)): AppPath<(Uuid, Uuid)>,
    AppJson(request): AppJson<InvitationRequest>,
) -> ApiResult<ParticipantReunion> {
    let participant = SecretariatService::new(&state)
        .update_invitation(&Actor::from(&auth), id, participant_id, request)
        .await?;
    Ok(ApiResponse::success(participant))
}

/// PUT /api/secretariat/reunions/:id/participants/:participant_id/presence
pub async fn put_presence(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath((id, participant_id)): AppPath<(Uuid, Uuid)>,
    AppJson(request): AppJson<PresenceRequest>,
) -> ApiResult<ParticipantReunion> {
    let participant = SecretariatService::new(&state)
        .record_presence(&Actor::from(&auth), id, participant_id, request)
        .await?;
    Ok(ApiResponse::success(participant))
}

/// DELETE /api/secretariat/reunions/:id/participants/:participant_id
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath((id, participant_id)): AppPath<(Uuid, Uuid)>,
) -> ApiResult<Value> {
    SecretariatService::new(&state).remove_participant(&Actor::from(&auth), id, participant_id).await?;
    Ok(ApiResponse::message("Participant removed"))
}
