use axum::extract::State;
use serde_json::Value;
use uuid::Uuid;

use crate::middleware::{ApiResponse, ApiResult, AppJson, AppPath, AuthAdmin, ValidatedJson};
use crate::models::formation::FormationSession;
use crate::services::formation_service::{FormationService, SessionRequest, UpdateSessionRequest};
use crate::services::Actor;
use crate::state::AppState;

/// GET /api/formation/formations/:id/sessions
pub async fn list(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<Vec<FormationSession>> {
    Ok(ApiResponse::success(FormationService::new(&state).list_sessions(id).await?))
}

/// POST /api/formation/formations/:id/sessions
pub async fn post(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath(id): AppPath<Uuid>,
    ValidatedJson(request): ValidatedJson<SessionRequest>,
) -> ApiResult<FormationSession> {
    Ok(ApiResponse::created(FormationService::new(&state).create_session(&Actor::from(&auth), id, request).await?))
}

/// PUT /api/formation/formations/:id/sessions/:session_id
pub async fn put(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath((id, session_id)): AppPath<(Uuid, Uuid)>,
    AppJson(request): AppJson<UpdateSessionRequest>,
) -> ApiResult<FormationSession> {
    let session = FormationService::new(&state).update_session(&Actor::from(&auth), id, session_id, request).await?;
    Ok(ApiResponse::success(session))
}

/// DELETE /api/formation/formations/:id/sessions/:session_id
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath((id, session_id)): AppPath<(Uuid, Uuid)>,
) -> ApiResult<Value> {
    FormationService::new(&state).delete_session(&Actor::from(&auth), id, session_id).await?;
    Ok(ApiResponse::message("Session deleted"))
}
