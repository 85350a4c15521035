use axum::extract::State;
use serde_json::Value;
use uuid::Uuid;

use crate::middleware::{ApiResponse, ApiResult, AppPath, AuthAdmin, ValidatedJson};
use crate::models::secretariat::DocumentReunion;
use crate::services::secretariat_service::{CreateDocumentRequest, SecretariatService};
use crate::services::Actor;
use crate::state::AppState;

/// GET /api/secretariat/reunions/:id/documents
pub async fn list(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<Vec<DocumentReunion>> {
    let service = SecretariatService::new(&state);
    service.get_reunion(id).await?;
    Ok(ApiResponse::success(service.list_documents(id).await?))
}

/// POST /api/secretariat/reunions/:id/documents
pub async fn post(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath(id): AppPath<Uuid>,
    ValidatedJson(request): ValidatedJson<CreateDocumentRequest>,
) -> ApiResult<DocumentReunion> {
    Ok(ApiResponse::created(SecretariatService::new(&state).add_document(&Actor::from(&auth), id, request).await?))
}

/// DELETE /api/secretariat/reunions/:id/documents/:document_id
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath((id, document_id)): AppPath<(Uuid, Uuid)>,
) -> ApiResult<Value> {
    SecretariatService::new(&state).delete_document(&Actor::from(&auth), id, document_id).await?;
    Ok(ApiResponse::message("Document deleted"))
}
