use axum::extract::State;
use serde_json::Value;
use uuid::Uuid;

use crate::middleware::{ApiResponse, ApiResult, AppJson, AppPath, AppQuery, AuthAdmin, Pagination, ValidatedJson};
use crate::services::secretariat_service::{
    ActionFilters, ActionStatusRequest, ActionView, CreateActionRequest, SecretariatService, UpdateActionRequest,
};
use crate::services::Actor;
use crate::state::AppState;

/// GET /api/secretariat/actions
pub async fn list(
    State(state): State<AppState>,
    AppQuery(filters): AppQuery<ActionFilters>,
    Pagination(page): Pagination,
) -> ApiResult<Vec<ActionView>> {
    Ok(ApiResponse::paginated(SecretariatService::new(&state).list_actions(filters, page).await?))
}

/// GET /api/secretariat/actions/:id
pub async fn get(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<ActionView> {
    Ok(ApiResponse::success(SecretariatService::new(&state).get_action(id).await?))
}

/// POST /api/secretariat/actions
pub async fn post(
    State(state): State<AppState>,
    auth: AuthAdmin,
    ValidatedJson(request): ValidatedJson<CreateActionRequest>,
) -> ApiResult<ActionView> {
    Ok(ApiResponse::created(SecretariatService::new(&state).create_action(&Actor::from(&auth), request).await?))
}

/// PUT /api/secretariat/actions/:id
pub async fn put(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath(id): AppPath<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateActionRequest>,
) -> ApiResult<ActionView> {
    Ok(ApiResponse::success(SecretariatService::new(&state).update_action(&Actor::from(&auth), id, request).await?))
}

/// PUT /api/secretariat/actions/:id/statut
pub async fn put_statut(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath(id): AppPath<Uuid>,
    AppJson(request): AppJson<ActionStatusRequest>,
) -> ApiResult<ActionView> {
    let action = SecretariatService::new(&state).change_action_status(&Actor::from(&auth), id, request).await?;
    Ok(ApiResponse::success(action))
}

/// DELETE /api/secretariat/actions/:id
pub async fn delete(State(state): State<AppState>, auth: AuthAdmin, AppPath(id): AppPath<Uuid>) -> ApiResult<Value> {
    SecretariatService::new(&state).delete_action(&Actor::from(&auth), id).await?;
    Ok(ApiResponse::message("Action deleted"))
}
