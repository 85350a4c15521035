use axum::extract::State;
use serde_json::Value;
use uuid::Uuid;

use crate::middleware::{ApiResponse, ApiResult, AppJson, AppPath, AppQuery, AuthAdmin, Pagination, ValidatedJson};
use crate::models::secretariat::{GroupeMembre, GroupeTravail};
use crate::services::secretariat_service::{
    AddGroupeMembreRequest, CreateGroupeRequest, GroupeDetail, GroupeFilters, GroupeMembreView, SecretariatService,
    UpdateGroupeRequest,
};
use crate::services::Actor;
use crate::state::AppState;

/// GET /api/secretariat/groupes
pub async fn list(
    State(state): State<AppState>,
    AppQuery(filters): AppQuery<GroupeFilters>,
    Pagination(page): Pagination,
) -> ApiResult<Vec<GroupeTravail>> {
    Ok(ApiResponse::paginated(SecretariatService::new(&state).list_groupes(filters, page).await?))
}

/// GET /api/secretariat/groupes/:id
pub async fn get(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<GroupeDetail> {
    Ok(ApiResponse::success(SecretariatService::new(&state).get_groupe(id).await?))
}

/// POST /api/secretariat/groupes
pub async fn post(
    State(state): State<AppState>,
    auth: AuthAdmin,
    ValidatedJson(request): ValidatedJson<CreateGroupeRequest>,
) -> ApiResult<GroupeTravail> {
    Ok(ApiResponse::created(SecretariatService::new(&state).create_groupe(&Actor::from(&auth), request).await?))
}

/// PUT /api/secretariat/groupes/:id
pub async fn put(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath(id): AppPath<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateGroupeRequest>,
) -> ApiResult<GroupeTravail> {
    Ok(ApiResponse::success(SecretariatService::new(&state).update_groupe(&Actor::from(&auth), id, request).await?))
}

/// DELETE /api/secretariat/groupes/:id
pub async fn delete(State(state): State<AppState>, auth: AuthAdmin, AppPath(id): AppPath<Uuid>) -> ApiResult<Value> {
    SecretariatService::new(&state).delete_groupe(&Actor::from(&auth), id).await?;
    Ok(ApiResponse::message("Groupe deleted"))
}

/// GET /api/secretariat/groupes/:id/membres
pub async fn membre_list(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<Vec<GroupeMembreView>> {
    let service = SecretariatService::new(&state);
    service.get_groupe(id).await?;
    Ok(ApiResponse::success(service.list_groupe_membres(id).await?))
}

/// POST /api/secretariat/groupes/:id/membres
pub async fn membre_post(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath(id): AppPath<Uuid>,
    AppJson(request): AppJson<AddGroupeMembreRequest>,
) -> ApiResult<GroupeMembre> {
    Ok(ApiResponse::created(SecretariatService::new(&state).add_groupe_membre(&Actor::from(&auth), id, request).await?))
}

/// DELETE /api/secretariat/groupes/:id/membres/:membre_id
pub async fn membre_delete(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath((id, membre_id)): AppPath<(Uuid, Uuid)>,
) -> ApiResult<Value> {
    SecretariatService::new(&state).remove_groupe_membre(&Actor::from(&auth), id, membre_id).await?;
    Ok(ApiResponse::message("Member removed from groupe"))
}
