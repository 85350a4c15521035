use axum::extract::State;
use serde_json::Value;
use uuid::Uuid;

use crate::middleware::{ApiResponse, ApiResult, AppPath, AppQuery, AuthAdmin, Pagination, ValidatedJson};
use crate::models::mentorat::Mentore;
use crate::services::mentorat_service::{CreateMentoreRequest, MentoratService, MentoreFilters, UpdateMentoreRequest};
use crate::services::Actor;
use crate::state::AppState;

/// GET /api/mentorat/mentores
pub async fn list(
    State(state): State<AppState>,
    AppQuery(filters): AppQuery<MentoreFilters>,
    Pagination(page): Pagination,
) -> ApiResult<Vec<Mentore>> {
    Ok(ApiResponse::paginated(MentoratService::new(&state).list_mentores(filters, page).await?))
}

/// GET /api/mentorat/mentores/:id
pub async fn get(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<Mentore> {
    Ok(ApiResponse::success(MentoratService::new(&state).get_mentore(id).await?))
}

/// POST /api/mentorat/mentores
pub async fn post(
    State(state): State<AppState>,
    auth: AuthAdmin,
    ValidatedJson(request): ValidatedJson<CreateMentoreRequest>,
) -> ApiResult<Mentore> {
    Ok(ApiResponse::created(MentoratService::new(&state).create_mentore(&Actor::from(&auth), request).await?))
}

/// PUT /api/mentorat/mentores/:id
pub async fn put(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath(id): AppPath<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateMentoreRequest>,
) -> ApiResult<Mentore> {
    Ok(ApiResponse::success(MentoratService::new(&state).update_mentore(&Actor::from(&auth), id, request).await?))
}

/// DELETE /api/mentorat/mentores/:id
pub async fn delete(State(state): State<AppState>, auth: AuthAdmin, AppPath(id): AppPath<Uuid>) -> ApiResult<Value> {
    MentoratService::new(&state).delete_mentore(&Actor::from(&auth), id).await?;
    Ok(ApiResponse::message("Mentore deleted"))
}
