use axum::extract::State;
use serde_json::Value;
use uuid::Uuid;

use crate::middleware::{ApiResponse, ApiResult, AppPath, AppQuery, AuthAdmin, Pagination, ValidatedJson};
use crate::models::mentorat::Mentor;
use crate::services::mentorat_service::{CreateMentorRequest, MentorFilters, MentorView, MentoratService, UpdateMentorRequest};
use crate::services::Actor;
use crate::state::AppState;

/// GET /api/mentorat/mentors
pub async fn list(
    State(state): State<AppState>,
    AppQuery(filters): AppQuery<MentorFilters>,
    Pagination(page): Pagination,
) -> ApiResult<Vec<Mentor>> {
    Ok(ApiResponse::paginated(MentoratService::new(&state).list_mentors(filters, page).await?))
}

/// GET /api/mentorat/mentors/:id - includes the count of active binomes
pub async fn get(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<MentorView> {
    Ok(ApiResponse::success(MentoratService::new(&state).get_mentor(id).await?))
}

/// POST /api/mentorat/mentors
pub async fn post(
    State(state): State<AppState>,
    auth: AuthAdmin,
    ValidatedJson(request): ValidatedJson<CreateMentorRequest>,
) -> ApiResult<Mentor> {
    Ok(ApiResponse::created(MentoratService::new(&state).create_mentor(&Actor::from(&auth), request).await?))
}

/// PUT /api/mentorat/mentors/:id
pub async fn put(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath(id): AppPath<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateMentorRequest>,
) -> ApiResult<Mentor> {
    Ok(ApiResponse::success(MentoratService::new(&state).update_mentor(&Actor::from(&auth), id, request).await?))
}

/// DELETE /api/mentorat/mentors/:id - refused while binomes reference the mentor
pub async fn delete(State(state): State<AppState>, auth: AuthAdmin, AppPath(id): AppPath<Uuid>) -> ApiResult<Value> {
    MentoratService::new(&state).delete_mentor(&Actor::from(&auth), id).await?;
    Ok(ApiResponse::message("Mentor deleted"))
}
