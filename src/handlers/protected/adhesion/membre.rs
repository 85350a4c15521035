use axum::extract::State;
use serde_json::Value;
use uuid::Uuid;

use crate::middleware::{ApiResponse, ApiResult, AppPath, AppQuery, AuthAdmin, Pagination, ValidatedJson};
use crate::models::adhesion::Member;
use crate::services::adhesion_service::{
    AdhesionService, AdhesionStats, MapLocation, MemberFilters, RejectMemberRequest, UpdateMemberRequest,
};
use crate::services::Actor;
use crate::state::AppState;

/// GET /api/adhesion/membres
pub async fn list(
    State(state): State<AppState>,
    AppQuery(filters): AppQuery<MemberFilters>,
    Pagination(page): Pagination,
) -> ApiResult<Vec<Member>> {
    Ok(ApiResponse::paginated(AdhesionService::new(&state).list(filters, page).await?))
}

/// GET /api/adhesion/membres/:id
pub async fn get(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<Member> {
    Ok(ApiResponse::success(AdhesionService::new(&state).get(id).await?))
}

/// PUT /api/adhesion/membres/:id
pub async fn put(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath(id): AppPath<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateMemberRequest>,
) -> ApiResult<Member> {
    Ok(ApiResponse::success(AdhesionService::new(&state).update(&Actor::from(&auth), id, request).await?))
}

/// POST /api/adhesion/membres/:id/approve - assigns the member number
pub async fn approve(State(state): State<AppState>, auth: AuthAdmin, AppPath(id): AppPath<Uuid>) -> ApiResult<Member> {
    let member = AdhesionService::new(&state).approve(&Actor::from(&auth), id).await?;
    Ok(ApiResponse::success(member).with_message("Member approved"))
}

/// POST /api/adhesion/membres/:id/reject
pub async fn reject(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath(id): AppPath<Uuid>,
    ValidatedJson(request): ValidatedJson<RejectMemberRequest>,
) -> ApiResult<Member> {
    let member = AdhesionService::new(&state).reject(&Actor::from(&auth), id, request).await?;
    Ok(ApiResponse::success(member).with_message("Member rejected"))
}

/// DELETE /api/adhesion/membres/:id
pub async fn delete(State(state): State<AppState>, auth: AuthAdmin, AppPath(id): AppPath<Uuid>) -> ApiResult<Value> {
    AdhesionService::new(&state).delete(&Actor::from(&auth), id).await?;
    Ok(ApiResponse::message("Member deleted"))
}

/// GET /api/adhesion/stats
pub async fn stats(State(state): State<AppState>) -> ApiResult<AdhesionStats> {
    Ok(ApiResponse::success(AdhesionService::new(&state).stats().await?))
}

/// GET /api/adhesion/membres/carte - approved members grouped by place, geocoded
pub async fn carte(State(state): State<AppState>) -> ApiResult<Vec<MapLocation>> {
    Ok(ApiResponse::success(AdhesionService::new(&state).map().await?))
}
