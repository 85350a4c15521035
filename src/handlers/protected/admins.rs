use axum::extract::State;
use uuid::Uuid;

use crate::middleware::{ApiResponse, ApiResult, AppJson, AppPath, AppQuery, AuthAdmin, Pagination, ValidatedJson};
use crate::models::admin::{AdminModule, AdminProfile};
use crate::services::admin_service::{
    AdminDetail, AdminFilters, AdminService, CreateAdminRequest, GrantInput, SuspendRequest, UpdateAdminRequest,
};
use crate::services::Actor;
use crate::state::AppState;

/// GET /api/admins
pub async fn list(
    State(state): State<AppState>,
    AppQuery(filters): AppQuery<AdminFilters>,
    Pagination(page): Pagination,
) -> ApiResult<Vec<AdminProfile>> {
    Ok(ApiResponse::paginated(AdminService::new(&state).list(filters, page).await?))
}

/// GET /api/admins/:id
pub async fn get(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<AdminDetail> {
    Ok(ApiResponse::success(AdminService::new(&state).get(id).await?))
}

/// POST /api/admins
pub async fn post(
    State(state): State<AppState>,
    auth: AuthAdmin,
    ValidatedJson(request): ValidatedJson<CreateAdminRequest>,
) -> ApiResult<AdminDetail> {
    let admin = AdminService::new(&state).create(&Actor::from(&auth), request).await?;
    Ok(ApiResponse::created(admin))
}

/// PUT /api/admins/:id - partial update, optional password reset
pub async fn put(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath(id): AppPath<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateAdminRequest>,
) -> ApiResult<AdminDetail> {
    Ok(ApiResponse::success(AdminService::new(&state).update(&Actor::from(&auth), id, request).await?))
}

/// DELETE /api/admins/:id - deactivation, the row is kept
pub async fn delete(State(state): State<AppState>, auth: AuthAdmin, AppPath(id): AppPath<Uuid>) -> ApiResult<AdminProfile> {
    let admin = AdminService::new(&state).deactivate(&Actor::from(&auth), id).await?;
    Ok(ApiResponse::success(admin).with_message("Admin deactivated"))
}

/// POST /api/admins/:id/suspend
pub async fn suspend(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath(id): AppPath<Uuid>,
    AppJson(request): AppJson<SuspendRequest>,
) -> ApiResult<AdminProfile> {
    Ok(ApiResponse::success(AdminService::new(&state).suspend(&Actor::from(&auth), id, request).await?))
}

/// POST /api/admins/:id/reactivate
pub async fn reactivate(State(state): State<AppState>, auth: AuthAdmin, AppPath(id): AppPath<Uuid>) -> ApiResult<AdminProfile> {
    Ok(ApiResponse::success(AdminService::new(&state).reactivate(&Actor::from(&auth), id).await?))
}

/// PUT /api/admins/:id/modules - replaces the whole grant set
pub async fn put_modules(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath(id): AppPath<Uuid>,
    AppJson(grants): AppJson<Vec<GrantInput>>,
) -> ApiResult<Vec<AdminModule>> {
    Ok(ApiResponse::success(AdminService::new(&state).set_modules(&Actor::from(&auth), id, grants).await?))
}
