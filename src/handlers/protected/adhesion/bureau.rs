use axum::extract::State;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::middleware::{ApiResponse, ApiResult, AppPath, AppQuery, AuthAdmin, ValidatedJson};
use crate::models::adhesion::BureauMember;
use crate::services::adhesion_service::{AdhesionService, CreateBureauRequest, UpdateBureauRequest};
use crate::services::Actor;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct BureauQuery {
    #[serde(default)]
    pub active_only: bool,
}

/// GET /api/adhesion/bureau
pub async fn list(State(state): State<AppState>, AppQuery(query): AppQuery<BureauQuery>) -> ApiResult<Vec<BureauMember>> {
    Ok(ApiResponse::success(AdhesionService::new(&state).list_bureau(query.active_only).await?))
}

/// GET /api/adhesion/bureau/:id
pub async fn get(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<BureauMember> {
    Ok(ApiResponse::success(AdhesionService::new(&state).get_bureau(id).await?))
}

/// POST /api/adhesion/bureau
pub async fn post(
    State(state): State<AppState>,
    auth: AuthAdmin,
    ValidatedJson(request): ValidatedJson<CreateBureauRequest>,
) -> ApiResult<BureauMember> {
    Ok(ApiResponse::created(AdhesionService::new(&state).create_bureau(&Actor::from(&auth), request).await?))
}

/// PUT /api/adhesion/bureau/:id
pub async fn put(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath(id): AppPath<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateBureauRequest>,
) -> ApiResult<BureauMember> {
    Ok(ApiResponse::success(AdhesionService::new(&state).update_bureau(&Actor::from(&auth), id, request).await?))
}

/// DELETE /api/adhesion/bureau/:id
pub async fn delete(State(state): State<AppState>, auth: AuthAdmin, AppPath(id): AppPath<Uuid>) -> ApiResult<Value> {
    AdhesionService::new(&state).delete_bureau(&Actor::from(&auth), id).await?;
    Ok(ApiResponse::message("Bureau member deleted"))
}
