use axum::extract::State;

use crate::middleware::{ApiResponse, ApiResult, AuthAdmin};
use crate::services::auth_service::{AuthService, MeResponse};
use crate::state::AppState;

/// GET /api/auth/me - profile and effective module grants of the caller
pub async fn me(State(state): State<AppState>, auth: AuthAdmin) -> ApiResult<MeResponse> {
    Ok(ApiResponse::success(AuthService::new(&state).me(&auth.admin).await?))
}
