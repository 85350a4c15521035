use axum::extract::State;
use chrono::Utc;

use crate::middleware::{ApiResponse, ApiResult, ValidatedJson};
use crate::services::auth_service::{AuthService, LoginRequest, LoginResponse};
use crate::state::AppState;

/// POST /api/auth/login - exchange credentials for a bearer token
///
/// The identifier is either the email or the member number. Suspended
/// accounts get 423 with the reactivation date; everything else that fails
/// is a plain 401.
pub async fn login(State(state): State<AppState>, ValidatedJson(request): ValidatedJson<LoginRequest>) -> ApiResult<LoginResponse> {
    let response = AuthService::new(&state).login(request, Utc::now()).await?;
    Ok(ApiResponse::success(response).with_message("Login successful"))
}
