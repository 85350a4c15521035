use axum::extract::State;
use serde_json::Value;
use uuid::Uuid;

use crate::middleware::{ApiResponse, ApiResult, AppPath, AppQuery, AuthAdmin, Pagination, ValidatedJson};
use crate::models::tresorerie::Cotisation;
use crate::services::tresorerie_service::{CotisationFilters, CreateCotisationRequest, TresorerieService};
use crate::services::Actor;
use crate::state::AppState;

/// GET /api/tresorerie/cotisations
pub async fn list(
    State(state): State<AppState>,
    AppQuery(filters): AppQuery<CotisationFilters>,
    Pagination(page): Pagination,
) -> ApiResult<Vec<Cotisation>> {
    Ok(ApiResponse::paginated(TresorerieService::new(&state).list_cotisations(filters, page).await?))
}

/// GET /api/tresorerie/cotisations/:id
pub async fn get(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<Cotisation> {
    Ok(ApiResponse::success(TresorerieService::new(&state).get_cotisation(id).await?))
}

/// POST /api/tresorerie/cotisations - created `en_attente`, amount converted to EUR
pub async fn post(
    State(state): State<AppState>,
    auth: AuthAdmin,
    ValidatedJson(request): ValidatedJson<CreateCotisationRequest>,
) -> ApiResult<Cotisation> {
    Ok(ApiResponse::created(TresorerieService::new(&state).create_cotisation(&Actor::from(&auth), request).await?))
}

/// POST /api/tresorerie/cotisations/:id/validate
pub async fn validate(State(state): State<AppState>, auth: AuthAdmin, AppPath(id): AppPath<Uuid>) -> ApiResult<Cotisation> {
    Ok(ApiResponse::success(TresorerieService::new(&state).validate_cotisation(&Actor::from(&auth), id).await?))
}

/// POST /api/tresorerie/cotisations/:id/cancel
pub async fn cancel(State(state): State<AppState>, auth: AuthAdmin, AppPath(id): AppPath<Uuid>) -> ApiResult<Cotisation> {
    Ok(ApiResponse::success(TresorerieService::new(&state).cancel_cotisation(&Actor::from(&auth), id).await?))
}

/// POST /api/tresorerie/cotisations/:id/reset - back to `en_attente`
pub async fn reset(State(state): State<AppState>, auth: AuthAdmin, AppPath(id): AppPath<Uuid>) -> ApiResult<Cotisation> {
    Ok(ApiResponse::success(TresorerieService::new(&state).reset_cotisation(&Actor::from(&auth), id).await?))
}

/// DELETE /api/tresorerie/cotisations/:id
pub async fn delete(State(state): State<AppState>, auth: AuthAdmin, AppPath(id): AppPath<Uuid>) -> ApiResult<Value> {
    TresorerieService::new(&state).delete_cotisation(&Actor::from(&auth), id).await?;
    Ok(ApiResponse::message("Cotisation deleted"))
}
