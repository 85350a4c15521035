use axum::extract::State;
use uuid::Uuid;

use crate::middleware::{ApiResponse, ApiResult, AppPath, AppQuery, AuthAdmin, Pagination, ValidatedJson};
use crate::models::secretariat::{Projet, ProjetInscription};
use crate::services::secretariat_service::{CreateProjetRequest, ProjetFilters, SecretariatService, UpdateProjetRequest};
use crate::services::Actor;
use crate::state::AppState;

/// GET /api/secretariat/projets
pub async fn list(
    State(state): State<AppState>,
    AppQuery(filters): AppQuery<ProjetFilters>,
    Pagination(page): Pagination,
) -> ApiResult<Vec<Projet>> {
    Ok(ApiResponse::paginated(SecretariatService::new(&state).list_projets(filters, page).await?))
}

/// GET /api/secretariat/projets/:id
pub async fn get(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> ApiResult<Projet> {
    Ok(ApiResponse::success(SecretariatService::new(&state).get_projet(id).await?))
}

/// POST /api/secretariat/projets
pub async fn post(
    State(state): State<AppState>,
    auth: AuthAdmin,
    ValidatedJson(request): ValidatedJson<CreateProjetRequest>,
) -> ApiResult<Projet> {
    Ok(ApiResponse::created(SecretariatService::new(&state).create_projet(&Actor::from(&auth), request).await?))
}

/// PUT /api/secretariat/projets/:id
pub async fn put(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath(id): AppPath<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateProjetRequest>,
) -> ApiResult<Projet> {
    Ok(ApiResponse::success(SecretariatService::new(&state).update_projet(&Actor::from(&auth), id, request).await?))
}

/// GET /api/secretariat/projets/:id/inscriptions
pub async fn inscription_list(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    Pagination(page): Pagination,
) -> ApiResult<Vec<ProjetInscription>> {
    Ok(ApiResponse::paginated(SecretariatService::new(&state).list_projet_inscriptions(id, page).await?))
}
