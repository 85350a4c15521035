use axum::extract::State;
use uuid::Uuid;

use crate::middleware::{ApiResponse, ApiResult, AppJson, AppPath, AppQuery, AuthAdmin, Pagination};
use crate::models::tresorerie::{CarteMembre, HistoriqueTresorerie};
use crate::services::tresorerie_service::{
    Bilan, BilanQuery, CarteFilters, HistoriqueFilters, IssueCarteRequest, TresorerieService,
};
use crate::services::Actor;
use crate::state::AppState;

/// GET /api/tresorerie/cartes
pub async fn carte_list(
    State(state): State<AppState>,
    AppQuery(filters): AppQuery<CarteFilters>,
    Pagination(page): Pagination,
) -> ApiResult<Vec<CarteMembre>> {
    Ok(ApiResponse::paginated(TresorerieService::new(&state).list_cartes(filters, page).await?))
}

/// POST /api/tresorerie/cartes - approved members only, one active card per year
pub async fn carte_post(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppJson(request): AppJson<IssueCarteRequest>,
) -> ApiResult<CarteMembre> {
    Ok(ApiResponse::created(TresorerieService::new(&state).issue_carte(&Actor::from(&auth), request).await?))
}

/// POST /api/tresorerie/cartes/:id/cancel
pub async fn carte_cancel(State(state): State<AppState>, auth: AuthAdmin, AppPath(id): AppPath<Uuid>) -> ApiResult<CarteMembre> {
    Ok(ApiResponse::success(TresorerieService::new(&state).cancel_carte(&Actor::from(&auth), id).await?))
}

/// GET /api/tresorerie/historique
pub async fn historique(
    State(state): State<AppState>,
    AppQuery(filters): AppQuery<HistoriqueFilters>,
    Pagination(page): Pagination,
) -> ApiResult<Vec<HistoriqueTresorerie>> {
    Ok(ApiResponse::paginated(TresorerieService::new(&state).list_historique(filters, page).await?))
}

/// GET /api/tresorerie/bilan?annee=
pub async fn bilan(State(state): State<AppState>, AppQuery(query): AppQuery<BilanQuery>) -> ApiResult<Bilan> {
    Ok(ApiResponse::success(TresorerieService::new(&state).bilan(query).await?))
}
