use axum::extract::State;
use serde_json::Value;
use uuid::Uuid;

use crate::middleware::{ApiResponse, ApiResult, AppPath, ValidatedJson};
use crate::models::adhesion::Member;
use crate::models::formation::FormationInscription;
use crate::models::recrutement::Candidature;
use crate::models::secretariat::ProjetInscription;
use crate::models::webinaire::WebinaireInscription;
use crate::services::adhesion_service::{AdhesionService, RegisterMemberRequest};
use crate::services::formation_service::{CreateInscriptionRequest, FormationService};
use crate::services::public_service::{ContactRequest, PublicBureauMember, PublicService};
use crate::services::recrutement_service::{CreateCandidatureRequest, RecrutementService};
use crate::services::secretariat_service::{ProjetInscriptionRequest, SecretariatService};
use crate::services::webinaire_service::{CreateWebinaireInscriptionRequest, WebinaireService};
use crate::state::AppState;

/// POST /api/public/contact
pub async fn contact(State(state): State<AppState>, ValidatedJson(request): ValidatedJson<ContactRequest>) -> ApiResult<Value> {
    PublicService::new(&state).contact(request)?;
    Ok(ApiResponse::message("Message sent"))
}

/// POST /api/public/adhesion - membership application, lands as `pending`
pub async fn adhesion(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RegisterMemberRequest>,
) -> ApiResult<Member> {
    let member = AdhesionService::new(&state).register(request).await?;
    Ok(ApiResponse::created(member).with_message("Application received"))
}

/// POST /api/public/formations/:id/inscriptions
pub async fn formation_inscription(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    ValidatedJson(request): ValidatedJson<CreateInscriptionRequest>,
) -> ApiResult<FormationInscription> {
    let inscription = FormationService::new(&state).create_inscription(None, id, request).await?;
    Ok(ApiResponse::created(inscription))
}

/// POST /api/public/webinaires/:id/inscriptions
pub async fn webinaire_inscription(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    ValidatedJson(request): ValidatedJson<CreateWebinaireInscriptionRequest>,
) -> ApiResult<WebinaireInscription> {
    let inscription = WebinaireService::new(&state).create_inscription(None, id, request).await?;
    Ok(ApiResponse::created(inscription))
}

/// POST /api/public/projets/:id/inscriptions
pub async fn projet_inscription(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    ValidatedJson(request): ValidatedJson<ProjetInscriptionRequest>,
) -> ApiResult<ProjetInscription> {
    let inscription = SecretariatService::new(&state).create_projet_inscription(id, request).await?;
    Ok(ApiResponse::created(inscription))
}

/// POST /api/public/offres/:id/candidatures
pub async fn candidature(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    ValidatedJson(request): ValidatedJson<CreateCandidatureRequest>,
) -> ApiResult<Candidature> {
    let candidature = RecrutementService::new(&state).create_candidature(None, id, request).await?;
    Ok(ApiResponse::created(candidature))
}

/// GET /api/public/bureau
pub async fn bureau(State(state): State<AppState>) -> ApiResult<Vec<PublicBureauMember>> {
    Ok(ApiResponse::success(PublicService::new(&state).bureau().await?))
}
