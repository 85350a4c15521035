use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::effects::notifier::NotificationEvent;
use crate::error::ApiError;
use crate::filter::Filter;
use crate::models::recrutement::*;
use crate::models::{PageRequest, Paginated};
use crate::services::audit_service::{record, AuditEvent};
use crate::services::{double_option, normalize_email, slug_for, today, validate_not_blank, Actor};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct OffreFilters {
    pub statut: Option<OffreStatus>,
    pub type_contrat: Option<TypeContrat>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOffreRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub titre: String,
    pub slug: Option<String>,
    pub type_contrat: TypeContrat,
    pub description: Option<String>,
    pub localisation: Option<String>,
    pub date_limite: Option<NaiveDate>,
    pub statut: Option<OffreStatus>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateOffreRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub titre: Option<String>,
    pub slug: Option<String>,
    pub type_contrat: Option<TypeContrat>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub localisation: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub date_limite: Option<Option<NaiveDate>>,
    pub statut: Option<OffreStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidatureFilters {
    pub offre_id: Option<Uuid>,
    pub statut: Option<CandidatureStatus>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCandidatureRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub prenom: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub nom: String,
    #[validate(email(message = "Must be a valid email address"))]
    pub email: String,
    #[validate(url(message = "Must be a valid URL"))]
    pub cv_url: Option<String>,
    pub lettre: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatureStatusRequest {
    pub statut: CandidatureStatus,
}

#[derive(Debug, Serialize)]
pub struct RecrutementStats {
    pub offres_ouvertes: i64,
    pub offres_fermees: i64,
    pub offres_pourvues: i64,
    pub candidatures_total: i64,
    pub candidatures_recues: i64,
    pub candidatures_en_revue: i64,
    pub candidatures_entretien: i64,
    pub candidatures_acceptees: i64,
    pub candidatures_refusees: i64,
}

/// An offer takes applications while open and before its deadline
pub fn accepts_applications(offre: &Offre, today: NaiveDate) -> bool {
    offre.statut == OffreStatus::Ouverte && offre.date_limite.map_or(true, |limite| limite >= today)
}

pub struct RecrutementService {
    state: AppState,
}

impl RecrutementService {
    pub fn new(state: &AppState) -> Self {
        Self { state: state.clone() }
    }

    pub async fn list_offres(&self, filters: OffreFilters, page: PageRequest) -> Result<Paginated<Offre>, ApiError> {
        let filter = Filter::new()
            .eq_opt("statut", filters.statut)
            .eq_opt("type_contrat", filters.type_contrat)
            .search(&["titre", "description", "localisation"], filters.search.as_deref())
            .order_desc("created_at");
        let (rows, total) = self.state.repos.offres.select_page(&filter, page.limit, page.offset()).await?;
        Ok(Paginated::new(rows, page, total))
    }

    pub async fn get_offre(&self, id: Uuid) -> Result<Offre, ApiError> {
        Ok(self.state.repos.offres.select_404(id).await?)
    }

    async fn ensure_slug_free(&self, slug: &str, except: Option<Uuid>) -> Result<(), ApiError> {
        let mut filter = Filter::new().eq("slug", slug);
        if let Some(id) = except {
            filter = filter.neq("id", id);
        }
        if self.state.repos.offres.exists(&filter).await? {
            return Err(ApiError::conflict(format!("An offre with slug '{}' already exists", slug)));
        }
        Ok(())
    }

    pub async fn create_offre(&self, actor: &Actor, request: CreateOffreRequest) -> Result<Offre, ApiError> {
        let slug = slug_for(request.slug.as_deref(), &request.titre)?;
        self.ensure_slug_free(&slug, None).await?;

        let now = Utc::now();
        let offre = Offre {
            id: Uuid::new_v4(),
            titre: request.titre.trim().to_string(),
            slug,
            type_contrat: request.type_contrat,
            description: request.description,
            localisation: request.localisation,
            date_limite: request.date_limite,
            statut: request.statut.unwrap_or(OffreStatus::Ouverte),
            created_at: now,
            updated_at: now,
        };
        let offre = self.state.repos.offres.insert(&offre).await?;
        record(&self.state, actor, AuditEvent::new("create", "offre", offre.id, &offre.titre), None, Some(&offre));
        Ok(offre)
    }

    pub async fn update_offre(&self, actor: &Actor, id: Uuid, request: UpdateOffreRequest) -> Result<Offre, ApiError> {
        let before = self.get_offre(id).await?;
        let mut offre = before.clone();

        if let Some(slug) = request.slug.as_deref() {
            let slug = slug_for(Some(slug), &offre.titre)?;
            if slug != offre.slug {
                self.ensure_slug_free(&slug, Some(id)).await?;
                offre.slug = slug;
            }
        }
        if let Some(v) = request.titre {
            offre.titre = v.trim().to_string();
        }
        if let Some(v) = request.type_contrat {
            offre.type_contrat = v;
        }
        if let Some(v) = request.description {
            offre.description = v;
        }
        if let Some(v) = request.localisation {
            offre.localisation = v;
        }
        if let Some(v) = request.date_limite {
            offre.date_limite = v;
        }
        if let Some(v) = request.statut {
            offre.statut = v;
        }
        offre.updated_at = Utc::now();

        let offre = self.state.repos.offres.update(&offre).await?;
        record(&self.state, actor, AuditEvent::new("update", "offre", id, &offre.titre), Some(&before), Some(&offre));
        Ok(offre)
    }

    /// Refused once anyone applied; close the offer instead
    pub async fn delete_offre(&self, actor: &Actor, id: Uuid) -> Result<(), ApiError> {
        let offre = self.get_offre(id).await?;
        if self.state.repos.candidatures.exists(&Filter::new().eq("offre_id", id)).await? {
            return Err(ApiError::conflict("Offre has candidatures and cannot be deleted; close it instead"));
        }
        self.state.repos.offres.delete(id).await?;
        record(&self.state, actor, AuditEvent::new("delete", "offre", id, &offre.titre), Some(&offre), None);
        Ok(())
    }

    pub async fn list_candidatures(&self, filters: CandidatureFilters, page: PageRequest) -> Result<Paginated<Candidature>, ApiError> {
        let filter = Filter::new()
            .eq_opt("offre_id", filters.offre_id)
            .eq_opt("statut", filters.statut)
            .search(&["prenom", "nom", "email"], filters.search.as_deref())
            .order_desc("created_at");
        let (rows, total) = self.state.repos.candidatures.select_page(&filter, page.limit, page.offset()).await?;
        Ok(Paginated::new(rows, page, total))
    }

    pub async fn get_candidature(&self, id: Uuid) -> Result<Candidature, ApiError> {
        Ok(self.state.repos.candidatures.select_404(id).await?)
    }

    /// Admin entry (`actor` set) may target any offer; public applications need an open one
    pub async fn create_candidature(
        &self,
        actor: Option<&Actor>,
        offre_id: Uuid,
        request: CreateCandidatureRequest,
    ) -> Result<Candidature, ApiError> {
        let offre = self.get_offre(offre_id).await?;
        if actor.is_none() && !accepts_applications(&offre, today()) {
            return Err(ApiError::conflict("This offre no longer accepts candidatures"));
        }
        let email = normalize_email(&request.email);
        let repo = &self.state.repos.candidatures;
        if repo.exists(&Filter::new().eq("offre_id", offre_id).eq("email", &email)).await? {
            return Err(ApiError::conflict("A candidature with this email already exists for the offre"));
        }

        let now = Utc::now();
        let candidature = repo
            .insert(&Candidature {
                id: Uuid::new_v4(),
                offre_id,
                prenom: request.prenom.trim().to_string(),
                nom: request.nom.trim().to_string(),
                email,
                cv_url: request.cv_url,
                lettre: request.lettre,
                statut: CandidatureStatus::Recue,
                created_at: now,
                updated_at: now,
            })
            .await?;

        match actor {
            Some(actor) => record(
                &self.state,
                actor,
                AuditEvent::new("create", "candidature", candidature.id, &candidature.email),
                None,
                Some(&candidature),
            ),
            None => self.state.effects.notify(NotificationEvent::new(
                "recrutement.candidature",
                vec![candidature.email.clone()],
                format!("Candidature reçue : {}", offre.titre),
                json!({ "offre": offre.titre, "prenom": candidature.prenom }),
            )),
        }
        Ok(candidature)
    }

    pub async fn update_candidature_status(
        &self,
        actor: &Actor,
        id: Uuid,
        request: CandidatureStatusRequest,
    ) -> Result<Candidature, ApiError> {
        let before = self.get_candidature(id).await?;
        let after = Candidature { statut: request.statut, updated_at: Utc::now(), ..before.clone() };
        let after = self.state.repos.candidatures.update(&after).await?;
        record(&self.state, actor, AuditEvent::new("update_status", "candidature", id, &after.email), Some(&before), Some(&after));
        Ok(after)
    }

    pub async fn delete_candidature(&self, actor: &Actor, id: Uuid) -> Result<(), ApiError> {
        let candidature = self.get_candidature(id).await?;
        self.state.repos.candidatures.delete(id).await?;
        record(&self.state, actor, AuditEvent::new("delete", "candidature", id, &candidature.email), Some(&candidature), None);
        Ok(())
    }

    pub async fn stats(&self) -> Result<RecrutementStats, ApiError> {
        let repos = &self.state.repos;
        let by_offre = |s: OffreStatus| Filter::new().eq("statut", s);
        let by_candidature = |s: CandidatureStatus| Filter::new().eq("statut", s);
        let (ouvertes, fermees, pourvues) =
            (by_offre(OffreStatus::Ouverte), by_offre(OffreStatus::Fermee), by_offre(OffreStatus::Pourvue));
        let all = Filter::new();
        let recues = by_candidature(CandidatureStatus::Recue);
        let en_revue = by_candidature(CandidatureStatus::EnRevue);
        let entretien = by_candidature(CandidatureStatus::Entretien);
        let acceptees = by_candidature(CandidatureStatus::Acceptee);
        let refusees = by_candidature(CandidatureStatus::Refusee);

        let (
            offres_ouvertes,
            offres_fermees,
            offres_pourvues,
            candidatures_total,
            candidatures_recues,
            candidatures_en_revue,
            candidatures_entretien,
            candidatures_acceptees,
            candidatures_refusees,
        ) = futures::try_join!(
            repos.offres.count(&ouvertes),
            repos.offres.count(&fermees),
            repos.offres.count(&pourvues),
            repos.candidatures.count(&all),
            repos.candidatures.count(&recues),
            repos.candidatures.count(&en_revue),
            repos.candidatures.count(&entretien),
            repos.candidatures.count(&acceptees),
            repos.candidatures.count(&refusees),
        )?;

        Ok(RecrutementStats {
            offres_ouvertes,
            offres_fermees,
            offres_pourvues,
            candidatures_total,
            candidatures_recues,
            candidatures_en_revue,
            candidatures_entretien,
            candidatures_acceptees,
            candidatures_refusees,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offre(statut: OffreStatus, date_limite: Option<NaiveDate>) -> Offre {
        let now = Utc::now();
        Offre {
            id: Uuid::new_v4(),
            titre: "Chargé de communication".into(),
            slug: "charge-de-communication".into(),
            type_contrat: TypeContrat::Benevolat,
            description: None,
            localisation: None,
            date_limite,
            statut,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn applications_close_with_status_or_deadline() {
        let today = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        assert!(accepts_applications(&offre(OffreStatus::Ouverte, None), today));
        assert!(accepts_applications(&offre(OffreStatus::Ouverte, Some(today)), today));
        assert!(!accepts_applications(&offre(OffreStatus::Ouverte, today.pred_opt()), today));
        assert!(!accepts_applications(&offre(OffreStatus::Pourvue, None), today));
    }
}
