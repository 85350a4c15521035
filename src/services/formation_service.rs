use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::effects::notifier::NotificationEvent;
use crate::error::ApiError;
use crate::filter::Filter;
use crate::models::formation::{Formation, FormationInscription, FormationSession, SessionStatus};
use crate::models::{InscriptionStatus, PageRequest, Paginated};
use crate::services::audit_service::{record, AuditEvent};
use crate::services::{double_option, ensure_capacity, normalize_email, slug_for, validate_not_blank, Actor};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct FormationFilters {
    pub categorie: Option<String>,
    pub niveau: Option<String>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateFormationRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub titre: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub categorie: Option<String>,
    pub niveau: Option<String>,
    #[validate(range(min = 1, message = "Must be a positive number of hours"))]
    pub duree_heures: Option<i32>,
    pub prix: Option<Decimal>,
    #[validate(range(min = 1, message = "Capacity must be at least 1"))]
    pub participants_max: Option<i32>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateFormationRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub titre: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub categorie: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub niveau: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub duree_heures: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub prix: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    pub participants_max: Option<Option<i32>>,
    pub is_active: Option<bool>,
}

/// What a delete actually did: formations with inscriptions are only switched off
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted,
    Deactivated,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SessionRequest {
    pub date_debut: NaiveDate,
    pub date_fin: Option<NaiveDate>,
    pub lieu: Option<String>,
    pub formateur: Option<String>,
    pub statut: Option<SessionStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSessionRequest {
    pub date_debut: Option<NaiveDate>,
    #[serde(default, deserialize_with = "double_option")]
    pub date_fin: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub lieu: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub formateur: Option<Option<String>>,
    pub statut: Option<SessionStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InscriptionFilters {
    pub formation_id: Option<Uuid>,
    pub session_id: Option<Uuid>,
    pub statut: Option<InscriptionStatus>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInscriptionRequest {
    pub session_id: Option<Uuid>,
    #[validate(custom(function = "validate_not_blank"))]
    pub prenom: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub nom: String,
    #[validate(email(message = "Must be a valid email address"))]
    pub email: String,
    pub telephone: Option<String>,
    /// Admins may register someone directly as confirmed; public signups stay pending
    pub statut: Option<InscriptionStatus>,
}

#[derive(Debug, Deserialize)]
pub struct InscriptionStatusRequest {
    pub statut: InscriptionStatus,
}

#[derive(Debug, Default, Serialize)]
pub struct FormationStats {
    pub formations_total: i64,
    pub formations_actives: i64,
    pub sessions_planifiees: i64,
    pub sessions_terminees: i64,
    pub inscriptions_total: i64,
    pub inscriptions_pending: i64,
    pub inscriptions_confirmed: i64,
    pub inscriptions_rejected: i64,
}

fn validate_session_dates(debut: NaiveDate, fin: Option<NaiveDate>) -> Result<(), ApiError> {
    match fin {
        Some(fin) if fin < debut => Err(ApiError::invalid_field("date_fin", "End date is before start date")),
        _ => Ok(()),
    }
}

pub struct FormationService {
    state: AppState,
}

impl FormationService {
    pub fn new(state: &AppState) -> Self {
        Self { state: state.clone() }
    }

    pub async fn list(&self, filters: FormationFilters, page: PageRequest) -> Result<Paginated<Formation>, ApiError> {
        let filter = Filter::new()
            .eq_opt("categorie", filters.categorie)
            .eq_opt("niveau", filters.niveau)
            .eq_opt("is_active", filters.is_active)
            .search(&["titre", "description", "categorie"], filters.search.as_deref())
            .order_asc("titre");
        let (rows, total) = self.state.repos.formations.select_page(&filter, page.limit, page.offset()).await?;
        Ok(Paginated::new(rows, page, total))
    }

    pub async fn get(&self, id: Uuid) -> Result<Formation, ApiError> {
        Ok(self.state.repos.formations.select_404(id).await?)
    }

    async fn ensure_slug_free(&self, slug: &str, except: Option<Uuid>) -> Result<(), ApiError> {
        let mut filter = Filter::new().eq("slug", slug);
        if let Some(id) = except {
            filter = filter.neq("id", id);
        }
        if self.state.repos.formations.exists(&filter).await? {
            return Err(ApiError::conflict(format!("A formation with slug '{}' already exists", slug)));
        }
        Ok(())
    }

    pub async fn create(&self, actor: &Actor, request: CreateFormationRequest) -> Result<Formation, ApiError> {
        let slug = slug_for(request.slug.as_deref(), &request.titre)?;
        self.ensure_slug_free(&slug, None).await?;

        let now = Utc::now();
        let formation = Formation {
            id: Uuid::new_v4(),
            titre: request.titre.trim().to_string(),
            slug,
            description: request.description,
            categorie: request.categorie,
            niveau: request.niveau,
            duree_heures: request.duree_heures,
            prix: request.prix,
            participants_max: request.participants_max,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let formation = self.state.repos.formations.insert(&formation).await?;
        record(&self.state, actor, AuditEvent::new("create", "formation", formation.id, &formation.titre), None, Some(&formation));
        Ok(formation)
    }

    pub async fn update(&self, actor: &Actor, id: Uuid, request: UpdateFormationRequest) -> Result<Formation, ApiError> {
        let before = self.get(id).await?;
        let mut formation = before.clone();

        if let Some(slug) = request.slug.as_deref() {
            let slug = slug_for(Some(slug), &formation.titre)?;
            if slug != formation.slug {
                self.ensure_slug_free(&slug, Some(id)).await?;
                formation.slug = slug;
            }
        }
        if let Some(titre) = request.titre {
            formation.titre = titre.trim().to_string();
        }
        if let Some(v) = request.description {
            formation.description = v;
        }
        if let Some(v) = request.categorie {
            formation.categorie = v;
        }
        if let Some(v) = request.niveau {
            formation.niveau = v;
        }
        if let Some(v) = request.duree_heures {
            formation.duree_heures = v;
        }
        if let Some(v) = request.prix {
            formation.prix = v;
        }
        if let Some(v) = request.participants_max {
            if let Some(max) = v {
                if max < 1 {
                    return Err(ApiError::invalid_field("participants_max", "Capacity must be at least 1"));
                }
                let confirmed = self.confirmed_count(id).await?;
                if i64::from(max) < confirmed {
                    return Err(ApiError::conflict(format!(
                        "Formation already has {} confirmed inscription(s); participants_max cannot go below that",
                        confirmed
                    )));
                }
            }
            formation.participants_max = v;
        }
        if let Some(v) = request.is_active {
            formation.is_active = v;
        }
        formation.updated_at = Utc::now();

        let formation = self.state.repos.formations.update(&formation).await?;
        record(&self.state, actor, AuditEvent::new("update", "formation", id, &formation.titre), Some(&before), Some(&formation));
        Ok(formation)
    }

    /// Hard delete, unless someone already enrolled: then the formation is deactivated
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<DeleteOutcome, ApiError> {
        let formation = self.get(id).await?;
        let of_formation = Filter::new().eq("formation_id", id);

        if self.state.repos.formation_inscriptions.exists(&of_formation).await? {
            let after = Formation { is_active: false, updated_at: Utc::now(), ..formation.clone() };
            let after = self.state.repos.formations.update(&after).await?;
            record(&self.state, actor, AuditEvent::new("deactivate", "formation", id, &after.titre), Some(&formation), Some(&after));
            return Ok(DeleteOutcome::Deactivated);
        }

        self.state.repos.formation_sessions.delete_where(&of_formation).await?;
        self.state.repos.formations.delete(id).await?;
        record(&self.state, actor, AuditEvent::new("delete", "formation", id, &formation.titre), Some(&formation), None);
        Ok(DeleteOutcome::Deleted)
    }

    // Sessions

    pub async fn list_sessions(&self, formation_id: Uuid) -> Result<Vec<FormationSession>, ApiError> {
        self.get(formation_id).await?;
        Ok(self
            .state
            .repos
            .formation_sessions
            .select_any(&Filter::new().eq("formation_id", formation_id).order_asc("date_debut"))
            .await?)
    }

    async fn session_of(&self, formation_id: Uuid, session_id: Uuid) -> Result<FormationSession, ApiError> {
        let session = self.state.repos.formation_sessions.select_404(session_id).await?;
        if session.formation_id != formation_id {
            return Err(ApiError::not_found(format!("sessions record {} not found", session_id)));
        }
        Ok(session)
    }

    pub async fn create_session(&self, actor: &Actor, formation_id: Uuid, request: SessionRequest) -> Result<FormationSession, ApiError> {
        let formation = self.get(formation_id).await?;
        validate_session_dates(request.date_debut, request.date_fin)?;

        let session = FormationSession {
            id: Uuid::new_v4(),
            formation_id,
            date_debut: request.date_debut,
            date_fin: request.date_fin,
            lieu: request.lieu,
            formateur: request.formateur,
            statut: request.statut.unwrap_or(SessionStatus::Planifiee),
            created_at: Utc::now(),
        };
        let session = self.state.repos.formation_sessions.insert(&session).await?;
        record(
            &self.state,
            actor,
            AuditEvent::new("create", "formation_session", session.id, format!("{} {}", formation.titre, session.date_debut)),
            None,
            Some(&session),
        );
        Ok(session)
    }

    pub async fn update_session(
        &self,
        actor: &Actor,
        formation_id: Uuid,
        session_id: Uuid,
        request: UpdateSessionRequest,
    ) -> Result<FormationSession, ApiError> {
        let before = self.session_of(formation_id, session_id).await?;
        let mut session = before.clone();
        if let Some(v) = request.date_debut {
            session.date_debut = v;
        }
        if let Some(v) = request.date_fin {
            session.date_fin = v;
        }
        if let Some(v) = request.lieu {
            session.lieu = v;
        }
        if let Some(v) = request.formateur {
            session.formateur = v;
        }
        if let Some(v) = request.statut {
            session.statut = v;
        }
        validate_session_dates(session.date_debut, session.date_fin)?;

        let session = self.state.repos.formation_sessions.update(&session).await?;
        record(
            &self.state,
            actor,
            AuditEvent::new("update", "formation_session", session_id, session.date_debut.to_string()),
            Some(&before),
            Some(&session),
        );
        Ok(session)
    }

    pub async fn delete_session(&self, actor: &Actor, formation_id: Uuid, session_id: Uuid) -> Result<(), ApiError> {
        let session = self.session_of(formation_id, session_id).await?;
        if self
            .state
            .repos
            .formation_inscriptions
            .exists(&Filter::new().eq("session_id", session_id))
            .await?
        {
            return Err(ApiError::conflict("Session has inscriptions and cannot be deleted"));
        }
        self.state.repos.formation_sessions.delete(session_id).await?;
        record(
            &self.state,
            actor,
            AuditEvent::new("delete", "formation_session", session_id, session.date_debut.to_string()),
            Some(&session),
            None,
        );
        Ok(())
    }

    // Inscriptions

    pub async fn list_inscriptions(&self, filters: InscriptionFilters, page: PageRequest) -> Result<Paginated<FormationInscription>, ApiError> {
        let filter = Filter::new()
            .eq_opt("formation_id", filters.formation_id)
            .eq_opt("session_id", filters.session_id)
            .eq_opt("statut", filters.statut)
            .search(&["prenom", "nom", "email"], filters.search.as_deref())
            .order_desc("created_at");
        let (rows, total) = self
            .state
            .repos
            .formation_inscriptions
            .select_page(&filter, page.limit, page.offset())
            .await?;
        Ok(Paginated::new(rows, page, total))
    }

    async fn confirmed_count(&self, formation_id: Uuid) -> Result<i64, ApiError> {
        Ok(self
            .state
            .repos
            .formation_inscriptions
            .count(&Filter::new().eq("formation_id", formation_id).eq("statut", InscriptionStatus::Confirmed))
            .await?)
    }

    /// Shared by the admin screen and the public form; `actor` is `None` for the latter
    pub async fn create_inscription(
        &self,
        actor: Option<&Actor>,
        formation_id: Uuid,
        request: CreateInscriptionRequest,
    ) -> Result<FormationInscription, ApiError> {
        let formation = self.get(formation_id).await?;
        if !formation.is_active {
            return Err(ApiError::conflict("This formation is closed to inscriptions"));
        }
        if let Some(session_id) = request.session_id {
            self.session_of(formation_id, session_id).await?;
        }
        ensure_capacity(self.confirmed_count(formation_id).await?, formation.participants_max)?;

        let email = normalize_email(&request.email);
        let repo = &self.state.repos.formation_inscriptions;
        if repo.exists(&Filter::new().eq("formation_id", formation_id).eq("email", &email)).await? {
            return Err(ApiError::conflict("This email is already registered for the formation"));
        }

        let statut = match actor {
            Some(_) => request.statut.unwrap_or(InscriptionStatus::Pending),
            None => InscriptionStatus::Pending,
        };
        let now = Utc::now();
        let inscription = FormationInscription {
            id: Uuid::new_v4(),
            formation_id,
            session_id: request.session_id,
            prenom: request.prenom.trim().to_string(),
            nom: request.nom.trim().to_string(),
            email,
            telephone: request.telephone,
            statut,
            created_at: now,
            updated_at: now,
        };
        let inscription = repo.insert(&inscription).await?;

        if let Some(actor) = actor {
            record(
                &self.state,
                actor,
                AuditEvent::new("create", "formation_inscription", inscription.id, &inscription.email),
                None,
                Some(&inscription),
            );
        }
        self.state.effects.notify(NotificationEvent::new(
            "formation.inscription",
            vec![inscription.email.clone()],
            format!("Inscription à la formation {}", formation.titre),
            json!({ "formation": formation.titre, "prenom": inscription.prenom, "statut": inscription.statut }),
        ));
        Ok(inscription)
    }

    pub async fn update_inscription_status(
        &self,
        actor: &Actor,
        id: Uuid,
        request: InscriptionStatusRequest,
    ) -> Result<FormationInscription, ApiError> {
        let before = self.state.repos.formation_inscriptions.select_404(id).await?;
        if before.statut == request.statut {
            return Ok(before);
        }
        if request.statut == InscriptionStatus::Confirmed {
            let formation = self.get(before.formation_id).await?;
            ensure_capacity(self.confirmed_count(formation.id).await?, formation.participants_max)?;
        }

        let after = FormationInscription { statut: request.statut, updated_at: Utc::now(), ..before.clone() };
        let after = self.state.repos.formation_inscriptions.update(&after).await?;
        record(
            &self.state,
            actor,
            AuditEvent::new("update_status", "formation_inscription", id, &after.email),
            Some(&before),
            Some(&after),
        );
        Ok(after)
    }

    pub async fn delete_inscription(&self, actor: &Actor, id: Uuid) -> Result<(), ApiError> {
        let inscription = self.state.repos.formation_inscriptions.select_404(id).await?;
        self.state.repos.formation_inscriptions.delete(id).await?;
        record(
            &self.state,
            actor,
            AuditEvent::new("delete", "formation_inscription", id, &inscription.email),
            Some(&inscription),
            None,
        );
        Ok(())
    }

    pub async fn stats(&self) -> Result<FormationStats, ApiError> {
        let repos = &self.state.repos;
        let all = Filter::new();
        let active = Filter::new().eq("is_active", true);
        let planned = Filter::new().eq("statut", SessionStatus::Planifiee);
        let finished = Filter::new().eq("statut", SessionStatus::Terminee);
        let pending = Filter::new().eq("statut", InscriptionStatus::Pending);
        let confirmed = Filter::new().eq("statut", InscriptionStatus::Confirmed);
        let rejected = Filter::new().eq("statut", InscriptionStatus::Rejected);
        let (
            formations_total,
            formations_actives,
            sessions_planifiees,
            sessions_terminees,
            inscriptions_total,
            inscriptions_pending,
            inscriptions_confirmed,
            inscriptions_rejected,
        ) = futures::try_join!(
            repos.formations.count(&all),
            repos.formations.count(&active),
            repos.formation_sessions.count(&planned),
            repos.formation_sessions.count(&finished),
            repos.formation_inscriptions.count(&all),
            repos.formation_inscriptions.count(&pending),
            repos.formation_inscriptions.count(&confirmed),
            repos.formation_inscriptions.count(&rejected),
        )?;

        Ok(FormationStats {
            formations_total,
            formations_actives,
            sessions_planifiees,
            sessions_terminees,
            inscriptions_total,
            inscriptions_pending,
            inscriptions_confirmed,
            inscriptions_rejected,
        })
    }
}
