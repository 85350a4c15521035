use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::effects::notifier::NotificationEvent;
use crate::error::ApiError;
use crate::filter::Filter;
use crate::models::webinaire::{percent, Presentateur, Webinaire, WebinaireInscription, WebinaireStats, WebinaireStatus};
use crate::models::{InscriptionStatus, PageRequest, Paginated};
use crate::services::audit_service::{record, AuditEvent};
use crate::services::{
    double_option, ensure_capacity, normalize_email, slug_for, validate_heure, validate_not_blank, Actor,
};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct WebinaireFilters {
    pub statut: Option<WebinaireStatus>,
    pub is_active: Option<bool>,
    pub date_debut: Option<NaiveDate>,
    pub date_fin: Option<NaiveDate>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateWebinaireRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub titre: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub date_webinaire: NaiveDate,
    #[validate(custom(function = "validate_heure"))]
    pub heure_debut: String,
    #[validate(range(min = 1, message = "Duration must be at least one minute"))]
    pub duree_minutes: Option<i32>,
    #[validate(url(message = "Must be a valid URL"))]
    pub lien_visio: Option<String>,
    #[validate(range(min = 1, message = "Capacity must be at least 1"))]
    pub capacite_max: Option<i32>,
    pub statut: Option<WebinaireStatus>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateWebinaireRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub titre: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub date_webinaire: Option<NaiveDate>,
    #[validate(custom(function = "validate_heure"))]
    pub heure_debut: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub duree_minutes: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub lien_visio: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub capacite_max: Option<Option<i32>>,
    pub statut: Option<WebinaireStatus>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebinaireInscriptionFilters {
    pub statut: Option<InscriptionStatus>,
    pub a_assiste: Option<bool>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateWebinaireInscriptionRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub prenom: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub nom: String,
    #[validate(email(message = "Must be a valid email address"))]
    pub email: String,
    pub statut: Option<InscriptionStatus>,
}

#[derive(Debug, Deserialize)]
pub struct WebinaireInscriptionStatusRequest {
    pub statut: InscriptionStatus,
}

#[derive(Debug, Deserialize)]
pub struct AttendanceRequest {
    pub a_assiste: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePresentateurRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub prenom: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub nom: String,
    pub titre: Option<String>,
    pub bio: Option<String>,
    pub ordre: Option<i32>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdatePresentateurRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub prenom: Option<String>,
    #[validate(custom(function = "validate_not_blank"))]
    pub nom: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub titre: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub bio: Option<Option<String>>,
    pub ordre: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct WebinaireGlobalStats {
    pub webinaires_total: i64,
    pub brouillons: i64,
    pub publies: i64,
    pub termines: i64,
    pub annules: i64,
    pub inscriptions_total: i64,
    pub inscriptions_confirmees: i64,
    pub presents: i64,
    pub taux_presence: f64,
}

pub struct WebinaireService {
    state: AppState,
}

impl WebinaireService {
    pub fn new(state: &AppState) -> Self {
        Self { state: state.clone() }
    }

    pub async fn list(&self, filters: WebinaireFilters, page: PageRequest) -> Result<Paginated<Webinaire>, ApiError> {
        let filter = Filter::new()
            .eq_opt("statut", filters.statut)
            .eq_opt("is_active", filters.is_active)
            .gte_opt("date_webinaire", filters.date_debut)
            .lte_opt("date_webinaire", filters.date_fin)
            .search(&["titre", "description"], filters.search.as_deref())
            .order_desc("date_webinaire");
        let (rows, total) = self.state.repos.webinaires.select_page(&filter, page.limit, page.offset()).await?;
        Ok(Paginated::new(rows, page, total))
    }

    pub async fn get(&self, id: Uuid) -> Result<Webinaire, ApiError> {
        Ok(self.state.repos.webinaires.select_404(id).await?)
    }

    async fn ensure_slug_free(&self, slug: &str, except: Option<Uuid>) -> Result<(), ApiError> {
        let mut filter = Filter::new().eq("slug", slug);
        if let Some(id) = except {
            filter = filter.neq("id", id);
        }
        if self.state.repos.webinaires.exists(&filter).await? {
            return Err(ApiError::conflict(format!("A webinaire with slug '{}' already exists", slug)));
        }
        Ok(())
    }

    pub async fn create(&self, actor: &Actor, request: CreateWebinaireRequest) -> Result<Webinaire, ApiError> {
        let slug = slug_for(request.slug.as_deref(), &request.titre)?;
        self.ensure_slug_free(&slug, None).await?;

        let now = Utc::now();
        let webinaire = Webinaire {
            id: Uuid::new_v4(),
            titre: request.titre.trim().to_string(),
            slug,
            description: request.description,
            date_webinaire: request.date_webinaire,
            heure_debut: request.heure_debut,
            duree_minutes: request.duree_minutes,
            lien_visio: request.lien_visio,
            capacite_max: request.capacite_max,
            statut: request.statut.unwrap_or(WebinaireStatus::Brouillon),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let webinaire = self.state.repos.webinaires.insert(&webinaire).await?;
        record(&self.state, actor, AuditEvent::new("create", "webinaire", webinaire.id, &webinaire.titre), None, Some(&webinaire));
        Ok(webinaire)
    }

    pub async fn update(&self, actor: &Actor, id: Uuid, request: UpdateWebinaireRequest) -> Result<Webinaire, ApiError> {
        let before = self.get(id).await?;
        let mut webinaire = before.clone();

        if let Some(slug) = request.slug.as_deref() {
            let slug = slug_for(Some(slug), &webinaire.titre)?;
            if slug != webinaire.slug {
                self.ensure_slug_free(&slug, Some(id)).await?;
                webinaire.slug = slug;
            }
        }
        if let Some(titre) = request.titre {
            webinaire.titre = titre.trim().to_string();
        }
        if let Some(v) = request.description {
            webinaire.description = v;
        }
        if let Some(v) = request.date_webinaire {
            webinaire.date_webinaire = v;
        }
        if let Some(v) = request.heure_debut {
            webinaire.heure_debut = v;
        }
        if let Some(v) = request.duree_minutes {
            webinaire.duree_minutes = v;
        }
        if let Some(v) = request.lien_visio {
            webinaire.lien_visio = v;
        }
        if let Some(v) = request.capacite_max {
            if let Some(max) = v {
                if max < 1 {
                    return Err(ApiError::invalid_field("capacite_max", "Capacity must be at least 1"));
                }
                let confirmed = self.confirmed_count(id).await?;
                if i64::from(max) < confirmed {
                    return Err(ApiError::conflict(format!(
                        "Webinaire already has {} confirmed inscription(s); capacite_max cannot go below that",
                        confirmed
                    )));
                }
            }
            webinaire.capacite_max = v;
        }
        if let Some(v) = request.statut {
            webinaire.statut = v;
        }
        if let Some(v) = request.is_active {
            webinaire.is_active = v;
        }
        webinaire.updated_at = Utc::now();

        let webinaire = self.state.repos.webinaires.update(&webinaire).await?;
        record(&self.state, actor, AuditEvent::new("update", "webinaire", id, &webinaire.titre), Some(&before), Some(&webinaire));
        Ok(webinaire)
    }

    /// Refused while any inscription exists; nothing is touched in that case
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), ApiError> {
        let webinaire = self.get(id).await?;
        let of_webinaire = Filter::new().eq("webinaire_id", id);
        let inscriptions = self.state.repos.webinaire_inscriptions.count(&of_webinaire).await?;
        if inscriptions > 0 {
            return Err(ApiError::conflict(format!(
                "Webinaire has {} inscription(s) and cannot be deleted",
                inscriptions
            )));
        }

        self.state.repos.presentateurs.delete_where(&of_webinaire).await?;
        self.state.repos.webinaire_stats.delete_where(&of_webinaire).await?;
        self.state.repos.webinaires.delete(id).await?;
        record(&self.state, actor, AuditEvent::new("delete", "webinaire", id, &webinaire.titre), Some(&webinaire), None);
        Ok(())
    }

    // Inscriptions

    pub async fn list_inscriptions(
        &self,
        webinaire_id: Uuid,
        filters: WebinaireInscriptionFilters,
        page: PageRequest,
    ) -> Result<Paginated<WebinaireInscription>, ApiError> {
        self.get(webinaire_id).await?;
        let filter = Filter::new()
            .eq("webinaire_id", webinaire_id)
            .eq_opt("statut", filters.statut)
            .eq_opt("a_assiste", filters.a_assiste)
            .search(&["prenom", "nom", "email"], filters.search.as_deref())
            .order_asc("created_at");
        let (rows, total) = self
            .state
            .repos
            .webinaire_inscriptions
            .select_page(&filter, page.limit, page.offset())
            .await?;
        Ok(Paginated::new(rows, page, total))
    }

    async fn inscription_of(&self, webinaire_id: Uuid, id: Uuid) -> Result<WebinaireInscription, ApiError> {
        let inscription = self.state.repos.webinaire_inscriptions.select_404(id).await?;
        if inscription.webinaire_id != webinaire_id {
            return Err(ApiError::not_found(format!("inscriptions record {} not found", id)));
        }
        Ok(inscription)
    }

    async fn confirmed_count(&self, webinaire_id: Uuid) -> Result<i64, ApiError> {
        Ok(self
            .state
            .repos
            .webinaire_inscriptions
            .count(&Filter::new().eq("webinaire_id", webinaire_id).eq("statut", InscriptionStatus::Confirmed))
            .await?)
    }

    /// Rebuild and upsert the rollup row from the current inscriptions
    pub async fn refresh_stats(&self, webinaire_id: Uuid) -> Result<WebinaireStats, ApiError> {
        let repos = &self.state.repos;
        let of_webinaire = Filter::new().eq("webinaire_id", webinaire_id);
        let inscriptions = repos.webinaire_inscriptions.select_any(&of_webinaire).await?;

        match repos.webinaire_stats.select_one(&of_webinaire).await? {
            Some(existing) => {
                let stats = WebinaireStats::compute(existing.id, webinaire_id, &inscriptions, Utc::now());
                Ok(repos.webinaire_stats.update(&stats).await?)
            }
            None => {
                let stats = WebinaireStats::compute(Uuid::new_v4(), webinaire_id, &inscriptions, Utc::now());
                Ok(repos.webinaire_stats.insert(&stats).await?)
            }
        }
    }

    /// Shared by the admin screen and the public form; `actor` is `None` for the latter
    pub async fn create_inscription(
        &self,
        actor: Option<&Actor>,
        webinaire_id: Uuid,
        request: CreateWebinaireInscriptionRequest,
    ) -> Result<WebinaireInscription, ApiError> {
        let webinaire = self.get(webinaire_id).await?;
        if actor.is_none() && (!webinaire.is_active || webinaire.statut != WebinaireStatus::Publie) {
            return Err(ApiError::conflict("This webinaire is not open to inscriptions"));
        }
        ensure_capacity(self.confirmed_count(webinaire_id).await?, webinaire.capacite_max)?;

        let email = normalize_email(&request.email);
        let repo = &self.state.repos.webinaire_inscriptions;
        if repo.exists(&Filter::new().eq("webinaire_id", webinaire_id).eq("email", &email)).await? {
            return Err(ApiError::conflict("This email is already registered for the webinaire"));
        }

        let statut = match actor {
            Some(_) => request.statut.unwrap_or(InscriptionStatus::Pending),
            None => InscriptionStatus::Pending,
        };
        let now = Utc::now();
        let inscription = WebinaireInscription {
            id: Uuid::new_v4(),
            webinaire_id,
            prenom: request.prenom.trim().to_string(),
            nom: request.nom.trim().to_string(),
            email,
            statut,
            a_assiste: false,
            created_at: now,
            updated_at: now,
        };
        let inscription = repo.insert(&inscription).await?;
        self.refresh_stats(webinaire_id).await?;

        if let Some(actor) = actor {
            record(
                &self.state,
                actor,
                AuditEvent::new("create", "webinaire_inscription", inscription.id, &inscription.email),
                None,
                Some(&inscription),
            );
        }
        self.state.effects.notify(NotificationEvent::new(
            "webinaire.inscription",
            vec![inscription.email.clone()],
            format!("Inscription au webinaire {}", webinaire.titre),
            json!({
                "webinaire": webinaire.titre,
                "date": webinaire.date_webinaire,
                "heure": webinaire.heure_debut,
                "lien_visio": webinaire.lien_visio,
            }),
        ));
        Ok(inscription)
    }

    pub async fn update_inscription_status(
        &self,
        actor: &Actor,
        webinaire_id: Uuid,
        id: Uuid,
        request: WebinaireInscriptionStatusRequest,
    ) -> Result<WebinaireInscription, ApiError> {
        let before = self.inscription_of(webinaire_id, id).await?;
        if before.statut == request.statut {
            return Ok(before);
        }
        if request.statut == InscriptionStatus::Confirmed {
            let webinaire = self.get(webinaire_id).await?;
            ensure_capacity(self.confirmed_count(webinaire_id).await?, webinaire.capacite_max)?;
        }

        let mut after = WebinaireInscription { statut: request.statut, updated_at: Utc::now(), ..before.clone() };
        if after.statut != InscriptionStatus::Confirmed {
            after.a_assiste = false;
        }
        let after = self.state.repos.webinaire_inscriptions.update(&after).await?;
        self.refresh_stats(webinaire_id).await?;
        record(
            &self.state,
            actor,
            AuditEvent::new("update_status", "webinaire_inscription", id, &after.email),
            Some(&before),
            Some(&after),
        );
        Ok(after)
    }

    /// Attendance only makes sense for confirmed inscriptions
    pub async fn mark_attendance(
        &self,
        actor: &Actor,
        webinaire_id: Uuid,
        id: Uuid,
        request: AttendanceRequest,
    ) -> Result<WebinaireInscription, ApiError> {
        let before = self.inscription_of(webinaire_id, id).await?;
        if request.a_assiste && before.statut != InscriptionStatus::Confirmed {
            return Err(ApiError::conflict("Only confirmed inscriptions can be marked as attended"));
        }

        let after = WebinaireInscription { a_assiste: request.a_assiste, updated_at: Utc::now(), ..before.clone() };
        let after = self.state.repos.webinaire_inscriptions.update(&after).await?;
        self.refresh_stats(webinaire_id).await?;
        record(
            &self.state,
            actor,
            AuditEvent::new("attendance", "webinaire_inscription", id, &after.email),
            Some(&before),
            Some(&after),
        );
        Ok(after)
    }

    pub async fn delete_inscription(&self, actor: &Actor, webinaire_id: Uuid, id: Uuid) -> Result<(), ApiError> {
        let inscription = self.inscription_of(webinaire_id, id).await?;
        self.state.repos.webinaire_inscriptions.delete(id).await?;
        self.refresh_stats(webinaire_id).await?;
        record(
            &self.state,
            actor,
            AuditEvent::new("delete", "webinaire_inscription", id, &inscription.email),
            Some(&inscription),
            None,
        );
        Ok(())
    }

    // Présentateurs

    pub async fn list_presentateurs(&self, webinaire_id: Uuid) -> Result<Vec<Presentateur>, ApiError> {
        self.get(webinaire_id).await?;
        Ok(self
            .state
            .repos
            .presentateurs
            .select_any(&Filter::new().eq("webinaire_id", webinaire_id).order_asc("ordre"))
            .await?)
    }

    async fn presentateur_of(&self, webinaire_id: Uuid, id: Uuid) -> Result<Presentateur, ApiError> {
        let presentateur = self.state.repos.presentateurs.select_404(id).await?;
        if presentateur.webinaire_id != webinaire_id {
            return Err(ApiError::not_found(format!("presentateurs record {} not found", id)));
        }
        Ok(presentateur)
    }

    pub async fn create_presentateur(
        &self,
        actor: &Actor,
        webinaire_id: Uuid,
        request: CreatePresentateurRequest,
    ) -> Result<Presentateur, ApiError> {
        self.get(webinaire_id).await?;
        let ordre = match request.ordre {
            Some(ordre) => ordre,
            None => {
                self.state
                    .repos
                    .presentateurs
                    .count(&Filter::new().eq("webinaire_id", webinaire_id))
                    .await? as i32
                    + 1
            }
        };
        let presentateur = Presentateur {
            id: Uuid::new_v4(),
            webinaire_id,
            prenom: request.prenom.trim().to_string(),
            nom: request.nom.trim().to_string(),
            titre: request.titre,
            bio: request.bio,
            ordre,
            created_at: Utc::now(),
        };
        let presentateur = self.state.repos.presentateurs.insert(&presentateur).await?;
        record(
            &self.state,
            actor,
            AuditEvent::new("create", "presentateur", presentateur.id, format!("{} {}", presentateur.prenom, presentateur.nom)),
            None,
            Some(&presentateur),
        );
        Ok(presentateur)
    }

    pub async fn update_presentateur(
        &self,
        actor: &Actor,
        webinaire_id: Uuid,
        id: Uuid,
        request: UpdatePresentateurRequest,
    ) -> Result<Presentateur, ApiError> {
        let before = self.presentateur_of(webinaire_id, id).await?;
        let mut presentateur = before.clone();
        if let Some(v) = request.prenom {
            presentateur.prenom = v.trim().to_string();
        }
        if let Some(v) = request.nom {
            presentateur.nom = v.trim().to_string();
        }
        if let Some(v) = request.titre {
            presentateur.titre = v;
        }
        if let Some(v) = request.bio {
            presentateur.bio = v;
        }
        if let Some(v) = request.ordre {
            presentateur.ordre = v;
        }
        let presentateur = self.state.repos.presentateurs.update(&presentateur).await?;
        record(
            &self.state,
            actor,
            AuditEvent::new("update", "presentateur", id, format!("{} {}", presentateur.prenom, presentateur.nom)),
            Some(&before),
            Some(&presentateur),
        );
        Ok(presentateur)
    }

    pub async fn delete_presentateur(&self, actor: &Actor, webinaire_id: Uuid, id: Uuid) -> Result<(), ApiError> {
        let presentateur = self.presentateur_of(webinaire_id, id).await?;
        self.state.repos.presentateurs.delete(id).await?;
        record(
            &self.state,
            actor,
            AuditEvent::new("delete", "presentateur", id, format!("{} {}", presentateur.prenom, presentateur.nom)),
            Some(&presentateur),
            None,
        );
        Ok(())
    }

    // Stats

    /// Stored rollup of one webinar, built on first read
    pub async fn webinaire_stats(&self, webinaire_id: Uuid) -> Result<WebinaireStats, ApiError> {
        self.get(webinaire_id).await?;
        let stored = self
            .state
            .repos
            .webinaire_stats
            .select_one(&Filter::new().eq("webinaire_id", webinaire_id))
            .await?;
        match stored {
            Some(stats) => Ok(stats),
            None => self.refresh_stats(webinaire_id).await,
        }
    }

    pub async fn stats(&self) -> Result<WebinaireGlobalStats, ApiError> {
        let repos = &self.state.repos;
        let all = Filter::new();
        let by_status = |statut: WebinaireStatus| Filter::new().eq("statut", statut);
        let (brouillon, publie, termine, annule) = (
            by_status(WebinaireStatus::Brouillon),
            by_status(WebinaireStatus::Publie),
            by_status(WebinaireStatus::Termine),
            by_status(WebinaireStatus::Annule),
        );
        let confirmed = Filter::new().eq("statut", InscriptionStatus::Confirmed);
        let attended = Filter::new().eq("statut", InscriptionStatus::Confirmed).eq("a_assiste", true);

        let (webinaires_total, brouillons, publies, termines, annules, inscriptions_total, inscriptions_confirmees, presents) = futures::try_join!(
            repos.webinaires.count(&all),
            repos.webinaires.count(&brouillon),
            repos.webinaires.count(&publie),
            repos.webinaires.count(&termine),
            repos.webinaires.count(&annule),
            repos.webinaire_inscriptions.count(&all),
            repos.webinaire_inscriptions.count(&confirmed),
            repos.webinaire_inscriptions.count(&attended),
        )?;

        Ok(WebinaireGlobalStats {
            webinaires_total,
            brouillons,
            publies,
            termines,
            annules,
            inscriptions_total,
            inscriptions_confirmees,
            presents,
            taux_presence: percent(presents, inscriptions_confirmees),
        })
    }
}
