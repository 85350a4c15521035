use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::filter::Filter;
use crate::models::mentorat::*;
use crate::models::{PageRequest, Paginated};
use crate::services::audit_service::{record, AuditEvent};
use crate::services::{double_option, normalize_email, today, validate_not_blank, Actor};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct MentorFilters {
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMentorRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub prenom: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub nom: String,
    #[validate(email(message = "Must be a valid email address"))]
    pub email: String,
    pub expertise: Option<String>,
    #[validate(range(min = 1, max = 50, message = "capacite_max must be between 1 and 50"))]
    pub capacite_max: Option<i32>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateMentorRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub prenom: Option<String>,
    #[validate(custom(function = "validate_not_blank"))]
    pub nom: Option<String>,
    #[validate(email(message = "Must be a valid email address"))]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub expertise: Option<Option<String>>,
    #[validate(range(min = 1, max = 50, message = "capacite_max must be between 1 and 50"))]
    pub capacite_max: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MentoreFilters {
    pub statut: Option<MentoreStatus>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMentoreRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub prenom: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub nom: String,
    #[validate(email(message = "Must be a valid email address"))]
    pub email: String,
    pub objectifs: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateMentoreRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub prenom: Option<String>,
    #[validate(custom(function = "validate_not_blank"))]
    pub nom: Option<String>,
    #[validate(email(message = "Must be a valid email address"))]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub objectifs: Option<Option<String>>,
    pub statut: Option<MentoreStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BinomeFilters {
    pub mentor_id: Option<Uuid>,
    pub mentore_id: Option<Uuid>,
    pub statut: Option<BinomeStatus>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBinomeRequest {
    pub mentor_id: Uuid,
    pub mentore_id: Uuid,
    pub date_debut: Option<chrono::NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BinomeStatusRequest {
    pub statut: BinomeStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MentorView {
    #[serde(flatten)]
    pub mentor: Mentor,
    pub binomes_actifs: i64,
}

#[derive(Debug, Serialize)]
pub struct MentoratStats {
    pub mentors_actifs: i64,
    pub mentores_total: i64,
    pub mentores_en_attente: i64,
    pub mentores_accompagnes: i64,
    pub binomes_actifs: i64,
    pub binomes_termines: i64,
}

fn active_binomes_of_mentor(mentor_id: Uuid) -> Filter {
    Filter::new().eq("mentor_id", mentor_id).eq("statut", BinomeStatus::Actif)
}

fn active_binomes_of_mentore(mentore_id: Uuid) -> Filter {
    Filter::new().eq("mentore_id", mentore_id).eq("statut", BinomeStatus::Actif)
}

/// An inactive mentor takes no one; an active one takes up to `capacite_max`
pub fn ensure_mentor_available(mentor: &Mentor, actifs: i64) -> Result<(), ApiError> {
    if !mentor.is_active {
        return Err(ApiError::conflict("Mentor is not active"));
    }
    if actifs >= i64::from(mentor.capacite_max) {
        return Err(ApiError::conflict(format!(
            "Mentor capacity reached: {} active binome(s) out of {}",
            actifs, mentor.capacite_max
        )));
    }
    Ok(())
}

/// Mentoré status that follows a binôme status change, if any
pub fn mentore_status_for(statut: BinomeStatus) -> Option<MentoreStatus> {
    match statut {
        BinomeStatus::Actif => Some(MentoreStatus::Accompagne),
        BinomeStatus::Termine => Some(MentoreStatus::Termine),
        BinomeStatus::Suspendu => None,
    }
}

pub struct MentoratService {
    state: AppState,
}

impl MentoratService {
    pub fn new(state: &AppState) -> Self {
        Self { state: state.clone() }
    }

    // Mentors

    pub async fn list_mentors(&self, filters: MentorFilters, page: PageRequest) -> Result<Paginated<Mentor>, ApiError> {
        let filter = Filter::new()
            .eq_opt("is_active", filters.is_active)
            .search(&["prenom", "nom", "email", "expertise"], filters.search.as_deref())
            .order_asc("nom");
        let (rows, total) = self.state.repos.mentors.select_page(&filter, page.limit, page.offset()).await?;
        Ok(Paginated::new(rows, page, total))
    }

    pub async fn get_mentor(&self, id: Uuid) -> Result<MentorView, ApiError> {
        let mentor = self.state.repos.mentors.select_404(id).await?;
        let binomes_actifs = self.state.repos.binomes.count(&active_binomes_of_mentor(id)).await?;
        Ok(MentorView { mentor, binomes_actifs })
    }

    async fn ensure_mentor_email_free(&self, email: &str, except: Option<Uuid>) -> Result<(), ApiError> {
        let mut filter = Filter::new().eq("email", email);
        if let Some(id) = except {
            filter = filter.neq("id", id);
        }
        if self.state.repos.mentors.exists(&filter).await? {
            return Err(ApiError::conflict(format!("A mentor with email '{}' already exists", email)));
        }
        Ok(())
    }

    pub async fn create_mentor(&self, actor: &Actor, request: CreateMentorRequest) -> Result<Mentor, ApiError> {
        let email = normalize_email(&request.email);
        self.ensure_mentor_email_free(&email, None).await?;
        let now = Utc::now();
        let mentor = Mentor {
            id: Uuid::new_v4(),
            prenom: request.prenom.trim().to_string(),
            nom: request.nom.trim().to_string(),
            email,
            expertise: request.expertise,
            capacite_max: request.capacite_max.unwrap_or(DEFAULT_MENTOR_CAPACITY),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let mentor = self.state.repos.mentors.insert(&mentor).await?;
        record(&self.state, actor, AuditEvent::new("create", "mentor", mentor.id, &mentor.email), None, Some(&mentor));
        Ok(mentor)
    }

    pub async fn update_mentor(&self, actor: &Actor, id: Uuid, request: UpdateMentorRequest) -> Result<Mentor, ApiError> {
        let before = self.state.repos.mentors.select_404(id).await?;
        let mut mentor = before.clone();

        if let Some(email) = request.email.as_deref().map(normalize_email) {
            if email != mentor.email {
                self.ensure_mentor_email_free(&email, Some(id)).await?;
                mentor.email = email;
            }
        }
        if let Some(v) = request.prenom {
            mentor.prenom = v.trim().to_string();
        }
        if let Some(v) = request.nom {
            mentor.nom = v.trim().to_string();
        }
        if let Some(v) = request.expertise {
            mentor.expertise = v;
        }
        if let Some(capacite) = request.capacite_max {
            let actifs = self.state.repos.binomes.count(&active_binomes_of_mentor(id)).await?;
            if i64::from(capacite) < actifs {
                return Err(ApiError::conflict(format!(
                    "Mentor already has {} active binome(s); capacite_max cannot go below that",
                    actifs
                )));
            }
            mentor.capacite_max = capacite;
        }
        if let Some(v) = request.is_active {
            mentor.is_active = v;
        }
        mentor.updated_at = Utc::now();

        let mentor = self.state.repos.mentors.update(&mentor).await?;
        record(&self.state, actor, AuditEvent::new("update", "mentor", id, &mentor.email), Some(&before), Some(&mentor));
        Ok(mentor)
    }

    /// Refused once the mentor has been paired; deactivate instead
    pub async fn delete_mentor(&self, actor: &Actor, id: Uuid) -> Result<(), ApiError> {
        let mentor = self.state.repos.mentors.select_404(id).await?;
        if self.state.repos.binomes.exists(&Filter::new().eq("mentor_id", id)).await? {
            return Err(ApiError::conflict("Mentor has binomes and cannot be deleted; deactivate it instead"));
        }
        self.state.repos.mentors.delete(id).await?;
        record(&self.state, actor, AuditEvent::new("delete", "mentor", id, &mentor.email), Some(&mentor), None);
        Ok(())
    }

    // Mentorés

    pub async fn list_mentores(&self, filters: MentoreFilters, page: PageRequest) -> Result<Paginated<Mentore>, ApiError> {
        let filter = Filter::new()
            .eq_opt("statut", filters.statut)
            .search(&["prenom", "nom", "email", "objectifs"], filters.search.as_deref())
            .order_desc("created_at");
        let (rows, total) = self.state.repos.mentores.select_page(&filter, page.limit, page.offset()).await?;
        Ok(Paginated::new(rows, page, total))
    }

    pub async fn get_mentore(&self, id: Uuid) -> Result<Mentore, ApiError> {
        Ok(self.state.repos.mentores.select_404(id).await?)
    }

    async fn ensure_mentore_email_free(&self, email: &str, except: Option<Uuid>) -> Result<(), ApiError> {
        let mut filter = Filter::new().eq("email", email);
        if let Some(id) = except {
            filter = filter.neq("id", id);
        }
        if self.state.repos.mentores.exists(&filter).await? {
            return Err(ApiError::conflict(format!("A mentore with email '{}' already exists", email)));
        }
        Ok(())
    }

    pub async fn create_mentore(&self, actor: &Actor, request: CreateMentoreRequest) -> Result<Mentore, ApiError> {
        let email = normalize_email(&request.email);
        self.ensure_mentore_email_free(&email, None).await?;
        let now = Utc::now();
        let mentore = Mentore {
            id: Uuid::new_v4(),
            prenom: request.prenom.trim().to_string(),
            nom: request.nom.trim().to_string(),
            email,
            objectifs: request.objectifs,
            statut: MentoreStatus::EnAttente,
            created_at: now,
            updated_at: now,
        };
        let mentore = self.state.repos.mentores.insert(&mentore).await?;
        record(&self.state, actor, AuditEvent::new("create", "mentore", mentore.id, &mentore.email), None, Some(&mentore));
        Ok(mentore)
    }

    pub async fn update_mentore(&self, actor: &Actor, id: Uuid, request: UpdateMentoreRequest) -> Result<Mentore, ApiError> {
        let before = self.get_mentore(id).await?;
        let mut mentore = before.clone();

        if let Some(email) = request.email.as_deref().map(normalize_email) {
            if email != mentore.email {
                self.ensure_mentore_email_free(&email, Some(id)).await?;
                mentore.email = email;
            }
        }
        if let Some(v) = request.prenom {
            mentore.prenom = v.trim().to_string();
        }
        if let Some(v) = request.nom {
            mentore.nom = v.trim().to_string();
        }
        if let Some(v) = request.objectifs {
            mentore.objectifs = v;
        }
        if let Some(v) = request.statut {
            mentore.statut = v;
        }
        mentore.updated_at = Utc::now();

        let mentore = self.state.repos.mentores.update(&mentore).await?;
        record(&self.state, actor, AuditEvent::new("update", "mentore", id, &mentore.email), Some(&before), Some(&mentore));
        Ok(mentore)
    }

    pub async fn delete_mentore(&self, actor: &Actor, id: Uuid) -> Result<(), ApiError> {
        let mentore = self.get_mentore(id).await?;
        if self.state.repos.binomes.exists(&Filter::new().eq("mentore_id", id)).await? {
            return Err(ApiError::conflict("Mentore has binomes and cannot be deleted"));
        }
        self.state.repos.mentores.delete(id).await?;
        record(&self.state, actor, AuditEvent::new("delete", "mentore", id, &mentore.email), Some(&mentore), None);
        Ok(())
    }

    // Binômes

    pub async fn list_binomes(&self, filters: BinomeFilters, page: PageRequest) -> Result<Paginated<Binome>, ApiError> {
        let filter = Filter::new()
            .eq_opt("mentor_id", filters.mentor_id)
            .eq_opt("mentore_id", filters.mentore_id)
            .eq_opt("statut", filters.statut)
            .order_desc("date_debut");
        let (rows, total) = self.state.repos.binomes.select_page(&filter, page.limit, page.offset()).await?;
        Ok(Paginated::new(rows, page, total))
    }

    pub async fn get_binome(&self, id: Uuid) -> Result<Binome, ApiError> {
        Ok(self.state.repos.binomes.select_404(id).await?)
    }

    /// Mentor must be active and under capacity; the mentoré must not already be paired
    async fn check_pairing(&self, mentor: &Mentor, mentore_id: Uuid, except: Option<Uuid>) -> Result<(), ApiError> {
        let binomes = &self.state.repos.binomes;
        let skip = |filter: Filter| match except {
            Some(id) => filter.neq("id", id),
            None => filter,
        };
        let actifs = binomes.count(&skip(active_binomes_of_mentor(mentor.id))).await?;
        ensure_mentor_available(mentor, actifs)?;
        if binomes.exists(&skip(active_binomes_of_mentore(mentore_id))).await? {
            return Err(ApiError::conflict("Mentore already has an active binome"));
        }
        Ok(())
    }

    pub async fn create_binome(&self, actor: &Actor, request: CreateBinomeRequest) -> Result<Binome, ApiError> {
        let mentor = self
            .state
            .repos
            .mentors
            .get(request.mentor_id)
            .await?
            .ok_or_else(|| ApiError::invalid_field("mentor_id", "Unknown mentor"))?;
        let mut mentore = self
            .state
            .repos
            .mentores
            .get(request.mentore_id)
            .await?
            .ok_or_else(|| ApiError::invalid_field("mentore_id", "Unknown mentore"))?;
        self.check_pairing(&mentor, mentore.id, None).await?;

        let now = Utc::now();
        let binome = Binome {
            id: Uuid::new_v4(),
            mentor_id: mentor.id,
            mentore_id: mentore.id,
            statut: BinomeStatus::Actif,
            date_debut: request.date_debut.unwrap_or_else(today),
            date_fin: None,
            notes: request.notes,
            created_at: now,
            updated_at: now,
        };
        let binome = self.state.repos.binomes.insert(&binome).await?;

        mentore.statut = MentoreStatus::Accompagne;
        mentore.updated_at = now;
        self.state.repos.mentores.update(&mentore).await?;

        record(
            &self.state,
            actor,
            AuditEvent::new("create", "binome", binome.id, format!("{} / {}", mentor.email, mentore.email)),
            None,
            Some(&binome),
        );
        Ok(binome)
    }

    /// Moving back to `actif` re-checks capacity and exclusivity; ending a pairing stamps `date_fin`
    pub async fn update_binome_status(&self, actor: &Actor, id: Uuid, request: BinomeStatusRequest) -> Result<Binome, ApiError> {
        let before = self.get_binome(id).await?;
        if before.statut == request.statut && request.notes.is_none() {
            return Ok(before);
        }
        if request.statut == BinomeStatus::Actif && before.statut != BinomeStatus::Actif {
            let mentor = self.state.repos.mentors.select_404(before.mentor_id).await?;
            self.check_pairing(&mentor, before.mentore_id, Some(id)).await?;
        }

        let mut binome = before.clone();
        binome.statut = request.statut;
        binome.date_fin = match request.statut {
            BinomeStatus::Termine => Some(before.date_fin.unwrap_or_else(today)),
            _ => None,
        };
        if let Some(notes) = request.notes {
            binome.notes = Some(notes);
        }
        binome.updated_at = Utc::now();
        let binome = self.state.repos.binomes.update(&binome).await?;

        if let Some(statut) = mentore_status_for(binome.statut) {
            if let Some(mut mentore) = self.state.repos.mentores.get(binome.mentore_id).await? {
                mentore.statut = statut;
                mentore.updated_at = Utc::now();
                self.state.repos.mentores.update(&mentore).await?;
            }
        }

        record(&self.state, actor, AuditEvent::new("update_status", "binome", id, id.to_string()), Some(&before), Some(&binome));
        Ok(binome)
    }

    pub async fn delete_binome(&self, actor: &Actor, id: Uuid) -> Result<(), ApiError> {
        let binome = self.get_binome(id).await?;
        self.state.repos.binomes.delete(id).await?;
        record(&self.state, actor, AuditEvent::new("delete", "binome", id, id.to_string()), Some(&binome), None);
        Ok(())
    }

    pub async fn stats(&self) -> Result<MentoratStats, ApiError> {
        let repos = &self.state.repos;
        let active = Filter::new().eq("is_active", true);
        let all = Filter::new();
        let waiting = Filter::new().eq("statut", MentoreStatus::EnAttente);
        let followed = Filter::new().eq("statut", MentoreStatus::Accompagne);
        let running = Filter::new().eq("statut", BinomeStatus::Actif);
        let ended = Filter::new().eq("statut", BinomeStatus::Termine);

        let (mentors_actifs, mentores_total, mentores_en_attente, mentores_accompagnes, binomes_actifs, binomes_termines) = futures::try_join!(
            repos.mentors.count(&active),
            repos.mentores.count(&all),
            repos.mentores.count(&waiting),
            repos.mentores.count(&followed),
            repos.binomes.count(&running),
            repos.binomes.count(&ended),
        )?;

        Ok(MentoratStats {
            mentors_actifs,
            mentores_total,
            mentores_en_attente,
            mentores_accompagnes,
            binomes_actifs,
            binomes_termines,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mentor(capacite_max: i32, is_active: bool) -> Mentor {
        let now = Utc::now();
        Mentor {
            id: Uuid::new_v4(),
            prenom: "Awa".into(),
            nom: "Diop".into(),
            email: "awa@example.org".into(),
            expertise: None,
            capacite_max,
            is_active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn capacity_is_inclusive_upper_bound() {
        let m = mentor(DEFAULT_MENTOR_CAPACITY, true);
        assert!(ensure_mentor_available(&m, 0).is_ok());
        assert!(ensure_mentor_available(&m, 2).is_ok());
        let err = ensure_mentor_available(&m, 3).unwrap_err();
        assert_eq!(err.status_code(), 409);
    }

    #[test]
    fn inactive_mentor_takes_no_one() {
        let err = ensure_mentor_available(&mentor(5, false), 0).unwrap_err();
        assert_eq!(err.status_code(), 409);
        assert!(err.message().contains("not active"));
    }

    #[test]
    fn suspension_leaves_mentore_untouched() {
        assert_eq!(mentore_status_for(BinomeStatus::Actif), Some(MentoreStatus::Accompagne));
        assert_eq!(mentore_status_for(BinomeStatus::Termine), Some(MentoreStatus::Termine));
        assert_eq!(mentore_status_for(BinomeStatus::Suspendu), None);
    }
}
