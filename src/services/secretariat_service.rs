use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::effects::notifier::NotificationEvent;
use crate::error::ApiError;
use crate::filter::Filter;
use crate::models::adhesion::Member;
use crate::models::secretariat::*;
use crate::models::{PageRequest, Paginated};
use crate::pdf::{render_compte_rendu, ActionLine, ParticipantLine, ReunionReport};
use crate::services::audit_service::{record, AuditEvent};
use crate::services::slug::slugify;
use crate::services::{double_option, normalize_email, slug_for, today, validate_heure, validate_not_blank, Actor};
use crate::state::AppState;

// Réunions

#[derive(Debug, Default, Deserialize)]
pub struct ReunionFilters {
    pub type_reunion: Option<TypeReunion>,
    pub statut: Option<ReunionStatus>,
    pub groupe_travail_id: Option<Uuid>,
    pub date_debut: Option<NaiveDate>,
    pub date_fin: Option<NaiveDate>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReunionRequest {
    pub type_reunion: TypeReunion,
    #[validate(custom(function = "validate_not_blank"))]
    pub titre: String,
    pub description: Option<String>,
    pub date_reunion: NaiveDate,
    #[validate(custom(function = "validate_heure"))]
    pub heure_debut: String,
    #[validate(custom(function = "validate_heure"))]
    pub heure_fin: Option<String>,
    pub lieu: Option<String>,
    #[validate(url(message = "Must be a valid URL"))]
    pub lien_visio: Option<String>,
    pub groupe_travail_id: Option<Uuid>,
    /// Extra invitees on top of the group members
    #[serde(default)]
    pub participants: Vec<Uuid>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateReunionRequest {
    pub type_reunion: Option<TypeReunion>,
    #[validate(custom(function = "validate_not_blank"))]
    pub titre: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub date_reunion: Option<NaiveDate>,
    #[validate(custom(function = "validate_heure"))]
    pub heure_debut: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub heure_fin: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub lieu: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub lien_visio: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub groupe_travail_id: Option<Option<Uuid>>,
    pub statut: Option<ReunionStatus>,
}

#[derive(Debug, Serialize)]
pub struct ParticipantView {
    #[serde(flatten)]
    pub participant: ParticipantReunion,
    pub nom: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AssigneeView {
    pub membre_id: Uuid,
    pub nom: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ActionView {
    #[serde(flatten)]
    pub action: ActionItem,
    pub assignees: Vec<AssigneeView>,
    pub en_retard: bool,
}

#[derive(Debug, Serialize)]
pub struct ReunionDetail {
    #[serde(flatten)]
    pub reunion: Reunion,
    pub groupe: Option<GroupeTravail>,
    pub participants: Vec<ParticipantView>,
    pub compte_rendu: Option<CompteRendu>,
    pub actions: Vec<ActionView>,
    pub documents: Vec<DocumentReunion>,
}

// Participants

#[derive(Debug, Deserialize)]
pub struct AddParticipantRequest {
    pub membre_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct InvitationRequest {
    pub statut_invitation: InvitationStatus,
}

#[derive(Debug, Deserialize)]
pub struct PresenceRequest {
    pub presence: Presence,
    pub motif_absence: Option<String>,
}

// Compte-rendu

#[derive(Debug, Default, Deserialize)]
pub struct SaveCompteRenduRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub resume: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub decisions: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub actions_assignees: Option<Option<String>>,
    pub participants_list: Option<Vec<String>>,
}

// Actions

#[derive(Debug, Default, Deserialize)]
pub struct ActionFilters {
    pub reunion_id: Option<Uuid>,
    pub groupe_travail_id: Option<Uuid>,
    pub statut: Option<ActionStatus>,
    pub assignee: Option<Uuid>,
    pub en_retard: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateActionRequest {
    pub reunion_id: Option<Uuid>,
    pub groupe_travail_id: Option<Uuid>,
    #[validate(custom(function = "validate_not_blank"))]
    pub titre: String,
    pub description: Option<String>,
    pub assignees: Option<Vec<Uuid>>,
    pub assigne_a: Option<Uuid>,
    pub deadline: Option<NaiveDate>,
    pub statut: Option<ActionStatus>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateActionRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub titre: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub assignees: Option<Vec<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    pub assigne_a: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    pub deadline: Option<Option<NaiveDate>>,
    pub statut: Option<ActionStatus>,
}

#[derive(Debug, Deserialize)]
pub struct ActionStatusRequest {
    pub statut: ActionStatus,
}

// Documents

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDocumentRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub titre: String,
    #[validate(url(message = "Must be a valid URL"))]
    pub url: String,
    pub type_document: Option<String>,
}

// Groupes et projets

#[derive(Debug, Default, Deserialize)]
pub struct GroupeFilters {
    pub is_active: Option<bool>,
    pub projet_id: Option<Uuid>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateGroupeRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub nom: String,
    pub description: Option<String>,
    pub projet_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateGroupeRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub nom: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub projet_id: Option<Option<Uuid>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct AddGroupeMembreRequest {
    pub membre_id: Uuid,
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GroupeMembreView {
    #[serde(flatten)]
    pub membre: GroupeMembre,
    pub nom: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GroupeDetail {
    #[serde(flatten)]
    pub groupe: GroupeTravail,
    pub membres: Vec<GroupeMembreView>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProjetFilters {
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjetRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub titre: String,
    pub slug: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProjetRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub titre: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProjetInscriptionRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub prenom: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub nom: String,
    #[validate(email(message = "Must be a valid email address"))]
    pub email: String,
    pub motivation: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SecretariatStats {
    pub reunions_total: i64,
    pub reunions_planifiees: i64,
    pub reunions_terminees: i64,
    pub reunions_annulees: i64,
    pub actions_en_cours: i64,
    pub actions_en_retard: i64,
    pub groupes_actifs: i64,
    pub projets_actifs: i64,
}

/// First-seen order, duplicates dropped
fn dedup(ids: impl IntoIterator<Item = Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

/// Assignee set an action ends up with: the list wins, a lone legacy `assigne_a` replaces the set
pub fn resolve_assignees(assignees: Option<Vec<Uuid>>, assigne_a: Option<Option<Uuid>>) -> Option<Vec<Uuid>> {
    match (assignees, assigne_a) {
        (Some(list), _) => Some(dedup(list)),
        (None, Some(Some(single))) => Some(vec![single]),
        (None, Some(None)) => Some(Vec::new()),
        (None, None) => None,
    }
}

/// `compte-rendu-<date>-<slug>.pdf`
pub fn compte_rendu_filename(reunion: &Reunion) -> String {
    let slug = slugify(&reunion.titre);
    if slug.is_empty() {
        format!("compte-rendu-{}.pdf", reunion.date_reunion)
    } else {
        format!("compte-rendu-{}-{}.pdf", reunion.date_reunion, slug)
    }
}

fn names_of(members: &HashMap<Uuid, Member>, id: Uuid) -> (Option<String>, Option<String>) {
    match members.get(&id) {
        Some(m) => (Some(m.display_name()), Some(m.email.clone())),
        None => (None, None),
    }
}

pub struct SecretariatService {
    state: AppState,
}

impl SecretariatService {
    pub fn new(state: &AppState) -> Self {
        Self { state: state.clone() }
    }

    async fn members_by_id(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Member>, ApiError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let members = self
            .state
            .repos
            .members
            .select_any(&Filter::new().is_in("id", ids.iter().copied()))
            .await?;
        Ok(members.into_iter().map(|m| (m.id, m)).collect())
    }

    async fn ensure_members_exist(&self, field: &str, ids: &[Uuid]) -> Result<(), ApiError> {
        let found = self.members_by_id(ids).await?;
        if let Some(missing) = ids.iter().find(|id| !found.contains_key(id)) {
            return Err(ApiError::invalid_field(field, format!("Unknown member {}", missing)));
        }
        Ok(())
    }

    // Réunions

    pub async fn list_reunions(&self, filters: ReunionFilters, page: PageRequest) -> Result<Paginated<Reunion>, ApiError> {
        let filter = Filter::new()
            .eq_opt("type_reunion", filters.type_reunion)
            .eq_opt("statut", filters.statut)
            .eq_opt("groupe_travail_id", filters.groupe_travail_id)
            .gte_opt("date_reunion", filters.date_debut)
            .lte_opt("date_reunion", filters.date_fin)
            .search(&["titre", "description", "lieu"], filters.search.as_deref())
            .order_desc("date_reunion")
            .order_desc("heure_debut");
        let (rows, total) = self.state.repos.reunions.select_page(&filter, page.limit, page.offset()).await?;
        Ok(Paginated::new(rows, page, total))
    }

    pub async fn get_reunion(&self, id: Uuid) -> Result<Reunion, ApiError> {
        Ok(self.state.repos.reunions.select_404(id).await?)
    }

    pub async fn reunion_detail(&self, id: Uuid) -> Result<ReunionDetail, ApiError> {
        let reunion = self.get_reunion(id).await?;
        let groupe = match reunion.groupe_travail_id {
            Some(groupe_id) => self.state.repos.groupes.get(groupe_id).await?,
            None => None,
        };
        let participants = self.list_participants(id).await?;
        let compte_rendu = self.find_compte_rendu(id).await?;
        let actions = self
            .action_views(
                self.state
                    .repos
                    .actions
                    .select_any(&Filter::new().eq("reunion_id", id).order_asc("created_at"))
                    .await?,
            )
            .await?;
        let documents = self.list_documents(id).await?;

        Ok(ReunionDetail { reunion, groupe, participants, compte_rendu, actions, documents })
    }

    /// Creates the meeting, invites the group members plus any extra invitees, queues the invitations
    pub async fn create_reunion(&self, actor: &Actor, request: CreateReunionRequest) -> Result<ReunionDetail, ApiError> {
        let mut invitees = Vec::new();
        if let Some(groupe_id) = request.groupe_travail_id {
            self.state
                .repos
                .groupes
                .get(groupe_id)
                .await?
                .ok_or_else(|| ApiError::invalid_field("groupe_travail_id", "Unknown groupe de travail"))?;
            let membres = self
                .state
                .repos
                .groupe_membres
                .select_any(&Filter::new().eq("groupe_travail_id", groupe_id).order_asc("created_at"))
                .await?;
            invitees.extend(membres.into_iter().map(|m| m.membre_id));
        }
        self.ensure_members_exist("participants", &request.participants).await?;
        invitees.extend(request.participants.iter().copied());
        let invitees = dedup(invitees);

        let now = Utc::now();
        let reunion = Reunion {
            id: Uuid::new_v4(),
            type_reunion: request.type_reunion,
            titre: request.titre.trim().to_string(),
            description: request.description,
            date_reunion: request.date_reunion,
            heure_debut: request.heure_debut,
            heure_fin: request.heure_fin,
            lieu: request.lieu,
            lien_visio: request.lien_visio,
            groupe_travail_id: request.groupe_travail_id,
            statut: ReunionStatus::Planifiee,
            created_by: Some(actor.id),
            created_at: now,
            updated_at: now,
        };
        let reunion = self.state.repos.reunions.insert(&reunion).await?;

        for membre_id in &invitees {
            self.state
                .repos
                .participants
                .insert(&ParticipantReunion {
                    id: Uuid::new_v4(),
                    reunion_id: reunion.id,
                    membre_id: *membre_id,
                    statut_invitation: InvitationStatus::Envoye,
                    presence: None,
                    motif_absence: None,
                    created_at: now,
                    updated_at: now,
                })
                .await?;
        }

        self.send_invitations(&reunion, &invitees).await?;
        let detail = self.reunion_detail(reunion.id).await?;

        record(&self.state, actor, AuditEvent::new("create", "reunion", reunion.id, &reunion.titre), None, Some(&reunion));
        tracing::info!(reunion = %reunion.id, invited = invitees.len(), "Reunion created");
        Ok(detail)
    }

    async fn send_invitations(&self, reunion: &Reunion, invitees: &[Uuid]) -> Result<(), ApiError> {
        let members = self.members_by_id(invitees).await?;
        let to: Vec<String> = invitees.iter().filter_map(|id| members.get(id)).map(|m| m.email.clone()).collect();
        if to.is_empty() {
            return Ok(());
        }
        self.state.effects.notify(NotificationEvent::new(
            "reunion.invitation",
            to,
            format!("Invitation : {}", reunion.titre),
            json!({
                "reunion_id": reunion.id,
                "titre": reunion.titre,
                "type": reunion.type_reunion.label(),
                "date": reunion.date_reunion,
                "heure_debut": reunion.heure_debut,
                "lieu": reunion.lieu,
                "lien_visio": reunion.lien_visio,
            }),
        ));
        Ok(())
    }

    pub async fn update_reunion(&self, actor: &Actor, id: Uuid, request: UpdateReunionRequest) -> Result<Reunion, ApiError> {
        let before = self.get_reunion(id).await?;
        let mut reunion = before.clone();

        if let Some(v) = request.type_reunion {
            reunion.type_reunion = v;
        }
        if let Some(v) = request.titre {
            reunion.titre = v.trim().to_string();
        }
        if let Some(v) = request.description {
            reunion.description = v;
        }
        if let Some(v) = request.date_reunion {
            reunion.date_reunion = v;
        }
        if let Some(v) = request.heure_debut {
            reunion.heure_debut = v;
        }
        if let Some(v) = request.heure_fin {
            if let Some(heure) = v.as_deref() {
                validate_heure(heure).map_err(|_| ApiError::invalid_field("heure_fin", "Must be a time formatted HH:MM"))?;
            }
            reunion.heure_fin = v;
        }
        if let Some(v) = request.lieu {
            reunion.lieu = v;
        }
        if let Some(v) = request.lien_visio {
            reunion.lien_visio = v;
        }
        if let Some(v) = request.groupe_travail_id {
            if let Some(groupe_id) = v {
                if self.state.repos.groupes.get(groupe_id).await?.is_none() {
                    return Err(ApiError::invalid_field("groupe_travail_id", "Unknown groupe de travail"));
                }
            }
            reunion.groupe_travail_id = v;
        }
        if let Some(v) = request.statut {
            reunion.statut = v;
        }
        reunion.updated_at = Utc::now();

        let reunion = self.state.repos.reunions.update(&reunion).await?;
        record(&self.state, actor, AuditEvent::new("update", "reunion", id, &reunion.titre), Some(&before), Some(&reunion));
        Ok(reunion)
    }

    /// Removes the meeting with its participants, minutes, documents and actions
    pub async fn delete_reunion(&self, actor: &Actor, id: Uuid) -> Result<(), ApiError> {
        let reunion = self.get_reunion(id).await?;
        let repos = &self.state.repos;
        let of_reunion = Filter::new().eq("reunion_id", id);

        let actions = repos.actions.select_any(&of_reunion).await?;
        if !actions.is_empty() {
            let action_ids: Vec<Uuid> = actions.iter().map(|a| a.id).collect();
            repos.action_assignees.delete_where(&Filter::new().is_in("action_id", action_ids)).await?;
        }
        repos.actions.delete_where(&of_reunion).await?;
        repos.participants.delete_where(&of_reunion).await?;
        repos.comptes_rendus.delete_where(&of_reunion).await?;
        repos.documents.delete_where(&of_reunion).await?;
        repos.reunions.delete(id).await?;

        record(&self.state, actor, AuditEvent::new("delete", "reunion", id, &reunion.titre), Some(&reunion), None);
        Ok(())
    }

    // Participants

    pub async fn list_participants(&self, reunion_id: Uuid) -> Result<Vec<ParticipantView>, ApiError> {
        let participants = self
            .state
            .repos
            .participants
            .select_any(&Filter::new().eq("reunion_id", reunion_id).order_asc("created_at"))
            .await?;
        let ids: Vec<Uuid> = participants.iter().map(|p| p.membre_id).collect();
        let members = self.members_by_id(&ids).await?;

        let mut views: Vec<ParticipantView> = participants
            .into_iter()
            .map(|participant| {
                let (nom, email) = names_of(&members, participant.membre_id);
                ParticipantView { participant, nom, email }
            })
            .collect();
        views.sort_by(|a, b| a.nom.cmp(&b.nom));
        Ok(views)
    }

    async fn participant_of(&self, reunion_id: Uuid, id: Uuid) -> Result<ParticipantReunion, ApiError> {
        let participant = self.state.repos.participants.select_404(id).await?;
        if participant.reunion_id != reunion_id {
            return Err(ApiError::not_found(format!("participants_reunion record {} not found", id)));
        }
        Ok(participant)
    }

    pub async fn add_participant(
        &self,
        actor: &Actor,
        reunion_id: Uuid,
        request: AddParticipantRequest,
    ) -> Result<ParticipantReunion, ApiError> {
        let reunion = self.get_reunion(reunion_id).await?;
        self.ensure_members_exist("membre_id", &[request.membre_id]).await?;
        let repo = &self.state.repos.participants;
        if repo
            .exists(&Filter::new().eq("reunion_id", reunion_id).eq("membre_id", request.membre_id))
            .await?
        {
            return Err(ApiError::conflict("This member is already invited to the reunion"));
        }

        let now = Utc::now();
        let participant = repo
            .insert(&ParticipantReunion {
                id: Uuid::new_v4(),
                reunion_id,
                membre_id: request.membre_id,
                statut_invitation: InvitationStatus::Envoye,
                presence: None,
                motif_absence: None,
                created_at: now,
                updated_at: now,
            })
            .await?;
        record(
            &self.state,
            actor,
            AuditEvent::new("add_participant", "reunion", reunion_id, &reunion.titre),
            None,
            Some(&participant),
        );
        self.send_invitations(&reunion, &[request.membre_id]).await?;
        Ok(participant)
    }

    pub async fn update_invitation(
        &self,
        actor: &Actor,
        reunion_id: Uuid,
        id: Uuid,
        request: InvitationRequest,
    ) -> Result<ParticipantReunion, ApiError> {
        let before = self.participant_of(reunion_id, id).await?;
        let after = ParticipantReunion {
            statut_invitation: request.statut_invitation,
            updated_at: Utc::now(),
            ..before.clone()
        };
        let after = self.state.repos.participants.update(&after).await?;
        record(&self.state, actor, AuditEvent::new("update_invitation", "participant", id, reunion_id.to_string()), Some(&before), Some(&after));
        Ok(after)
    }

    /// `present` clears any absence reason, `absent` keeps the optional one given
    pub async fn record_presence(
        &self,
        actor: &Actor,
        reunion_id: Uuid,
        id: Uuid,
        request: PresenceRequest,
    ) -> Result<ParticipantReunion, ApiError> {
        let before = self.participant_of(reunion_id, id).await?;
        let motif_absence = match request.presence {
            Presence::Present => None,
            Presence::Absent => request.motif_absence.map(|m| m.trim().to_string()).filter(|m| !m.is_empty()),
        };
        let after = ParticipantReunion {
            presence: Some(request.presence),
            motif_absence,
            updated_at: Utc::now(),
            ..before.clone()
        };
        let after = self.state.repos.participants.update(&after).await?;
        record(&self.state, actor, AuditEvent::new("presence", "participant", id, reunion_id.to_string()), Some(&before), Some(&after));
        Ok(after)
    }

    pub async fn remove_participant(&self, actor: &Actor, reunion_id: Uuid, id: Uuid) -> Result<(), ApiError> {
        let participant = self.participant_of(reunion_id, id).await?;
        self.state.repos.participants.delete(id).await?;
        record(&self.state, actor, AuditEvent::new("remove_participant", "reunion", reunion_id, id.to_string()), Some(&participant), None);
        Ok(())
    }

    // Compte-rendu

    async fn find_compte_rendu(&self, reunion_id: Uuid) -> Result<Option<CompteRendu>, ApiError> {
        Ok(self
            .state
            .repos
            .comptes_rendus
            .select_one(&Filter::new().eq("reunion_id", reunion_id))
            .await?)
    }

    pub async fn get_compte_rendu(&self, reunion_id: Uuid) -> Result<CompteRendu, ApiError> {
        self.get_reunion(reunion_id).await?;
        self.find_compte_rendu(reunion_id)
            .await?
            .ok_or_else(|| ApiError::not_found("No compte-rendu recorded for this reunion"))
    }

    /// Display names of the participants marked present
    async fn present_names(&self, reunion_id: Uuid) -> Result<Vec<String>, ApiError> {
        Ok(self
            .list_participants(reunion_id)
            .await?
            .into_iter()
            .filter(|p| p.participant.presence == Some(Presence::Present))
            .filter_map(|p| p.nom)
            .collect())
    }

    /// Upsert keyed by reunion; a first save without a roster takes the present participants
    pub async fn save_compte_rendu(
        &self,
        actor: &Actor,
        reunion_id: Uuid,
        request: SaveCompteRenduRequest,
    ) -> Result<CompteRendu, ApiError> {
        let reunion = self.get_reunion(reunion_id).await?;
        let now = Utc::now();

        match self.find_compte_rendu(reunion_id).await? {
            Some(before) => {
                let mut cr = before.clone();
                if let Some(v) = request.resume {
                    cr.resume = v;
                }
                if let Some(v) = request.decisions {
                    cr.decisions = v;
                }
                if let Some(v) = request.actions_assignees {
                    cr.actions_assignees = v;
                }
                if let Some(v) = request.participants_list {
                    cr.participants_list = v;
                }
                cr.redige_par = Some(actor.id);
                cr.updated_at = now;
                let cr = self.state.repos.comptes_rendus.update(&cr).await?;
                record(&self.state, actor, AuditEvent::new("update", "compte_rendu", cr.id, &reunion.titre), Some(&before), Some(&cr));
                Ok(cr)
            }
            None => {
                let participants_list = match request.participants_list {
                    Some(list) => list,
                    None => self.present_names(reunion_id).await?,
                };
                let cr = CompteRendu {
                    id: Uuid::new_v4(),
                    reunion_id,
                    resume: request.resume.flatten(),
                    decisions: request.decisions.flatten(),
                    actions_assignees: request.actions_assignees.flatten(),
                    participants_list,
                    redige_par: Some(actor.id),
                    created_at: now,
                    updated_at: now,
                };
                let cr = self.state.repos.comptes_rendus.insert(&cr).await?;
                record(&self.state, actor, AuditEvent::new("create", "compte_rendu", cr.id, &reunion.titre), None, Some(&cr));
                Ok(cr)
            }
        }
    }

    // Actions

    async fn action_views(&self, actions: Vec<ActionItem>) -> Result<Vec<ActionView>, ApiError> {
        if actions.is_empty() {
            return Ok(Vec::new());
        }
        let links = self
            .state
            .repos
            .action_assignees
            .select_any(&Filter::new().is_in("action_id", actions.iter().map(|a| a.id)).order_asc("created_at"))
            .await?;
        let member_ids = dedup(links.iter().map(|l| l.membre_id));
        let members = self.members_by_id(&member_ids).await?;

        let mut by_action: HashMap<Uuid, Vec<AssigneeView>> = HashMap::new();
        for link in links {
            let (nom, _) = names_of(&members, link.membre_id);
            by_action.entry(link.action_id).or_default().push(AssigneeView { membre_id: link.membre_id, nom });
        }

        let today = today();
        Ok(actions
            .into_iter()
            .map(|action| ActionView {
                en_retard: action.is_overdue(today),
                assignees: by_action.remove(&action.id).unwrap_or_default(),
                action,
            })
            .collect())
    }

    pub async fn list_actions(&self, filters: ActionFilters, page: PageRequest) -> Result<Paginated<ActionView>, ApiError> {
        let mut filter = Filter::new()
            .eq_opt("reunion_id", filters.reunion_id)
            .eq_opt("groupe_travail_id", filters.groupe_travail_id)
            .eq_opt("statut", filters.statut)
            .order_asc("deadline")
            .order_desc("created_at");

        if let Some(membre_id) = filters.assignee {
            let links = self
                .state
                .repos
                .action_assignees
                .select_any(&Filter::new().eq("membre_id", membre_id))
                .await?;
            if links.is_empty() {
                return Ok(Paginated::new(Vec::new(), page, 0));
            }
            filter = filter.is_in("id", links.into_iter().map(|l| l.action_id));
        }

        let today = today();
        let (rows, total) = match filters.en_retard {
            Some(true) => {
                let overdue = filter.lt("deadline", today).neq("statut", ActionStatus::Termine);
                self.state.repos.actions.select_page(&overdue, page.limit, page.offset()).await?
            }
            Some(false) => {
                let on_time: Vec<ActionItem> = self
                    .state
                    .repos
                    .actions
                    .select_any(&filter)
                    .await?
                    .into_iter()
                    .filter(|a| !a.is_overdue(today))
                    .collect();
                let total = on_time.len() as i64;
                let rows = on_time.into_iter().skip(page.offset() as usize).take(page.limit as usize).collect();
                (rows, total)
            }
            None => self.state.repos.actions.select_page(&filter, page.limit, page.offset()).await?,
        };

        Ok(Paginated::new(self.action_views(rows).await?, page, total))
    }

    pub async fn get_action(&self, id: Uuid) -> Result<ActionView, ApiError> {
        let action = self.state.repos.actions.select_404(id).await?;
        let mut views = self.action_views(vec![action]).await?;
        views.pop().ok_or_else(|| ApiError::not_found(format!("actions record {} not found", id)))
    }

    async fn replace_assignees(&self, action_id: Uuid, membres: &[Uuid]) -> Result<(), ApiError> {
        let repo = &self.state.repos.action_assignees;
        repo.delete_where(&Filter::new().eq("action_id", action_id)).await?;
        let now = Utc::now();
        for membre_id in membres {
            repo.insert(&ActionAssignee { id: Uuid::new_v4(), action_id, membre_id: *membre_id, created_at: now })
                .await?;
        }
        Ok(())
    }

    pub async fn create_action(&self, actor: &Actor, request: CreateActionRequest) -> Result<ActionView, ApiError> {
        if request.reunion_id.is_none() && request.groupe_travail_id.is_none() {
            return Err(ApiError::invalid_field(
                "reunion_id",
                "An action belongs to a reunion or a groupe de travail",
            ));
        }
        if let Some(reunion_id) = request.reunion_id {
            if self.state.repos.reunions.get(reunion_id).await?.is_none() {
                return Err(ApiError::invalid_field("reunion_id", "Unknown reunion"));
            }
        }
        if let Some(groupe_id) = request.groupe_travail_id {
            if self.state.repos.groupes.get(groupe_id).await?.is_none() {
                return Err(ApiError::invalid_field("groupe_travail_id", "Unknown groupe de travail"));
            }
        }
        let assignees = resolve_assignees(request.assignees, request.assigne_a.map(Some)).unwrap_or_default();
        self.ensure_members_exist("assignees", &assignees).await?;

        let now = Utc::now();
        let action = ActionItem {
            id: Uuid::new_v4(),
            reunion_id: request.reunion_id,
            groupe_travail_id: request.groupe_travail_id,
            titre: request.titre.trim().to_string(),
            description: request.description,
            assigne_a: assignees.first().copied(),
            deadline: request.deadline,
            statut: request.statut.unwrap_or(ActionStatus::EnCours),
            created_at: now,
            updated_at: now,
        };
        let action = self.state.repos.actions.insert(&action).await?;
        self.replace_assignees(action.id, &assignees).await?;
        let view = self.get_action(action.id).await?;

        record(&self.state, actor, AuditEvent::new("create", "action", action.id, &action.titre), None, Some(&action));
        Ok(view)
    }

    pub async fn update_action(&self, actor: &Actor, id: Uuid, request: UpdateActionRequest) -> Result<ActionView, ApiError> {
        let before = self.state.repos.actions.select_404(id).await?;
        let mut action = before.clone();

        if let Some(v) = request.titre {
            action.titre = v.trim().to_string();
        }
        if let Some(v) = request.description {
            action.description = v;
        }
        if let Some(v) = request.deadline {
            action.deadline = v;
        }
        if let Some(v) = request.statut {
            action.statut = v;
        }
        let assignees = resolve_assignees(request.assignees, request.assigne_a);
        if let Some(list) = assignees.as_deref() {
            self.ensure_members_exist("assignees", list).await?;
            action.assigne_a = list.first().copied();
        }
        action.updated_at = Utc::now();

        let action = self.state.repos.actions.update(&action).await?;
        if let Some(list) = assignees {
            self.replace_assignees(id, &list).await?;
        }
        let view = self.get_action(id).await?;
        record(&self.state, actor, AuditEvent::new("update", "action", id, &action.titre), Some(&before), Some(&action));
        Ok(view)
    }

    pub async fn change_action_status(&self, actor: &Actor, id: Uuid, request: ActionStatusRequest) -> Result<ActionView, ApiError> {
        let before = self.state.repos.actions.select_404(id).await?;
        let after = ActionItem { statut: request.statut, updated_at: Utc::now(), ..before.clone() };
        let after = self.state.repos.actions.update(&after).await?;
        let view = self.get_action(id).await?;
        record(&self.state, actor, AuditEvent::new("update_status", "action", id, &after.titre), Some(&before), Some(&after));
        Ok(view)
    }

    pub async fn delete_action(&self, actor: &Actor, id: Uuid) -> Result<(), ApiError> {
        let action = self.state.repos.actions.select_404(id).await?;
        self.state.repos.action_assignees.delete_where(&Filter::new().eq("action_id", id)).await?;
        self.state.repos.actions.delete(id).await?;
        record(&self.state, actor, AuditEvent::new("delete", "action", id, &action.titre), Some(&action), None);
        Ok(())
    }

    // Documents

    pub async fn list_documents(&self, reunion_id: Uuid) -> Result<Vec<DocumentReunion>, ApiError> {
        Ok(self
            .state
            .repos
            .documents
            .select_any(&Filter::new().eq("reunion_id", reunion_id).order_asc("created_at"))
            .await?)
    }

    pub async fn add_document(&self, actor: &Actor, reunion_id: Uuid, request: CreateDocumentRequest) -> Result<DocumentReunion, ApiError> {
        self.get_reunion(reunion_id).await?;
        let document = DocumentReunion {
            id: Uuid::new_v4(),
            reunion_id,
            titre: request.titre.trim().to_string(),
            url: request.url,
            type_document: request.type_document,
            created_at: Utc::now(),
        };
        let document = self.state.repos.documents.insert(&document).await?;
        record(&self.state, actor, AuditEvent::new("create", "document", document.id, &document.titre), None, Some(&document));
        Ok(document)
    }

    pub async fn delete_document(&self, actor: &Actor, reunion_id: Uuid, id: Uuid) -> Result<(), ApiError> {
        let document = self.state.repos.documents.select_404(id).await?;
        if document.reunion_id != reunion_id {
            return Err(ApiError::not_found(format!("documents_reunion record {} not found", id)));
        }
        self.state.repos.documents.delete(id).await?;
        record(&self.state, actor, AuditEvent::new("delete", "document", id, &document.titre), Some(&document), None);
        Ok(())
    }

    // Groupes de travail

    pub async fn list_groupes(&self, filters: GroupeFilters, page: PageRequest) -> Result<Paginated<GroupeTravail>, ApiError> {
        let filter = Filter::new()
            .eq_opt("is_active", filters.is_active)
            .eq_opt("projet_id", filters.projet_id)
            .search(&["nom", "description"], filters.search.as_deref())
            .order_asc("nom");
        let (rows, total) = self.state.repos.groupes.select_page(&filter, page.limit, page.offset()).await?;
        Ok(Paginated::new(rows, page, total))
    }

    pub async fn get_groupe(&self, id: Uuid) -> Result<GroupeDetail, ApiError> {
        let groupe = self.state.repos.groupes.select_404(id).await?;
        let membres = self.list_groupe_membres(id).await?;
        Ok(GroupeDetail { groupe, membres })
    }

    async fn ensure_projet(&self, projet_id: Option<Uuid>) -> Result<(), ApiError> {
        if let Some(id) = projet_id {
            if self.state.repos.projets.get(id).await?.is_none() {
                return Err(ApiError::invalid_field("projet_id", "Unknown projet"));
            }
        }
        Ok(())
    }

    pub async fn create_groupe(&self, actor: &Actor, request: CreateGroupeRequest) -> Result<GroupeTravail, ApiError> {
        self.ensure_projet(request.projet_id).await?;
        let groupe = GroupeTravail {
            id: Uuid::new_v4(),
            nom: request.nom.trim().to_string(),
            description: request.description,
            projet_id: request.projet_id,
            is_active: true,
            created_at: Utc::now(),
        };
        let groupe = self.state.repos.groupes.insert(&groupe).await?;
        record(&self.state, actor, AuditEvent::new("create", "groupe_travail", groupe.id, &groupe.nom), None, Some(&groupe));
        Ok(groupe)
    }

    pub async fn update_groupe(&self, actor: &Actor, id: Uuid, request: UpdateGroupeRequest) -> Result<GroupeTravail, ApiError> {
        let before = self.state.repos.groupes.select_404(id).await?;
        let mut groupe = before.clone();
        if let Some(v) = request.nom {
            groupe.nom = v.trim().to_string();
        }
        if let Some(v) = request.description {
            groupe.description = v;
        }
        if let Some(v) = request.projet_id {
            self.ensure_projet(v).await?;
            groupe.projet_id = v;
        }
        if let Some(v) = request.is_active {
            groupe.is_active = v;
        }
        let groupe = self.state.repos.groupes.update(&groupe).await?;
        record(&self.state, actor, AuditEvent::new("update", "groupe_travail", id, &groupe.nom), Some(&before), Some(&groupe));
        Ok(groupe)
    }

    /// Refused while meetings still point at the group; deactivate it instead
    pub async fn delete_groupe(&self, actor: &Actor, id: Uuid) -> Result<(), ApiError> {
        let groupe = self.state.repos.groupes.select_404(id).await?;
        let of_groupe = Filter::new().eq("groupe_travail_id", id);
        if self.state.repos.reunions.exists(&of_groupe).await? || self.state.repos.actions.exists(&of_groupe).await? {
            return Err(ApiError::conflict("Groupe has reunions or actions and cannot be deleted; deactivate it instead"));
        }
        self.state.repos.groupe_membres.delete_where(&of_groupe).await?;
        self.state.repos.groupes.delete(id).await?;
        record(&self.state, actor, AuditEvent::new("delete", "groupe_travail", id, &groupe.nom), Some(&groupe), None);
        Ok(())
    }

    pub async fn list_groupe_membres(&self, groupe_id: Uuid) -> Result<Vec<GroupeMembreView>, ApiError> {
        let membres = self
            .state
            .repos
            .groupe_membres
            .select_any(&Filter::new().eq("groupe_travail_id", groupe_id).order_asc("created_at"))
            .await?;
        let ids: Vec<Uuid> = membres.iter().map(|m| m.membre_id).collect();
        let members = self.members_by_id(&ids).await?;
        Ok(membres
            .into_iter()
            .map(|membre| {
                let (nom, email) = names_of(&members, membre.membre_id);
                GroupeMembreView { membre, nom, email }
            })
            .collect())
    }

    pub async fn add_groupe_membre(&self, actor: &Actor, groupe_id: Uuid, request: AddGroupeMembreRequest) -> Result<GroupeMembre, ApiError> {
        let groupe = self.state.repos.groupes.select_404(groupe_id).await?;
        self.ensure_members_exist("membre_id", &[request.membre_id]).await?;
        let repo = &self.state.repos.groupe_membres;
        if repo
            .exists(&Filter::new().eq("groupe_travail_id", groupe_id).eq("membre_id", request.membre_id))
            .await?
        {
            return Err(ApiError::conflict("This member already belongs to the groupe"));
        }
        let membre = repo
            .insert(&GroupeMembre {
                id: Uuid::new_v4(),
                groupe_travail_id: groupe_id,
                membre_id: request.membre_id,
                role: request.role.filter(|r| !r.trim().is_empty()),
                created_at: Utc::now(),
            })
            .await?;
        record(&self.state, actor, AuditEvent::new("add_membre", "groupe_travail", groupe_id, &groupe.nom), None, Some(&membre));
        Ok(membre)
    }

    pub async fn remove_groupe_membre(&self, actor: &Actor, groupe_id: Uuid, id: Uuid) -> Result<(), ApiError> {
        let membre = self.state.repos.groupe_membres.select_404(id).await?;
        if membre.groupe_travail_id != groupe_id {
            return Err(ApiError::not_found(format!("groupes_membres record {} not found", id)));
        }
        self.state.repos.groupe_membres.delete(id).await?;
        record(&self.state, actor, AuditEvent::new("remove_membre", "groupe_travail", groupe_id, id.to_string()), Some(&membre), None);
        Ok(())
    }

    // Projets

    pub async fn list_projets(&self, filters: ProjetFilters, page: PageRequest) -> Result<Paginated<Projet>, ApiError> {
        let filter = Filter::new()
            .eq_opt("is_active", filters.is_active)
            .search(&["titre", "description"], filters.search.as_deref())
            .order_asc("titre");
        let (rows, total) = self.state.repos.projets.select_page(&filter, page.limit, page.offset()).await?;
        Ok(Paginated::new(rows, page, total))
    }

    pub async fn get_projet(&self, id: Uuid) -> Result<Projet, ApiError> {
        Ok(self.state.repos.projets.select_404(id).await?)
    }

    async fn ensure_projet_slug_free(&self, slug: &str, except: Option<Uuid>) -> Result<(), ApiError> {
        let mut filter = Filter::new().eq("slug", slug);
        if let Some(id) = except {
            filter = filter.neq("id", id);
        }
        if self.state.repos.projets.exists(&filter).await? {
            return Err(ApiError::conflict(format!("A projet with slug '{}' already exists", slug)));
        }
        Ok(())
    }

    pub async fn create_projet(&self, actor: &Actor, request: CreateProjetRequest) -> Result<Projet, ApiError> {
        let slug = slug_for(request.slug.as_deref(), &request.titre)?;
        self.ensure_projet_slug_free(&slug, None).await?;
        let projet = Projet {
            id: Uuid::new_v4(),
            titre: request.titre.trim().to_string(),
            slug,
            description: request.description,
            is_active: true,
            created_at: Utc::now(),
        };
        let projet = self.state.repos.projets.insert(&projet).await?;
        record(&self.state, actor, AuditEvent::new("create", "projet", projet.id, &projet.titre), None, Some(&projet));
        Ok(projet)
    }

    pub async fn update_projet(&self, actor: &Actor, id: Uuid, request: UpdateProjetRequest) -> Result<Projet, ApiError> {
        let before = self.get_projet(id).await?;
        let mut projet = before.clone();
        if let Some(slug) = request.slug.as_deref() {
            let slug = slug_for(Some(slug), &projet.titre)?;
            if slug != projet.slug {
                self.ensure_projet_slug_free(&slug, Some(id)).await?;
                projet.slug = slug;
            }
        }
        if let Some(v) = request.titre {
            projet.titre = v.trim().to_string();
        }
        if let Some(v) = request.description {
            projet.description = v;
        }
        if let Some(v) = request.is_active {
            projet.is_active = v;
        }
        let projet = self.state.repos.projets.update(&projet).await?;
        record(&self.state, actor, AuditEvent::new("update", "projet", id, &projet.titre), Some(&before), Some(&projet));
        Ok(projet)
    }

    pub async fn list_projet_inscriptions(&self, projet_id: Uuid, page: PageRequest) -> Result<Paginated<ProjetInscription>, ApiError> {
        self.get_projet(projet_id).await?;
        let filter = Filter::new().eq("projet_id", projet_id).order_desc("created_at");
        let (rows, total) = self
            .state
            .repos
            .projet_inscriptions
            .select_page(&filter, page.limit, page.offset())
            .await?;
        Ok(Paginated::new(rows, page, total))
    }

    /// Public sign-up to a project; one inscription per email and project
    pub async fn create_projet_inscription(&self, projet_id: Uuid, request: ProjetInscriptionRequest) -> Result<ProjetInscription, ApiError> {
        let projet = self.get_projet(projet_id).await?;
        if !projet.is_active {
            return Err(ApiError::conflict("This projet is closed to inscriptions"));
        }
        let email = normalize_email(&request.email);
        let repo = &self.state.repos.projet_inscriptions;
        if repo.exists(&Filter::new().eq("projet_id", projet_id).eq("email", &email)).await? {
            return Err(ApiError::conflict("This email is already registered for the projet"));
        }

        let inscription = repo
            .insert(&ProjetInscription {
                id: Uuid::new_v4(),
                projet_id,
                prenom: request.prenom.trim().to_string(),
                nom: request.nom.trim().to_string(),
                email,
                motivation: request.motivation,
                created_at: Utc::now(),
            })
            .await?;
        self.state.effects.notify(NotificationEvent::new(
            "projet.inscription",
            vec![inscription.email.clone()],
            format!("Inscription au projet {}", projet.titre),
            json!({ "projet": projet.titre, "prenom": inscription.prenom }),
        ));
        Ok(inscription)
    }

    // PDF et stats

    /// Minutes of one meeting rendered as a PDF attachment
    pub async fn reunion_pdf(&self, id: Uuid) -> Result<(String, Vec<u8>), ApiError> {
        let detail = self.reunion_detail(id).await?;

        let participants: Vec<ParticipantLine> = detail
            .participants
            .iter()
            .map(|p| ParticipantLine {
                nom: p.nom.clone().unwrap_or_else(|| "Membre inconnu".to_string()),
                statut_invitation: p.participant.statut_invitation,
                presence: p.participant.presence,
                motif_absence: p.participant.motif_absence.clone(),
            })
            .collect();
        let actions: Vec<ActionLine> = detail
            .actions
            .iter()
            .map(|a| ActionLine {
                titre: a.action.titre.clone(),
                assignees: a.assignees.iter().filter_map(|x| x.nom.clone()).collect(),
                deadline: a.action.deadline,
                statut: a.action.statut,
                en_retard: a.en_retard,
            })
            .collect();

        let bytes = render_compte_rendu(&ReunionReport {
            association: &self.state.config.reports.association_name,
            reunion: &detail.reunion,
            groupe: detail.groupe.as_ref().map(|g| g.nom.as_str()),
            participants: &participants,
            compte_rendu: detail.compte_rendu.as_ref(),
            actions: &actions,
        });
        Ok((compte_rendu_filename(&detail.reunion), bytes))
    }

    pub async fn stats(&self) -> Result<SecretariatStats, ApiError> {
        let repos = &self.state.repos;
        let all = Filter::new();
        let planned = Filter::new().eq("statut", ReunionStatus::Planifiee);
        let finished = Filter::new().eq("statut", ReunionStatus::Terminee);
        let cancelled = Filter::new().eq("statut", ReunionStatus::Annulee);
        let open = Filter::new().eq("statut", ActionStatus::EnCours);
        let overdue = Filter::new().lt("deadline", today()).neq("statut", ActionStatus::Termine);
        let active = Filter::new().eq("is_active", true);

        let (reunions_total, reunions_planifiees, reunions_terminees, reunions_annulees, actions_en_cours, actions_en_retard, groupes_actifs, projets_actifs) = futures::try_join!(
            repos.reunions.count(&all),
            repos.reunions.count(&planned),
            repos.reunions.count(&finished),
            repos.reunions.count(&cancelled),
            repos.actions.count(&open),
            repos.actions.count(&overdue),
            repos.groupes.count(&active),
            repos.projets.count(&active),
        )?;

        Ok(SecretariatStats {
            reunions_total,
            reunions_planifiees,
            reunions_terminees,
            reunions_annulees,
            actions_en_cours,
            actions_en_retard,
            groupes_actifs,
            projets_actifs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignee_list_wins_over_legacy_field() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(resolve_assignees(Some(vec![a, b, a]), Some(Some(b))), Some(vec![a, b]));
        assert_eq!(resolve_assignees(None, Some(Some(b))), Some(vec![b]));
        assert_eq!(resolve_assignees(None, Some(None)), Some(vec![]));
        assert_eq!(resolve_assignees(None, None), None);
    }

    #[test]
    fn pdf_filename_uses_date_and_slug() {
        let now = Utc::now();
        let reunion = Reunion {
            id: Uuid::new_v4(),
            type_reunion: TypeReunion::Ca,
            titre: "Conseil d'administration : bilan".into(),
            description: None,
            date_reunion: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            heure_debut: "18:30".into(),
            heure_fin: None,
            lieu: None,
            lien_visio: None,
            groupe_travail_id: None,
            statut: ReunionStatus::Planifiee,
            created_by: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(compte_rendu_filename(&reunion), "compte-rendu-2025-03-14-conseil-d-administration-bilan.pdf");
    }
}
