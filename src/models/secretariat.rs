use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupeTravail {
    pub id: Uuid,
    pub nom: String,
    pub description: Option<String>,
    pub projet_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

entity!(GroupeTravail, "secretariat.groupes_travail");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupeMembre {
    pub id: Uuid,
    pub groupe_travail_id: Uuid,
    pub membre_id: Uuid,
    pub role: Option<String>,
    pub created_at: DateTime<Utc>,
}

entity!(GroupeMembre, "secretariat.groupes_membres");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projet {
    pub id: Uuid,
    pub titre: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

entity!(Projet, "secretariat.projets");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjetInscription {
    pub id: Uuid,
    pub projet_id: Uuid,
    pub prenom: String,
    pub nom: String,
    pub email: String,
    pub motivation: Option<String>,
    pub created_at: DateTime<Utc>,
}

entity!(ProjetInscription, "secretariat.projets_inscriptions");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeReunion {
    Ca,
    Bureau,
    Ag,
    GroupeTravail,
    Autre,
}

impl TypeReunion {
    pub const ALL: [TypeReunion; 5] =
        [TypeReunion::Ca, TypeReunion::Bureau, TypeReunion::Ag, TypeReunion::GroupeTravail, TypeReunion::Autre];

    pub fn as_str(&self) -> &'static str {
        match self {
            TypeReunion::Ca => "ca",
            TypeReunion::Bureau => "bureau",
            TypeReunion::Ag => "ag",
            TypeReunion::GroupeTravail => "groupe_travail",
            TypeReunion::Autre => "autre",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TypeReunion::Ca => "Conseil d'administration",
            TypeReunion::Bureau => "Bureau",
            TypeReunion::Ag => "Assemblée générale",
            TypeReunion::GroupeTravail => "Groupe de travail",
            TypeReunion::Autre => "Autre",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReunionStatus {
    Planifiee,
    Terminee,
    Annulee,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reunion {
    pub id: Uuid,
    pub type_reunion: TypeReunion,
    pub titre: String,
    pub description: Option<String>,
    pub date_reunion: NaiveDate,
    pub heure_debut: String,
    pub heure_fin: Option<String>,
    pub lieu: Option<String>,
    pub lien_visio: Option<String>,
    pub groupe_travail_id: Option<Uuid>,
    pub statut: ReunionStatus,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

entity!(Reunion, "secretariat.reunions");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    Envoye,
    Accepte,
    Refuse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Present,
    Absent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantReunion {
    pub id: Uuid,
    pub reunion_id: Uuid,
    pub membre_id: Uuid,
    pub statut_invitation: InvitationStatus,
    pub presence: Option<Presence>,
    pub motif_absence: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

entity!(ParticipantReunion, "secretariat.participants_reunion");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompteRendu {
    pub id: Uuid,
    pub reunion_id: Uuid,
    pub resume: Option<String>,
    pub decisions: Option<String>,
    pub actions_assignees: Option<String>,
    #[serde(default)]
    pub participants_list: Vec<String>,
    pub redige_par: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

entity!(CompteRendu, "secretariat.comptes_rendus");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    EnCours,
    Termine,
    Annule,
}

impl ActionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ActionStatus::EnCours => "En cours",
            ActionStatus::Termine => "Terminé",
            ActionStatus::Annule => "Annulé",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionItem {
    pub id: Uuid,
    pub reunion_id: Option<Uuid>,
    pub groupe_travail_id: Option<Uuid>,
    pub titre: String,
    pub description: Option<String>,
    pub assigne_a: Option<Uuid>,
    pub deadline: Option<NaiveDate>,
    pub statut: ActionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

entity!(ActionItem, "secretariat.actions");

impl ActionItem {
    /// Past its deadline and not yet done; never stored
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        match self.deadline {
            Some(deadline) => deadline < today && self.statut != ActionStatus::Termine,
            None => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionAssignee {
    pub id: Uuid,
    pub action_id: Uuid,
    pub membre_id: Uuid,
    pub created_at: DateTime<Utc>,
}

entity!(ActionAssignee, "secretariat.actions_assignees");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReunion {
    pub id: Uuid,
    pub reunion_id: Uuid,
    pub titre: String,
    pub url: String,
    pub type_document: Option<String>,
    pub created_at: DateTime<Utc>,
}

entity!(DocumentReunion, "secretariat.documents_reunion");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RapportPresidence {
    pub id: Uuid,
    pub date_debut: NaiveDate,
    pub date_fin: NaiveDate,
    pub resume: String,
    pub statistiques: Value,
    pub fichier: String,
    pub sha256: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

entity!(RapportPresidence, "secretariat.rapports_presidence");

/// Figures behind a presidency report, stored as its `statistiques` JSON
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PresidenceStats {
    pub reunions_total: i64,
    pub reunions_par_type: BTreeMap<String, i64>,
    pub reunions_terminees: i64,
    pub participants_total: i64,
    pub presents: i64,
    pub taux_participation: f64,
    pub actions_total: i64,
    pub actions_en_cours: i64,
    pub actions_terminees: i64,
    pub actions_annulees: i64,
    pub actions_en_retard: i64,
    pub documents: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(deadline: Option<NaiveDate>, statut: ActionStatus) -> ActionItem {
        ActionItem {
            id: Uuid::new_v4(),
            reunion_id: None,
            groupe_travail_id: None,
            titre: "Relancer".into(),
            description: None,
            assigne_a: None,
            deadline,
            statut,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn overdue_requires_past_deadline_and_open_status() {
        let today = date("2025-03-01");
        assert!(action(Some(date("2025-02-28")), ActionStatus::EnCours).is_overdue(today));
        assert!(action(Some(date("2025-02-28")), ActionStatus::Annule).is_overdue(today));
        assert!(!action(Some(date("2025-03-01")), ActionStatus::EnCours).is_overdue(today));
        assert!(!action(None, ActionStatus::EnCours).is_overdue(today));
    }

    #[test]
    fn finishing_an_action_clears_overdue_without_touching_deadline() {
        let today = date("2025-03-01");
        let mut item = action(Some(date("2025-01-15")), ActionStatus::EnCours);
        assert!(item.is_overdue(today));
        item.statut = ActionStatus::Termine;
        assert!(!item.is_overdue(today));
        assert_eq!(item.deadline, Some(date("2025-01-15")));
    }
}
