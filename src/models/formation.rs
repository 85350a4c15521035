use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::InscriptionStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Formation {
    pub id: Uuid,
    pub titre: String,
    pub slug: String,
    pub description: Option<String>,
    pub categorie: Option<String>,
    pub niveau: Option<String>,
    pub duree_heures: Option<i32>,
    pub prix: Option<Decimal>,
    pub participants_max: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

entity!(Formation, "formation.formations");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Planifiee,
    EnCours,
    Terminee,
    Annulee,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormationSession {
    pub id: Uuid,
    pub formation_id: Uuid,
    pub date_debut: NaiveDate,
    pub date_fin: Option<NaiveDate>,
    pub lieu: Option<String>,
    pub formateur: Option<String>,
    pub statut: SessionStatus,
    pub created_at: DateTime<Utc>,
}

entity!(FormationSession, "formation.sessions");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormationInscription {
    pub id: Uuid,
    pub formation_id: Uuid,
    pub session_id: Option<Uuid>,
    pub prenom: String,
    pub nom: String,
    pub email: String,
    pub telephone: Option<String>,
    pub statut: InscriptionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

entity!(FormationInscription, "formation.inscriptions");
