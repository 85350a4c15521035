use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_MENTOR_CAPACITY: i32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mentor {
    pub id: Uuid,
    pub prenom: String,
    pub nom: String,
    pub email: String,
    pub expertise: Option<String>,
    pub capacite_max: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

entity!(Mentor, "mentorat.mentors");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MentoreStatus {
    EnAttente,
    Accompagne,
    Termine,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mentore {
    pub id: Uuid,
    pub prenom: String,
    pub nom: String,
    pub email: String,
    pub objectifs: Option<String>,
    pub statut: MentoreStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

entity!(Mentore, "mentorat.mentores");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinomeStatus {
    Actif,
    Suspendu,
    Termine,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Binome {
    pub id: Uuid,
    pub mentor_id: Uuid,
    pub mentore_id: Uuid,
    pub statut: BinomeStatus,
    pub date_debut: NaiveDate,
    pub date_fin: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

entity!(Binome, "mentorat.binomes");
