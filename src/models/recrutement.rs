use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeContrat {
    Cdi,
    Cdd,
    Stage,
    Benevolat,
    Freelance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffreStatus {
    Ouverte,
    Fermee,
    Pourvue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offre {
    pub id: Uuid,
    pub titre: String,
    pub slug: String,
    pub type_contrat: TypeContrat,
    pub description: Option<String>,
    pub localisation: Option<String>,
    pub date_limite: Option<NaiveDate>,
    pub statut: OffreStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

entity!(Offre, "recrutement.offres");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidatureStatus {
    Recue,
    EnRevue,
    Entretien,
    Acceptee,
    Refusee,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidature {
    pub id: Uuid,
    pub offre_id: Uuid,
    pub prenom: String,
    pub nom: String,
    pub email: String,
    pub cv_url: Option<String>,
    pub lettre: Option<String>,
    pub statut: CandidatureStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

entity!(Candidature, "recrutement.candidatures");
