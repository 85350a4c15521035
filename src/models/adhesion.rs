use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    pub prenom: String,
    pub nom: String,
    pub email: String,
    pub telephone: Option<String>,
    pub pays: Option<String>,
    pub ville: Option<String>,
    pub niveau_etudes: Option<String>,
    pub domaine_etudes: Option<String>,
    pub etablissement: Option<String>,
    pub statut: MemberStatus,
    pub numero_membre: Option<String>,
    pub motif_rejet: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

entity!(Member, "adhesion.membres");

impl Member {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.prenom, self.nom)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BureauMember {
    pub id: Uuid,
    pub prenom: String,
    pub nom: String,
    pub poste: String,
    pub photo_url: Option<String>,
    pub email: Option<String>,
    pub ordre: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

entity!(BureauMember, "adhesion.bureau");
