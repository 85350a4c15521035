use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Devise {
    #[serde(rename = "EUR")]
    Eur,
    #[serde(rename = "XOF")]
    Xof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CotisationStatus {
    EnAttente,
    Validee,
    Annulee,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cotisation {
    pub id: Uuid,
    pub membre_id: Uuid,
    pub annee: i32,
    pub montant: Decimal,
    pub devise: Devise,
    pub pays: Option<String>,
    pub mode_paiement: Option<String>,
    pub statut: CotisationStatus,
    pub validated_at: Option<DateTime<Utc>>,
    pub validated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

entity!(Cotisation, "tresorerie.cotisations");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaiementStatus {
    EnAttente,
    Valide,
    Rejete,
    Annule,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paiement {
    pub id: Uuid,
    pub membre_id: Option<Uuid>,
    pub cotisation_id: Option<Uuid>,
    pub objet: String,
    pub montant: Decimal,
    pub devise: Devise,
    pub pays: Option<String>,
    pub statut: PaiementStatus,
    pub date_paiement: NaiveDate,
    pub validated_at: Option<DateTime<Utc>>,
    pub validated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

entity!(Paiement, "tresorerie.paiements");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepenseStatus {
    EnAttente,
    Validee,
    Rejetee,
    Annulee,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Depense {
    pub id: Uuid,
    pub libelle: String,
    pub categorie: Option<String>,
    pub montant: Decimal,
    pub devise: Devise,
    pub date_depense: NaiveDate,
    pub justificatif_url: Option<String>,
    pub statut: DepenseStatus,
    pub validated_at: Option<DateTime<Utc>>,
    pub validated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

entity!(Depense, "tresorerie.depenses");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarteStatus {
    Active,
    Annulee,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarteMembre {
    pub id: Uuid,
    pub membre_id: Uuid,
    pub numero: String,
    pub annee: i32,
    pub date_emission: NaiveDate,
    pub date_expiration: NaiveDate,
    pub statut: CarteStatus,
    pub created_at: DateTime<Utc>,
}

entity!(CarteMembre, "tresorerie.cartes_membres");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoriqueTresorerie {
    pub id: Uuid,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub action: String,
    pub montant: Option<Decimal>,
    pub admin_id: Option<Uuid>,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

entity!(HistoriqueTresorerie, "tresorerie.historique");
