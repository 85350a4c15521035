use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::InscriptionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebinaireStatus {
    Brouillon,
    Publie,
    Termine,
    Annule,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Webinaire {
    pub id: Uuid,
    pub titre: String,
    pub slug: String,
    pub description: Option<String>,
    pub date_webinaire: NaiveDate,
    pub heure_debut: String,
    pub duree_minutes: Option<i32>,
    pub lien_visio: Option<String>,
    pub capacite_max: Option<i32>,
    pub statut: WebinaireStatus,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

entity!(Webinaire, "webinaire.webinaires");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebinaireInscription {
    pub id: Uuid,
    pub webinaire_id: Uuid,
    pub prenom: String,
    pub nom: String,
    pub email: String,
    pub statut: InscriptionStatus,
    pub a_assiste: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

entity!(WebinaireInscription, "webinaire.inscriptions");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Presentateur {
    pub id: Uuid,
    pub webinaire_id: Uuid,
    pub prenom: String,
    pub nom: String,
    pub titre: Option<String>,
    pub bio: Option<String>,
    pub ordre: i32,
    pub created_at: DateTime<Utc>,
}

entity!(Presentateur, "webinaire.presentateurs");

/// Per-webinar rollup, rebuilt from the inscriptions after each mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebinaireStats {
    pub id: Uuid,
    pub webinaire_id: Uuid,
    pub total_inscrits: i64,
    pub confirmes: i64,
    pub en_attente: i64,
    pub rejetes: i64,
    pub presents: i64,
    pub taux_presence: f64,
    pub updated_at: DateTime<Utc>,
}

entity!(WebinaireStats, "webinaire.stats");

impl WebinaireStats {
    /// Fold the current inscriptions of one webinar into its rollup.
    ///
    /// `taux_presence` is the share of confirmed inscriptions that attended,
    /// in percent with one decimal; zero when nobody is confirmed.
    pub fn compute(id: Uuid, webinaire_id: Uuid, inscriptions: &[WebinaireInscription], now: DateTime<Utc>) -> Self {
        let count = |status: InscriptionStatus| inscriptions.iter().filter(|i| i.statut == status).count() as i64;
        let confirmes = count(InscriptionStatus::Confirmed);
        let presents = inscriptions
            .iter()
            .filter(|i| i.statut == InscriptionStatus::Confirmed && i.a_assiste)
            .count() as i64;

        Self {
            id,
            webinaire_id,
            total_inscrits: inscriptions.len() as i64,
            confirmes,
            en_attente: count(InscriptionStatus::Pending),
            rejetes: count(InscriptionStatus::Rejected),
            presents,
            taux_presence: percent(presents, confirmes),
            updated_at: now,
        }
    }
}

/// `part / whole` as a percentage rounded to one decimal
pub fn percent(part: i64, whole: i64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 * 1000.0 / whole as f64).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inscription(statut: InscriptionStatus, a_assiste: bool) -> WebinaireInscription {
        WebinaireInscription {
            id: Uuid::new_v4(),
            webinaire_id: Uuid::nil(),
            prenom: "A".into(),
            nom: "B".into(),
            email: "a@b.org".into(),
            statut,
            a_assiste,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn rollup_counts_and_attendance_rate() {
        let rows = vec![
            inscription(InscriptionStatus::Confirmed, true),
            inscription(InscriptionStatus::Confirmed, true),
            inscription(InscriptionStatus::Confirmed, false),
            inscription(InscriptionStatus::Pending, false),
            inscription(InscriptionStatus::Rejected, false),
        ];
        let stats = WebinaireStats::compute(Uuid::new_v4(), Uuid::nil(), &rows, Utc::now());
        assert_eq!(stats.total_inscrits, 5);
        assert_eq!(stats.confirmes, 3);
        assert_eq!(stats.en_attente, 1);
        assert_eq!(stats.rejetes, 1);
        assert_eq!(stats.presents, 2);
        assert_eq!(stats.taux_presence, 66.7);
    }

    #[test]
    fn empty_webinar_has_zero_rate() {
        let stats = WebinaireStats::compute(Uuid::new_v4(), Uuid::nil(), &[], Utc::now());
        assert_eq!(stats.total_inscrits, 0);
        assert_eq!(stats.taux_presence, 0.0);
    }
}
