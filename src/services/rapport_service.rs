use std::collections::BTreeMap;

use chrono::{Days, NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::filter::Filter;
use crate::models::secretariat::{
    ActionItem, ActionStatus, ParticipantReunion, PresidenceStats, Presence, RapportPresidence, Reunion, ReunionStatus,
    TypeReunion,
};
use crate::models::webinaire::percent;
use crate::models::{PageRequest, Paginated};
use crate::pdf::{render_rapport_presidence, sha256_hex, PresidenceReport};
use crate::services::audit_service::{record, AuditEvent};
use crate::services::{today, Actor};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateRapportRequest {
    pub date_debut: NaiveDate,
    pub date_fin: NaiveDate,
}

/// Aggregates the activity of one period. Pure so it can be checked without a store.
pub fn compute_stats(
    reunions: &[Reunion],
    participants: &[ParticipantReunion],
    actions: &[ActionItem],
    documents: i64,
    today: NaiveDate,
) -> PresidenceStats {
    let mut reunions_par_type: BTreeMap<String, i64> =
        TypeReunion::ALL.iter().map(|t| (t.as_str().to_string(), 0)).collect();
    for reunion in reunions {
        *reunions_par_type.entry(reunion.type_reunion.as_str().to_string()).or_default() += 1;
    }

    let presents = participants.iter().filter(|p| p.presence == Some(Presence::Present)).count() as i64;
    let participants_total = participants.len() as i64;
    let count_actions = |statut: ActionStatus| actions.iter().filter(|a| a.statut == statut).count() as i64;

    PresidenceStats {
        reunions_total: reunions.len() as i64,
        reunions_par_type,
        reunions_terminees: reunions.iter().filter(|r| r.statut == ReunionStatus::Terminee).count() as i64,
        participants_total,
        presents,
        taux_participation: percent(presents, participants_total),
        actions_total: actions.len() as i64,
        actions_en_cours: count_actions(ActionStatus::EnCours),
        actions_terminees: count_actions(ActionStatus::Termine),
        actions_annulees: count_actions(ActionStatus::Annule),
        actions_en_retard: actions.iter().filter(|a| a.is_overdue(today)).count() as i64,
        documents,
    }
}

/// Plain-text digest printed at the top of the report
pub fn summarize(date_debut: NaiveDate, date_fin: NaiveDate, stats: &PresidenceStats) -> String {
    let par_type: Vec<String> = TypeReunion::ALL
        .iter()
        .filter_map(|t| {
            let n = stats.reunions_par_type.get(t.as_str()).copied().unwrap_or(0);
            (n > 0).then(|| format!("{} {}", n, t.label()))
        })
        .collect();

    let mut text = format!(
        "Du {} au {} : {} réunion(s) tenue(s)",
        date_debut.format("%d/%m/%Y"),
        date_fin.format("%d/%m/%Y"),
        stats.reunions_total
    );
    if !par_type.is_empty() {
        text.push_str(&format!(" ({})", par_type.join(", ")));
    }
    text.push_str(&format!(
        ", taux de participation {:.1} %. {} action(s) suivie(s) dont {} terminée(s), {} en cours et {} en retard. {} document(s) partagé(s).",
        stats.taux_participation,
        stats.actions_total,
        stats.actions_terminees,
        stats.actions_en_cours,
        stats.actions_en_retard,
        stats.documents
    ));
    text
}

pub fn rapport_filename(date_debut: NaiveDate, date_fin: NaiveDate, id: Uuid) -> String {
    let short = id.simple().to_string();
    format!("rapport-presidence-{}-{}-{}.pdf", date_debut, date_fin, &short[..8])
}

pub struct RapportService {
    state: AppState,
}

impl RapportService {
    pub fn new(state: &AppState) -> Self {
        Self { state: state.clone() }
    }

    pub async fn list(&self, page: PageRequest) -> Result<Paginated<RapportPresidence>, ApiError> {
        let filter = Filter::new().order_desc("created_at");
        let (rows, total) = self.state.repos.rapports.select_page(&filter, page.limit, page.offset()).await?;
        Ok(Paginated::new(rows, page, total))
    }

    pub async fn get(&self, id: Uuid) -> Result<RapportPresidence, ApiError> {
        Ok(self.state.repos.rapports.select_404(id).await?)
    }

    async fn period_stats(&self, date_debut: NaiveDate, date_fin: NaiveDate) -> Result<PresidenceStats, ApiError> {
        let repos = &self.state.repos;
        let reunions = repos
            .reunions
            .select_any(&Filter::new().gte("date_reunion", date_debut).lte("date_reunion", date_fin))
            .await?;
        let reunion_ids: Vec<Uuid> = reunions.iter().map(|r| r.id).collect();

        // Timestamps compare as text, so the upper bound is the next day, exclusive
        let fin_exclusive = date_fin.checked_add_days(Days::new(1)).unwrap_or(date_fin);
        let actions = repos
            .actions
            .select_any(&Filter::new().gte("created_at", date_debut).lt("created_at", fin_exclusive))
            .await?;

        let (participants, documents) = if reunion_ids.is_empty() {
            (Vec::new(), 0)
        } else {
            let of_reunions = Filter::new().is_in("reunion_id", reunion_ids.iter().copied());
            let (participants, documents) =
                futures::try_join!(repos.participants.select_any(&of_reunions), repos.documents.count(&of_reunions))?;
            (participants, documents)
        };

        Ok(compute_stats(&reunions, &participants, &actions, documents, today()))
    }

    /// Computes the figures, renders and stores the PDF, then persists the report row
    pub async fn create(&self, actor: &Actor, request: CreateRapportRequest) -> Result<RapportPresidence, ApiError> {
        if request.date_fin < request.date_debut {
            return Err(ApiError::invalid_field("date_fin", "date_fin must not be before date_debut"));
        }
        let stats = self.period_stats(request.date_debut, request.date_fin).await?;
        let resume = summarize(request.date_debut, request.date_fin, &stats);

        let bytes = render_rapport_presidence(&PresidenceReport {
            association: &self.state.config.reports.association_name,
            date_debut: request.date_debut,
            date_fin: request.date_fin,
            resume: &resume,
            stats: &stats,
        });

        let id = Uuid::new_v4();
        let fichier = rapport_filename(request.date_debut, request.date_fin, id);
        self.state.artifacts.put(&fichier, &bytes).await?;

        let rapport = RapportPresidence {
            id,
            date_debut: request.date_debut,
            date_fin: request.date_fin,
            resume,
            statistiques: serde_json::to_value(&stats).map_err(|e| ApiError::internal_with_details("Failed to encode report statistics", e.to_string()))?,
            fichier,
            sha256: sha256_hex(&bytes),
            created_by: Some(actor.id),
            created_at: Utc::now(),
        };
        let rapport = self.state.repos.rapports.insert(&rapport).await?;

        record(&self.state, actor, AuditEvent::new("create", "rapport_presidence", rapport.id, &rapport.fichier), None, Some(&rapport));
        tracing::info!(rapport = %rapport.id, fichier = %rapport.fichier, bytes = bytes.len(), "Presidency report generated");
        Ok(rapport)
    }

    pub async fn pdf(&self, id: Uuid) -> Result<(String, Vec<u8>), ApiError> {
        let rapport = self.get(id).await?;
        let bytes = self
            .state
            .artifacts
            .get(&rapport.fichier)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Report file {} is missing", rapport.fichier)))?;
        if sha256_hex(&bytes) != rapport.sha256 {
            tracing::warn!(rapport = %id, fichier = %rapport.fichier, "Stored report does not match its digest");
        }
        Ok((rapport.fichier, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::secretariat::InvitationStatus;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn reunion(type_reunion: TypeReunion, statut: ReunionStatus) -> Reunion {
        let now = Utc::now();
        Reunion {
            id: Uuid::new_v4(),
            type_reunion,
            titre: "Réunion".into(),
            description: None,
            date_reunion: date("2025-02-10"),
            heure_debut: "18:00".into(),
            heure_fin: None,
            lieu: None,
            lien_visio: None,
            groupe_travail_id: None,
            statut,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn participant(reunion_id: Uuid, presence: Option<Presence>) -> ParticipantReunion {
        let now = Utc::now();
        ParticipantReunion {
            id: Uuid::new_v4(),
            reunion_id,
            membre_id: Uuid::new_v4(),
            statut_invitation: InvitationStatus::Accepte,
            presence,
            motif_absence: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn action(deadline: Option<NaiveDate>, statut: ActionStatus) -> ActionItem {
        let now = Utc::now();
        ActionItem {
            id: Uuid::new_v4(),
            reunion_id: None,
            groupe_travail_id: None,
            titre: "Suivi".into(),
            description: None,
            assigne_a: None,
            deadline,
            statut,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn stats_cover_types_participation_and_actions() {
        let ca = reunion(TypeReunion::Ca, ReunionStatus::Terminee);
        let bureau = reunion(TypeReunion::Bureau, ReunionStatus::Planifiee);
        let participants = vec![
            participant(ca.id, Some(Presence::Present)),
            participant(ca.id, Some(Presence::Present)),
            participant(ca.id, Some(Presence::Absent)),
            participant(bureau.id, None),
        ];
        let actions = vec![
            action(Some(date("2025-01-01")), ActionStatus::EnCours),
            action(Some(date("2025-01-01")), ActionStatus::Termine),
            action(None, ActionStatus::Annule),
        ];

        let stats = compute_stats(&[ca, bureau], &participants, &actions, 2, date("2025-03-01"));
        assert_eq!(stats.reunions_total, 2);
        assert_eq!(stats.reunions_par_type["ca"], 1);
        assert_eq!(stats.reunions_par_type["ag"], 0);
        assert_eq!(stats.reunions_terminees, 1);
        assert_eq!(stats.taux_participation, 50.0);
        assert_eq!(stats.actions_total, 3);
        assert_eq!(stats.actions_en_retard, 1);
        assert_eq!(stats.documents, 2);
    }

    #[test]
    fn empty_period_yields_zeroes() {
        let stats = compute_stats(&[], &[], &[], 0, date("2025-03-01"));
        assert_eq!(stats.taux_participation, 0.0);
        let resume = summarize(date("2025-01-01"), date("2025-01-31"), &stats);
        assert!(resume.starts_with("Du 01/01/2025 au 31/01/2025 : 0 réunion(s)"));
    }

    #[test]
    fn filename_is_storage_safe() {
        let name = rapport_filename(date("2025-01-01"), date("2025-06-30"), Uuid::nil());
        assert_eq!(name, "rapport-presidence-2025-01-01-2025-06-30-00000000.pdf");
    }
}
