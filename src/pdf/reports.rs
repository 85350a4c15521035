use chrono::NaiveDate;

use super::layout::{DocumentBuilder, TextStyle};
use super::writer::DocumentInfo;
use crate::models::secretariat::{
    ActionStatus, CompteRendu, InvitationStatus, Presence, PresidenceStats, Reunion, TypeReunion,
};

/// One row of the participant roster
#[derive(Debug, Clone)]
pub struct ParticipantLine {
    pub nom: String,
    pub statut_invitation: InvitationStatus,
    pub presence: Option<Presence>,
    pub motif_absence: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ActionLine {
    pub titre: String,
    pub assignees: Vec<String>,
    pub deadline: Option<NaiveDate>,
    pub statut: ActionStatus,
    pub en_retard: bool,
}

pub struct ReunionReport<'a> {
    pub association: &'a str,
    pub reunion: &'a Reunion,
    pub groupe: Option<&'a str>,
    pub participants: &'a [ParticipantLine],
    pub compte_rendu: Option<&'a CompteRendu>,
    pub actions: &'a [ActionLine],
}

pub struct PresidenceReport<'a> {
    pub association: &'a str,
    pub date_debut: NaiveDate,
    pub date_fin: NaiveDate,
    pub resume: &'a str,
    pub stats: &'a PresidenceStats,
}

fn fr_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

fn roster_section(doc: &mut DocumentBuilder, label: &str, rows: &[&ParticipantLine]) {
    doc.paragraph(&format!("{} ({})", label, rows.len()), TextStyle::BODY.indented(0.0));
    if rows.is_empty() {
        doc.paragraph("Aucun", TextStyle::NOTE.indented(12.0));
        return;
    }
    for row in rows {
        match row.motif_absence.as_deref().filter(|m| !m.trim().is_empty()) {
            Some(motif) => doc.bullet(&format!("{} (motif : {})", row.nom, motif)),
            None => doc.bullet(&row.nom),
        }
    }
}

fn text_section(doc: &mut DocumentBuilder, title: &str, body: Option<&str>) {
    doc.heading(title);
    match body.map(str::trim).filter(|b| !b.is_empty()) {
        Some(text) => doc.paragraph(text, TextStyle::BODY),
        None => doc.paragraph("Non renseigné", TextStyle::NOTE),
    }
}

/// Minutes of one meeting: metadata, roster by presence, minutes text, actions
pub fn render_compte_rendu(report: &ReunionReport<'_>) -> Vec<u8> {
    let reunion = report.reunion;
    let title = format!("Compte-rendu : {}", reunion.titre);
    let mut doc = DocumentBuilder::new(
        DocumentInfo { title: title.clone(), author: report.association.to_string() },
        format!("{} - {}", report.association, reunion.titre),
    );

    doc.title(&reunion.titre);
    doc.paragraph(
        &format!("{} du {} à {}", reunion.type_reunion.label(), fr_date(reunion.date_reunion), reunion.heure_debut),
        TextStyle::BODY,
    );
    if let Some(fin) = reunion.heure_fin.as_deref() {
        doc.field("Fin", fin);
    }
    if let Some(lieu) = reunion.lieu.as_deref() {
        doc.field("Lieu", lieu);
    }
    if let Some(lien) = reunion.lien_visio.as_deref() {
        doc.field("Visioconférence", lien);
    }
    if let Some(groupe) = report.groupe {
        doc.field("Groupe de travail", groupe);
    }
    if let Some(description) = reunion.description.as_deref().filter(|d| !d.trim().is_empty()) {
        doc.paragraph(description, TextStyle::NOTE);
    }

    if !report.participants.is_empty() {
        doc.heading("Participants");
        let presents: Vec<_> = report.participants.iter().filter(|p| p.presence == Some(Presence::Present)).collect();
        let absents: Vec<_> = report.participants.iter().filter(|p| p.presence == Some(Presence::Absent)).collect();
        let unknown: Vec<_> = report.participants.iter().filter(|p| p.presence.is_none()).collect();
        roster_section(&mut doc, "Présents", &presents);
        roster_section(&mut doc, "Absents", &absents);
        roster_section(&mut doc, "Non renseignés", &unknown);
    }

    if let Some(cr) = report.compte_rendu {
        text_section(&mut doc, "Résumé", cr.resume.as_deref());
        text_section(&mut doc, "Décisions", cr.decisions.as_deref());
        text_section(&mut doc, "Actions assignées", cr.actions_assignees.as_deref());
    }

    if !report.actions.is_empty() {
        doc.heading("Suivi des actions");
        for action in report.actions {
            let mut line = format!("{} [{}]", action.titre, action.statut.label());
            if !action.assignees.is_empty() {
                line.push_str(&format!(" - {}", action.assignees.join(", ")));
            }
            if let Some(deadline) = action.deadline {
                line.push_str(&format!(" - échéance {}", fr_date(deadline)));
            }
            if action.en_retard {
                line.push_str(" - EN RETARD");
            }
            doc.bullet(&line);
        }
    }

    doc.finish()
}

/// Presidency activity report over a date range
pub fn render_rapport_presidence(report: &PresidenceReport<'_>) -> Vec<u8> {
    let period = format!("du {} au {}", fr_date(report.date_debut), fr_date(report.date_fin));
    let mut doc = DocumentBuilder::new(
        DocumentInfo { title: format!("Rapport de la présidence {}", period), author: report.association.to_string() },
        format!("{} - Rapport de la présidence", report.association),
    );
    let stats = report.stats;

    doc.title("Rapport de la présidence");
    doc.paragraph(&format!("{} - période {}", report.association, period), TextStyle::BODY);

    doc.heading("Synthèse");
    doc.paragraph(report.resume, TextStyle::BODY);

    doc.heading("Réunions");
    doc.field("Total", &stats.reunions_total.to_string());
    doc.field("Terminées", &stats.reunions_terminees.to_string());
    for kind in TypeReunion::ALL {
        let count = stats.reunions_par_type.get(kind.as_str()).copied().unwrap_or(0);
        doc.bullet(&format!("{} : {}", kind.label(), count));
    }

    doc.heading("Participation");
    doc.field("Participants convoqués", &stats.participants_total.to_string());
    doc.field("Présents", &stats.presents.to_string());
    doc.field("Taux de participation", &format!("{:.1} %", stats.taux_participation));

    doc.heading("Actions");
    doc.field("Total", &stats.actions_total.to_string());
    doc.bullet(&format!("En cours : {}", stats.actions_en_cours));
    doc.bullet(&format!("Terminées : {}", stats.actions_terminees));
    doc.bullet(&format!("Annulées : {}", stats.actions_annulees));
    doc.bullet(&format!("En retard : {}", stats.actions_en_retard));

    doc.heading("Documents");
    doc.field("Documents de réunion", &stats.documents.to_string());

    doc.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::secretariat::ReunionStatus;
    use chrono::Utc;
    use uuid::Uuid;

    fn reunion() -> Reunion {
        Reunion {
            id: Uuid::new_v4(),
            type_reunion: TypeReunion::Ca,
            titre: "CA Jan".into(),
            description: None,
            date_reunion: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            heure_debut: "10:00".into(),
            heure_fin: None,
            lieu: None,
            lien_visio: None,
            groupe_travail_id: None,
            statut: ReunionStatus::Planifiee,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn page_count(bytes: &[u8]) -> usize {
        let text = String::from_utf8_lossy(bytes);
        let tail = text.split("/Count ").nth(1).unwrap();
        tail.split(|c: char| !c.is_ascii_digit()).next().unwrap().parse().unwrap()
    }

    #[test]
    fn empty_meeting_renders_single_page_with_title_and_date() {
        let reunion = reunion();
        let bytes = render_compte_rendu(&ReunionReport {
            association: "Asso",
            reunion: &reunion,
            groupe: None,
            participants: &[],
            compte_rendu: None,
            actions: &[],
        });
        let text = String::from_utf8_lossy(&bytes);
        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert!(bytes.ends_with(b"%%EOF\n"));
        assert_eq!(page_count(&bytes), 1);
        assert!(text.contains("(CA Jan)"));
        assert!(text.contains("10/01/2025"));
        assert!(text.contains("(Page 1 / 1)"));
    }

    #[test]
    fn long_roster_spills_onto_more_pages() {
        let reunion = reunion();
        let participants: Vec<ParticipantLine> = (0..90)
            .map(|i| ParticipantLine {
                nom: format!("Membre {}", i),
                statut_invitation: InvitationStatus::Accepte,
                presence: if i % 3 == 0 { Some(Presence::Absent) } else { Some(Presence::Present) },
                motif_absence: None,
            })
            .collect();
        let bytes = render_compte_rendu(&ReunionReport {
            association: "Asso",
            reunion: &reunion,
            groupe: None,
            participants: &participants,
            compte_rendu: None,
            actions: &[],
        });
        let pages = page_count(&bytes);
        assert!(pages >= 2);
        assert!(String::from_utf8_lossy(&bytes).contains(&format!("(Page {} / {})", pages, pages)));
    }

    #[test]
    fn presidency_report_lists_figures() {
        let stats = PresidenceStats { reunions_total: 4, actions_en_retard: 2, ..Default::default() };
        let bytes = render_rapport_presidence(&PresidenceReport {
            association: "Asso",
            date_debut: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            date_fin: NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
            resume: "4 réunions tenues.",
            stats: &stats,
        });
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("En retard : 2)"));
        assert_eq!(page_count(&bytes), 1);
    }
}
