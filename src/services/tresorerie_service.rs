use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::filter::Filter;
use crate::models::adhesion::MemberStatus;
use crate::models::tresorerie::*;
use crate::models::{PageRequest, Paginated};
use crate::services::audit_service::{record, AuditEvent};
use crate::services::currency::{default_devise, to_eur};
use crate::services::{today, Actor};
use crate::state::AppState;

fn status_name<S: Serialize>(status: &S) -> String {
    serde_json::to_value(status)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

/// 409 unless `current` is one of `allowed`
fn check_transition<S: PartialEq + Serialize>(entity: &str, action: &str, current: &S, allowed: &[S]) -> Result<(), ApiError> {
    if allowed.contains(current) {
        return Ok(());
    }
    Err(ApiError::conflict(format!(
        "Cannot {} a {} with status '{}'",
        action,
        entity,
        status_name(current)
    )))
}

fn positive_amount(montant: Decimal) -> Result<(), ApiError> {
    if montant <= Decimal::ZERO {
        return Err(ApiError::invalid_field("montant", "Amount must be greater than zero"));
    }
    Ok(())
}

fn year_bounds(year: i32) -> Result<(NaiveDate, NaiveDate), ApiError> {
    match (NaiveDate::from_ymd_opt(year, 1, 1), NaiveDate::from_ymd_opt(year, 12, 31)) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err(ApiError::invalid_field("annee", "Invalid year")),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CotisationFilters {
    pub statut: Option<CotisationStatus>,
    pub membre_id: Option<Uuid>,
    pub annee: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCotisationRequest {
    pub membre_id: Uuid,
    #[validate(range(min = 2000, max = 2100, message = "Year must be between 2000 and 2100"))]
    pub annee: i32,
    pub montant: Decimal,
    pub devise: Option<Devise>,
    pub pays: Option<String>,
    pub mode_paiement: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LedgerFilters<S> {
    pub statut: Option<S>,
    pub membre_id: Option<Uuid>,
    pub date_debut: Option<NaiveDate>,
    pub date_fin: Option<NaiveDate>,
    pub categorie: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePaiementRequest {
    pub membre_id: Option<Uuid>,
    pub cotisation_id: Option<Uuid>,
    #[validate(length(min = 1, message = "This field is required"))]
    pub objet: String,
    pub montant: Decimal,
    pub devise: Option<Devise>,
    pub pays: Option<String>,
    pub date_paiement: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDepenseRequest {
    #[validate(length(min = 1, message = "This field is required"))]
    pub libelle: String,
    pub categorie: Option<String>,
    pub montant: Decimal,
    pub devise: Option<Devise>,
    pub date_depense: Option<NaiveDate>,
    #[validate(url(message = "Must be a valid URL"))]
    pub justificatif_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CarteFilters {
    pub membre_id: Option<Uuid>,
    pub annee: Option<i32>,
    pub statut: Option<CarteStatus>,
}

#[derive(Debug, Deserialize)]
pub struct IssueCarteRequest {
    pub membre_id: Uuid,
    pub annee: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoriqueFilters {
    pub entity_type: Option<String>,
    pub entity_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BilanQuery {
    pub annee: Option<i32>,
}

#[derive(Debug, Default, Serialize, PartialEq)]
pub struct StatusCounts {
    pub en_attente: i64,
    pub valides: i64,
    pub rejetes: i64,
    pub annules: i64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct MonthlyTotals {
    pub mois: u32,
    pub paiements_eur: Decimal,
    pub depenses_eur: Decimal,
}

#[derive(Debug, Serialize)]
pub struct Bilan {
    pub annee: i32,
    pub cotisations: StatusCounts,
    pub paiements: StatusCounts,
    pub depenses: StatusCounts,
    pub total_cotisations_eur: Decimal,
    pub total_paiements_eur: Decimal,
    pub total_depenses_eur: Decimal,
    pub solde_eur: Decimal,
    pub cartes_actives: i64,
    pub mensuel: Vec<MonthlyTotals>,
}

/// Fold validated amounts into twelve monthly buckets
pub fn monthly_totals(paiements: &[Paiement], depenses: &[Depense]) -> Vec<MonthlyTotals> {
    let mut months: Vec<MonthlyTotals> = (1..=12)
        .map(|mois| MonthlyTotals { mois, paiements_eur: Decimal::ZERO, depenses_eur: Decimal::ZERO })
        .collect();
    for p in paiements.iter().filter(|p| p.statut == PaiementStatus::Valide) {
        months[p.date_paiement.month0() as usize].paiements_eur += to_eur(p.montant, p.devise);
    }
    for d in depenses.iter().filter(|d| d.statut == DepenseStatus::Validee) {
        months[d.date_depense.month0() as usize].depenses_eur += to_eur(d.montant, d.devise);
    }
    months
}

pub struct TresorerieService {
    state: AppState,
}

impl TresorerieService {
    pub fn new(state: &AppState) -> Self {
        Self { state: state.clone() }
    }

    async fn history(
        &self,
        actor: &Actor,
        entity_type: &str,
        entity_id: Uuid,
        action: &str,
        montant: Option<Decimal>,
        details: Option<String>,
    ) -> Result<(), ApiError> {
        self.state
            .repos
            .historique
            .insert(&HistoriqueTresorerie {
                id: Uuid::new_v4(),
                entity_type: entity_type.to_string(),
                entity_id,
                action: action.to_string(),
                montant,
                admin_id: Some(actor.id),
                details,
                created_at: Utc::now(),
            })
            .await?;
        Ok(())
    }

    // Cotisations

    pub async fn list_cotisations(&self, filters: CotisationFilters, page: PageRequest) -> Result<Paginated<Cotisation>, ApiError> {
        let filter = Filter::new()
            .eq_opt("statut", filters.statut)
            .eq_opt("membre_id", filters.membre_id)
            .eq_opt("annee", filters.annee)
            .order_desc("created_at");
        let (rows, total) = self.state.repos.cotisations.select_page(&filter, page.limit, page.offset()).await?;
        Ok(Paginated::new(rows, page, total))
    }

    pub async fn get_cotisation(&self, id: Uuid) -> Result<Cotisation, ApiError> {
        Ok(self.state.repos.cotisations.select_404(id).await?)
    }

    pub async fn create_cotisation(&self, actor: &Actor, request: CreateCotisationRequest) -> Result<Cotisation, ApiError> {
        positive_amount(request.montant)?;
        let membre = self
            .state
            .repos
            .members
            .get(request.membre_id)
            .await?
            .ok_or_else(|| ApiError::invalid_field("membre_id", "Unknown member"))?;

        let pays = request.pays.or(membre.pays);
        let now = Utc::now();
        let cotisation = Cotisation {
            id: Uuid::new_v4(),
            membre_id: membre.id,
            annee: request.annee,
            montant: request.montant,
            devise: request.devise.unwrap_or_else(|| default_devise(pays.as_deref())),
            pays,
            mode_paiement: request.mode_paiement,
            statut: CotisationStatus::EnAttente,
            validated_at: None,
            validated_by: None,
            created_at: now,
            updated_at: now,
        };
        let cotisation = self.state.repos.cotisations.insert(&cotisation).await?;
        self.history(actor, "cotisation", cotisation.id, "create", Some(cotisation.montant), None).await?;
        record(
            &self.state,
            actor,
            AuditEvent::new("create", "cotisation", cotisation.id, format!("{} {}", membre.numero_membre.unwrap_or_default(), cotisation.annee)),
            None,
            Some(&cotisation),
        );
        Ok(cotisation)
    }

    async fn save_cotisation(&self, actor: &Actor, before: &Cotisation, after: Cotisation, action: &str) -> Result<Cotisation, ApiError> {
        let saved = self.state.repos.cotisations.update(&after).await?;
        self.history(actor, "cotisation", saved.id, action, Some(saved.montant), None).await?;
        record(
            &self.state,
            actor,
            AuditEvent::new(action, "cotisation", saved.id, saved.annee.to_string()),
            Some(before),
            Some(&saved),
        );
        Ok(saved)
    }

    pub async fn validate_cotisation(&self, actor: &Actor, id: Uuid) -> Result<Cotisation, ApiError> {
        let before = self.get_cotisation(id).await?;
        check_transition("cotisation", "validate", &before.statut, &[CotisationStatus::EnAttente])?;
        let now = Utc::now();
        let after = Cotisation {
            statut: CotisationStatus::Validee,
            validated_at: Some(now),
            validated_by: Some(actor.id),
            updated_at: now,
            ..before.clone()
        };
        self.save_cotisation(actor, &before, after, "validate").await
    }

    pub async fn cancel_cotisation(&self, actor: &Actor, id: Uuid) -> Result<Cotisation, ApiError> {
        let before = self.get_cotisation(id).await?;
        check_transition("cotisation", "cancel", &before.statut, &[CotisationStatus::EnAttente])?;
        let after = Cotisation { statut: CotisationStatus::Annulee, updated_at: Utc::now(), ..before.clone() };
        self.save_cotisation(actor, &before, after, "cancel").await
    }

    /// Back to `en_attente`, validation stamp cleared
    pub async fn reset_cotisation(&self, actor: &Actor, id: Uuid) -> Result<Cotisation, ApiError> {
        let before = self.get_cotisation(id).await?;
        check_transition(
            "cotisation",
            "reset",
            &before.statut,
            &[CotisationStatus::Validee, CotisationStatus::Annulee],
        )?;
        let after = Cotisation {
            statut: CotisationStatus::EnAttente,
            validated_at: None,
            validated_by: None,
            updated_at: Utc::now(),
            ..before.clone()
        };
        self.save_cotisation(actor, &before, after, "reset").await
    }

    pub async fn delete_cotisation(&self, actor: &Actor, id: Uuid) -> Result<(), ApiError> {
        let cotisation = self.get_cotisation(id).await?;
        if cotisation.statut == CotisationStatus::Validee {
            return Err(ApiError::conflict("A validated cotisation cannot be deleted; reset it first"));
        }
        self.state.repos.cotisations.delete(id).await?;
        self.history(actor, "cotisation", id, "delete", Some(cotisation.montant), None).await?;
        record(&self.state, actor, AuditEvent::new("delete", "cotisation", id, cotisation.annee.to_string()), Some(&cotisation), None);
        Ok(())
    }

    // Paiements

    pub async fn list_paiements(&self, filters: LedgerFilters<PaiementStatus>, page: PageRequest) -> Result<Paginated<Paiement>, ApiError> {
        let filter = Filter::new()
            .eq_opt("statut", filters.statut)
            .eq_opt("membre_id", filters.membre_id)
            .gte_opt("date_paiement", filters.date_debut)
            .lte_opt("date_paiement", filters.date_fin)
            .order_desc("date_paiement");
        let (rows, total) = self.state.repos.paiements.select_page(&filter, page.limit, page.offset()).await?;
        Ok(Paginated::new(rows, page, total))
    }

    pub async fn get_paiement(&self, id: Uuid) -> Result<Paiement, ApiError> {
        Ok(self.state.repos.paiements.select_404(id).await?)
    }

    pub async fn create_paiement(&self, actor: &Actor, request: CreatePaiementRequest) -> Result<Paiement, ApiError> {
        positive_amount(request.montant)?;
        let mut pays = request.pays;
        if let Some(membre_id) = request.membre_id {
            let membre = self
                .state
                .repos
                .members
                .get(membre_id)
                .await?
                .ok_or_else(|| ApiError::invalid_field("membre_id", "Unknown member"))?;
            pays = pays.or(membre.pays);
        }
        if let Some(cotisation_id) = request.cotisation_id {
            if self.state.repos.cotisations.get(cotisation_id).await?.is_none() {
                return Err(ApiError::invalid_field("cotisation_id", "Unknown cotisation"));
            }
        }

        let now = Utc::now();
        let paiement = Paiement {
            id: Uuid::new_v4(),
            membre_id: request.membre_id,
            cotisation_id: request.cotisation_id,
            objet: request.objet.trim().to_string(),
            montant: request.montant,
            devise: request.devise.unwrap_or_else(|| default_devise(pays.as_deref())),
            pays,
            statut: PaiementStatus::EnAttente,
            date_paiement: request.date_paiement.unwrap_or_else(today),
            validated_at: None,
            validated_by: None,
            created_at: now,
            updated_at: now,
        };
        let paiement = self.state.repos.paiements.insert(&paiement).await?;
        self.history(actor, "paiement", paiement.id, "create", Some(paiement.montant), Some(paiement.objet.clone())).await?;
        record(&self.state, actor, AuditEvent::new("create", "paiement", paiement.id, &paiement.objet), None, Some(&paiement));
        Ok(paiement)
    }

    async fn move_paiement(&self, actor: &Actor, id: Uuid, action: &str, to: PaiementStatus) -> Result<Paiement, ApiError> {
        let before = self.get_paiement(id).await?;
        check_transition("paiement", action, &before.statut, &[PaiementStatus::EnAttente])?;
        let now = Utc::now();
        let mut after = Paiement { statut: to, updated_at: now, ..before.clone() };
        if to == PaiementStatus::Valide {
            after.validated_at = Some(now);
            after.validated_by = Some(actor.id);
        }
        let saved = self.state.repos.paiements.update(&after).await?;
        self.history(actor, "paiement", id, action, Some(saved.montant), None).await?;
        record(&self.state, actor, AuditEvent::new(action, "paiement", id, &saved.objet), Some(&before), Some(&saved));
        Ok(saved)
    }

    pub async fn validate_paiement(&self, actor: &Actor, id: Uuid) -> Result<Paiement, ApiError> {
        self.move_paiement(actor, id, "validate", PaiementStatus::Valide).await
    }

    pub async fn reject_paiement(&self, actor: &Actor, id: Uuid) -> Result<Paiement, ApiError> {
        self.move_paiement(actor, id, "reject", PaiementStatus::Rejete).await
    }

    pub async fn cancel_paiement(&self, actor: &Actor, id: Uuid) -> Result<Paiement, ApiError> {
        self.move_paiement(actor, id, "cancel", PaiementStatus::Annule).await
    }

    pub async fn delete_paiement(&self, actor: &Actor, id: Uuid) -> Result<(), ApiError> {
        let paiement = self.get_paiement(id).await?;
        if paiement.statut == PaiementStatus::Valide {
            return Err(ApiError::conflict("A validated paiement cannot be deleted"));
        }
        self.state.repos.paiements.delete(id).await?;
        self.history(actor, "paiement", id, "delete", Some(paiement.montant), None).await?;
        record(&self.state, actor, AuditEvent::new("delete", "paiement", id, &paiement.objet), Some(&paiement), None);
        Ok(())
    }

    // Dépenses

    pub async fn list_depenses(&self, filters: LedgerFilters<DepenseStatus>, page: PageRequest) -> Result<Paginated<Depense>, ApiError> {
        let filter = Filter::new()
            .eq_opt("statut", filters.statut)
            .eq_opt("categorie", filters.categorie)
            .gte_opt("date_depense", filters.date_debut)
            .lte_opt("date_depense", filters.date_fin)
            .order_desc("date_depense");
        let (rows, total) = self.state.repos.depenses.select_page(&filter, page.limit, page.offset()).await?;
        Ok(Paginated::new(rows, page, total))
    }

    pub async fn get_depense(&self, id: Uuid) -> Result<Depense, ApiError> {
        Ok(self.state.repos.depenses.select_404(id).await?)
    }

    pub async fn create_depense(&self, actor: &Actor, request: CreateDepenseRequest) -> Result<Depense, ApiError> {
        positive_amount(request.montant)?;
        let now = Utc::now();
        let depense = Depense {
            id: Uuid::new_v4(),
            libelle: request.libelle.trim().to_string(),
            categorie: request.categorie,
            montant: request.montant,
            devise: request.devise.unwrap_or(Devise::Eur),
            date_depense: request.date_depense.unwrap_or_else(today),
            justificatif_url: request.justificatif_url,
            statut: DepenseStatus::EnAttente,
            validated_at: None,
            validated_by: None,
            created_at: now,
            updated_at: now,
        };
        let depense = self.state.repos.depenses.insert(&depense).await?;
        self.history(actor, "depense", depense.id, "create", Some(depense.montant), Some(depense.libelle.clone())).await?;
        record(&self.state, actor, AuditEvent::new("create", "depense", depense.id, &depense.libelle), None, Some(&depense));
        Ok(depense)
    }

    async fn move_depense(&self, actor: &Actor, id: Uuid, action: &str, to: DepenseStatus) -> Result<Depense, ApiError> {
        let before = self.get_depense(id).await?;
        check_transition("depense", action, &before.statut, &[DepenseStatus::EnAttente])?;
        let now = Utc::now();
        let mut after = Depense { statut: to, updated_at: now, ..before.clone() };
        if to == DepenseStatus::Validee {
            after.validated_at = Some(now);
            after.validated_by = Some(actor.id);
        }
        let saved = self.state.repos.depenses.update(&after).await?;
        self.history(actor, "depense", id, action, Some(saved.montant), None).await?;
        record(&self.state, actor, AuditEvent::new(action, "depense", id, &saved.libelle), Some(&before), Some(&saved));
        Ok(saved)
    }

    pub async fn validate_depense(&self, actor: &Actor, id: Uuid) -> Result<Depense, ApiError> {
        self.move_depense(actor, id, "validate", DepenseStatus::Validee).await
    }

    pub async fn reject_depense(&self, actor: &Actor, id: Uuid) -> Result<Depense, ApiError> {
        self.move_depense(actor, id, "reject", DepenseStatus::Rejetee).await
    }

    pub async fn cancel_depense(&self, actor: &Actor, id: Uuid) -> Result<Depense, ApiError> {
        self.move_depense(actor, id, "cancel", DepenseStatus::Annulee).await
    }

    pub async fn delete_depense(&self, actor: &Actor, id: Uuid) -> Result<(), ApiError> {
        let depense = self.get_depense(id).await?;
        if depense.statut == DepenseStatus::Validee {
            return Err(ApiError::conflict("A validated depense cannot be deleted"));
        }
        self.state.repos.depenses.delete(id).await?;
        self.history(actor, "depense", id, "delete", Some(depense.montant), None).await?;
        record(&self.state, actor, AuditEvent::new("delete", "depense", id, &depense.libelle), Some(&depense), None);
        Ok(())
    }

    // Cartes de membre

    pub async fn list_cartes(&self, filters: CarteFilters, page: PageRequest) -> Result<Paginated<CarteMembre>, ApiError> {
        let filter = Filter::new()
            .eq_opt("membre_id", filters.membre_id)
            .eq_opt("annee", filters.annee)
            .eq_opt("statut", filters.statut)
            .order_desc("numero");
        let (rows, total) = self.state.repos.cartes.select_page(&filter, page.limit, page.offset()).await?;
        Ok(Paginated::new(rows, page, total))
    }

    /// `CM-<year>-<seq4>`, first free sequence number for the year
    async fn next_carte_numero(&self, annee: i32) -> Result<String, ApiError> {
        let cartes = &self.state.repos.cartes;
        let mut seq = cartes.count(&Filter::new().eq("annee", annee)).await? + 1;
        loop {
            let numero = format!("CM-{}-{:04}", annee, seq);
            if !cartes.exists(&Filter::new().eq("numero", &numero)).await? {
                return Ok(numero);
            }
            seq += 1;
        }
    }

    pub async fn issue_carte(&self, actor: &Actor, request: IssueCarteRequest) -> Result<CarteMembre, ApiError> {
        let membre = self
            .state
            .repos
            .members
            .get(request.membre_id)
            .await?
            .ok_or_else(|| ApiError::invalid_field("membre_id", "Unknown member"))?;
        if membre.statut != MemberStatus::Approved {
            return Err(ApiError::conflict("Cards are only issued to approved members"));
        }

        let issued_on = today();
        let annee = request.annee.unwrap_or_else(|| issued_on.year());
        let (_, expiration) = year_bounds(annee)?;
        let active = Filter::new().eq("membre_id", membre.id).eq("annee", annee).eq("statut", CarteStatus::Active);
        if self.state.repos.cartes.exists(&active).await? {
            return Err(ApiError::conflict(format!("Member already holds an active card for {}", annee)));
        }

        let carte = CarteMembre {
            id: Uuid::new_v4(),
            membre_id: membre.id,
            numero: self.next_carte_numero(annee).await?,
            annee,
            date_emission: issued_on,
            date_expiration: expiration,
            statut: CarteStatus::Active,
            created_at: Utc::now(),
        };
        let carte = self.state.repos.cartes.insert(&carte).await?;
        self.history(actor, "carte", carte.id, "create", None, Some(carte.numero.clone())).await?;
        record(&self.state, actor, AuditEvent::new("create", "carte", carte.id, &carte.numero), None, Some(&carte));
        Ok(carte)
    }

    pub async fn cancel_carte(&self, actor: &Actor, id: Uuid) -> Result<CarteMembre, ApiError> {
        let before = self.state.repos.cartes.select_404(id).await?;
        check_transition("carte", "cancel", &before.statut, &[CarteStatus::Active])?;
        let after = CarteMembre { statut: CarteStatus::Annulee, ..before.clone() };
        let saved = self.state.repos.cartes.update(&after).await?;
        self.history(actor, "carte", id, "cancel", None, Some(saved.numero.clone())).await?;
        record(&self.state, actor, AuditEvent::new("cancel", "carte", id, &saved.numero), Some(&before), Some(&saved));
        Ok(saved)
    }

    // Historique et bilan

    pub async fn list_historique(&self, filters: HistoriqueFilters, page: PageRequest) -> Result<Paginated<HistoriqueTresorerie>, ApiError> {
        let filter = Filter::new()
            .eq_opt("entity_type", filters.entity_type)
            .eq_opt("entity_id", filters.entity_id)
            .order_desc("created_at");
        let (rows, total) = self.state.repos.historique.select_page(&filter, page.limit, page.offset()).await?;
        Ok(Paginated::new(rows, page, total))
    }

    pub async fn bilan(&self, query: BilanQuery) -> Result<Bilan, ApiError> {
        let annee = query.annee.unwrap_or_else(|| today().year());
        let (start, end) = year_bounds(annee)?;
        let repos = &self.state.repos;

        let of_year = Filter::new().eq("annee", annee);
        let paid_in_year = Filter::new().gte("date_paiement", start).lte("date_paiement", end);
        let spent_in_year = Filter::new().gte("date_depense", start).lte("date_depense", end);
        let active_cards = Filter::new().eq("annee", annee).eq("statut", CarteStatus::Active);
        let (cotisations, paiements, depenses, cartes_actives) = futures::try_join!(
            repos.cotisations.select_any(&of_year),
            repos.paiements.select_any(&paid_in_year),
            repos.depenses.select_any(&spent_in_year),
            repos.cartes.count(&active_cards),
        )?;

        let cotisation_counts = StatusCounts {
            en_attente: cotisations.iter().filter(|c| c.statut == CotisationStatus::EnAttente).count() as i64,
            valides: cotisations.iter().filter(|c| c.statut == CotisationStatus::Validee).count() as i64,
            rejetes: 0,
            annules: cotisations.iter().filter(|c| c.statut == CotisationStatus::Annulee).count() as i64,
        };
        let paiement_counts = StatusCounts {
            en_attente: paiements.iter().filter(|p| p.statut == PaiementStatus::EnAttente).count() as i64,
            valides: paiements.iter().filter(|p| p.statut == PaiementStatus::Valide).count() as i64,
            rejetes: paiements.iter().filter(|p| p.statut == PaiementStatus::Rejete).count() as i64,
            annules: paiements.iter().filter(|p| p.statut == PaiementStatus::Annule).count() as i64,
        };
        let depense_counts = StatusCounts {
            en_attente: depenses.iter().filter(|d| d.statut == DepenseStatus::EnAttente).count() as i64,
            valides: depenses.iter().filter(|d| d.statut == DepenseStatus::Validee).count() as i64,
            rejetes: depenses.iter().filter(|d| d.statut == DepenseStatus::Rejetee).count() as i64,
            annules: depenses.iter().filter(|d| d.statut == DepenseStatus::Annulee).count() as i64,
        };

        let total_cotisations_eur: Decimal = cotisations
            .iter()
            .filter(|c| c.statut == CotisationStatus::Validee)
            .map(|c| to_eur(c.montant, c.devise))
            .sum();
        // Paiements tied to a cotisation are already counted through it
        let total_paiements_eur: Decimal = paiements
            .iter()
            .filter(|p| p.statut == PaiementStatus::Valide && p.cotisation_id.is_none())
            .map(|p| to_eur(p.montant, p.devise))
            .sum();
        let total_depenses_eur: Decimal = depenses
            .iter()
            .filter(|d| d.statut == DepenseStatus::Validee)
            .map(|d| to_eur(d.montant, d.devise))
            .sum();

        Ok(Bilan {
            annee,
            cotisations: cotisation_counts,
            paiements: paiement_counts,
            depenses: depense_counts,
            total_cotisations_eur,
            total_paiements_eur,
            total_depenses_eur,
            solde_eur: total_cotisations_eur + total_paiements_eur - total_depenses_eur,
            cartes_actives,
            mensuel: monthly_totals(&paiements, &depenses),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn paiement(date: &str, montant: &str, devise: Devise, statut: PaiementStatus) -> Paiement {
        let now = Utc::now();
        Paiement {
            id: Uuid::new_v4(),
            membre_id: None,
            cotisation_id: None,
            objet: "don".into(),
            montant: Decimal::from_str(montant).unwrap(),
            devise,
            pays: None,
            statut,
            date_paiement: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            validated_at: None,
            validated_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn monthly_totals_only_count_validated_entries() {
        let rows = vec![
            paiement("2025-01-05", "10", Devise::Eur, PaiementStatus::Valide),
            paiement("2025-01-20", "6559.57", Devise::Xof, PaiementStatus::Valide),
            paiement("2025-03-01", "99", Devise::Eur, PaiementStatus::EnAttente),
            paiement("2025-12-31", "5.5", Devise::Eur, PaiementStatus::Valide),
        ];
        let months = monthly_totals(&rows, &[]);
        assert_eq!(months.len(), 12);
        assert_eq!(months[0].paiements_eur, Decimal::from_str("20.00").unwrap());
        assert_eq!(months[2].paiements_eur, Decimal::ZERO);
        assert_eq!(months[11].paiements_eur, Decimal::from_str("5.5").unwrap());
    }

    #[test]
    fn transitions_outside_the_allowed_set_conflict() {
        let err = check_transition("paiement", "validate", &PaiementStatus::Rejete, &[PaiementStatus::EnAttente]).unwrap_err();
        assert_eq!(err.status_code(), 409);
        assert!(err.message().contains("'rejete'"));
        assert!(check_transition("paiement", "validate", &PaiementStatus::EnAttente, &[PaiementStatus::EnAttente]).is_ok());
    }
}
