use std::collections::BTreeMap;

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::effects::geocode::Coordinates;
use crate::effects::notifier::NotificationEvent;
use crate::error::ApiError;
use crate::filter::Filter;
use crate::models::adhesion::{BureauMember, Member, MemberStatus};
use crate::models::{PageRequest, Paginated};
use crate::services::audit_service::{record, AuditEvent};
use crate::services::{double_option, normalize_email, validate_not_blank, Actor};
use crate::state::AppState;

const TOP_COUNTRIES: usize = 5;

#[derive(Debug, Default, Deserialize)]
pub struct MemberFilters {
    pub statut: Option<MemberStatus>,
    pub pays: Option<String>,
    pub search: Option<String>,
}

/// Signup form submitted on the public site
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterMemberRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub prenom: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub nom: String,
    #[validate(email(message = "Must be a valid email address"))]
    pub email: String,
    pub telephone: Option<String>,
    pub pays: Option<String>,
    pub ville: Option<String>,
    pub niveau_etudes: Option<String>,
    pub domaine_etudes: Option<String>,
    pub etablissement: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateMemberRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub prenom: Option<String>,
    #[validate(custom(function = "validate_not_blank"))]
    pub nom: Option<String>,
    #[validate(email(message = "Must be a valid email address"))]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub telephone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub pays: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub ville: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub niveau_etudes: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub domaine_etudes: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub etablissement: Option<Option<String>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RejectMemberRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub motif: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct CountryCount {
    pub pays: String,
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct AdhesionStats {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
    pub top_pays: Vec<CountryCount>,
}

/// One marker on the members map
#[derive(Debug, Serialize)]
pub struct MapLocation {
    pub ville: Option<String>,
    pub pays: Option<String>,
    pub total: i64,
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBureauRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub prenom: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub nom: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub poste: String,
    #[validate(url(message = "Must be a valid URL"))]
    pub photo_url: Option<String>,
    #[validate(email(message = "Must be a valid email address"))]
    pub email: Option<String>,
    pub ordre: Option<i32>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateBureauRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub prenom: Option<String>,
    #[validate(custom(function = "validate_not_blank"))]
    pub nom: Option<String>,
    #[validate(custom(function = "validate_not_blank"))]
    pub poste: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub photo_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
    pub ordre: Option<i32>,
    pub is_active: Option<bool>,
}

/// Country totals, largest first, ties broken alphabetically
pub fn top_countries(members: &[Member], limit: usize) -> Vec<CountryCount> {
    let mut totals: BTreeMap<String, i64> = BTreeMap::new();
    for pays in members.iter().filter_map(|m| m.pays.as_deref()).map(str::trim).filter(|p| !p.is_empty()) {
        *totals.entry(pays.to_string()).or_default() += 1;
    }
    let mut counts: Vec<CountryCount> = totals.into_iter().map(|(pays, total)| CountryCount { pays, total }).collect();
    counts.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.pays.cmp(&b.pays)));
    counts.truncate(limit);
    counts
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub struct AdhesionService {
    state: AppState,
}

impl AdhesionService {
    pub fn new(state: &AppState) -> Self {
        Self { state: state.clone() }
    }

    pub async fn list(&self, filters: MemberFilters, page: PageRequest) -> Result<Paginated<Member>, ApiError> {
        let filter = Filter::new()
            .eq_opt("statut", filters.statut)
            .eq_opt("pays", filters.pays)
            .search(&["prenom", "nom", "email", "numero_membre", "ville"], filters.search.as_deref())
            .order_desc("created_at");
        let (rows, total) = self.state.repos.members.select_page(&filter, page.limit, page.offset()).await?;
        Ok(Paginated::new(rows, page, total))
    }

    pub async fn get(&self, id: Uuid) -> Result<Member, ApiError> {
        Ok(self.state.repos.members.select_404(id).await?)
    }

    async fn ensure_email_free(&self, email: &str, except: Option<Uuid>) -> Result<(), ApiError> {
        let mut filter = Filter::new().eq("email", email);
        if let Some(id) = except {
            filter = filter.neq("id", id);
        }
        if self.state.repos.members.exists(&filter).await? {
            return Err(ApiError::conflict(format!("A member with email '{}' already exists", email)));
        }
        Ok(())
    }

    /// Public signup; the member waits in `pending` until an admin decides
    pub async fn register(&self, request: RegisterMemberRequest) -> Result<Member, ApiError> {
        let email = normalize_email(&request.email);
        self.ensure_email_free(&email, None).await?;

        let now = Utc::now();
        let member = Member {
            id: Uuid::new_v4(),
            prenom: request.prenom.trim().to_string(),
            nom: request.nom.trim().to_string(),
            email,
            telephone: trimmed(request.telephone),
            pays: trimmed(request.pays),
            ville: trimmed(request.ville),
            niveau_etudes: trimmed(request.niveau_etudes),
            domaine_etudes: trimmed(request.domaine_etudes),
            etablissement: trimmed(request.etablissement),
            statut: MemberStatus::Pending,
            numero_membre: None,
            motif_rejet: None,
            approved_at: None,
            approved_by: None,
            created_at: now,
            updated_at: now,
        };
        let member = self.state.repos.members.insert(&member).await?;
        tracing::info!(member = %member.id, "Membership application received");

        self.state.effects.notify(NotificationEvent::new(
            "adhesion.received",
            vec![member.email.clone()],
            "Votre demande d'adhésion a bien été reçue",
            json!({ "prenom": member.prenom, "nom": member.nom }),
        ));
        Ok(member)
    }

    pub async fn update(&self, actor: &Actor, id: Uuid, request: UpdateMemberRequest) -> Result<Member, ApiError> {
        let before = self.get(id).await?;
        let mut member = before.clone();

        if let Some(email) = request.email.as_deref().map(normalize_email) {
            if email != member.email {
                self.ensure_email_free(&email, Some(id)).await?;
                member.email = email;
            }
        }
        if let Some(prenom) = request.prenom {
            member.prenom = prenom.trim().to_string();
        }
        if let Some(nom) = request.nom {
            member.nom = nom.trim().to_string();
        }
        if let Some(v) = request.telephone {
            member.telephone = trimmed(v);
        }
        if let Some(v) = request.pays {
            member.pays = trimmed(v);
        }
        if let Some(v) = request.ville {
            member.ville = trimmed(v);
        }
        if let Some(v) = request.niveau_etudes {
            member.niveau_etudes = trimmed(v);
        }
        if let Some(v) = request.domaine_etudes {
            member.domaine_etudes = trimmed(v);
        }
        if let Some(v) = request.etablissement {
            member.etablissement = trimmed(v);
        }
        member.updated_at = Utc::now();

        let member = self.state.repos.members.update(&member).await?;
        record(&self.state, actor, AuditEvent::new("update", "membre", id, member.display_name()), Some(&before), Some(&member));
        Ok(member)
    }

    /// `ADH-<year>-<seq4>`: members numbered this year plus one, skipping taken numbers
    async fn next_numero(&self, year: i32) -> Result<String, ApiError> {
        let members = &self.state.repos.members;
        let prefix = format!("ADH-{}-", year);
        let issued = members
            .select_any(&Filter::new().not_null("numero_membre").search(&["numero_membre"], Some(&prefix)))
            .await?;
        let mut seq = issued.len() as i64 + 1;
        loop {
            let numero = format!("{}{:04}", prefix, seq);
            if !members.exists(&Filter::new().eq("numero_membre", &numero)).await? {
                return Ok(numero);
            }
            seq += 1;
        }
    }

    pub async fn approve(&self, actor: &Actor, id: Uuid) -> Result<Member, ApiError> {
        let before = self.get(id).await?;
        if before.statut != MemberStatus::Pending {
            return Err(ApiError::conflict("Only pending applications can be approved"));
        }

        let now = Utc::now();
        let member = Member {
            statut: MemberStatus::Approved,
            numero_membre: Some(self.next_numero(now.year()).await?),
            motif_rejet: None,
            approved_at: Some(now),
            approved_by: Some(actor.id),
            updated_at: now,
            ..before.clone()
        };
        let member = self.state.repos.members.update(&member).await?;
        record(&self.state, actor, AuditEvent::new("approve", "membre", id, member.display_name()), Some(&before), Some(&member));
        tracing::info!(member = %id, numero = ?member.numero_membre, by = %actor.email, "Member approved");

        self.state.effects.notify(NotificationEvent::new(
            "adhesion.approved",
            vec![member.email.clone()],
            "Votre adhésion a été acceptée",
            json!({ "prenom": member.prenom, "numero_membre": member.numero_membre }),
        ));
        Ok(member)
    }

    pub async fn reject(&self, actor: &Actor, id: Uuid, request: RejectMemberRequest) -> Result<Member, ApiError> {
        let before = self.get(id).await?;
        if before.statut != MemberStatus::Pending {
            return Err(ApiError::conflict("Only pending applications can be rejected"));
        }

        let member = Member {
            statut: MemberStatus::Rejected,
            motif_rejet: Some(request.motif.trim().to_string()),
            updated_at: Utc::now(),
            ..before.clone()
        };
        let member = self.state.repos.members.update(&member).await?;
        record(&self.state, actor, AuditEvent::new("reject", "membre", id, member.display_name()), Some(&before), Some(&member));

        self.state.effects.notify(NotificationEvent::new(
            "adhesion.rejected",
            vec![member.email.clone()],
            "Votre demande d'adhésion",
            json!({ "prenom": member.prenom, "motif": member.motif_rejet }),
        ));
        Ok(member)
    }

    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), ApiError> {
        let member = self.get(id).await?;
        let with_member = Filter::new().eq("membre_id", id);
        if self.state.repos.cotisations.exists(&with_member).await? {
            return Err(ApiError::conflict("Member has cotisations and cannot be deleted"));
        }
        self.state.repos.members.delete(id).await?;
        record(&self.state, actor, AuditEvent::new("delete", "membre", id, member.display_name()), Some(&member), None);
        Ok(())
    }

    pub async fn stats(&self) -> Result<AdhesionStats, ApiError> {
        let repo = &self.state.repos.members;
        let all = Filter::new();
        let by_status = |statut: MemberStatus| Filter::new().eq("statut", statut);
        let (pending_f, approved_f, rejected_f) =
            (by_status(MemberStatus::Pending), by_status(MemberStatus::Approved), by_status(MemberStatus::Rejected));
        let located = Filter::new().not_null("pays");
        let (total, pending, approved, rejected, members) = futures::try_join!(
            repo.count(&all),
            repo.count(&pending_f),
            repo.count(&approved_f),
            repo.count(&rejected_f),
            repo.select_any(&located),
        )?;
        Ok(AdhesionStats { total, pending, approved, rejected, top_pays: top_countries(&members, TOP_COUNTRIES) })
    }

    /// Approved members grouped by city and country, each group geocoded once
    pub async fn map(&self) -> Result<Vec<MapLocation>, ApiError> {
        let members = self
            .state
            .repos
            .members
            .select_any(&Filter::new().eq("statut", MemberStatus::Approved))
            .await?;

        let mut groups: BTreeMap<(String, String), (Option<String>, Option<String>, i64)> = BTreeMap::new();
        for m in &members {
            let ville = trimmed(m.ville.clone());
            let pays = trimmed(m.pays.clone());
            if ville.is_none() && pays.is_none() {
                continue;
            }
            let key = (
                ville.as_deref().unwrap_or_default().to_lowercase(),
                pays.as_deref().unwrap_or_default().to_lowercase(),
            );
            groups.entry(key).or_insert((ville, pays, 0)).2 += 1;
        }

        let mut locations = Vec::with_capacity(groups.len());
        for (_, (ville, pays, total)) in groups {
            let coordinates = self.state.geocoder.locate(ville.as_deref(), pays.as_deref()).await;
            locations.push(MapLocation { ville, pays, total, coordinates });
        }
        Ok(locations)
    }

    // Bureau

    pub async fn list_bureau(&self, active_only: bool) -> Result<Vec<BureauMember>, ApiError> {
        let mut filter = Filter::new().order_asc("ordre").order_asc("nom");
        if active_only {
            filter = filter.eq("is_active", true);
        }
        Ok(self.state.repos.bureau.select_any(&filter).await?)
    }

    pub async fn get_bureau(&self, id: Uuid) -> Result<BureauMember, ApiError> {
        Ok(self.state.repos.bureau.select_404(id).await?)
    }

    pub async fn create_bureau(&self, actor: &Actor, request: CreateBureauRequest) -> Result<BureauMember, ApiError> {
        let ordre = match request.ordre {
            Some(ordre) => ordre,
            None => self.state.repos.bureau.count(&Filter::new()).await? as i32 + 1,
        };
        let entry = BureauMember {
            id: Uuid::new_v4(),
            prenom: request.prenom.trim().to_string(),
            nom: request.nom.trim().to_string(),
            poste: request.poste.trim().to_string(),
            photo_url: trimmed(request.photo_url),
            email: request.email.as_deref().map(normalize_email),
            ordre,
            is_active: true,
            created_at: Utc::now(),
        };
        let entry = self.state.repos.bureau.insert(&entry).await?;
        record(&self.state, actor, AuditEvent::new("create", "bureau", entry.id, &entry.poste), None, Some(&entry));
        Ok(entry)
    }

    pub async fn update_bureau(&self, actor: &Actor, id: Uuid, request: UpdateBureauRequest) -> Result<BureauMember, ApiError> {
        let before = self.get_bureau(id).await?;
        let mut entry = before.clone();
        if let Some(prenom) = request.prenom {
            entry.prenom = prenom.trim().to_string();
        }
        if let Some(nom) = request.nom {
            entry.nom = nom.trim().to_string();
        }
        if let Some(poste) = request.poste {
            entry.poste = poste.trim().to_string();
        }
        if let Some(photo_url) = request.photo_url {
            entry.photo_url = trimmed(photo_url);
        }
        if let Some(email) = request.email {
            entry.email = email.as_deref().map(normalize_email);
        }
        if let Some(ordre) = request.ordre {
            entry.ordre = ordre;
        }
        if let Some(is_active) = request.is_active {
            entry.is_active = is_active;
        }
        let entry = self.state.repos.bureau.update(&entry).await?;
        record(&self.state, actor, AuditEvent::new("update", "bureau", id, &entry.poste), Some(&before), Some(&entry));
        Ok(entry)
    }

    pub async fn delete_bureau(&self, actor: &Actor, id: Uuid) -> Result<(), ApiError> {
        let entry = self.get_bureau(id).await?;
        self.state.repos.bureau.delete(id).await?;
        record(&self.state, actor, AuditEvent::new("delete", "bureau", id, &entry.poste), Some(&entry), None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(pays: Option<&str>) -> Member {
        let now = Utc::now();
        Member {
            id: Uuid::new_v4(),
            prenom: "Awa".into(),
            nom: "Diop".into(),
            email: format!("{}@example.org", Uuid::new_v4()),
            telephone: None,
            pays: pays.map(String::from),
            ville: None,
            niveau_etudes: None,
            domaine_etudes: None,
            etablissement: None,
            statut: MemberStatus::Approved,
            numero_membre: None,
            motif_rejet: None,
            approved_at: None,
            approved_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn top_countries_orders_by_count_then_name() {
        let members = vec![
            member(Some("Sénégal")),
            member(Some("France")),
            member(Some("Sénégal")),
            member(Some("Mali")),
            member(None),
            member(Some(" ")),
        ];
        let top = top_countries(&members, 2);
        assert_eq!(
            top,
            vec![
                CountryCount { pays: "Sénégal".into(), total: 2 },
                CountryCount { pays: "France".into(), total: 1 },
            ]
        );
    }
}
