//! Business operations per module, written against the repository traits.

pub mod adhesion_service;
pub mod admin_service;
pub mod audit_service;
pub mod auth_service;
pub mod currency;
pub mod formation_service;
pub mod mentorat_service;
pub mod public_service;
pub mod rapport_service;
pub mod recrutement_service;
pub mod secretariat_service;
pub mod slug;
pub mod tresorerie_service;
pub mod webinaire_service;

use chrono::{NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;
use validator::ValidationError;

use crate::error::ApiError;
use crate::middleware::auth::AuthAdmin;
use crate::services::slug::slugify;

/// Who performed a mutation, as recorded in the audit log
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: Uuid,
    pub email: String,
    pub ip: Option<String>,
}

impl From<&AuthAdmin> for Actor {
    fn from(auth: &AuthAdmin) -> Self {
        Self { id: auth.admin.id, email: auth.admin.email.clone(), ip: Some(auth.ip.clone()) }
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`)
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// `HH:MM`, 24-hour clock
pub fn validate_heure(value: &str) -> Result<(), ValidationError> {
    match NaiveTime::parse_from_str(value, "%H:%M") {
        Ok(_) if value.len() == 5 => Ok(()),
        _ => {
            let mut err = ValidationError::new("heure");
            err.message = Some("Must be a time formatted HH:MM".into());
            Err(err)
        }
    }
}

/// Rejects blank strings that `length(min = 1)` would let through as spaces
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("This field is required".into());
        return Err(err);
    }
    Ok(())
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Explicit slug when given, otherwise derived from the title
pub fn slug_for(explicit: Option<&str>, titre: &str) -> Result<String, ApiError> {
    let slug = slugify(explicit.filter(|s| !s.trim().is_empty()).unwrap_or(titre));
    if slug.is_empty() {
        return Err(ApiError::invalid_field("slug", "Slug must contain at least one letter or digit"));
    }
    Ok(slug)
}

/// 409 once the confirmed count has reached the ceiling; no ceiling means unlimited
pub fn ensure_capacity(confirmed: i64, max: Option<i32>) -> Result<(), ApiError> {
    match max {
        Some(max) if confirmed >= i64::from(max) => Err(ApiError::conflict(format!(
            "Capacity reached: {} of {} places confirmed",
            confirmed, max
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heure_format() {
        assert!(validate_heure("10:00").is_ok());
        assert!(validate_heure("23:59").is_ok());
        assert!(validate_heure("24:00").is_err());
        assert!(validate_heure("9:00").is_err());
        assert!(validate_heure("10h00").is_err());
    }

    #[test]
    fn capacity_ceiling() {
        assert!(ensure_capacity(9, Some(10)).is_ok());
        assert_eq!(ensure_capacity(10, Some(10)).unwrap_err().status_code(), 409);
        assert!(ensure_capacity(10_000, None).is_ok());
    }

    #[test]
    fn slug_prefers_explicit_value() {
        assert_eq!(slug_for(Some("Mon Slug"), "Titre").unwrap(), "mon-slug");
        assert_eq!(slug_for(None, "Atelier CV").unwrap(), "atelier-cv");
        assert_eq!(slug_for(Some(" "), "?!").unwrap_err().status_code(), 400);
    }

    #[test]
    fn double_option_keeps_explicit_null() {
        #[derive(Deserialize)]
        struct Patch {
            #[serde(default, deserialize_with = "double_option")]
            lieu: Option<Option<String>>,
        }
        let absent: Patch = serde_json::from_str("{}").unwrap();
        let null: Patch = serde_json::from_str(r#"{"lieu": null}"#).unwrap();
        let set: Patch = serde_json::from_str(r#"{"lieu": "Dakar"}"#).unwrap();
        assert_eq!(absent.lieu, None);
        assert_eq!(null.lieu, Some(None));
        assert_eq!(set.lieu, Some(Some("Dakar".into())));
    }
}
