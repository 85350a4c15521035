use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use crate::effects::notifier::NotificationEvent;
use crate::error::ApiError;
use crate::models::adhesion::BureauMember;
use crate::services::adhesion_service::AdhesionService;
use crate::services::{normalize_email, validate_not_blank};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct ContactRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub nom: String,
    #[validate(email(message = "Must be a valid email address"))]
    pub email: String,
    #[validate(length(max = 200, message = "Subject is limited to 200 characters"))]
    pub sujet: Option<String>,
    #[validate(length(min = 10, max = 5000, message = "Message must be between 10 and 5000 characters"))]
    pub message: String,
}

/// Bureau as shown on the public site, without contact details
#[derive(Debug, Serialize)]
pub struct PublicBureauMember {
    pub prenom: String,
    pub nom: String,
    pub poste: String,
    pub photo_url: Option<String>,
    pub ordre: i32,
}

impl From<BureauMember> for PublicBureauMember {
    fn from(m: BureauMember) -> Self {
        Self { prenom: m.prenom, nom: m.nom, poste: m.poste, photo_url: m.photo_url, ordre: m.ordre }
    }
}

pub struct PublicService {
    state: AppState,
}

impl PublicService {
    pub fn new(state: &AppState) -> Self {
        Self { state: state.clone() }
    }

    /// Nothing is stored; the message is forwarded to the association inbox
    pub fn contact(&self, request: ContactRequest) -> Result<(), ApiError> {
        let email = normalize_email(&request.email);
        let sujet = request
            .sujet
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "Message depuis le formulaire de contact".to_string());

        self.state.effects.notify(NotificationEvent::new(
            "contact.message",
            vec![self.state.config.notifications.contact_recipient.clone()],
            format!("[Contact] {}", sujet),
            json!({ "nom": request.nom.trim(), "email": email, "message": request.message }),
        ));
        tracing::info!(from = %email, "Contact message queued");
        Ok(())
    }

    pub async fn bureau(&self) -> Result<Vec<PublicBureauMember>, ApiError> {
        let members = AdhesionService::new(&self.state).list_bureau(true).await?;
        Ok(members.into_iter().map(PublicBureauMember::from).collect())
    }
}
