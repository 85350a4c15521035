use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The seven functional areas an admin can be granted access to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleName {
    Adhesion,
    Formation,
    Webinaire,
    Tresorerie,
    Secretariat,
    Mentorat,
    Recrutement,
}

impl ModuleName {
    pub const ALL: [ModuleName; 7] = [
        ModuleName::Adhesion,
        ModuleName::Formation,
        ModuleName::Webinaire,
        ModuleName::Tresorerie,
        ModuleName::Secretariat,
        ModuleName::Mentorat,
        ModuleName::Recrutement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleName::Adhesion => "adhesion",
            ModuleName::Formation => "formation",
            ModuleName::Webinaire => "webinaire",
            ModuleName::Tresorerie => "tresorerie",
            ModuleName::Secretariat => "secretariat",
            ModuleName::Mentorat => "mentorat",
            ModuleName::Recrutement => "recrutement",
        }
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModuleName::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unknown module '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleType {
    Admin,
    Superadmin,
}

/// Rights level of a module grant, ordered from weakest to strongest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Droit {
    Lecture,
    Ecriture,
    Admin,
}

impl Droit {
    pub fn allows_write(&self) -> bool {
        *self >= Droit::Ecriture
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admin {
    pub id: Uuid,
    pub email: String,
    pub numero_membre: Option<String>,
    pub password_hash: String,
    pub prenom: String,
    pub nom: String,
    pub role_type: RoleType,
    pub is_master: bool,
    #[serde(default)]
    pub super_scope: Vec<ModuleName>,
    pub is_active: bool,
    pub disabled_until: Option<DateTime<Utc>>,
    pub disabled_reason: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

entity!(Admin, "auth.admins");

impl Admin {
    /// Suspended until a future instant
    pub fn is_suspended_at(&self, now: DateTime<Utc>) -> bool {
        self.disabled_until.map(|until| until > now).unwrap_or(false)
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.prenom, self.nom)
    }
}

/// Client-facing view of an admin; never carries the password hash
#[derive(Debug, Clone, Serialize)]
pub struct AdminProfile {
    pub id: Uuid,
    pub email: String,
    pub numero_membre: Option<String>,
    pub prenom: String,
    pub nom: String,
    pub role_type: RoleType,
    pub is_master: bool,
    pub super_scope: Vec<ModuleName>,
    pub is_active: bool,
    pub disabled_until: Option<DateTime<Utc>>,
    pub disabled_reason: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Admin> for AdminProfile {
    fn from(admin: &Admin) -> Self {
        Self {
            id: admin.id,
            email: admin.email.clone(),
            numero_membre: admin.numero_membre.clone(),
            prenom: admin.prenom.clone(),
            nom: admin.nom.clone(),
            role_type: admin.role_type,
            is_master: admin.is_master,
            super_scope: admin.super_scope.clone(),
            is_active: admin.is_active,
            disabled_until: admin.disabled_until,
            disabled_reason: admin.disabled_reason.clone(),
            last_login_at: admin.last_login_at,
            created_at: admin.created_at,
            updated_at: admin.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminModule {
    pub id: Uuid,
    pub admin_id: Uuid,
    pub module: ModuleName,
    pub droit: Droit,
    pub created_at: DateTime<Utc>,
}

entity!(AdminModule, "auth.admins_modules");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_names_round_trip_through_strings() {
        for module in ModuleName::ALL {
            assert_eq!(module.as_str().parse::<ModuleName>().unwrap(), module);
        }
        assert!("finance".parse::<ModuleName>().is_err());
    }

    #[test]
    fn only_lecture_is_read_only() {
        assert!(!Droit::Lecture.allows_write());
        assert!(Droit::Ecriture.allows_write());
        assert!(Droit::Admin.allows_write());
    }
}
