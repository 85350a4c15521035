// handlers/public/mod.rs - handlers reachable without a token
//
// Login and the public-site submissions. Every POST here sits behind the
// strict rate-limit tier; payloads are validated before any service call.

pub mod auth;
pub mod site;

pub use auth::login as auth_login;
pub use site::{
    adhesion as site_adhesion, bureau as site_bureau, candidature as site_candidature, contact as site_contact,
    formation_inscription as site_formation_inscription, projet_inscription as site_projet_inscription,
    webinaire_inscription as site_webinaire_inscription,
};
