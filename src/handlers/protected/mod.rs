// handlers/protected/mod.rs - handlers behind `require_auth`
//
// Each business module is mounted under /api/<module> with its own
// `require_module` gate. Admin management and the audit trail additionally
// require a master admin.

pub mod adhesion;
pub mod admins;
pub mod audit;
pub mod auth;
pub mod formation;
pub mod mentorat;
pub mod recrutement;
pub mod secretariat;
pub mod tresorerie;
pub mod webinaire;
