//! PDF generation for meeting minutes and presidency reports.

pub mod layout;
pub mod reports;
pub mod store;
pub mod writer;

pub use reports::{render_compte_rendu, render_rapport_presidence, ActionLine, ParticipantLine, PresidenceReport, ReunionReport};
pub use store::{sha256_hex, ArtifactError, ArtifactStore};
