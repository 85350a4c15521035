pub mod action;
pub mod compte_rendu;
pub mod document;
pub mod groupe;
pub mod participant;
pub mod projet;
pub mod rapport;
pub mod reunion;

pub use action::{
    delete as action_delete, get as action_get, list as action_list, post as action_post, put as action_put,
    put_statut as action_statut,
};
pub use compte_rendu::{get as compte_rendu_get, put as compte_rendu_put};
pub use document::{delete as document_delete, list as document_list, post as document_post};
pub use groupe::{
    delete as groupe_delete, get as groupe_get, list as groupe_list, membre_delete as groupe_membre_delete,
    membre_list as groupe_membre_list, membre_post as groupe_membre_post, post as groupe_post, put as groupe_put,
};
pub use participant::{
    delete as participant_delete, list as participant_list, post as participant_post,
    put_invitation as participant_invitation, put_presence as participant_presence,
};
pub use projet::{
    get as projet_get, inscription_list as projet_inscription_list, list as projet_list, post as projet_post,
    put as projet_put,
};
pub use rapport::{get as rapport_get, list as rapport_list, pdf as rapport_pdf, post as rapport_post};
pub use reunion::{
    delete as reunion_delete, get as reunion_get, list as reunion_list, pdf as reunion_pdf, post as reunion_post,
    put as reunion_put, stats,
};
