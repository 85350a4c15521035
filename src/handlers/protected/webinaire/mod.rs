pub mod inscription;
pub mod presentateur;
pub mod webinaire;

pub use inscription::{
    delete as inscription_delete, list as inscription_list, post as inscription_post, put_presence as inscription_presence,
    put_statut as inscription_statut,
};
pub use presentateur::{
    delete as presentateur_delete, list as presentateur_list, post as presentateur_post, put as presentateur_put,
};
pub use webinaire::{delete, get, list, post, put, stats, webinaire_stats};
