pub mod candidature;
pub mod offre;

pub use candidature::{
    delete as candidature_delete, get as candidature_get, list as candidature_list, post as candidature_post,
    put_statut as candidature_statut,
};
pub use offre::{delete as offre_delete, get as offre_get, list as offre_list, post as offre_post, put as offre_put, stats};
