pub mod formation;
pub mod inscription;
pub mod session;

pub use formation::{delete, get, list, post, put, stats};
pub use inscription::{
    delete as inscription_delete, list as inscription_list, post as inscription_post, put_statut as inscription_statut,
};
pub use session::{delete as session_delete, list as session_list, post as session_post, put as session_put};
