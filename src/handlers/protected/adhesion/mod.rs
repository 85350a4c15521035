pub mod bureau;
pub mod membre;

pub use membre::{
    approve as membre_approve, carte as membre_carte, delete as membre_delete, get as membre_get, list as membre_list,
    put as membre_put, reject as membre_reject, stats,
};

pub use bureau::{delete as bureau_delete, get as bureau_get, list as bureau_list, post as bureau_post, put as bureau_put};
