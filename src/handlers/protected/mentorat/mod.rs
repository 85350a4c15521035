pub mod binome;
pub mod mentor;
pub mod mentore;

pub use binome::{delete as binome_delete, get as binome_get, list as binome_list, post as binome_post, put_statut as binome_statut, stats};
pub use mentor::{delete as mentor_delete, get as mentor_get, list as mentor_list, post as mentor_post, put as mentor_put};
pub use mentore::{delete as mentore_delete, get as mentore_get, list as mentore_list, post as mentore_post, put as mentore_put};
