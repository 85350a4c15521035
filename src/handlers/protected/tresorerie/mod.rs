pub mod cotisation;
pub mod depense;
pub mod paiement;
pub mod registre;

pub use cotisation::{
    cancel as cotisation_cancel, delete as cotisation_delete, get as cotisation_get, list as cotisation_list,
    post as cotisation_post, reset as cotisation_reset, validate as cotisation_validate,
};
pub use depense::{
    cancel as depense_cancel, delete as depense_delete, get as depense_get, list as depense_list, post as depense_post,
    reject as depense_reject, validate as depense_validate,
};
pub use paiement::{
    cancel as paiement_cancel, delete as paiement_delete, get as paiement_get, list as paiement_list,
    post as paiement_post, reject as paiement_reject, validate as paiement_validate,
};
pub use registre::{bilan, carte_cancel, carte_list, carte_post, historique};
