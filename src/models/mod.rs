//! Row types for every module, one file per database schema.

macro_rules! entity {
    ($ty:ty, $table:literal) => {
        impl $crate::database::Entity for $ty {
            const TABLE: &'static str = $table;

            fn id(&self) -> uuid::Uuid {
                self.id
            }
        }
    };
}

pub mod adhesion;
pub mod admin;
pub mod audit;
pub mod common;
pub mod formation;
pub mod mentorat;
pub mod recrutement;
pub mod secretariat;
pub mod tresorerie;
pub mod webinaire;

pub use common::*;
