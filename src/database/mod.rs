pub mod manager;
pub mod memory;
pub mod postgres;
pub mod registry;
pub mod repository;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryRepository;
pub use postgres::PgRepository;
pub use registry::Repositories;
pub use repository::{Entity, Repository};
