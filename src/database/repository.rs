use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::filter::Filter;

/// A row type persisted in one table.
///
/// `TABLE` is schema-qualified (`secretariat.reunions`); every entity carries
/// a UUID primary key named `id`.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + Unpin + 'static {
    const TABLE: &'static str;

    fn id(&self) -> Uuid;
}

/// Storage contract shared by every module.
///
/// Implementations: [`crate::database::PgRepository`] for Postgres and
/// [`crate::database::MemoryRepository`] for in-process use.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    async fn select_any(&self, filter: &Filter) -> Result<Vec<T>, DatabaseError>;

    async fn count(&self, filter: &Filter) -> Result<i64, DatabaseError>;

    async fn get(&self, id: Uuid) -> Result<Option<T>, DatabaseError>;

    async fn insert(&self, entity: &T) -> Result<T, DatabaseError>;

    /// Replace the stored row with the same id; `NotFound` when absent
    async fn update(&self, entity: &T) -> Result<T, DatabaseError>;

    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError>;

    async fn delete_where(&self, filter: &Filter) -> Result<u64, DatabaseError>;

    async fn select_one(&self, filter: &Filter) -> Result<Option<T>, DatabaseError> {
        let mut rows = self.select_any(&filter.clone().limit(1)).await?;
        Ok(rows.pop())
    }

    async fn select_404(&self, id: Uuid) -> Result<T, DatabaseError> {
        self.get(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} record {} not found", entity_label(T::TABLE), id)))
    }

    async fn exists(&self, filter: &Filter) -> Result<bool, DatabaseError> {
        Ok(self.count(filter).await? > 0)
    }

    /// One page of rows plus the unwindowed total
    async fn select_page(&self, filter: &Filter, limit: i64, offset: i64) -> Result<(Vec<T>, i64), DatabaseError> {
        let total = self.count(&filter.without_window()).await?;
        let rows = self.select_any(&filter.clone().limit(limit).offset(offset)).await?;
        Ok((rows, total))
    }
}

/// `secretariat.reunions` -> `reunions`
pub fn entity_label(table: &str) -> &str {
    table.rsplit('.').next().unwrap_or(table)
}
