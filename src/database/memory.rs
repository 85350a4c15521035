use std::marker::PhantomData;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::repository::{Entity, Repository};
use crate::filter::Filter;

/// In-process repository keeping rows in their JSON form, so filters are
/// evaluated exactly as the Postgres implementation renders them.
pub struct MemoryRepository<T> {
    rows: RwLock<Vec<Value>>,
    _phantom: PhantomData<T>,
}

impl<T: Entity> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> MemoryRepository<T> {
    pub fn new() -> Self {
        Self { rows: RwLock::new(Vec::new()), _phantom: PhantomData }
    }

    fn id_of(row: &Value) -> Option<&str> {
        row.get("id").and_then(Value::as_str)
    }

    fn decode(row: Value) -> Result<T, DatabaseError> {
        Ok(serde_json::from_value(row)?)
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for MemoryRepository<T> {
    async fn select_any(&self, filter: &Filter) -> Result<Vec<T>, DatabaseError> {
        let rows = self.rows.read().await;
        let mut matched: Vec<Value> = rows.iter().filter(|r| filter.matches(r)).cloned().collect();
        filter.sort_rows(&mut matched);
        filter.window(matched).into_iter().map(Self::decode).collect()
    }

    async fn count(&self, filter: &Filter) -> Result<i64, DatabaseError> {
        let rows = self.rows.read().await;
        Ok(rows.iter().filter(|r| filter.matches(r)).count() as i64)
    }

    async fn get(&self, id: Uuid) -> Result<Option<T>, DatabaseError> {
        let key = id.to_string();
        let rows = self.rows.read().await;
        rows.iter()
            .find(|r| Self::id_of(r) == Some(key.as_str()))
            .cloned()
            .map(Self::decode)
            .transpose()
    }

    async fn insert(&self, entity: &T) -> Result<T, DatabaseError> {
        let value = serde_json::to_value(entity)?;
        let key = entity.id().to_string();
        let mut rows = self.rows.write().await;
        if rows.iter().any(|r| Self::id_of(r) == Some(key.as_str())) {
            return Err(DatabaseError::Query(format!("duplicate primary key {} in {}", key, T::TABLE)));
        }
        rows.push(value.clone());
        Self::decode(value)
    }

    async fn update(&self, entity: &T) -> Result<T, DatabaseError> {
        let value = serde_json::to_value(entity)?;
        let key = entity.id().to_string();
        let mut rows = self.rows.write().await;
        match rows.iter_mut().find(|r| Self::id_of(r) == Some(key.as_str())) {
            Some(slot) => {
                *slot = value.clone();
                Self::decode(value)
            }
            None => Err(DatabaseError::NotFound(format!("{} record {} not found", T::TABLE, key))),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let key = id.to_string();
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|r| Self::id_of(r) != Some(key.as_str()));
        Ok(rows.len() < before)
    }

    async fn delete_where(&self, filter: &Filter) -> Result<u64, DatabaseError> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|r| !filter.matches(r));
        Ok((before - rows.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: Uuid,
        titre: String,
        rang: i32,
    }

    impl Entity for Note {
        const TABLE: &'static str = "test.notes";
        fn id(&self) -> Uuid {
            self.id
        }
    }

    fn note(titre: &str, rang: i32) -> Note {
        Note { id: Uuid::new_v4(), titre: titre.to_string(), rang }
    }

    #[tokio::test]
    async fn crud_round_trip() {
        let repo = MemoryRepository::<Note>::new();
        let a = repo.insert(&note("a", 2)).await.unwrap();
        repo.insert(&note("b", 1)).await.unwrap();

        let mut changed = a.clone();
        changed.titre = "a2".to_string();
        repo.update(&changed).await.unwrap();
        assert_eq!(repo.get(a.id).await.unwrap().unwrap().titre, "a2");

        let ordered = repo.select_any(&Filter::new().order_asc("rang")).await.unwrap();
        assert_eq!(ordered[0].titre, "b");

        assert!(repo.delete(a.id).await.unwrap());
        assert_eq!(repo.count(&Filter::new()).await.unwrap(), 1);
        assert!(repo.select_404(a.id).await.is_err());
    }

    #[tokio::test]
    async fn update_of_missing_row_is_not_found() {
        let repo = MemoryRepository::<Note>::new();
        let err = repo.update(&note("x", 0)).await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound(_)));
    }

    #[tokio::test]
    async fn select_page_reports_total() {
        let repo = MemoryRepository::<Note>::new();
        for i in 0..7 {
            repo.insert(&note(&format!("n{}", i), i)).await.unwrap();
        }
        let (rows, total) = repo.select_page(&Filter::new().order_desc("rang"), 3, 3).await.unwrap();
        assert_eq!(total, 7);
        assert_eq!(rows.iter().map(|n| n.rang).collect::<Vec<_>>(), vec![3, 2, 1]);
    }
}
