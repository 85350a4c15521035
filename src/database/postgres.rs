use std::marker::PhantomData;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgArguments, PgPool, Row};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::repository::{Entity, Repository};
use crate::filter::filter::{quote_column, quote_table};
use crate::filter::Filter;

/// Postgres-backed repository.
///
/// Rows travel as JSON in both directions: reads use `row_to_json`, writes use
/// `jsonb_populate_record` against the table's own row type, so one generic
/// implementation serves every entity without per-table SQL.
pub struct PgRepository<T> {
    pool: PgPool,
    _phantom: PhantomData<T>,
}

impl<T: Entity> PgRepository<T> {
    pub fn new(pool: PgPool) -> Self {
        Self { pool, _phantom: PhantomData }
    }

    fn decode_row(row: &sqlx::postgres::PgRow) -> Result<T, DatabaseError> {
        let value: Value = row.try_get("row")?;
        Ok(serde_json::from_value(value)?)
    }

    fn entity_object(entity: &T) -> Result<serde_json::Map<String, Value>, DatabaseError> {
        match serde_json::to_value(entity)? {
            Value::Object(map) => Ok(map),
            _ => Err(DatabaseError::Query(format!("{} entity must serialize to an object", T::TABLE))),
        }
    }
}

type PgQuery<'q> = sqlx::query::Query<'q, sqlx::Postgres, PgArguments>;

fn bind_param<'q>(q: PgQuery<'q>, v: &Value) -> PgQuery<'q> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s.clone()),
        Value::Array(arr) => {
            // FilterWhere only emits homogeneous string or integer arrays
            if arr.iter().all(|v| v.is_i64()) {
                q.bind(arr.iter().filter_map(Value::as_i64).collect::<Vec<i64>>())
            } else {
                q.bind(
                    arr.iter()
                        .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                        .collect::<Vec<String>>(),
                )
            }
        }
        Value::Object(_) => q.bind(sqlx::types::Json(v.clone())),
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for PgRepository<T> {
    async fn select_any(&self, filter: &Filter) -> Result<Vec<T>, DatabaseError> {
        let sql = filter.to_select_sql(T::TABLE)?;
        let mut q = sqlx::query(&sql.query);
        for p in sql.params.iter() {
            q = bind_param(q, p);
        }
        let rows = q.fetch_all(&self.pool).await?;
        rows.iter().map(Self::decode_row).collect()
    }

    async fn count(&self, filter: &Filter) -> Result<i64, DatabaseError> {
        let sql = filter.to_count_sql(T::TABLE)?;
        let mut q = sqlx::query(&sql.query);
        for p in sql.params.iter() {
            q = bind_param(q, p);
        }
        let row = q.fetch_one(&self.pool).await?;
        let count: i64 = row.try_get("count")?;
        Ok(count)
    }

    async fn get(&self, id: Uuid) -> Result<Option<T>, DatabaseError> {
        let query = format!(
            "SELECT row_to_json(t.*) AS row FROM {} AS t WHERE t.\"id\" = $1",
            quote_table(T::TABLE)?
        );
        let row = sqlx::query(&query).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(Self::decode_row).transpose()
    }

    async fn insert(&self, entity: &T) -> Result<T, DatabaseError> {
        let table = quote_table(T::TABLE)?;
        let object = Value::Object(Self::entity_object(entity)?);
        let query = format!(
            "INSERT INTO {table} AS t SELECT * FROM jsonb_populate_record(NULL::{table}, $1) RETURNING row_to_json(t.*) AS row"
        );
        let row = sqlx::query(&query)
            .bind(sqlx::types::Json(object))
            .fetch_one(&self.pool)
            .await?;
        Self::decode_row(&row)
    }

    async fn update(&self, entity: &T) -> Result<T, DatabaseError> {
        let table = quote_table(T::TABLE)?;
        let object = Self::entity_object(entity)?;
        let columns = object
            .keys()
            .filter(|k| k.as_str() != "id")
            .map(|k| quote_column(k).map(|_| format!("\"{}\"", k)))
            .collect::<Result<Vec<_>, _>>()?;
        if columns.is_empty() {
            return Err(DatabaseError::Query(format!("{} has no updatable columns", T::TABLE)));
        }
        let column_list = columns.join(", ");
        let query = format!(
            "UPDATE {table} AS t SET ({column_list}) = (SELECT {column_list} FROM jsonb_populate_record(NULL::{table}, $1)) \
             WHERE t.\"id\" = $2 RETURNING row_to_json(t.*) AS row"
        );
        let row = sqlx::query(&query)
            .bind(sqlx::types::Json(Value::Object(object)))
            .bind(entity.id())
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Self::decode_row(&row),
            None => Err(DatabaseError::NotFound(format!("{} record {} not found", T::TABLE, entity.id()))),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let query = format!("DELETE FROM {} AS t WHERE t.\"id\" = $1", quote_table(T::TABLE)?);
        let result = sqlx::query(&query).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_where(&self, filter: &Filter) -> Result<u64, DatabaseError> {
        let sql = filter.to_delete_sql(T::TABLE)?;
        let mut q = sqlx::query(&sql.query);
        for p in sql.params.iter() {
            q = bind_param(q, p);
        }
        let result = q.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
