use serde::Serialize;
use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterOp, FilterOrderInfo, FilterSearchInfo, FilterWhereInfo, SortDirection, SqlResult};

/// Typed query description shared by every repository backend.
///
/// The same `Filter` renders to parameterised SQL for Postgres and is
/// evaluated directly against the JSON form of a row by the memory store,
/// so services never see which backend they run on.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conditions: Vec<FilterWhereInfo>,
    search: Option<FilterSearchInfo>,
    order: Vec<FilterOrderInfo>,
    limit: Option<i64>,
    offset: Option<i64>,
}

fn to_value(value: impl Serialize) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, column: &str, operator: FilterOp, data: Value) -> Self {
        self.conditions.push(FilterWhereInfo { column: column.to_string(), operator, data });
        self
    }

    pub fn eq(self, column: &str, value: impl Serialize) -> Self {
        self.push(column, FilterOp::Eq, to_value(value))
    }

    /// Equality only when a value is present; used for optional query-string filters
    pub fn eq_opt<V: Serialize>(self, column: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.eq(column, v),
            None => self,
        }
    }

    pub fn neq(self, column: &str, value: impl Serialize) -> Self {
        self.push(column, FilterOp::Neq, to_value(value))
    }

    pub fn gt(self, column: &str, value: impl Serialize) -> Self {
        self.push(column, FilterOp::Gt, to_value(value))
    }

    pub fn gte(self, column: &str, value: impl Serialize) -> Self {
        self.push(column, FilterOp::Gte, to_value(value))
    }

    pub fn gte_opt<V: Serialize>(self, column: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.gte(column, v),
            None => self,
        }
    }

    pub fn lt(self, column: &str, value: impl Serialize) -> Self {
        self.push(column, FilterOp::Lt, to_value(value))
    }

    pub fn lte(self, column: &str, value: impl Serialize) -> Self {
        self.push(column, FilterOp::Lte, to_value(value))
    }

    pub fn lte_opt<V: Serialize>(self, column: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.lte(column, v),
            None => self,
        }
    }

    pub fn is_in<V: Serialize>(self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        let data = Value::Array(values.into_iter().map(to_value).collect());
        self.push(column, FilterOp::In, data)
    }

    pub fn is_null(self, column: &str) -> Self {
        self.push(column, FilterOp::IsNull, Value::Null)
    }

    pub fn not_null(self, column: &str) -> Self {
        self.push(column, FilterOp::NotNull, Value::Null)
    }

    /// Blank or missing terms leave the filter unchanged
    pub fn search(mut self, columns: &[&str], term: Option<&str>) -> Self {
        if let Some(term) = term.map(str::trim).filter(|t| !t.is_empty()) {
            self.search = Some(FilterSearchInfo {
                columns: columns.iter().map(|c| c.to_string()).collect(),
                term: term.to_string(),
            });
        }
        self
    }

    pub fn order_by(mut self, column: &str, sort: SortDirection) -> Self {
        self.order.push(FilterOrderInfo { column: column.to_string(), sort });
        self
    }

    pub fn order_asc(self, column: &str) -> Self {
        self.order_by(column, SortDirection::Asc)
    }

    pub fn order_desc(self, column: &str) -> Self {
        self.order_by(column, SortDirection::Desc)
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit.max(0));
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset.max(0));
        self
    }

    /// Same conditions, no ordering or window; used for counts
    pub fn without_window(&self) -> Self {
        Self {
            conditions: self.conditions.clone(),
            search: self.search.clone(),
            order: vec![],
            limit: None,
            offset: None,
        }
    }

    pub fn conditions(&self) -> &[FilterWhereInfo] {
        &self.conditions
    }

    pub fn search_info(&self) -> Option<&FilterSearchInfo> {
        self.search.as_ref()
    }

    pub fn order_info(&self) -> &[FilterOrderInfo] {
        &self.order
    }

    pub fn limit_value(&self) -> Option<i64> {
        self.limit
    }

    pub fn offset_value(&self) -> Option<i64> {
        self.offset
    }

    pub fn to_select_sql(&self, table: &str) -> Result<SqlResult, FilterError> {
        let table = quote_table(table)?;
        let (where_clause, params) = FilterWhere::generate(&self.conditions, self.search.as_ref())?;
        let order_clause = FilterOrder::generate(&self.order)?;

        let query = [
            "SELECT row_to_json(t.*) AS row".to_string(),
            format!("FROM {} AS t", table),
            format!("WHERE {}", where_clause),
            order_clause,
            self.build_limit_clause(),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        Ok(SqlResult { query, params })
    }

    pub fn to_count_sql(&self, table: &str) -> Result<SqlResult, FilterError> {
        let table = quote_table(table)?;
        let (where_clause, params) = FilterWhere::generate(&self.conditions, self.search.as_ref())?;
        Ok(SqlResult {
            query: format!("SELECT COUNT(*) AS count FROM {} AS t WHERE {}", table, where_clause),
            params,
        })
    }

    pub fn to_delete_sql(&self, table: &str) -> Result<SqlResult, FilterError> {
        let table = quote_table(table)?;
        let (where_clause, params) = FilterWhere::generate(&self.conditions, self.search.as_ref())?;
        Ok(SqlResult {
            query: format!("DELETE FROM {} AS t WHERE {}", table, where_clause),
            params,
        })
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            (None, Some(o)) => format!("OFFSET {}", o),
            _ => String::new(),
        }
    }
}

/// Validate a bare SQL identifier (letters, digits, underscore; not starting with a digit)
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

pub fn quote_column(column: &str) -> Result<String, FilterError> {
    if !is_valid_identifier(column) {
        return Err(FilterError::InvalidColumn(column.to_string()));
    }
    Ok(format!("t.\"{}\"", column))
}

/// Quote `schema.table` (or a bare table) after validating each part
pub fn quote_table(table: &str) -> Result<String, FilterError> {
    let parts: Vec<&str> = table.split('.').collect();
    if parts.is_empty() || parts.len() > 2 || !parts.iter().all(|p| is_valid_identifier(p)) {
        return Err(FilterError::InvalidTableName(table.to_string()));
    }
    Ok(parts.iter().map(|p| format!("\"{}\"", p)).collect::<Vec<_>>().join("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_conditions_search_and_window() {
        let sql = Filter::new()
            .eq("statut", "pending")
            .gte("annee", 2024)
            .search(&["nom", "email"], Some("dia"))
            .order_desc("created_at")
            .limit(20)
            .offset(40)
            .to_select_sql("adhesion.membres")
            .unwrap();

        assert_eq!(
            sql.query,
            "SELECT row_to_json(t.*) AS row FROM \"adhesion\".\"membres\" AS t \
             WHERE t.\"statut\"::text = $1 AND t.\"annee\" >= $2 \
             AND (t.\"nom\"::text ILIKE $3 OR t.\"email\"::text ILIKE $3) \
             ORDER BY t.\"created_at\" DESC LIMIT 20 OFFSET 40"
        );
        assert_eq!(sql.params, vec![json!("pending"), json!(2024), json!("%dia%")]);
    }

    #[test]
    fn empty_filter_selects_everything() {
        let sql = Filter::new().to_count_sql("auth.admins").unwrap();
        assert_eq!(sql.query, "SELECT COUNT(*) AS count FROM \"auth\".\"admins\" AS t WHERE 1=1");
        assert!(sql.params.is_empty());
    }

    #[test]
    fn rejects_injected_identifiers() {
        assert!(Filter::new().eq("nom; DROP TABLE x", 1).to_select_sql("a.b").is_err());
        assert!(Filter::new().to_select_sql("a.b.c").is_err());
        assert!(Filter::new().to_select_sql("a-b").is_err());
    }

    #[test]
    fn blank_search_terms_are_ignored() {
        let filter = Filter::new().search(&["nom"], Some("   "));
        assert!(filter.search_info().is_none());
    }
}
