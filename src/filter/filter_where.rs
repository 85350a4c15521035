use serde_json::Value;

use super::error::FilterError;
use super::filter::quote_column;
use super::types::{FilterOp, FilterSearchInfo, FilterWhereInfo};

pub struct FilterWhere {
    param_values: Vec<Value>,
}

impl FilterWhere {
    fn new() -> Self {
        Self { param_values: vec![] }
    }

    /// Render the conditions as a `WHERE` body (`1=1` when empty) plus bound values
    pub fn generate(
        conditions: &[FilterWhereInfo],
        search: Option<&FilterSearchInfo>,
    ) -> Result<(String, Vec<Value>), FilterError> {
        let mut filter_where = Self::new();
        let mut sql_conditions = vec![];

        for condition in conditions {
            sql_conditions.push(filter_where.build_sql_condition(condition)?);
        }
        if let Some(search) = search {
            sql_conditions.push(filter_where.build_search(search)?);
        }

        let where_clause = if sql_conditions.is_empty() { "1=1".to_string() } else { sql_conditions.join(" AND ") };
        Ok((where_clause, filter_where.param_values))
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        let column = quote_column(&condition.column)?;
        // Text-typed comparisons go through ::text so uuid/date/enum columns compare against bound strings
        let lhs = if condition.data.is_string() { format!("{}::text", column) } else { column.clone() };

        match condition.operator {
            FilterOp::Eq if condition.data.is_null() => Ok(format!("{} IS NULL", column)),
            FilterOp::Neq if condition.data.is_null() => Ok(format!("{} IS NOT NULL", column)),
            FilterOp::Eq => Ok(format!("{} = {}", lhs, self.param(condition.data.clone()))),
            FilterOp::Neq => Ok(format!("{} IS DISTINCT FROM {}", lhs, self.param(condition.data.clone()))),
            FilterOp::Gt => Ok(format!("{} > {}", lhs, self.param(condition.data.clone()))),
            FilterOp::Gte => Ok(format!("{} >= {}", lhs, self.param(condition.data.clone()))),
            FilterOp::Lt => Ok(format!("{} < {}", lhs, self.param(condition.data.clone()))),
            FilterOp::Lte => Ok(format!("{} <= {}", lhs, self.param(condition.data.clone()))),
            FilterOp::IsNull => Ok(format!("{} IS NULL", column)),
            FilterOp::NotNull => Ok(format!("{} IS NOT NULL", column)),
            FilterOp::In => {
                let values = condition.data.as_array().ok_or_else(|| {
                    FilterError::InvalidOperatorData(format!("IN on '{}' requires an array", condition.column))
                })?;
                if values.is_empty() {
                    return Ok("1=0".to_string());
                }
                if values.iter().all(Value::is_string) {
                    Ok(format!("{}::text = ANY({})", column, self.param(condition.data.clone())))
                } else if values.iter().all(|v| v.is_i64()) {
                    Ok(format!("{} = ANY({})", column, self.param(condition.data.clone())))
                } else {
                    Err(FilterError::InvalidOperatorData(format!(
                        "IN on '{}' requires only strings or only integers",
                        condition.column
                    )))
                }
            }
        }
    }

    fn build_search(&mut self, search: &FilterSearchInfo) -> Result<String, FilterError> {
        let pattern = format!("%{}%", escape_like(&search.term));
        let placeholder = self.param(Value::String(pattern));
        let parts = search
            .columns
            .iter()
            .map(|c| quote_column(c).map(|col| format!("{}::text ILIKE {}", col, placeholder)))
            .collect::<Result<Vec<_>, _>>()?;
        if parts.is_empty() {
            return Ok("1=1".to_string());
        }
        Ok(format!("({})", parts.join(" OR ")))
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        format!("${}", self.param_values.len())
    }
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}
