use std::cmp::Ordering;

use serde_json::Value;

use super::filter::Filter;
use super::types::{FilterOp, SortDirection};

/// Loose comparison mirroring how Postgres compares the stored column:
/// numbers numerically (decimals may be stored as strings), strings
/// lexically (ISO dates sort correctly), booleans as booleans.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::String(s), Value::Number(n)) => s.parse::<f64>().ok()?.partial_cmp(&n.as_f64()?),
        (Value::Number(n), Value::String(s)) => n.as_f64()?.partial_cmp(&s.parse::<f64>().ok()?),
        _ => None,
    }
}

fn field<'a>(row: &'a Value, column: &str) -> &'a Value {
    row.get(column).unwrap_or(&Value::Null)
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl Filter {
    /// Evaluate the filter conditions and search against one JSON row
    pub fn matches(&self, row: &Value) -> bool {
        let conditions_hold = self.conditions().iter().all(|c| {
            let actual = field(row, &c.column);
            match c.operator {
                FilterOp::Eq if c.data.is_null() => actual.is_null(),
                FilterOp::Neq if c.data.is_null() => !actual.is_null(),
                FilterOp::Eq => compare_values(actual, &c.data) == Some(Ordering::Equal),
                FilterOp::Neq => compare_values(actual, &c.data) != Some(Ordering::Equal),
                FilterOp::Gt => compare_values(actual, &c.data) == Some(Ordering::Greater),
                FilterOp::Gte => matches!(compare_values(actual, &c.data), Some(Ordering::Greater | Ordering::Equal)),
                FilterOp::Lt => compare_values(actual, &c.data) == Some(Ordering::Less),
                FilterOp::Lte => matches!(compare_values(actual, &c.data), Some(Ordering::Less | Ordering::Equal)),
                FilterOp::IsNull => actual.is_null(),
                FilterOp::NotNull => !actual.is_null(),
                FilterOp::In => c
                    .data
                    .as_array()
                    .map(|values| values.iter().any(|v| compare_values(actual, v) == Some(Ordering::Equal)))
                    .unwrap_or(false),
            }
        });
        if !conditions_hold {
            return false;
        }

        match self.search_info() {
            Some(search) => {
                let needle = search.term.to_lowercase();
                search
                    .columns
                    .iter()
                    .any(|c| text_of(field(row, c)).to_lowercase().contains(&needle))
            }
            None => true,
        }
    }

    /// Sort rows by the filter's ORDER BY list (NULLs last ascending, first descending)
    pub fn sort_rows(&self, rows: &mut [Value]) {
        if self.order_info().is_empty() {
            return;
        }
        rows.sort_by(|a, b| {
            for order in self.order_info() {
                let (x, y) = (field(a, &order.column), field(b, &order.column));
                let ordering = match (x.is_null(), y.is_null()) {
                    (true, true) => Ordering::Equal,
                    (true, false) => Ordering::Greater,
                    (false, true) => Ordering::Less,
                    (false, false) => compare_values(x, y).unwrap_or(Ordering::Equal),
                };
                let ordering = match order.sort {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
    }

    /// Apply OFFSET/LIMIT to an already filtered and sorted row set
    pub fn window<T>(&self, rows: Vec<T>) -> Vec<T> {
        let offset = self.offset_value().unwrap_or(0) as usize;
        let iter = rows.into_iter().skip(offset);
        match self.limit_value() {
            Some(limit) => iter.take(limit as usize).collect(),
            None => iter.collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn matches_equality_ranges_and_decimal_strings() {
        let row = json!({"statut": "validee", "montant": "150.00", "date": "2025-03-04", "pays": null});
        assert!(Filter::new().eq("statut", "validee").matches(&row));
        assert!(Filter::new().gte("montant", 100).matches(&row));
        assert!(Filter::new().gte("date", "2025-03-01").lt("date", "2025-04-01").matches(&row));
        assert!(Filter::new().is_null("pays").matches(&row));
        assert!(!Filter::new().eq("statut", "annulee").matches(&row));
    }

    #[test]
    fn search_is_case_insensitive_across_columns() {
        let row = json!({"nom": "Diallo", "email": "a.diallo@example.org"});
        assert!(Filter::new().search(&["nom", "email"], Some("DIAL")).matches(&row));
        assert!(!Filter::new().search(&["nom"], Some("ndiaye")).matches(&row));
    }

    #[test]
    fn sorts_with_nulls_last_then_windows() {
        let mut rows = vec![json!({"d": "2025-02-01"}), json!({"d": null}), json!({"d": "2025-01-01"})];
        let filter = Filter::new().order_asc("d").offset(1).limit(1);
        filter.sort_rows(&mut rows);
        assert_eq!(rows[0]["d"], "2025-01-01");
        assert!(rows[2]["d"].is_null());
        let page = filter.window(rows);
        assert_eq!(page, vec![json!({"d": "2025-02-01"})]);
    }
}
