use super::error::FilterError;
use super::filter::quote_column;
use super::types::FilterOrderInfo;

pub struct FilterOrder;

impl FilterOrder {
    pub fn generate(infos: &[FilterOrderInfo]) -> Result<String, FilterError> {
        if infos.is_empty() {
            return Ok(String::new());
        }
        let parts = infos
            .iter()
            .map(|i| quote_column(&i.column).map(|c| format!("{} {}", c, i.sort.to_sql())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(format!("ORDER BY {}", parts.join(", ")))
    }
}
