use serde::{Deserialize, Serialize};

use crate::error::{ApiError, FieldError};

pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 500;

/// Raw `?page=&limit=` values; parsed by hand so bad input yields field errors
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: DEFAULT_PAGE_LIMIT }
    }
}

impl PageRequest {
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl TryFrom<PaginationQuery> for PageRequest {
    type Error = ApiError;

    fn try_from(query: PaginationQuery) -> Result<Self, Self::Error> {
        let mut errors = vec![];

        let page = match query.page.as_deref().map(str::trim) {
            None | Some("") => 1,
            Some(raw) => match raw.parse::<i64>() {
                Ok(p) if p >= 1 => p,
                _ => {
                    errors.push(FieldError::new("page", "page must be an integer >= 1"));
                    1
                }
            },
        };

        let limit = match query.limit.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_PAGE_LIMIT,
            Some(raw) => match raw.parse::<i64>() {
                Ok(l) if (1..=MAX_PAGE_LIMIT).contains(&l) => l,
                _ => {
                    errors.push(FieldError::new("limit", format!("limit must be an integer between 1 and {}", MAX_PAGE_LIMIT)));
                    DEFAULT_PAGE_LIMIT
                }
            },
        };

        if errors.is_empty() && (page - 1).checked_mul(limit).is_none() {
            errors.push(FieldError::new("page", "page is too large for the requested limit"));
        }

        if !errors.is_empty() {
            return Err(ApiError::validation_error("Invalid pagination parameters", errors));
        }
        Ok(Self { page, limit })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
}

impl PaginationMeta {
    pub fn new(request: PageRequest, total: i64) -> Self {
        let total_pages = if total == 0 { 0 } else { (total + request.limit - 1) / request.limit };
        Self { page: request.page, limit: request.limit, total, total_pages }
    }
}

/// One page of rows together with its pagination block
#[derive(Debug, Clone)]
pub struct Paginated<T> {
    pub rows: Vec<T>,
    pub meta: PaginationMeta,
}

impl<T> Paginated<T> {
    pub fn new(rows: Vec<T>, request: PageRequest, total: i64) -> Self {
        Self { rows, meta: PaginationMeta::new(request, total) }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated { rows: self.rows.into_iter().map(f).collect(), meta: self.meta }
    }
}

/// Enrollment status shared by formation and webinaire inscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InscriptionStatus {
    Pending,
    Confirmed,
    Rejected,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>, limit: Option<&str>) -> PaginationQuery {
        PaginationQuery { page: page.map(String::from), limit: limit.map(String::from) }
    }

    #[test]
    fn defaults_when_absent() {
        let req = PageRequest::try_from(query(None, None)).unwrap();
        assert_eq!(req, PageRequest { page: 1, limit: 20 });
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn rejects_out_of_range_values() {
        for (page, limit) in [(Some("0"), None), (None, Some("0")), (None, Some("501")), (Some("x"), None)] {
            let err = PageRequest::try_from(query(page, limit)).unwrap_err();
            assert_eq!(err.status_code(), 400);
        }
        assert!(PageRequest::try_from(query(Some("3"), Some("500"))).is_ok());
    }

    #[test]
    fn rejects_pages_whose_offset_overflows() {
        let err = PageRequest::try_from(query(Some("9223372036854775807"), Some("500"))).unwrap_err();
        assert_eq!(err.status_code(), 400);
        let req = PageRequest::try_from(query(Some("9223372036854775807"), Some("1"))).unwrap();
        assert_eq!(req.offset(), i64::MAX - 1);
    }

    #[test]
    fn computes_total_pages() {
        let meta = PaginationMeta::new(PageRequest { page: 2, limit: 20 }, 41);
        assert_eq!(meta.total_pages, 3);
        assert_eq!(PaginationMeta::new(PageRequest::default(), 0).total_pages, 0);
    }
}
