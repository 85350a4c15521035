pub mod access;
pub mod auth;
pub mod extract;
pub mod rate_limit;
pub mod response;

pub use access::{require_master, require_module};
pub use auth::{require_auth, AuthAdmin};
pub use extract::{AppJson, AppPath, AppQuery, Pagination, ValidatedJson};
pub use rate_limit::{rate_limit_generic, rate_limit_strict};
pub use response::{ApiResponse, ApiResult, PdfAttachment};
