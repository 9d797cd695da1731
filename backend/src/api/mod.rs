//! HTTP inbound adapter exposing REST endpoints.

pub mod diag;
pub mod error;
pub mod health;
pub mod users;

pub use error::{ApiError, ApiResult, ErrorCode};
