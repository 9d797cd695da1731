//! Actix middleware: bearer-token authentication and request logging.

pub mod auth;
pub mod request_log;

pub use auth::BearerAuth;
pub use request_log::RequestLog;
