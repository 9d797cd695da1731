//! Diagnostic endpoints living inside the authenticated scope: a root
//! reachability check and a deliberately failing route that proves
//! server faults reach clients as the redacted error envelope.

use actix_web::{get, web};

use crate::api::{ApiError, ApiResult};

/// Root reachability check.
#[get("/")]
pub async fn root() -> web::Json<&'static str> {
    web::Json("I am root")
}

/// Always fails so operators can verify the 500 path end to end.
///
/// The message never reaches clients; internal errors are redacted by
/// the envelope before serialisation.
#[get("/throw")]
pub async fn fail() -> ApiResult<web::Json<()>> {
    Err(ApiError::internal("deliberate failure"))
}
