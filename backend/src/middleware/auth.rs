//! Bearer-token authentication middleware.
//!
//! Requests must carry `Authorization: Bearer <token>` where the token is
//! a member of a fixed allow-list supplied at startup. There is no token
//! issuance endpoint; operators distribute tokens out of band. Failures
//! are answered with the standard JSON error envelope and never reach the
//! wrapped services.

use std::collections::HashSet;
use std::future::{Ready, ready};
use std::rc::Rc;
use std::sync::Arc;

use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::http::header::AUTHORIZATION;
use actix_web::{Error, ResponseError};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::api::ApiError;

const BEARER_PREFIX: &str = "Bearer ";

/// Authentication middleware factory holding the token allow-list.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use backend::middleware::BearerAuth;
///
/// let auth = BearerAuth::new(["mysecrettoken123".to_owned()]);
/// let app = App::new().wrap(auth);
/// ```
#[derive(Clone)]
pub struct BearerAuth {
    tokens: Arc<HashSet<String>>,
}

impl BearerAuth {
    /// Build the middleware from any collection of accepted tokens.
    pub fn new(tokens: impl IntoIterator<Item = String>) -> Self {
        Self {
            tokens: Arc::new(tokens.into_iter().collect()),
        }
    }

    fn accepts(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }
}

impl<S> Transform<S, ServiceRequest> for BearerAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse;
    type Error = Error;
    type InitError = ();
    type Transform = BearerAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(BearerAuthMiddleware {
            service: Rc::new(service),
            auth: self.clone(),
        }))
    }
}

/// Service wrapper produced by [`BearerAuth`].
pub struct BearerAuthMiddleware<S> {
    service: Rc<S>,
    auth: BearerAuth,
}

impl<S> Service<ServiceRequest> for BearerAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let auth = self.auth.clone();

        Box::pin(async move {
            let token = req
                .headers()
                .get(AUTHORIZATION)
                .and_then(|header| header.to_str().ok())
                .and_then(|value| value.strip_prefix(BEARER_PREFIX))
                .map(str::trim);

            let rejection = match token {
                None => {
                    warn!(path = %req.path(), "request without bearer token");
                    Some(ApiError::unauthorized("missing or invalid bearer token"))
                }
                Some(token) if !auth.accepts(token) => {
                    warn!(path = %req.path(), "request with unknown bearer token");
                    Some(ApiError::unauthorized("invalid token"))
                }
                Some(_) => None,
            };

            match rejection {
                Some(error) => {
                    let (req, _) = req.into_parts();
                    Ok(ServiceResponse::new(req, error.error_response()))
                }
                None => service.call(req).await,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test as actix_test, web};
    use rstest::rstest;
    use serde_json::Value;

    use super::*;

    const TOKEN: &str = "token-one";

    fn test_app() -> App<
        impl actix_web::dev::ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = Error,
            InitError = (),
        >,
    > {
        App::new().service(
            web::scope("")
                .wrap(BearerAuth::new([TOKEN.to_owned(), "token-two".to_owned()]))
                .route("/guarded", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
    }

    async fn call(authorization: Option<&str>) -> actix_web::dev::ServiceResponse {
        let app = actix_test::init_service(test_app()).await;
        let mut request = actix_test::TestRequest::get().uri("/guarded");
        if let Some(value) = authorization {
            request = request.insert_header((AUTHORIZATION, value));
        }
        actix_test::call_service(&app, request.to_request()).await
    }

    #[actix_web::test]
    async fn accepts_listed_token() {
        let response = call(Some("Bearer token-one")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[rstest]
    #[case(None, "missing or invalid bearer token")]
    #[case(Some("Basic dXNlcg=="), "missing or invalid bearer token")]
    #[case(Some("token-one"), "missing or invalid bearer token")]
    #[case(Some("Bearer who-is-this"), "invalid token")]
    #[actix_web::test]
    async fn rejects_missing_or_unknown_tokens(
        #[case] authorization: Option<&str>,
        #[case] message: &str,
    ) {
        let response = call(authorization).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let value: Value = actix_test::read_body_json(response).await;
        assert_eq!(
            value.get("code").and_then(Value::as_str),
            Some("unauthorized")
        );
        assert_eq!(value.get("message").and_then(Value::as_str), Some(message));
    }

    #[actix_web::test]
    async fn trims_whitespace_around_the_token() {
        let response = call(Some("Bearer  token-one ")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
