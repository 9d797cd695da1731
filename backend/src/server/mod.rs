//! Server construction and middleware wiring.

mod config;

pub use config::{BIND_ADDR_VAR, ServerConfig, TOKENS_VAR};

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use crate::api::diag::{fail, root};
use crate::api::error::{json_error_handler, path_error_handler};
use crate::api::health::{HealthState, live, ready};
use crate::api::users::{
    create_user, delete_user, get_user, get_user_by_username, list_users, update_user,
};
use crate::domain::UserDirectory;
use crate::middleware::{BearerAuth, RequestLog};

/// Dependency bundle for one application instance.
///
/// `HttpServer` invokes its factory once per worker, so everything in
/// here must be cheap to clone; the directory and health state are shared
/// behind [`web::Data`].
#[derive(Clone)]
pub struct AppDependencies {
    /// Shared user store.
    pub directory: web::Data<UserDirectory>,
    /// Shared readiness/liveness state.
    pub health_state: web::Data<HealthState>,
    /// Bearer-token gate for the user routes.
    pub auth: BearerAuth,
}

/// Compose the application: logging on the outside, authentication around
/// the user routes only, health probes open.
pub fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        directory,
        health_state,
        auth,
    } = deps;

    let users = web::scope("")
        .wrap(auth)
        .service(root)
        .service(fail)
        .service(list_users)
        .service(get_user_by_username)
        .service(get_user)
        .service(create_user)
        .service(update_user)
        .service(delete_user);

    App::new()
        .app_data(directory)
        .app_data(health_state)
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .wrap(RequestLog)
        .service(ready)
        .service(live)
        .service(users)
}

/// Construct an Actix HTTP server serving the user directory.
///
/// # Parameters
/// - `directory`: the store shared by every worker.
/// - `health_state`: shared readiness state flipped once the listener is bound.
/// - `config`: bind address and token allow-list.
///
/// # Returns
/// A spawned [`Server`] that must be awaited to drive the listener.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    directory: web::Data<UserDirectory>,
    health_state: web::Data<HealthState>,
    config: &ServerConfig,
) -> std::io::Result<Server> {
    let auth = BearerAuth::new(config.tokens.iter().cloned());
    let server_health_state = health_state.clone();

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            directory: directory.clone(),
            health_state: server_health_state.clone(),
            auth: auth.clone(),
        })
    })
    .bind(config.bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
