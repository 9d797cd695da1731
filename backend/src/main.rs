//! Backend entry-point: wires the user directory behind REST endpoints.

use actix_web::web;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use backend::api::health::HealthState;
use backend::domain::UserDirectory;
use backend::server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let config = ServerConfig::from_env()?;

    // One directory owned for the whole process lifetime; handlers share
    // it by reference through actix application data.
    let directory = web::Data::new(UserDirectory::new());
    let health_state = web::Data::new(HealthState::new());

    let server = create_server(directory, health_state, &config)?;
    info!(addr = %config.bind_addr(), "user directory listening");
    server.await
}
