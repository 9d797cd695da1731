//! HTTP server configuration object and helpers.

use std::env;
use std::net::SocketAddr;

use tracing::warn;

/// Environment variable naming the socket address to bind.
pub const BIND_ADDR_VAR: &str = "USER_API_BIND";
/// Environment variable carrying the comma-separated token allow-list.
pub const TOKENS_VAR: &str = "USER_API_TOKENS";

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Builder-style configuration for creating the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) tokens: Vec<String>,
}

impl ServerConfig {
    /// Construct a server configuration from explicit values.
    #[must_use]
    pub fn new(bind_addr: SocketAddr, tokens: Vec<String>) -> Self {
        Self { bind_addr, tokens }
    }

    /// Read configuration from the environment.
    ///
    /// `USER_API_BIND` falls back to `127.0.0.1:8080` when unset.
    /// `USER_API_TOKENS` is a comma-separated allow-list; when unset, a
    /// pair of well-known development tokens is used and a warning is
    /// emitted so the fallback never goes unnoticed in production logs.
    ///
    /// # Errors
    /// Returns [`std::io::Error`] when the bind address does not parse.
    pub fn from_env() -> std::io::Result<Self> {
        let raw_addr = env::var(BIND_ADDR_VAR).unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_owned());
        let bind_addr = raw_addr.parse().map_err(|e| {
            std::io::Error::other(format!("invalid {BIND_ADDR_VAR} value {raw_addr:?}: {e}"))
        })?;

        let tokens = match env::var(TOKENS_VAR) {
            Ok(raw) => parse_token_list(&raw),
            Err(_) => {
                warn!("{TOKENS_VAR} not set, using development tokens");
                vec!["mysecrettoken123".to_owned(), "another-valid-token".to_owned()]
            }
        };
        if tokens.is_empty() {
            return Err(std::io::Error::other(format!(
                "{TOKENS_VAR} must list at least one token"
            )));
        }

        Ok(Self { bind_addr, tokens })
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Return the accepted bearer tokens.
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}

fn parse_token_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
