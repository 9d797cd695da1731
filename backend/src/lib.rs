//! User directory service library.
//!
//! An in-memory store of user records kept consistent across three
//! indices (id, username, email) under one exclusive lock, plus the HTTP
//! adapter exposing it: CRUD routes, bearer-token authentication, and
//! request logging.

pub mod api;
pub mod domain;
pub mod middleware;
pub mod server;

pub use domain::{DirectoryError, User, UserDirectory, UserDraft, UserId};
pub use server::{AppDependencies, ServerConfig, build_app, create_server};
