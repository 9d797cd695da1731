//! Domain primitives and the user directory.
//!
//! Purpose: strongly typed user values, the validation rules they carry,
//! and the lock-guarded in-memory store. Nothing in here knows about
//! HTTP; inbound adapters translate these types and errors into
//! transport-level responses.
//!
//! Public surface:
//! - [`User`], [`UserId`], [`Username`], [`EmailAddress`], [`UserDraft`]:
//!   the entity and its validated value types.
//! - [`UserDirectory`]: the store owning all records and indices.
//! - [`DirectoryError`], [`UserValidationError`]: the failure taxonomy.

pub mod directory;
pub mod user;

pub use self::directory::{DirectoryError, DirectoryResult, UserDirectory};
pub use self::user::{
    EmailAddress, FIELD_MAX_CHARS, User, UserDraft, UserId, UserValidationError, Username,
};
