//! User entity and validated value types.
//!
//! Purpose: own the field-level validation rules so the rest of the
//! service only ever handles well-formed usernames, email addresses, and
//! ages. Serialisation contracts (serde) are documented on each type.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of characters accepted for usernames and email addresses.
pub const FIELD_MAX_CHARS: usize = 256;

/// Validation errors raised while constructing user value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UserValidationError {
    /// Username is empty once trimmed of whitespace.
    #[error("username must not be empty")]
    EmptyUsername,
    /// Username exceeds the maximum length.
    #[error("username must be at most {max} characters")]
    UsernameTooLong {
        /// Maximum permitted length.
        max: usize,
    },
    /// Email address is empty once trimmed of whitespace.
    #[error("email must not be empty")]
    EmptyEmail,
    /// Email address exceeds the maximum length.
    #[error("email must be at most {max} characters")]
    EmailTooLong {
        /// Maximum permitted length.
        max: usize,
    },
    /// Email address does not match the `local@domain.tld` shape.
    #[error("email must be a valid address")]
    InvalidEmail,
    /// Age is below zero.
    #[error("age must be non-negative")]
    NegativeAge,
    /// Age exceeds the supported range.
    #[error("age must be at most {max}")]
    AgeOutOfRange {
        /// Maximum permitted age value.
        max: u32,
    },
}

/// Stable numeric user identifier.
///
/// Identifiers are allocated by the directory, start at 1, strictly
/// increase, and are never reissued within a process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    /// Wrap a raw identifier value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Access the raw identifier value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for UserId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Username chosen by the user.
///
/// ## Invariants
/// - Non-empty once trimmed of whitespace.
/// - At most [`FIELD_MAX_CHARS`] characters.
///
/// Uniqueness is case-insensitive across the directory; the original
/// casing is preserved here and [`Username::folded`] yields the index key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validate and construct a [`Username`] from owned input.
    pub fn new(username: impl Into<String>) -> Result<Self, UserValidationError> {
        Self::from_owned(username.into())
    }

    fn from_owned(username: String) -> Result<Self, UserValidationError> {
        if username.trim().is_empty() {
            return Err(UserValidationError::EmptyUsername);
        }
        if username.chars().count() > FIELD_MAX_CHARS {
            return Err(UserValidationError::UsernameTooLong {
                max: FIELD_MAX_CHARS,
            });
        }
        Ok(Self(username))
    }

    /// Lower-cased form used as the case-insensitive index key.
    #[must_use]
    pub fn folded(&self) -> String {
        self.0.to_lowercase()
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl TryFrom<String> for Username {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        // Deliberately loose: one `@`, no whitespace, a dotted domain.
        let pattern = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Email address belonging to the user.
///
/// ## Invariants
/// - Non-empty once trimmed of whitespace.
/// - At most [`FIELD_MAX_CHARS`] characters.
/// - Matches the `local@domain.tld` shape.
///
/// Uniqueness is case-insensitive across the directory; the original
/// casing is preserved here and [`EmailAddress::folded`] yields the index
/// key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and construct an [`EmailAddress`] from owned input.
    pub fn new(email: impl Into<String>) -> Result<Self, UserValidationError> {
        Self::from_owned(email.into())
    }

    fn from_owned(email: String) -> Result<Self, UserValidationError> {
        if email.trim().is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        if email.chars().count() > FIELD_MAX_CHARS {
            return Err(UserValidationError::EmailTooLong {
                max: FIELD_MAX_CHARS,
            });
        }
        if !email_regex().is_match(&email) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(email))
    }

    /// Lower-cased form used as the case-insensitive index key.
    #[must_use]
    pub fn folded(&self) -> String {
        self.0.to_lowercase()
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Validated payload for creating or updating a user.
///
/// A draft carries everything except the identifier, which the directory
/// owns. Drafts can only be built through validating constructors, so the
/// store may trust their contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDraft {
    username: Username,
    email: EmailAddress,
    age: u32,
}

impl UserDraft {
    /// Build a draft from already validated components.
    #[must_use]
    pub fn new(username: Username, email: EmailAddress, age: u32) -> Self {
        Self {
            username,
            email,
            age,
        }
    }

    /// Fallible constructor validating every field, including a possibly
    /// negative age from an untrusted source.
    pub fn try_from_parts(
        username: impl Into<String>,
        email: impl Into<String>,
        age: i64,
    ) -> Result<Self, UserValidationError> {
        let username = Username::new(username)?;
        let email = EmailAddress::new(email)?;
        if age < 0 {
            return Err(UserValidationError::NegativeAge);
        }
        let age =
            u32::try_from(age).map_err(|_| UserValidationError::AgeOutOfRange { max: u32::MAX })?;
        Ok(Self::new(username, email, age))
    }

    /// Requested username.
    #[must_use]
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Requested email address.
    #[must_use]
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Requested age.
    #[must_use]
    pub fn age(&self) -> u32 {
        self.age
    }

    /// Split the draft into its parts.
    #[must_use]
    pub fn into_parts(self) -> (Username, EmailAddress, u32) {
        (self.username, self.email, self.age)
    }
}

/// Application user.
///
/// ## Invariants
/// - `id` is immutable once assigned.
/// - `username` and `email` satisfy the value type invariants and remain
///   unique (case-insensitively) across the owning directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UserDto", into = "UserDto")]
pub struct User {
    id: UserId,
    username: Username,
    email: EmailAddress,
    age: u32,
}

impl User {
    /// Build a new [`User`] from validated components.
    #[must_use]
    pub fn new(id: UserId, username: Username, email: EmailAddress, age: u32) -> Self {
        Self {
            id,
            username,
            email,
            age,
        }
    }

    /// Assemble a user from a draft and a freshly allocated identifier.
    #[must_use]
    pub fn from_draft(id: UserId, draft: UserDraft) -> Self {
        let (username, email, age) = draft.into_parts();
        Self::new(id, username, email, age)
    }

    /// Stable identifier.
    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Current username.
    #[must_use]
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Current email address.
    #[must_use]
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Current age.
    #[must_use]
    pub fn age(&self) -> u32 {
        self.age
    }

    /// Replace every field except the identifier with the draft's values.
    pub fn apply(&mut self, draft: UserDraft) {
        let (username, email, age) = draft.into_parts();
        self.username = username;
        self.email = email;
        self.age = age;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct UserDto {
    id: u64,
    username: String,
    email: String,
    age: u32,
}

impl From<User> for UserDto {
    fn from(value: User) -> Self {
        let User {
            id,
            username,
            email,
            age,
        } = value;
        Self {
            id: id.value(),
            username: username.into(),
            email: email.into(),
            age,
        }
    }
}

impl TryFrom<UserDto> for User {
    type Error = UserValidationError;

    fn try_from(value: UserDto) -> Result<Self, Self::Error> {
        let username = Username::new(value.username)?;
        let email = EmailAddress::new(value.email)?;
        Ok(Self::new(UserId::new(value.id), username, email, value.age))
    }
}
