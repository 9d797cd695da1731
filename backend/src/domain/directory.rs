//! In-memory user directory: the store behind every endpoint.
//!
//! The directory keeps three synchronised indices (users by id, by
//! lower-cased username, and by lower-cased email) under one exclusive
//! lock. Each public operation takes the lock for its whole duration, so
//! no caller can observe a record present in one index and missing from
//! another, or two records claiming the same username or email.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

use super::user::{User, UserDraft, UserId, UserValidationError, Username};

/// Result alias for directory operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Failures surfaced by [`UserDirectory`] operations.
///
/// All variants are recoverable; the directory never partially applies a
/// mutation before returning one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    /// No user matches the requested identifier or username.
    #[error("user not found")]
    NotFound,
    /// The requested username or email is already claimed by another user.
    #[error("a user with the same username or email already exists")]
    Conflict,
    /// Caller-supplied data failed validation.
    #[error("invalid user data: {0}")]
    Invalid(#[from] UserValidationError),
}

/// Issues strictly increasing identifiers, starting at 1.
///
/// Values are never reissued within a process lifetime: delete does not
/// return identifiers to the allocator, so a removed user's id stays
/// retired while its username and email become reusable.
#[derive(Debug)]
struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    const fn new() -> Self {
        Self { next: 1 }
    }

    fn allocate(&mut self) -> UserId {
        let id = UserId::new(self.next);
        self.next += 1;
        id
    }
}

/// Everything the lock protects: the three indices and the allocator.
///
/// The secondary indices map folded (lower-cased) keys to ids; records in
/// the primary index keep the caller's original casing.
#[derive(Debug)]
struct DirectoryInner {
    users: BTreeMap<UserId, User>,
    by_username: HashMap<String, UserId>,
    by_email: HashMap<String, UserId>,
    ids: IdAllocator,
}

impl DirectoryInner {
    fn new() -> Self {
        Self {
            users: BTreeMap::new(),
            by_username: HashMap::new(),
            by_email: HashMap::new(),
            ids: IdAllocator::new(),
        }
    }

    /// True when the draft's username or email is claimed by a user other
    /// than `exempt`.
    fn collides(&self, draft: &UserDraft, exempt: Option<UserId>) -> bool {
        let taken = |claim: Option<&UserId>| claim.is_some_and(|owner| Some(*owner) != exempt);
        taken(self.by_username.get(&draft.username().folded()))
            || taken(self.by_email.get(&draft.email().folded()))
    }
}

/// Thread-safe, in-memory store of user records.
///
/// One instance is built at startup and shared by reference with every
/// handler; there is no ambient global. State lives for the process
/// lifetime only.
///
/// # Examples
/// ```
/// use backend::domain::{UserDirectory, UserDraft};
///
/// let directory = UserDirectory::new();
/// let draft = UserDraft::try_from_parts("ada", "ada@x.com", 36)?;
/// let user = directory.create(draft)?;
/// assert_eq!(user.id().value(), 1);
/// # Ok::<(), backend::domain::DirectoryError>(())
/// ```
#[derive(Debug)]
pub struct UserDirectory {
    inner: Mutex<DirectoryInner>,
}

impl UserDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(DirectoryInner::new()),
        }
    }

    /// Take the store-wide lock.
    ///
    /// A poisoned lock still guards consistent data because mutations are
    /// applied only after every precondition check has passed, so the
    /// poison marker is discarded instead of propagated.
    fn lock(&self) -> std::sync::MutexGuard<'_, DirectoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of all users in id order.
    ///
    /// Ids are allocated monotonically, so id order equals insertion
    /// order. Reads never mutate state.
    #[must_use]
    pub fn list(&self) -> Vec<User> {
        self.lock().users.values().cloned().collect()
    }

    /// Look up a user by identifier.
    ///
    /// # Errors
    /// [`DirectoryError::NotFound`] when the id has no live record.
    pub fn get(&self, id: UserId) -> DirectoryResult<User> {
        self.lock()
            .users
            .get(&id)
            .cloned()
            .ok_or(DirectoryError::NotFound)
    }

    /// Look up a user by username, case-insensitively.
    ///
    /// # Errors
    /// [`DirectoryError::NotFound`] when no live record matches.
    pub fn get_by_username(&self, username: &Username) -> DirectoryResult<User> {
        let inner = self.lock();
        inner
            .by_username
            .get(&username.folded())
            .and_then(|id| inner.users.get(id))
            .cloned()
            .ok_or(DirectoryError::NotFound)
    }

    /// Create a new user from a validated draft.
    ///
    /// Allocates a fresh identifier and inserts the record into all three
    /// indices within one critical section.
    ///
    /// # Errors
    /// [`DirectoryError::Conflict`] when the username or email is already
    /// claimed (case-insensitively); nothing is mutated in that case.
    pub fn create(&self, draft: UserDraft) -> DirectoryResult<User> {
        let mut inner = self.lock();
        if inner.collides(&draft, None) {
            return Err(DirectoryError::Conflict);
        }

        let id = inner.ids.allocate();
        let user = User::from_draft(id, draft);
        inner.by_username.insert(user.username().folded(), id);
        inner.by_email.insert(user.email().folded(), id);
        inner.users.insert(id, user.clone());
        Ok(user)
    }

    /// Replace a user's username, email, and age; the id never changes.
    ///
    /// Secondary index entries are re-keyed only when the corresponding
    /// field changed case-insensitively, so an update that keeps a field
    /// (or merely re-cases it) never collides with the record itself.
    ///
    /// # Errors
    /// [`DirectoryError::NotFound`] when the id has no live record;
    /// [`DirectoryError::Conflict`] when the new username or email is
    /// claimed by a different user. Nothing is mutated on failure.
    pub fn update(&self, id: UserId, draft: UserDraft) -> DirectoryResult<User> {
        let mut inner = self.lock();
        let (old_username, old_email) = match inner.users.get(&id) {
            Some(user) => (user.username().folded(), user.email().folded()),
            None => return Err(DirectoryError::NotFound),
        };
        if inner.collides(&draft, Some(id)) {
            return Err(DirectoryError::Conflict);
        }

        let new_username = draft.username().folded();
        let new_email = draft.email().folded();
        if old_username != new_username {
            inner.by_username.remove(&old_username);
        }
        if old_email != new_email {
            inner.by_email.remove(&old_email);
        }
        inner.by_username.insert(new_username, id);
        inner.by_email.insert(new_email, id);

        match inner.users.get_mut(&id) {
            Some(user) => {
                user.apply(draft);
                Ok(user.clone())
            }
            // Unreachable: existence was checked under the same lock.
            None => Err(DirectoryError::NotFound),
        }
    }

    /// Remove a user from all three indices.
    ///
    /// The identifier is permanently retired (the allocator is monotonic)
    /// while the username and email become available for reuse.
    ///
    /// # Errors
    /// [`DirectoryError::NotFound`] when the id has no live record.
    pub fn remove(&self, id: UserId) -> DirectoryResult<()> {
        let mut inner = self.lock();
        let user = inner.users.remove(&id).ok_or(DirectoryError::NotFound)?;
        inner.by_username.remove(&user.username().folded());
        inner.by_email.remove(&user.email().folded());
        Ok(())
    }
}
