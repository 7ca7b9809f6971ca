//! Contains the structs and traits that define the versioned-repository
//! backend a lock provider runs against.
//!
//! The repository owns the locks: it stores them, expires them, and
//! serializes concurrent writers. The provider in this crate only reads
//! and writes lock records through this interface and never caches them.
use std::fmt::Debug;

/// Revision number of the versioned filesystem.
pub type Revnum = u64;

/// Failures reported by the repository backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoError {
    /// No authenticated user is associated with the operation.
    NoUser,
    /// The token does not name a lock known to the repository.
    BadLockToken,
    /// The token names a lock whose expiration date has passed.
    LockExpired,
    /// The path is already locked and the operation was not forced.
    LockConflict,
    /// The path changed after the revision the client claims to hold.
    OutOfDate,
    NotFound,
    GeneralFailure,
}

pub type RepoResult<T> = std::result::Result<T, RepoError>;

/// A lock as the repository stores it.
///
/// `owner` is the authenticated principal that holds the lock; `comment`
/// is a free-form note about it. Both dates are epoch microseconds, and
/// an `expiration_date` of zero means the lock never expires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoLock {
    pub path:            String,
    pub token:           String,
    pub owner:           Option<String>,
    pub comment:         Option<String>,
    pub creation_date:   i64,
    pub expiration_date: i64,
}

/// Read handle on the repository at one revision, as handed to the
/// read-authorization callback.
pub trait RevisionRoot: Debug {
    fn revision(&self) -> Revnum;
}

/// The trait that defines a repository filesystem, as far as locking is
/// concerned.
pub trait RepoFs: Debug + Send + Sync {
    /// Newest revision in the repository.
    fn youngest_revision(&self) -> RepoResult<Revnum>;

    /// Open a read root at `rev`.
    fn revision_root(&self, rev: Revnum) -> RepoResult<Box<dyn RevisionRoot>>;

    /// Produce a fresh lock token in UUID string form.
    fn generate_token(&self) -> RepoResult<String>;

    /// The lock on `path`, if any. May report a lock whose expiration
    /// date has already passed.
    fn get_lock_by_path(&self, path: &str) -> RepoResult<Option<RepoLock>>;

    /// Look a lock up by its token. Fails with `BadLockToken` for an
    /// unknown token and `LockExpired` for a lapsed one.
    fn get_lock_by_token(&self, token: &str) -> RepoResult<RepoLock>;

    /// Store `lock`, overwriting any existing lock on the path when
    /// `force` is set and failing with `LockConflict` otherwise. When
    /// `working_rev` is given, fail with `OutOfDate` if the path changed
    /// after that revision.
    fn attach_lock(&self, lock: &RepoLock, force: bool, working_rev: Option<Revnum>)
        -> RepoResult<()>;

    /// Remove the lock that `token` names. Without `force` only the lock
    /// owner may unlock.
    fn unlock(&self, token: &str, force: bool) -> RepoResult<()>;
}
