//! Contains the structs and traits that define a lock provider backend.
//!
use std::cmp::Ordering;
use std::fmt::Debug;

use http::HeaderMap;
use xmltree::Element;

use crate::locktoken::LockToken;
use crate::DavResult;

/// How a lock record relates to its resource. Every lock here applies
/// directly; there is no lock inheritance from ancestor collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockRecType {
    Direct,
}

/// Lock scope. `Unknown` only appears on a freshly created record,
/// before the host has filled in the parsed LOCK request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockScope {
    Exclusive,
    Shared,
    Unknown,
}

/// Lock type. Same convention as [`LockScope`] for `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockType {
    Write,
    Unknown,
}

/// Type of the locks returned by DavLockDb methods.
///
/// `owner` is the free-form DAV:owner body, `auth_user` the
/// authenticated principal. `timeout` is an absolute expiry in epoch
/// seconds, `None` meaning the lock never times out.
#[derive(Debug, Clone)]
pub struct DavLock {
    pub rectype:     LockRecType,
    pub scope:       LockScope,
    pub typ:         LockType,
    pub depth:       u32,
    pub is_locknull: bool,
    pub locktoken:   LockToken,
    pub owner:       Option<String>,
    pub auth_user:   Option<String>,
    pub timeout:     Option<i64>,
}

/// What the host knows about the resource a lock operation targets.
#[derive(Debug, Clone, Copy)]
pub struct LockResource<'a> {
    /// Path of the resource inside the repository, if it maps to one.
    pub repos_path: Option<&'a str>,
    /// Whether the path currently exists as a versioned object.
    pub exists:     bool,
    /// Collections are not lockable.
    pub collection: bool,
}

/// The trait that defines a lock provider.
///
/// The host DAV server holds one of these for the lifetime of the
/// service and opens a [`DavLockDb`] from it for every request that
/// touches locks.
///
/// The BoxCloneLp trait is a helper trait that is automatically
/// implemented so that Box\<dyn DavLockProvider\>.clone() works.
pub trait DavLockProvider: Debug + Send + Sync + BoxCloneLp {
    /// The supportedlock property of a resource: a single
    /// exclusive/write `D:lockentry`, or `None` for collections.
    fn supported_lock(&self, resource: &LockResource<'_>) -> Option<Element>;

    /// Parse a lock token URI.
    fn parse_locktoken(&self, token: &str) -> DavResult<LockToken>;

    /// Format a lock token as a URI. Never returns an empty string.
    fn format_locktoken(&self, token: &LockToken) -> String;

    /// Total order on tokens, used to deduplicate token sets.
    fn compare_locktoken(&self, a: &LockToken, b: &LockToken) -> Ordering;

    /// Open the request-scoped lock database. `headers` are the request
    /// headers; `read_only` promises that only observations follow, and
    /// `force` promises that locking operations definitely occur (a host
    /// hint; this provider does not need it).
    fn open_lockdb(
        &self,
        headers: &HeaderMap,
        read_only: bool,
        force: bool,
    ) -> DavResult<Box<dyn DavLockDb>>;
}

/// The request-scoped lock database.
///
/// One of these lives for exactly one request. All lock state lives in
/// the repository; the database only carries per-request policy and the
/// custom response headers the host must merge into its reply.
pub trait DavLockDb {
    /// Indicates completion of locking operations.
    fn close(&mut self);

    /// Take a resource out of the lock-null state.
    fn remove_locknull_state(&mut self, resource: &LockResource<'_>) -> DavResult<()>;

    /// Create a direct lock record for the resource, with a fresh token.
    /// Scope, type, owner and timeout are filled in by the host before
    /// the record is passed to `append_locks`.
    fn create_lock(&mut self, resource: &LockResource<'_>) -> DavResult<DavLock>;

    /// The locks on the resource: empty or a single lock.
    fn get_locks(&mut self, resource: &LockResource<'_>) -> DavResult<Vec<DavLock>>;

    /// Find one particular lock on a resource by its token.
    fn find_lock(
        &mut self,
        resource: &LockResource<'_>,
        token: &LockToken,
    ) -> DavResult<Option<DavLock>>;

    /// Quick test whether the resource has any lock at all. May report
    /// true for a lock whose timeout has already passed.
    fn has_locks(&mut self, resource: &LockResource<'_>) -> DavResult<bool>;

    /// Attach the given lock to the resource. At most one lock may be
    /// passed, and the lock is stored in the repository.
    fn append_locks(&mut self, resource: &LockResource<'_>, locks: &[DavLock]) -> DavResult<()>;

    /// Remove the lock named by `token`, or whatever lock the resource
    /// currently has when no token is given.
    fn remove_lock(
        &mut self,
        resource: &LockResource<'_>,
        token: Option<&LockToken>,
    ) -> DavResult<()>;

    /// Move the expiration of the resource's lock to `new_time` (epoch
    /// seconds). Only the first submitted token is considered.
    fn refresh_locks(
        &mut self,
        resource: &LockResource<'_>,
        tokens: &[LockToken],
        new_time: i64,
    ) -> DavResult<Vec<DavLock>>;

    /// Custom response headers produced so far; the host merges these
    /// into the HTTP response.
    fn response_headers(&self) -> &HeaderMap;
}

#[doc(hidden)]
pub trait BoxCloneLp {
    fn box_clone(&self) -> Box<dyn DavLockProvider>;
}

// generic Clone, calls implementation-specific box_clone().
impl Clone for Box<dyn DavLockProvider> {
    fn clone(&self) -> Box<dyn DavLockProvider> {
        self.box_clone()
    }
}

// implementation-specific clone.
#[doc(hidden)]
impl<LP: Clone + DavLockProvider + 'static> BoxCloneLp for LP {
    fn box_clone(&self) -> Box<dyn DavLockProvider> {
        Box::new((*self).clone())
    }
}
