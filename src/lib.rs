//! Lock provider for WebDAV servers, backed by a versioned repository
//! filesystem with native lock semantics of its own.
//!
//! A generic DAV server thinks in shared/exclusive locks of arbitrary
//! depth with provider-managed timeouts. The repository thinks in one
//! exclusive lock per versioned file path, with an authenticated owner,
//! a free-form comment, and expiry handled by the repository itself.
//! This crate is the translation layer between the two: the host talks
//! to a [`DavLockProvider`], opens a request-scoped [`DavLockDb`] per
//! request, and every operation is authorized, translated and forwarded
//! to a [`RepoFs`](repofs::RepoFs) backend.
//!
//! Only exclusive write locks on non-collection resources exist, one
//! per path, and the provider itself is stateless across requests: all
//! lock state lives in the repository.
//!
//! Specialized clients steer the provider through custom headers:
//! `X-SVN-Options: force` breaks or steals an existing lock, and
//! `X-SVN-Version-Name` makes lock creation fail when the path changed
//! after the revision the client claims to hold. Successful lock
//! creation reports the repository-side creation date back through the
//! `X-SVN-Creation-Date` response header, since a standard DAV lock
//! carries no such field.
//!
//! ```
//! use std::sync::Arc;
//! use dav_repo_locks::memrepo::MemRepo;
//! use dav_repo_locks::repofs::{RepoResult, RevisionRoot};
//! use dav_repo_locks::{DavLockProvider, RepoLocks};
//!
//! let repo = MemRepo::new();
//! repo.touch("/trunk/file.txt");
//! let authz = |_root: &dyn RevisionRoot, _path: &str| -> RepoResult<bool> { Ok(true) };
//! let provider = RepoLocks::new(Arc::new(repo), Arc::new(authz));
//! let db = provider.open_lockdb(&http::HeaderMap::new(), false, true).unwrap();
//! ```

mod authz;
pub mod davheaders;
mod errors;
mod lockdb;
mod locktoken;
mod ls;
#[cfg(feature = "memrepo")]
pub mod memrepo;
pub mod repofs;
mod translate;
mod util;
mod xmltree_ext;

pub use crate::authz::AuthzRead;
pub use crate::errors::{DavErrCode, DavError};
pub use crate::lockdb::{RepoLockDb, RepoLocks};
pub use crate::locktoken::LockToken;
pub use crate::ls::{
    DavLock, DavLockDb, DavLockProvider, LockRecType, LockResource, LockScope, LockType,
};

/// The `Result` type used by the provider entry points.
pub type DavResult<T> = std::result::Result<T, DavError>;
