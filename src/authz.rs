//! The read-authorization gate.
//!
//! Whether a path's lock state may be observed or mutated at all is the
//! host's decision, made through a callback against a read root at the
//! youngest revision. The gate runs on every lock operation so that the
//! mere presence of a lock is not leaked for unreadable paths.
use crate::errors::reperror;
use crate::repofs::{RepoFs, RepoResult, RevisionRoot};
use crate::DavResult;

/// Host-supplied callback deciding whether `path` is readable in the
/// given revision root.
///
/// Implemented for plain closures, so a host can pass
/// `Arc::new(|_root: &dyn RevisionRoot, _path: &str| Ok(true))`.
pub trait AuthzRead: Send + Sync {
    fn is_readable(&self, root: &dyn RevisionRoot, path: &str) -> RepoResult<bool>;
}

impl<F> AuthzRead for F
where
    F: Fn(&dyn RevisionRoot, &str) -> RepoResult<bool> + Send + Sync,
{
    fn is_readable(&self, root: &dyn RevisionRoot, path: &str) -> RepoResult<bool> {
        self(root, path)
    }
}

/// Resolve the youngest revision, open a read root there, and ask the
/// authz callback whether `path` may be observed.
pub(crate) fn check_readability(
    repos: &dyn RepoFs,
    authz: &dyn AuthzRead,
    path: &str,
) -> DavResult<bool> {
    let headrev = repos
        .youngest_revision()
        .map_err(reperror("Failed to get youngest filesystem revision."))?;
    let headroot = repos
        .revision_root(headrev)
        .map_err(reperror("Failed to open revision root for HEAD."))?;
    authz
        .is_readable(&*headroot, path)
        .map_err(reperror("Failed to check readability of a path."))
}
