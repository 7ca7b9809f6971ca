//! Mapping between the repository lock record and the DAV lock record.
//!
//! The two models disagree on what "owner" means: the DAV owner field is
//! a free-form note (the DAV:owner body), while the repository owner is
//! the authenticated principal. The mapping is therefore crosswise:
//! DAV owner <-> repository comment, DAV auth_user <-> repository owner.
use crate::errors::DavError;
use crate::locktoken::LockToken;
use crate::ls::{DavLock, LockRecType, LockScope, LockType};
use crate::repofs::RepoLock;
use crate::util::{now_micros, USEC_PER_SEC};
use crate::DavResult;

/// The DAV view of a repository lock. `exists` says whether the locked
/// path is currently a versioned object.
pub(crate) fn repo_lock_to_dav(slock: &RepoLock, exists: bool) -> DavLock {
    DavLock {
        rectype:     LockRecType::Direct,
        scope:       LockScope::Exclusive,
        typ:         LockType::Write,
        depth:       0,
        is_locknull: exists,
        locktoken:   LockToken {
            uuid_str: slock.token.clone(),
        },
        owner:       slock.comment.clone(),
        auth_user:   slock.owner.clone(),
        timeout:     if slock.expiration_date != 0 {
            Some(slock.expiration_date / USEC_PER_SEC)
        } else {
            None
        },
    }
}

/// The repository record for a DAV lock targeted at `path`. Records
/// with a scope or type this provider does not handle are rejected
/// before anything reaches the repository.
pub(crate) fn dav_lock_to_repo(dlock: &DavLock, path: &str) -> DavResult<RepoLock> {
    if dlock.typ != LockType::Write {
        return Err(DavError::NonWriteLock);
    }
    if dlock.scope != LockScope::Exclusive {
        return Err(DavError::NonExclusiveLock);
    }

    Ok(RepoLock {
        path:            path.to_string(),
        token:           dlock.locktoken.uuid_str.clone(),
        owner:           dlock.auth_user.clone(),
        comment:         dlock.owner.clone(),
        // DAV has no concept of a lock creation date, so assume 'now'.
        creation_date:   now_micros(),
        expiration_date: match dlock.timeout {
            Some(t) => t * USEC_PER_SEC,
            None => 0, // never expires
        },
    })
}
