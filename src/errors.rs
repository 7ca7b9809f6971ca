use std::error::Error;

use http::StatusCode;

use crate::repofs::RepoError;

/// Protocol sub-code accompanying an error, as the host's DAV error
/// machinery expects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DavErrCode {
    SaveLock,
    UnknownStateToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DavError {
    NonWriteLock,            // only 'write' locks exist
    NonExclusiveLock,        // only exclusive locks exist
    MultipleLocks,           // one lock per resource
    UnknownLockToken,        // token URI in unknown format
    Anonymous(&'static str), // repository refused an unauthenticated mutation
    RefreshMismatch,         // refresh token names a lock on another path
    PathUnreadable,          // authorization gate said no
    Repos(RepoError, &'static str),
}

impl Error for DavError {}

impl std::fmt::Display for DavError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            DavError::NonWriteLock => write!(f, "Only 'write' locks are supported."),
            DavError::NonExclusiveLock => write!(f, "Only exclusive locks are supported."),
            DavError::MultipleLocks => {
                write!(f, "Tried to attach multiple locks to a resource.")
            }
            DavError::UnknownLockToken => {
                write!(f, "Client supplied lock token in unknown format.")
            }
            DavError::Anonymous(action) => {
                write!(f, "Anonymous lock {} is not allowed.", action)
            }
            DavError::RefreshMismatch => {
                write!(f, "Lock refresh request doesn't match existing lock.")
            }
            DavError::PathUnreadable => write!(f, "Path is not accessible."),
            DavError::Repos(_, context) => write!(f, "{}", context),
        }
    }
}

impl DavError {
    pub fn statuscode(&self) -> StatusCode {
        match self {
            DavError::NonWriteLock => StatusCode::BAD_REQUEST,
            DavError::NonExclusiveLock => StatusCode::BAD_REQUEST,
            DavError::MultipleLocks => StatusCode::BAD_REQUEST,
            DavError::UnknownLockToken => StatusCode::BAD_REQUEST,
            DavError::Anonymous(_) => StatusCode::UNAUTHORIZED,
            DavError::RefreshMismatch => StatusCode::UNAUTHORIZED,
            DavError::PathUnreadable => StatusCode::FORBIDDEN,
            DavError::Repos(..) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn errcode(&self) -> DavErrCode {
        match self {
            DavError::UnknownLockToken => DavErrCode::UnknownStateToken,
            _ => DavErrCode::SaveLock,
        }
    }
}

// map_err helper.
pub(crate) fn reperror(context: &'static str) -> impl FnOnce(RepoError) -> DavError {
    move |e| DavError::Repos(e, context)
}
