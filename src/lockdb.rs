//! Lock provider backed by a versioned repository filesystem.
//!
//! The repository stores the locks; this provider translates between
//! the host's lock model and the repository's, and carries per-request
//! policy parsed from custom client headers. It holds no lock state of
//! its own, so cloning the provider is cheap and every request gets a
//! fresh [`RepoLockDb`].
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use headers::HeaderMapExt;
use http::HeaderMap;
use log::{debug, trace};
use xmltree::Element;

use crate::authz::{check_readability, AuthzRead};
use crate::davheaders::{SvnCreationDate, SvnOptions, SvnVersionName};
use crate::errors::{reperror, DavError};
use crate::locktoken::LockToken;
use crate::ls::*;
use crate::repofs::{RepoError, RepoFs, Revnum};
use crate::translate::{dav_lock_to_repo, repo_lock_to_dav};
use crate::util::{micros_to_rfc3339, USEC_PER_SEC};
use crate::xmltree_ext::ElementExt;
use crate::DavResult;

/// Lock provider on top of a repository filesystem.
#[derive(Clone)]
pub struct RepoLocks {
    repos: Arc<dyn RepoFs>,
    authz: Arc<dyn AuthzRead>,
}

impl fmt::Debug for RepoLocks {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RepoLocks").field("repos", &self.repos).finish()
    }
}

impl RepoLocks {
    /// Create a new provider on `repos`, gating every lock observation
    /// and mutation through `authz`.
    pub fn new(repos: Arc<dyn RepoFs>, authz: Arc<dyn AuthzRead>) -> Box<RepoLocks> {
        Box::new(RepoLocks { repos, authz })
    }
}

impl DavLockProvider for RepoLocks {
    fn supported_lock(&self, resource: &LockResource<'_>) -> Option<Element> {
        // No shared locks, and no locks on collections.
        if resource.collection {
            return None;
        }
        let mut scope = Element::new2("D:lockscope");
        scope.push(Element::new2("D:exclusive"));
        let mut typ = Element::new2("D:locktype");
        typ.push(Element::new2("D:write"));
        let mut entry = Element::new2("D:lockentry");
        entry.push(scope);
        entry.push(typ);
        Some(entry)
    }

    fn parse_locktoken(&self, token: &str) -> DavResult<LockToken> {
        LockToken::parse(token)
    }

    fn format_locktoken(&self, token: &LockToken) -> String {
        token.format()
    }

    fn compare_locktoken(&self, a: &LockToken, b: &LockToken) -> Ordering {
        a.compare(b)
    }

    fn open_lockdb(
        &self,
        headers: &HeaderMap,
        read_only: bool,
        _force: bool,
    ) -> DavResult<Box<dyn DavLockDb>> {
        // Custom headers only specialized clients send.
        let force = headers
            .typed_get::<SvnOptions>()
            .map(|o| o.has_force())
            .unwrap_or(false);
        let working_revnum = headers.typed_get::<SvnVersionName>().map(|v| v.0);
        trace!(
            "open_lockdb: force={} working_revnum={:?}",
            force,
            working_revnum
        );

        Ok(Box::new(RepoLockDb {
            repos: self.repos.clone(),
            authz: self.authz.clone(),
            force,
            working_revnum,
            read_only,
            response_headers: HeaderMap::new(),
        }))
    }
}

/// Request-scoped lock database produced by [`RepoLocks::open_lockdb`].
pub struct RepoLockDb {
    repos:            Arc<dyn RepoFs>,
    authz:            Arc<dyn AuthzRead>,
    /// Client asked for lock stealing / breaking.
    force:            bool,
    /// Revision the client believes is current, for the out-of-dateness
    /// check on lock creation. `None` skips the check.
    working_revnum:   Option<Revnum>,
    #[allow(dead_code)]
    read_only:        bool,
    response_headers: HeaderMap,
}

impl RepoLockDb {
    // Every lock observation and mutation passes through here, so an
    // unreadable path reveals nothing about its lock state.
    fn readability_gate(&self, path: &str) -> DavResult<()> {
        if !check_readability(&*self.repos, &*self.authz, path)? {
            return Err(DavError::PathUnreadable);
        }
        Ok(())
    }
}

impl DavLockDb for RepoLockDb {
    fn close(&mut self) {
        // nothing to do here.
    }

    fn remove_locknull_state(&mut self, _resource: &LockResource<'_>) -> DavResult<()> {
        // Locknull state is implicit: a resource is locknull iff it has
        // a lock and no versioned object. There is no side-table, which
        // also means locknull resources are not listed as children in a
        // parent PROPFIND.
        Ok(())
    }

    fn create_lock(&mut self, resource: &LockResource<'_>) -> DavResult<DavLock> {
        let uuid_str = self
            .repos
            .generate_token()
            .map_err(reperror("Failed to generate a lock token."))?;
        trace!("create_lock: new token {}", uuid_str);

        // The host fills in scope, type, owner and timeout from the
        // parsed request body before append_locks sees this record.
        Ok(DavLock {
            rectype:     LockRecType::Direct,
            scope:       LockScope::Unknown,
            typ:         LockType::Unknown,
            depth:       0,
            is_locknull: resource.exists,
            locktoken:   LockToken { uuid_str },
            owner:       None,
            auth_user:   None,
            timeout:     None,
        })
    }

    fn get_locks(&mut self, resource: &LockResource<'_>) -> DavResult<Vec<DavLock>> {
        // No path in the repository, nothing to report.
        let path = match resource.repos_path {
            Some(p) => p,
            None => return Ok(Vec::new()),
        };

        // A client that asked for a forced lock is told there is no
        // existing lock, no matter what. Otherwise the host answers
        // '403 Locked' on its own and the forced attach never runs.
        if self.force {
            return Ok(Vec::new());
        }

        self.readability_gate(path)?;

        let slock = self
            .repos
            .get_lock_by_path(path)
            .map_err(reperror("Failed to check path for a lock."))?;
        Ok(slock
            .map(|l| repo_lock_to_dav(&l, resource.exists))
            .into_iter()
            .collect())
    }

    fn find_lock(
        &mut self,
        resource: &LockResource<'_>,
        token: &LockToken,
    ) -> DavResult<Option<DavLock>> {
        let path = match resource.repos_path {
            Some(p) => p,
            None => return Ok(None),
        };
        self.readability_gate(path)?;

        match self.repos.get_lock_by_token(&token.uuid_str) {
            Ok(slock) => Ok(Some(repo_lock_to_dav(&slock, resource.exists))),
            Err(RepoError::BadLockToken) | Err(RepoError::LockExpired) => Ok(None),
            Err(e) => Err(DavError::Repos(e, "Failed to lookup lock via token.")),
        }
    }

    fn has_locks(&mut self, resource: &LockResource<'_>) -> DavResult<bool> {
        let path = match resource.repos_path {
            Some(p) => p,
            None => return Ok(false),
        };

        // Same lie as in get_locks.
        if self.force {
            return Ok(false);
        }

        self.readability_gate(path)?;

        // May report true for a lock that already timed out; expiry is
        // observed passively and left to the host to honor.
        let slock = self
            .repos
            .get_lock_by_path(path)
            .map_err(reperror("Failed to check path for a lock."))?;
        Ok(slock.is_some())
    }

    fn append_locks(&mut self, resource: &LockResource<'_>, locks: &[DavLock]) -> DavResult<()> {
        let path = resource.repos_path.ok_or(DavError::PathUnreadable)?;
        self.readability_gate(path)?;

        let dlock = match locks {
            [dlock] => dlock,
            _ => return Err(DavError::MultipleLocks),
        };

        let slock = dav_lock_to_repo(dlock, path)?;
        match self
            .repos
            .attach_lock(&slock, self.force, self.working_revnum)
        {
            Ok(()) => {}
            Err(RepoError::NoUser) => return Err(DavError::Anonymous("creation")),
            Err(e) => return Err(DavError::Repos(e, "Failed to create new lock.")),
        }
        debug!("append_locks: locked {} with {}", slock.path, slock.token);

        // A standard LOCK response has no slot for the creation date.
        // Specialized clients pick it up from a custom response header;
        // everyone else ignores it.
        self.response_headers
            .typed_insert(SvnCreationDate(micros_to_rfc3339(slock.creation_date)));
        Ok(())
    }

    fn remove_lock(
        &mut self,
        resource: &LockResource<'_>,
        locktoken: Option<&LockToken>,
    ) -> DavResult<()> {
        // No path in the repository, nothing to do.
        let path = match resource.repos_path {
            Some(p) => p,
            None => return Ok(()),
        };
        self.readability_gate(path)?;

        let token = match locktoken {
            Some(t) => Some(t.uuid_str.clone()),
            None => {
                // No token supplied: discover the current lock on the path.
                self.repos
                    .get_lock_by_path(path)
                    .map_err(reperror("Failed to check path for a lock."))?
                    .map(|slock| slock.token)
            }
        };

        if let Some(token) = token {
            // A generic DAV client cannot set the force flag; only a
            // client that sent the custom options header can break
            // another user's lock.
            match self.repos.unlock(&token, self.force) {
                Ok(()) => debug!("remove_lock: unlocked {}", path),
                Err(RepoError::NoUser) => return Err(DavError::Anonymous("removal")),
                Err(e) => return Err(DavError::Repos(e, "Failed to remove a lock.")),
            }
        }
        Ok(())
    }

    fn refresh_locks(
        &mut self,
        resource: &LockResource<'_>,
        tokens: &[LockToken],
        new_time: i64,
    ) -> DavResult<Vec<DavLock>> {
        // One lock per resource, so only the first token matters.
        let token = tokens.first().ok_or(DavError::RefreshMismatch)?;

        let path = match resource.repos_path {
            Some(p) => p,
            None => return Err(DavError::RefreshMismatch),
        };
        self.readability_gate(path)?;

        let mut slock = self
            .repos
            .get_lock_by_token(&token.uuid_str)
            .map_err(reperror("Token doesn't point to a lock."))?;

        // Does the submitted token actually represent the current lock
        // on this resource?
        if slock.path != path {
            return Err(DavError::RefreshMismatch);
        }

        slock.expiration_date = new_time * USEC_PER_SEC;

        // The lock is already ours: overwrite it in place, with no
        // out-of-dateness check.
        match self.repos.attach_lock(&slock, true, None) {
            Ok(()) => {}
            Err(RepoError::NoUser) => return Err(DavError::Anonymous("refreshing")),
            Err(e) => return Err(DavError::Repos(e, "Failed to refresh existing lock.")),
        }
        trace!(
            "refresh_locks: {} now expires at {}",
            slock.token,
            slock.expiration_date
        );

        Ok(vec![repo_lock_to_dav(&slock, resource.exists)])
    }

    fn response_headers(&self) -> &HeaderMap {
        &self.response_headers
    }
}
