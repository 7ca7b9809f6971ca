//! Simple in-memory repository backend.
//!
//! Versioned paths and their locks live in a map behind a mutex. This
//! implementation has state - if you create a new instance per request
//! it will be empty every time, so create it once with `MemRepo::new`,
//! keep it around, and clone() the handle wherever a `RepoFs` is
//! needed. As a MemRepo struct is just a handle, cloning is cheap.
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use log::trace;
use uuid::Uuid;

use crate::repofs::*;
use crate::util::now_micros;

/// Ephemeral in-memory repository.
#[derive(Debug, Clone)]
pub struct MemRepo(Arc<Mutex<MemRepoInner>>);

#[derive(Debug)]
struct MemRepoInner {
    youngest:  Revnum,
    /// path -> revision in which it last changed
    paths:     HashMap<String, Revnum>,
    /// path -> current lock
    locks:     HashMap<String, RepoLock>,
    principal: Option<String>,
}

impl MemRepo {
    /// Create a new "memrepo" repository at revision 0, with no
    /// authenticated principal.
    pub fn new() -> MemRepo {
        let inner = MemRepoInner {
            youngest:  0,
            paths:     HashMap::new(),
            locks:     HashMap::new(),
            principal: None,
        };
        MemRepo(Arc::new(Mutex::new(inner)))
    }

    /// Commit a change to `path`, creating it if needed. Returns the
    /// new youngest revision.
    pub fn touch(&self, path: &str) -> Revnum {
        let inner = &mut *self.0.lock().unwrap();
        inner.youngest += 1;
        inner.paths.insert(path.to_string(), inner.youngest);
        inner.youngest
    }

    /// Authenticated user for subsequent lock mutations, or `None` for
    /// anonymous access.
    pub fn set_principal(&self, principal: Option<&str>) {
        self.0.lock().unwrap().principal = principal.map(|s| s.to_string());
    }

    /// Whether `path` exists at the youngest revision.
    pub fn exists(&self, path: &str) -> bool {
        self.0.lock().unwrap().paths.contains_key(path)
    }
}

impl Default for MemRepo {
    fn default() -> Self {
        MemRepo::new()
    }
}

#[derive(Debug)]
struct MemRoot {
    rev: Revnum,
}

impl RevisionRoot for MemRoot {
    fn revision(&self) -> Revnum {
        self.rev
    }
}

impl RepoFs for MemRepo {
    fn youngest_revision(&self) -> RepoResult<Revnum> {
        Ok(self.0.lock().unwrap().youngest)
    }

    fn revision_root(&self, rev: Revnum) -> RepoResult<Box<dyn RevisionRoot>> {
        if rev > self.0.lock().unwrap().youngest {
            return Err(RepoError::NotFound);
        }
        Ok(Box::new(MemRoot { rev }))
    }

    fn generate_token(&self) -> RepoResult<String> {
        Ok(Uuid::new_v4().to_string())
    }

    fn get_lock_by_path(&self, path: &str) -> RepoResult<Option<RepoLock>> {
        // Expired locks are still reported here; callers observe
        // expiry passively.
        Ok(self.0.lock().unwrap().locks.get(path).cloned())
    }

    fn get_lock_by_token(&self, token: &str) -> RepoResult<RepoLock> {
        let inner = self.0.lock().unwrap();
        let lock = inner
            .locks
            .values()
            .find(|l| l.token == token)
            .ok_or(RepoError::BadLockToken)?;
        if lock.expiration_date != 0 && lock.expiration_date < now_micros() {
            return Err(RepoError::LockExpired);
        }
        Ok(lock.clone())
    }

    fn attach_lock(
        &self,
        lock: &RepoLock,
        force: bool,
        working_rev: Option<Revnum>,
    ) -> RepoResult<()> {
        let inner = &mut *self.0.lock().unwrap();
        if inner.principal.is_none() || lock.owner.is_none() {
            return Err(RepoError::NoUser);
        }

        // Refuse to lock a path that changed after the revision the
        // client says it is at.
        if let Some(rev) = working_rev {
            if let Some(&changed) = inner.paths.get(&lock.path) {
                if changed > rev {
                    return Err(RepoError::OutOfDate);
                }
            }
        }

        if !force {
            if let Some(existing) = inner.locks.get(&lock.path) {
                if existing.token != lock.token {
                    return Err(RepoError::LockConflict);
                }
            }
        }

        trace!("attach_lock: {} -> {}", lock.path, lock.token);
        inner.locks.insert(lock.path.clone(), lock.clone());
        Ok(())
    }

    fn unlock(&self, token: &str, force: bool) -> RepoResult<()> {
        let inner = &mut *self.0.lock().unwrap();
        if inner.principal.is_none() {
            return Err(RepoError::NoUser);
        }
        let path = inner
            .locks
            .iter()
            .find(|(_, l)| l.token == token)
            .map(|(p, _)| p.clone())
            .ok_or(RepoError::BadLockToken)?;

        // Without force only the lock owner may unlock.
        if !force && inner.locks[&path].owner != inner.principal {
            return Err(RepoError::LockConflict);
        }

        inner.locks.remove(&path);
        trace!("unlock: removed lock on {}", path);
        Ok(())
    }
}
