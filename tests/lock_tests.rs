use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use http::{HeaderMap, HeaderValue, StatusCode};

use dav_repo_locks::memrepo::MemRepo;
use dav_repo_locks::repofs::{RepoError, RepoFs, RepoResult, RevisionRoot};
use dav_repo_locks::{
    DavError, DavLock, DavLockDb, DavLockProvider, LockRecType, LockResource, LockScope,
    LockToken, LockType, RepoLocks,
};

const FILE: &str = "/trunk/file.txt";

fn setup() -> (MemRepo, Box<RepoLocks>) {
    setup_denying(&[])
}

fn setup_denying(denied: &'static [&'static str]) -> (MemRepo, Box<RepoLocks>) {
    let repo = MemRepo::new();
    repo.touch(FILE);
    repo.set_principal(Some("alice"));
    let authz = move |_root: &dyn RevisionRoot, path: &str| -> RepoResult<bool> {
        Ok(!denied.contains(&path))
    };
    let provider = RepoLocks::new(Arc::new(repo.clone()), Arc::new(authz));
    (repo, provider)
}

fn resource(path: &'static str, exists: bool) -> LockResource<'static> {
    LockResource {
        repos_path: Some(path),
        exists,
        collection: false,
    }
}

fn open_db(provider: &RepoLocks, headers: &HeaderMap) -> Box<dyn DavLockDb> {
    provider.open_lockdb(headers, false, true).unwrap()
}

fn force_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("x-svn-options", HeaderValue::from_static("force"));
    headers
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

// Drive create_lock + append_locks the way the host does on LOCK.
fn lock_file(
    db: &mut dyn DavLockDb,
    path: &'static str,
    auth_user: &str,
    timeout: Option<i64>,
) -> Result<DavLock, DavError> {
    let res = resource(path, true);
    let mut lock = db.create_lock(&res)?;
    lock.scope = LockScope::Exclusive;
    lock.typ = LockType::Write;
    lock.owner = Some("working".to_string());
    lock.auth_user = Some(auth_user.to_string());
    lock.timeout = timeout;
    db.append_locks(&res, std::slice::from_ref(&lock))?;
    Ok(lock)
}

#[test]
fn create_lock_end_to_end() {
    let (repo, provider) = setup();
    let mut db = open_db(&provider, &HeaderMap::new());
    let res = resource(FILE, true);

    let mut lock = db.create_lock(&res).unwrap();
    assert_eq!(lock.rectype, LockRecType::Direct);
    assert_eq!(lock.scope, LockScope::Unknown);
    assert_eq!(lock.typ, LockType::Unknown);
    assert_eq!(lock.depth, 0);
    assert!(lock.is_locknull);
    assert!(!lock.locktoken.uuid_str.is_empty());

    // the host fills these in from the parsed request body
    lock.scope = LockScope::Exclusive;
    lock.typ = LockType::Write;
    lock.owner = Some("me".to_string());
    lock.auth_user = Some("alice".to_string());
    lock.timeout = Some(3600);

    db.append_locks(&res, std::slice::from_ref(&lock)).unwrap();

    let slock = repo.get_lock_by_path(FILE).unwrap().unwrap();
    assert_eq!(slock.token, lock.locktoken.uuid_str);
    assert_eq!(slock.owner.as_deref(), Some("alice"));
    assert_eq!(slock.comment.as_deref(), Some("me"));
    assert_eq!(slock.expiration_date, 3600 * 1_000_000);
    assert!(slock.creation_date > 0);

    // creation date travels back out of band
    let hval = db.response_headers().get("x-svn-creation-date").unwrap();
    assert!(hval.to_str().unwrap().ends_with('Z'));

    let locks = db.get_locks(&res).unwrap();
    assert_eq!(locks.len(), 1);
    assert_eq!(locks[0].scope, LockScope::Exclusive);
    assert_eq!(locks[0].typ, LockType::Write);
    assert_eq!(locks[0].timeout, Some(3600));
    assert!(db.has_locks(&res).unwrap());
}

#[test]
fn append_rejects_multiple_locks() {
    let (_repo, provider) = setup();
    let mut db = open_db(&provider, &HeaderMap::new());
    let res = resource(FILE, true);

    let mut a = db.create_lock(&res).unwrap();
    a.scope = LockScope::Exclusive;
    a.typ = LockType::Write;
    a.auth_user = Some("alice".to_string());
    let b = a.clone();

    let e = db.append_locks(&res, &[a, b]).unwrap_err();
    assert_eq!(e, DavError::MultipleLocks);
    assert_eq!(e.statuscode(), StatusCode::BAD_REQUEST);
}

#[test]
fn append_rejects_shared_scope() {
    let (_repo, provider) = setup();
    let mut db = open_db(&provider, &HeaderMap::new());
    let res = resource(FILE, true);

    let mut lock = db.create_lock(&res).unwrap();
    lock.scope = LockScope::Shared;
    lock.typ = LockType::Write;
    lock.auth_user = Some("alice".to_string());

    let e = db.append_locks(&res, std::slice::from_ref(&lock)).unwrap_err();
    assert_eq!(e, DavError::NonExclusiveLock);
    assert_eq!(e.statuscode(), StatusCode::BAD_REQUEST);
}

#[test]
fn anonymous_lock_creation_is_refused() {
    let (repo, provider) = setup();
    repo.set_principal(None);
    let mut db = open_db(&provider, &HeaderMap::new());

    let e = lock_file(&mut *db, FILE, "alice", None).unwrap_err();
    assert_eq!(e, DavError::Anonymous("creation"));
    assert_eq!(e.statuscode(), StatusCode::UNAUTHORIZED);
    assert_eq!(e.to_string(), "Anonymous lock creation is not allowed.");
}

#[test]
fn force_pretends_no_lock_exists() {
    let (repo, provider) = setup();
    repo.set_principal(Some("bob"));
    let mut db = open_db(&provider, &HeaderMap::new());
    lock_file(&mut *db, FILE, "bob", None).unwrap();

    // without force the lock is visible
    let res = resource(FILE, true);
    assert!(db.has_locks(&res).unwrap());
    assert_eq!(db.get_locks(&res).unwrap().len(), 1);

    // with force the provider reports no locks at all
    let mut forced = open_db(&provider, &force_headers());
    assert!(!forced.has_locks(&res).unwrap());
    assert!(forced.get_locks(&res).unwrap().is_empty());
}

#[test]
fn force_break_steals_existing_lock() {
    let (repo, provider) = setup();
    repo.set_principal(Some("bob"));
    let mut db = open_db(&provider, &HeaderMap::new());
    let bobs = lock_file(&mut *db, FILE, "bob", None).unwrap();

    // alice takes it over with the force option
    repo.set_principal(Some("alice"));
    let mut forced = open_db(&provider, &force_headers());
    let stolen = lock_file(&mut *forced, FILE, "alice", None).unwrap();

    let slock = repo.get_lock_by_path(FILE).unwrap().unwrap();
    assert_eq!(slock.owner.as_deref(), Some("alice"));
    assert_eq!(slock.token, stolen.locktoken.uuid_str);
    assert_ne!(slock.token, bobs.locktoken.uuid_str);

    // without force the same attempt collides
    let mut db = open_db(&provider, &HeaderMap::new());
    repo.set_principal(Some("bob"));
    let e = lock_file(&mut *db, FILE, "bob", None).unwrap_err();
    assert_eq!(
        e,
        DavError::Repos(RepoError::LockConflict, "Failed to create new lock.")
    );
    assert_eq!(e.statuscode(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn working_revision_enables_out_of_dateness_check() {
    let (repo, provider) = setup();
    let rev = repo.touch(FILE); // file changed after r1

    let mut headers = HeaderMap::new();
    headers.insert(
        "x-svn-version-name",
        HeaderValue::from_str(&(rev - 1).to_string()).unwrap(),
    );
    let mut db = open_db(&provider, &headers);
    let e = lock_file(&mut *db, FILE, "alice", None).unwrap_err();
    assert_eq!(
        e,
        DavError::Repos(RepoError::OutOfDate, "Failed to create new lock.")
    );

    // at the current revision the lock goes through
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-svn-version-name",
        HeaderValue::from_str(&rev.to_string()).unwrap(),
    );
    let mut db = open_db(&provider, &headers);
    lock_file(&mut *db, FILE, "alice", None).unwrap();
}

#[test]
fn remove_lock_with_and_without_token() {
    let (repo, provider) = setup();
    let mut db = open_db(&provider, &HeaderMap::new());
    let res = resource(FILE, true);

    // removing when nothing is locked succeeds vacuously
    db.remove_lock(&res, None).unwrap();

    let lock = lock_file(&mut *db, FILE, "alice", None).unwrap();
    db.remove_lock(&res, Some(&lock.locktoken)).unwrap();
    assert!(repo.get_lock_by_path(FILE).unwrap().is_none());

    // without a token the provider discovers the current lock itself
    lock_file(&mut *db, FILE, "alice", None).unwrap();
    db.remove_lock(&res, None).unwrap();
    assert!(repo.get_lock_by_path(FILE).unwrap().is_none());
}

#[test]
fn remove_foreign_lock_needs_force() {
    let (repo, provider) = setup();
    repo.set_principal(Some("bob"));
    let mut db = open_db(&provider, &HeaderMap::new());
    let lock = lock_file(&mut *db, FILE, "bob", None).unwrap();

    repo.set_principal(Some("alice"));
    let res = resource(FILE, true);
    let mut db = open_db(&provider, &HeaderMap::new());
    let e = db.remove_lock(&res, Some(&lock.locktoken)).unwrap_err();
    assert_eq!(
        e,
        DavError::Repos(RepoError::LockConflict, "Failed to remove a lock.")
    );

    let mut forced = open_db(&provider, &force_headers());
    forced.remove_lock(&res, Some(&lock.locktoken)).unwrap();
    assert!(repo.get_lock_by_path(FILE).unwrap().is_none());
}

#[test]
fn refresh_extends_expiration() {
    let (repo, provider) = setup();
    let mut db = open_db(&provider, &HeaderMap::new());
    let lock = lock_file(&mut *db, FILE, "alice", Some(now_secs() + 3600)).unwrap();

    let new_time = now_secs() + 7200;
    let res = resource(FILE, true);
    let refreshed = db
        .refresh_locks(&res, std::slice::from_ref(&lock.locktoken), new_time)
        .unwrap();
    assert_eq!(refreshed.len(), 1);
    assert_eq!(refreshed[0].timeout, Some(new_time));
    assert_eq!(refreshed[0].scope, LockScope::Exclusive);
    assert_eq!(refreshed[0].typ, LockType::Write);

    let slock = repo.get_lock_by_path(FILE).unwrap().unwrap();
    assert_eq!(slock.expiration_date, new_time * 1_000_000);
}

#[test]
fn refresh_with_mismatched_path_is_refused() {
    let (repo, provider) = setup();
    repo.touch("/trunk/other.txt");
    let mut db = open_db(&provider, &HeaderMap::new());
    let lock = lock_file(&mut *db, "/trunk/other.txt", "alice", None).unwrap();

    // token names a lock on another path
    let res = resource(FILE, true);
    let e = db
        .refresh_locks(&res, std::slice::from_ref(&lock.locktoken), now_secs() + 60)
        .unwrap_err();
    assert_eq!(e, DavError::RefreshMismatch);
    assert_eq!(e.statuscode(), StatusCode::UNAUTHORIZED);
}

#[test]
fn refresh_with_unknown_token_is_an_internal_error() {
    let (_repo, provider) = setup();
    let mut db = open_db(&provider, &HeaderMap::new());
    let res = resource(FILE, true);
    let token = LockToken {
        uuid_str: "no-such-token".to_string(),
    };
    let e = db
        .refresh_locks(&res, std::slice::from_ref(&token), now_secs() + 60)
        .unwrap_err();
    assert_eq!(
        e,
        DavError::Repos(RepoError::BadLockToken, "Token doesn't point to a lock.")
    );
    assert_eq!(e.statuscode(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn unreadable_path_hides_lock_state() {
    let (repo, provider) = setup_denying(&[FILE]);
    let mut db = open_db(&provider, &HeaderMap::new());
    let res = resource(FILE, true);
    let token = LockToken {
        uuid_str: "whatever".to_string(),
    };

    assert_eq!(db.get_locks(&res).unwrap_err(), DavError::PathUnreadable);
    assert_eq!(db.has_locks(&res).unwrap_err(), DavError::PathUnreadable);
    assert_eq!(
        db.find_lock(&res, &token).unwrap_err(),
        DavError::PathUnreadable
    );
    assert_eq!(
        db.remove_lock(&res, None).unwrap_err(),
        DavError::PathUnreadable
    );
    assert_eq!(
        db.refresh_locks(&res, std::slice::from_ref(&token), now_secs())
            .unwrap_err(),
        DavError::PathUnreadable
    );
    let e = lock_file(&mut *db, FILE, "alice", None).unwrap_err();
    assert_eq!(e, DavError::PathUnreadable);
    assert_eq!(e.statuscode(), StatusCode::FORBIDDEN);

    // readable paths on the same repository are unaffected
    repo.touch("/trunk/readable.txt");
    lock_file(&mut *db, "/trunk/readable.txt", "alice", None).unwrap();
}

#[test]
fn find_lock_by_token() {
    let (_repo, provider) = setup();
    let mut db = open_db(&provider, &HeaderMap::new());
    let lock = lock_file(&mut *db, FILE, "alice", None).unwrap();

    let res = resource(FILE, true);
    let found = db.find_lock(&res, &lock.locktoken).unwrap().unwrap();
    assert_eq!(found.locktoken.uuid_str, lock.locktoken.uuid_str);
    assert_eq!(found.auth_user.as_deref(), Some("alice"));

    let missing = LockToken {
        uuid_str: "no-such-token".to_string(),
    };
    assert!(db.find_lock(&res, &missing).unwrap().is_none());
}

#[test]
fn resource_without_repository_path() {
    let (_repo, provider) = setup();
    let mut db = open_db(&provider, &HeaderMap::new());
    let res = LockResource {
        repos_path: None,
        exists: false,
        collection: false,
    };
    let token = LockToken {
        uuid_str: "whatever".to_string(),
    };

    assert!(db.get_locks(&res).unwrap().is_empty());
    assert!(!db.has_locks(&res).unwrap());
    assert!(db.find_lock(&res, &token).unwrap().is_none());
    db.remove_lock(&res, None).unwrap();
}

#[test]
fn locknull_record_tracks_missing_resource() {
    let (repo, provider) = setup();
    let mut db = open_db(&provider, &HeaderMap::new());

    // lock a path that is not (yet) a versioned object
    let res = LockResource {
        repos_path: Some("/trunk/new.txt"),
        exists: false,
        collection: false,
    };
    let mut lock = db.create_lock(&res).unwrap();
    assert!(!lock.is_locknull);
    lock.scope = LockScope::Exclusive;
    lock.typ = LockType::Write;
    lock.auth_user = Some("alice".to_string());
    db.append_locks(&res, std::slice::from_ref(&lock)).unwrap();
    assert!(repo.get_lock_by_path("/trunk/new.txt").unwrap().is_some());

    // leaving the locknull state changes nothing observable
    db.remove_locknull_state(&res).unwrap();
    assert!(db.has_locks(&res).unwrap());
}

#[test]
fn supported_lock_advertisement() {
    let (_repo, provider) = setup();

    let file = resource(FILE, true);
    let entry = provider.supported_lock(&file).unwrap();
    assert_eq!(entry.name, "lockentry");
    let scope = entry.get_child("lockscope").unwrap();
    assert!(scope.get_child("exclusive").is_some());
    assert!(scope.get_child("shared").is_none());
    let typ = entry.get_child("locktype").unwrap();
    assert!(typ.get_child("write").is_some());

    let collection = LockResource {
        repos_path: Some("/trunk"),
        exists: true,
        collection: true,
    };
    assert!(provider.supported_lock(&collection).is_none());
}

#[test]
fn locktoken_callbacks() {
    let (_repo, provider) = setup();

    let t = provider.parse_locktoken("opaquelocktoken:abc-123").unwrap();
    assert_eq!(provider.format_locktoken(&t), "opaquelocktoken:abc-123");
    assert_eq!(
        provider.parse_locktoken("something-else:xyz").unwrap_err(),
        DavError::UnknownLockToken
    );

    let u = provider.parse_locktoken("opaquelocktoken:abd-123").unwrap();
    assert_eq!(provider.compare_locktoken(&t, &u), std::cmp::Ordering::Less);
}

#[test]
fn close_lockdb_has_no_observable_effect() {
    let (_repo, provider) = setup();
    let mut db = open_db(&provider, &HeaderMap::new());
    let lock = lock_file(&mut *db, FILE, "alice", None).unwrap();

    db.close();
    db.close();

    // lock state lives in the repository, not in the request object
    let mut db = open_db(&provider, &HeaderMap::new());
    let res = resource(FILE, true);
    let found = db.find_lock(&res, &lock.locktoken).unwrap();
    assert!(found.is_some());
}
