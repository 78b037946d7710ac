//! Concurrent use of the user directory and session registry.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use ispend_cache::{BoundedCache, CacheConfig};
use ispend_domain::{DirectoryError, SessionRegistry, UserDirectory};
use ispend_store::{InMemoryStore, SpenderStore, SqliteStore};
use ispend_types::{SpendKind, SpendKindId, Spending, SpendingId, User};

fn directory() -> UserDirectory {
    UserDirectory::initialize(
        Arc::new(InMemoryStore::with_default_spend_kinds()),
        Arc::new(BoundedCache::new(CacheConfig::new())),
    )
    .unwrap()
}

fn user(name: &str) -> User {
    User::new(
        format!("{name}@example.com"),
        name,
        "hash",
        vec![SpendKind::new("food")],
    )
}

#[test]
fn test_distinct_usernames_all_register() {
    let directory = directory();
    let names: Vec<String> = (0..32).map(|i| format!("user-{i}")).collect();

    thread::scope(|s| {
        for name in &names {
            let directory = &directory;
            s.spawn(move || directory.add_user(user(name)).unwrap());
        }
    });

    let users = directory.get_all_users();
    assert_eq!(users.len(), names.len());
    let unique: HashSet<_> = users.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(unique.len(), names.len());
    for name in &names {
        assert!(directory.user_exists(name));
    }
}

#[test]
fn test_same_username_registers_once() {
    let directory = directory();

    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..16)
            .map(|_| s.spawn(|| directory.add_user(user("alice"))))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(DirectoryError::Conflict(_))))
        .count();
    assert_eq!(successes, 1);
    assert_eq!(conflicts, 15);
    assert_eq!(directory.get_all_users().len(), 1);
}

#[test]
fn test_spendings_from_many_threads_all_visible() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let directory = UserDirectory::initialize(
        store,
        Arc::new(BoundedCache::new(CacheConfig::new())),
    )
    .unwrap();
    let alice = directory.add_user(user("alice")).unwrap();

    let ids: Vec<String> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let mut alice = alice.clone();
                let directory = &directory;
                s.spawn(move || {
                    directory
                        .store_spending(&mut alice, Spending::new("EUR", i as f64, SpendKind::new("food")))
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let loaded = directory.get_user("alice").unwrap();
    assert_eq!(loaded.spends.len(), ids.len());
    let stored: HashSet<_> = loaded.spends.iter().map(|s| s.id.as_str()).collect();
    for id in &ids {
        assert!(stored.contains(id.as_str()));
    }
    assert_eq!(loaded.spend_kinds.len(), 1);
}

#[test]
fn test_sessions_for_many_users() {
    let registry = SessionRegistry::default();
    let names: Vec<String> = (0..32).map(|i| format!("user-{i}")).collect();

    let tokens: Vec<(String, String)> = thread::scope(|s| {
        let handles: Vec<_> = names
            .iter()
            .map(|name| {
                let registry = &registry;
                s.spawn(move || (name.clone(), registry.new_session(name)))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(registry.len(), names.len());
    for (name, token) in &tokens {
        assert!(registry.is_user_logged_in(token, name));
    }
}

/// In-memory store whose spend writes for `slow` take half a second.
struct SlowStore {
    inner: InMemoryStore,
}

impl SpenderStore for SlowStore {
    fn store_default_spend_kind(&self, kind: &SpendKind) -> ispend_store::Result<SpendKindId> {
        self.inner.store_default_spend_kind(kind)
    }
    fn get_all_default_spend_kinds(&self) -> ispend_store::Result<Vec<SpendKind>> {
        self.inner.get_all_default_spend_kinds()
    }
    fn get_spend_kind(&self, username: &str, id: SpendKindId) -> ispend_store::Result<SpendKind> {
        self.inner.get_spend_kind(username, id)
    }
    fn get_spend_kinds(&self, username: &str) -> ispend_store::Result<Vec<SpendKind>> {
        self.inner.get_spend_kinds(username)
    }
    fn store_spend_kind(&self, username: &str, kind: &SpendKind) -> ispend_store::Result<SpendKindId> {
        self.inner.store_spend_kind(username, kind)
    }
    fn store_user(&self, user: &User) -> ispend_store::Result<()> {
        self.inner.store_user(user)
    }
    fn get_user(&self, username: &str, load_all: bool) -> ispend_store::Result<User> {
        self.inner.get_user(username, load_all)
    }
    fn get_all_users(&self, load_all: bool) -> ispend_store::Result<Vec<User>> {
        self.inner.get_all_users(load_all)
    }
    fn store_spending(&self, username: &str, spending: &Spending) -> ispend_store::Result<SpendingId> {
        if username == "slow" {
            thread::sleep(Duration::from_millis(500));
        }
        self.inner.store_spending(username, spending)
    }
    fn get_spends(&self, username: &str) -> ispend_store::Result<Vec<Spending>> {
        self.inner.get_spends(username)
    }
    fn delete_spending(&self, username: &str, spend_id: &str) -> ispend_store::Result<()> {
        self.inner.delete_spending(username, spend_id)
    }
}

#[test]
fn test_slow_writer_does_not_block_other_users() {
    let directory = UserDirectory::initialize(
        Arc::new(SlowStore {
            inner: InMemoryStore::with_default_spend_kinds(),
        }),
        Arc::new(BoundedCache::new(CacheConfig::new())),
    )
    .unwrap();
    let mut slow = directory.add_user(user("slow")).unwrap();
    let mut bob = directory.add_user(user("bob")).unwrap();

    let elapsed = thread::scope(|s| {
        let directory = &directory;
        let writer = s.spawn(move || {
            directory
                .store_spending(&mut slow, Spending::new("EUR", 1.0, SpendKind::new("food")))
                .unwrap()
        });
        thread::sleep(Duration::from_millis(50));

        let started = Instant::now();
        directory
            .store_spending(&mut bob, Spending::new("EUR", 2.0, SpendKind::new("food")))
            .unwrap();
        let elapsed = started.elapsed();

        writer.join().unwrap();
        elapsed
    });

    assert!(elapsed < Duration::from_millis(200), "bob waited {elapsed:?}");
    assert_eq!(directory.get_user("slow").unwrap().spends.len(), 1);
    assert_eq!(directory.get_user("bob").unwrap().spends.len(), 1);
}
