//! Cache-aside directory of registered users.
//!
//! The store is the source of truth. Each user's spends and spend kinds are
//! mirrored in a [`Cache`] under two keys (`username` and `username|sk`), and
//! the set of registered usernames is kept in memory so existence checks never
//! touch the store.
//!
//! Reads serve the cached collection when present and non-empty, otherwise
//! they fetch from the store and repopulate the cache. Writes go to the store
//! first and then overwrite the cache entry with the full collection.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use ispend_cache::Cache;
use ispend_store::SpenderStore;
use ispend_types::{SpendKind, SpendKindId, Spending, SpendingId, User};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, trace, warn};

use crate::error::{DirectoryError, DirectoryResult};

/// Every cache entry is charged the same cost.
const ENTRY_COST: u64 = 1;

const SPEND_KINDS_SUFFIX: &str = "|sk";

/// Value stored in the directory cache: one user's full collection.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedCollection {
    Spends(Vec<Spending>),
    SpendKinds(Vec<SpendKind>),
}

/// Registered usernames: insertion order for listing plus a hash index for
/// membership.
#[derive(Default)]
struct Registry {
    order: Vec<String>,
    index: HashSet<String>,
}

impl Registry {
    fn reserve(&mut self, username: &str) -> bool {
        if !self.index.insert(username.to_string()) {
            return false;
        }
        self.order.push(username.to_string());
        true
    }

    fn release(&mut self, username: &str) {
        if self.index.remove(username) {
            self.order.retain(|u| u != username);
        }
    }
}

/// Cache-aside directory of users, their spendings and spend kinds.
pub struct UserDirectory {
    store: Arc<dyn SpenderStore>,
    cache: Arc<dyn Cache<CachedCollection>>,
    registry: RwLock<Registry>,
    /// Per-username locks held across spend mutations so cache refreshes land
    /// in store order. Writes for different users never share a lock.
    writes: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl UserDirectory {
    /// Load every user from `store`, warm the cache and build the username
    /// registry.
    ///
    /// Any store failure aborts construction.
    pub fn initialize(
        store: Arc<dyn SpenderStore>,
        cache: Arc<dyn Cache<CachedCollection>>,
    ) -> DirectoryResult<Self> {
        store.open()?;
        let users = store.get_all_users(true)?;

        let directory = Self {
            store,
            cache,
            registry: RwLock::new(Registry::default()),
            writes: Mutex::new(HashMap::new()),
        };

        {
            let mut registry = directory.registry.write();
            for user in &users {
                if !registry.reserve(&user.username) {
                    warn!(username = %user.username, "Duplicate username in store, skipping");
                    continue;
                }
                directory.cache_spends(&user.username, user.spends.clone());
                directory.cache_spend_kinds(&user.username, user.spend_kinds.clone());
            }
        }

        info!(users = users.len(), "User directory initialized");
        Ok(directory)
    }

    /// Register a new user.
    ///
    /// Persists the user record, then each spend kind and spending it carries.
    /// Returns the user with store-assigned ids filled in. Kinds or spendings
    /// the store refuses are logged and dropped.
    pub fn add_user(&self, mut user: User) -> DirectoryResult<User> {
        validate_username(&user.username)?;
        let username = user.username.clone();

        if !self.registry.write().reserve(&username) {
            return Err(DirectoryError::Conflict(format!("user {username}")));
        }

        if let Err(e) = self.store.store_user(&user) {
            self.registry.write().release(&username);
            return Err(e.into());
        }

        let kinds = std::mem::take(&mut user.spend_kinds);
        for mut kind in kinds {
            match self.store.store_spend_kind(&username, &kind) {
                Ok(id) => {
                    kind.id = id;
                    user.spend_kinds.push(kind);
                }
                Err(e) => warn!(username = %username, kind = %kind.name, error = %e, "Failed to store spend kind"),
            }
        }

        let spends = std::mem::take(&mut user.spends);
        for mut spending in spends {
            match self.store.store_spending(&username, &spending) {
                Ok(id) => {
                    spending.id = id;
                    user.spends.push(spending);
                }
                Err(e) => warn!(username = %username, error = %e, "Failed to store spending"),
            }
        }

        // Spendings may have created kinds the user didn't carry.
        let mut kinds_current = true;
        if !user.spends.is_empty() {
            match self.store.get_spend_kinds(&username) {
                Ok(kinds) => user.spend_kinds = kinds,
                Err(e) => {
                    warn!(username = %username, error = %e, "Failed to reload spend kinds");
                    kinds_current = false;
                }
            }
        }

        self.cache_spends(&username, user.spends.clone());
        if kinds_current {
            self.cache_spend_kinds(&username, user.spend_kinds.clone());
        } else {
            self.cache.delete(&spend_kinds_key(&username));
        }

        debug!(username = %username, kinds = user.spend_kinds.len(), "User added");
        Ok(user)
    }

    /// Get a user with their spendings and spend kinds.
    pub fn get_user(&self, username: &str) -> DirectoryResult<User> {
        self.ensure_registered(username)?;

        let mut user = self.store.get_user(username, false)?;
        user.spends = self.spends(username)?;
        user.spend_kinds = self.spend_kinds(username)?;
        Ok(user)
    }

    /// Get every registered user in registration order.
    ///
    /// Users that fail to load are logged and skipped.
    pub fn get_all_users(&self) -> Vec<User> {
        let usernames = self.registry.read().order.clone();
        usernames
            .iter()
            .filter_map(|username| match self.get_user(username) {
                Ok(user) => Some(user),
                Err(e) => {
                    error!(username = %username, error = %e, "Failed to load user");
                    None
                }
            })
            .collect()
    }

    /// Whether `username` is registered. Never touches the store.
    pub fn user_exists(&self, username: &str) -> bool {
        self.registry.read().index.contains(username)
    }

    /// Number of registered users.
    pub fn user_count(&self) -> usize {
        self.registry.read().order.len()
    }

    /// Get one of the user's spend kinds by id.
    pub fn get_spend_kind(&self, username: &str, id: SpendKindId) -> DirectoryResult<SpendKind> {
        Ok(self.store.get_spend_kind(username, id)?)
    }

    /// Get the user's spend kinds.
    pub fn get_spend_kinds(&self, username: &str) -> DirectoryResult<Vec<SpendKind>> {
        self.ensure_registered(username)?;
        self.spend_kinds(username)
    }

    /// Get the global default spend kinds.
    pub fn get_all_default_spend_kinds(&self) -> DirectoryResult<Vec<SpendKind>> {
        Ok(self.store.get_all_default_spend_kinds()?)
    }

    /// Record a spending for `user`, returning the store-assigned id.
    ///
    /// The stored spending is appended to `user.spends` and the spends cache
    /// entry is replaced with the store's current list.
    pub fn store_spending(&self, user: &mut User, spending: Spending) -> DirectoryResult<SpendingId> {
        self.ensure_registered(&user.username)?;
        let username = user.username.clone();
        let lock = self.user_lock(&username);
        let _writes = lock.lock();

        let id = self.store.store_spending(&username, &spending)?;

        let spends = match self.store.get_spends(&username) {
            Ok(spends) => spends,
            Err(e) => {
                // The write landed; stop serving the old lists.
                self.cache.delete(&username);
                self.cache.delete(&spend_kinds_key(&username));
                error!(username = %username, spend_id = %id, error = %e, "Failed to refresh spends after write");
                return Err(e.into());
            }
        };
        if let Some(stored) = spends.iter().find(|s| s.id == id) {
            user.spends.push(stored.clone());
            if user.spend_kind_named(&stored.kind.name).is_none() {
                user.spend_kinds.push(stored.kind.clone());
            }
            // The store may have created the kind on the fly.
            let kinds_key = spend_kinds_key(&username);
            let cached = matches!(
                self.cache.get(&kinds_key),
                Some(CachedCollection::SpendKinds(kinds)) if kinds.iter().any(|k| k.id == stored.kind.id)
            );
            if !cached {
                self.cache.delete(&kinds_key);
            }
        }

        self.replace_spends(&username, spends);
        debug!(username = %username, spend_id = %id, "Spending stored");
        Ok(id)
    }

    /// Delete one of the user's spendings.
    pub fn delete_spending(&self, username: &str, spend_id: &str) -> DirectoryResult<()> {
        self.ensure_registered(username)?;
        let lock = self.user_lock(username);
        let _writes = lock.lock();

        let mut spends = self.spends(username)?;
        self.store.delete_spending(username, spend_id)?;

        match spends.iter().position(|s| s.id == spend_id) {
            Some(index) => {
                spends.remove(index);
                self.replace_spends(username, spends);
                debug!(username, spend_id, "Spending deleted");
                Ok(())
            }
            None => {
                warn!(username, spend_id, "Cached spends diverged from store, resyncing");
                match self.store.get_spends(username) {
                    Ok(fresh) => self.replace_spends(username, fresh),
                    Err(e) => {
                        self.cache.delete(username);
                        return Err(e.into());
                    }
                }
                Err(DirectoryError::NotFound(format!(
                    "spending {spend_id} for {username}"
                )))
            }
        }
    }

    // ── Cache helpers ───────────────────────────────────────────────────

    fn user_lock(&self, username: &str) -> Arc<Mutex<()>> {
        self.writes
            .lock()
            .entry(username.to_string())
            .or_default()
            .clone()
    }

    fn ensure_registered(&self, username: &str) -> DirectoryResult<()> {
        if self.user_exists(username) {
            Ok(())
        } else {
            Err(DirectoryError::NotFound(format!("user {username}")))
        }
    }

    fn spends(&self, username: &str) -> DirectoryResult<Vec<Spending>> {
        if let Some(CachedCollection::Spends(spends)) = self.cache.get(username)
            && !spends.is_empty()
        {
            trace!(username, "Spends cache hit");
            return Ok(spends);
        }

        debug!(username, "Spends cache miss, loading from store");
        let spends = self.store.get_spends(username)?;
        self.cache_spends(username, spends.clone());
        Ok(spends)
    }

    fn spend_kinds(&self, username: &str) -> DirectoryResult<Vec<SpendKind>> {
        let key = spend_kinds_key(username);
        if let Some(CachedCollection::SpendKinds(kinds)) = self.cache.get(&key)
            && !kinds.is_empty()
        {
            trace!(username, "Spend kinds cache hit");
            return Ok(kinds);
        }

        debug!(username, "Spend kinds cache miss, loading from store");
        let kinds = self.store.get_spend_kinds(username)?;
        self.cache_spend_kinds(username, kinds.clone());
        Ok(kinds)
    }

    fn replace_spends(&self, username: &str, spends: Vec<Spending>) {
        self.cache.delete(username);
        self.cache_spends(username, spends);
    }

    fn cache_spends(&self, username: &str, spends: Vec<Spending>) {
        if !self
            .cache
            .set(username, CachedCollection::Spends(spends), ENTRY_COST)
        {
            warn!(username, "Failed to cache spends");
        }
    }

    fn cache_spend_kinds(&self, username: &str, kinds: Vec<SpendKind>) {
        if !self.cache.set(
            &spend_kinds_key(username),
            CachedCollection::SpendKinds(kinds),
            ENTRY_COST,
        ) {
            warn!(username, "Failed to cache spend kinds");
        }
    }
}

fn spend_kinds_key(username: &str) -> String {
    format!("{username}{SPEND_KINDS_SUFFIX}")
}

fn validate_username(username: &str) -> DirectoryResult<()> {
    if username.is_empty() {
        return Err(DirectoryError::InvalidArgument("username is empty".into()));
    }
    if username.contains('|') {
        return Err(DirectoryError::InvalidArgument(format!(
            "username {username} contains '|'"
        )));
    }
    Ok(())
}
