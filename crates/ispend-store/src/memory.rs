//! In-memory [`SpenderStore`] implementation.

use std::collections::HashMap;

use ispend_types::spending::DEFAULT_SPEND_KIND_NAMES;
use ispend_types::{SpendKind, SpendKindId, Spending, SpendingId, User};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::storage::SpenderStore;
use crate::{Result, StoreError};

#[derive(Default)]
struct Inner {
    default_kinds: Vec<SpendKind>,
    users: HashMap<String, User>,
    order: Vec<String>,
    next_kind_id: SpendKindId,
}

impl Inner {
    fn next_kind_id(&mut self) -> SpendKindId {
        self.next_kind_id += 1;
        self.next_kind_id
    }

    fn user(&self, username: &str) -> Result<&User> {
        self.users
            .get(username)
            .ok_or_else(|| StoreError::NotFound(format!("user {username}")))
    }

    fn user_mut(&mut self, username: &str) -> Result<&mut User> {
        self.users
            .get_mut(username)
            .ok_or_else(|| StoreError::NotFound(format!("user {username}")))
    }
}

/// Store that keeps everything in process memory.
///
/// Kind ids come from a counter shared by default and user-owned kinds;
/// spending ids are UUIDs.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    /// Create an empty store with no default spend kinds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with the standard default spend kinds.
    pub fn with_default_spend_kinds() -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.lock();
            for name in DEFAULT_SPEND_KIND_NAMES {
                let id = inner.next_kind_id();
                inner.default_kinds.push(SpendKind::with_id(id, name));
            }
        }
        store
    }
}

impl SpenderStore for InMemoryStore {
    fn store_default_spend_kind(&self, kind: &SpendKind) -> Result<SpendKindId> {
        let mut inner = self.inner.lock();
        if inner.default_kinds.iter().any(|k| k.name == kind.name) {
            return Err(StoreError::Conflict(format!("default spend kind {}", kind.name)));
        }
        let id = inner.next_kind_id();
        inner.default_kinds.push(SpendKind::with_id(id, kind.name.clone()));
        Ok(id)
    }

    fn get_all_default_spend_kinds(&self) -> Result<Vec<SpendKind>> {
        Ok(self.inner.lock().default_kinds.clone())
    }

    fn get_spend_kind(&self, username: &str, id: SpendKindId) -> Result<SpendKind> {
        let inner = self.inner.lock();
        inner
            .user(username)?
            .spend_kinds
            .iter()
            .find(|k| k.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("spend kind {id} for {username}")))
    }

    fn get_spend_kinds(&self, username: &str) -> Result<Vec<SpendKind>> {
        Ok(self.inner.lock().user(username)?.spend_kinds.clone())
    }

    fn store_spend_kind(&self, username: &str, kind: &SpendKind) -> Result<SpendKindId> {
        let mut inner = self.inner.lock();
        if inner.user(username)?.spend_kind_named(&kind.name).is_some() {
            return Err(StoreError::Conflict(format!(
                "spend kind {} for {username}",
                kind.name
            )));
        }
        let id = inner.next_kind_id();
        inner
            .user_mut(username)?
            .spend_kinds
            .push(SpendKind::with_id(id, kind.name.clone()));
        Ok(id)
    }

    fn store_user(&self, user: &User) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.users.contains_key(&user.username) {
            return Err(StoreError::Conflict(format!("user {}", user.username)));
        }
        let record = User::new(
            user.email.clone(),
            user.username.clone(),
            user.password.clone(),
            Vec::new(),
        );
        inner.order.push(user.username.clone());
        inner.users.insert(user.username.clone(), record);
        Ok(())
    }

    fn get_user(&self, username: &str, load_all: bool) -> Result<User> {
        let inner = self.inner.lock();
        let user = inner.user(username)?;
        if load_all {
            Ok(user.clone())
        } else {
            Ok(User::new(
                user.email.clone(),
                user.username.clone(),
                user.password.clone(),
                Vec::new(),
            ))
        }
    }

    fn get_all_users(&self, load_all: bool) -> Result<Vec<User>> {
        let usernames = self.inner.lock().order.clone();
        usernames
            .iter()
            .map(|username| self.get_user(username, load_all))
            .collect()
    }

    fn store_spending(&self, username: &str, spending: &Spending) -> Result<SpendingId> {
        let mut inner = self.inner.lock();

        let existing = inner
            .user(username)?
            .spend_kind_named(&spending.kind.name)
            .cloned();
        let kind = match existing {
            Some(kind) => kind,
            None => {
                let kind = SpendKind::with_id(inner.next_kind_id(), spending.kind.name.clone());
                inner.user_mut(username)?.spend_kinds.push(kind.clone());
                kind
            }
        };

        let id = Uuid::new_v4().to_string();
        let mut stored = spending.clone();
        stored.id = id.clone();
        stored.kind = kind;
        inner.user_mut(username)?.spends.push(stored);
        Ok(id)
    }

    fn get_spends(&self, username: &str) -> Result<Vec<Spending>> {
        Ok(self.inner.lock().user(username)?.spends.clone())
    }

    fn delete_spending(&self, username: &str, spend_id: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        let spends = &mut inner.user_mut(username)?.spends;
        let index = spends
            .iter()
            .position(|s| s.id == spend_id)
            .ok_or_else(|| StoreError::NotFound(format!("spending {spend_id} for {username}")))?;
        spends.remove(index);
        Ok(())
    }
}
