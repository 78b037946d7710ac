use std::path::Path;

use chrono::{DateTime, Utc};
use ispend_types::{SpendKind, SpendKindId, Spending, SpendingId, User};
use parking_lot::{Mutex, MutexGuard};
use rusqlite::types::Type;
use rusqlite::{Connection, ErrorCode, OptionalExtension, params};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::storage::SpenderStore;
use crate::{Result, StoreError};

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// SQLite-backed [`SpenderStore`].
///
/// Thread-safe via internal `Mutex<Connection>`. Default spend kinds are
/// seeded by the migrations.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and run pending migrations.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

        let mut store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        debug!(path = %path.display(), "Opened SQLite store");
        Ok(store)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        let mut store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&mut self) -> Result<()> {
        let conn = self.conn.get_mut();
        embedded::migrations::runner()
            .run(conn)
            .map_err(|e| StoreError::Migration(e.to_string()))?;
        Ok(())
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }
}

impl SpenderStore for SqliteStore {
    fn open(&self) -> Result<()> {
        self.conn().query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.conn().execute_batch("PRAGMA optimize;")?;
        debug!("SQLite store closed");
        Ok(())
    }

    // ── Spend kinds ─────────────────────────────────────────────────────

    fn store_default_spend_kind(&self, kind: &SpendKind) -> Result<SpendKindId> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO default_spend_kinds (name) VALUES (?1)",
            params![kind.name],
        )
        .map_err(|e| conflict_or(e, || format!("default spend kind {}", kind.name)))?;
        Ok(conn.last_insert_rowid())
    }

    fn get_all_default_spend_kinds(&self) -> Result<Vec<SpendKind>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, name FROM default_spend_kinds ORDER BY id")?;
        let rows = stmt.query_map([], row_to_spend_kind)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn get_spend_kind(&self, username: &str, id: SpendKindId) -> Result<SpendKind> {
        let conn = self.conn();
        let user_id = user_id(&conn, username)?;
        conn.query_row(
            "SELECT id, name FROM spend_kinds WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
            row_to_spend_kind,
        )
        .optional()?
        .ok_or_else(|| StoreError::NotFound(format!("spend kind {id} for {username}")))
    }

    fn get_spend_kinds(&self, username: &str) -> Result<Vec<SpendKind>> {
        let conn = self.conn();
        let user_id = user_id(&conn, username)?;
        spend_kinds_for(&conn, user_id)
    }

    fn store_spend_kind(&self, username: &str, kind: &SpendKind) -> Result<SpendKindId> {
        let conn = self.conn();
        let user_id = user_id(&conn, username)?;
        insert_spend_kind(&conn, user_id, &kind.name)
            .map_err(|e| conflict_or(e, || format!("spend kind {} for {username}", kind.name)))
    }

    // ── Users ───────────────────────────────────────────────────────────

    fn store_user(&self, user: &User) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO users (email, username, password) VALUES (?1, ?2, ?3)",
                params![user.email, user.username, user.password],
            )
            .map_err(|e| conflict_or(e, || format!("user {}", user.username)))?;
        trace!(username = %user.username, "Stored user");
        Ok(())
    }

    fn get_user(&self, username: &str, load_all: bool) -> Result<User> {
        let conn = self.conn();
        let (id, user) = conn
            .query_row(
                "SELECT id, email, username, password FROM users WHERE username = ?1",
                params![username],
                row_to_user,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("user {username}")))?;

        if load_all {
            load_collections(&conn, id, user)
        } else {
            Ok(user)
        }
    }

    fn get_all_users(&self, load_all: bool) -> Result<Vec<User>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT id, email, username, password FROM users ORDER BY id")?;
        let rows = stmt
            .query_map([], row_to_user)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(id, user)| {
                if load_all {
                    load_collections(&conn, id, user)
                } else {
                    Ok(user)
                }
            })
            .collect()
    }

    // ── Spendings ───────────────────────────────────────────────────────

    fn store_spending(&self, username: &str, spending: &Spending) -> Result<SpendingId> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let user_id = user_id(&tx, username)?;

        let existing: Option<SpendKindId> = tx
            .query_row(
                "SELECT id FROM spend_kinds WHERE user_id = ?1 AND name = ?2",
                params![user_id, spending.kind.name],
                |row| row.get(0),
            )
            .optional()?;
        let kind_id = match existing {
            Some(id) => id,
            None => insert_spend_kind(&tx, user_id, &spending.kind.name)?,
        };

        let id = Uuid::new_v4().to_string();
        tx.execute(
            "INSERT INTO spends (id, currency, amount, spend_timestamp, user_id, kind_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                spending.currency,
                spending.amount,
                spending.timestamp.to_rfc3339(),
                user_id,
                kind_id
            ],
        )?;
        tx.commit()?;

        trace!(username, spend_id = %id, kind_id, "Stored spending");
        Ok(id)
    }

    fn get_spends(&self, username: &str) -> Result<Vec<Spending>> {
        let conn = self.conn();
        let user_id = user_id(&conn, username)?;
        spends_for(&conn, user_id)
    }

    fn delete_spending(&self, username: &str, spend_id: &str) -> Result<()> {
        let conn = self.conn();
        let user_id = user_id(&conn, username)?;
        let count = conn.execute(
            "DELETE FROM spends WHERE id = ?1 AND user_id = ?2",
            params![spend_id, user_id],
        )?;
        if count == 0 {
            return Err(StoreError::NotFound(format!(
                "spending {spend_id} for {username}"
            )));
        }
        trace!(username, spend_id, "Deleted spending");
        Ok(())
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn user_id(conn: &Connection, username: &str) -> Result<i64> {
    conn.query_row(
        "SELECT id FROM users WHERE username = ?1",
        params![username],
        |row| row.get(0),
    )
    .optional()?
    .ok_or_else(|| StoreError::NotFound(format!("user {username}")))
}

fn insert_spend_kind(conn: &Connection, user_id: i64, name: &str) -> Result<SpendKindId> {
    conn.execute(
        "INSERT INTO spend_kinds (user_id, name) VALUES (?1, ?2)",
        params![user_id, name],
    )?;
    Ok(conn.last_insert_rowid())
}

fn spend_kinds_for(conn: &Connection, user_id: i64) -> Result<Vec<SpendKind>> {
    let mut stmt = conn.prepare("SELECT id, name FROM spend_kinds WHERE user_id = ?1 ORDER BY id")?;
    let rows = stmt.query_map(params![user_id], row_to_spend_kind)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn spends_for(conn: &Connection, user_id: i64) -> Result<Vec<Spending>> {
    let mut stmt = conn.prepare(
        "SELECT s.id, s.currency, s.amount, s.spend_timestamp, k.id, k.name
         FROM spends s JOIN spend_kinds k ON k.id = s.kind_id
         WHERE s.user_id = ?1 ORDER BY s.rowid",
    )?;
    let rows = stmt.query_map(params![user_id], row_to_spending)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn load_collections(conn: &Connection, user_id: i64, mut user: User) -> Result<User> {
    user.spends = spends_for(conn, user_id)?;
    user.spend_kinds = spend_kinds_for(conn, user_id)?;
    Ok(user)
}

/// Map a unique-constraint violation to `Conflict`, anything else to `Database`.
fn conflict_or(err: impl Into<StoreError>, what: impl FnOnce() -> String) -> StoreError {
    match err.into() {
        StoreError::Database(rusqlite::Error::SqliteFailure(e, _))
            if e.code == ErrorCode::ConstraintViolation =>
        {
            StoreError::Conflict(what())
        }
        other => other,
    }
}

fn parse_dt(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_spend_kind(row: &rusqlite::Row<'_>) -> rusqlite::Result<SpendKind> {
    Ok(SpendKind::with_id(row.get(0)?, row.get::<_, String>(1)?))
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<(i64, User)> {
    let user = User::new(
        row.get::<_, String>(1)?,
        row.get::<_, String>(2)?,
        row.get::<_, String>(3)?,
        Vec::new(),
    );
    Ok((row.get(0)?, user))
}

fn row_to_spending(row: &rusqlite::Row<'_>) -> rusqlite::Result<Spending> {
    Ok(Spending {
        id: row.get(0)?,
        currency: row.get::<_, String>(1)?.trim().to_string(),
        amount: row.get(2)?,
        timestamp: parse_dt(3, &row.get::<_, String>(3)?)?,
        kind: SpendKind::with_id(row.get(4)?, row.get::<_, String>(5)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ispend_types::spending::DEFAULT_SPEND_KIND_NAMES;

    fn test_store() -> SqliteStore {
        SqliteStore::open_in_memory().expect("failed to open in-memory store")
    }

    fn store_with_alice() -> SqliteStore {
        let store = test_store();
        store
            .store_user(&User::new("alice@example.com", "alice", "hash", Vec::new()))
            .unwrap();
        store
    }

    #[test]
    fn test_migrations_seed_default_kinds() {
        let store = test_store();
        let kinds = store.get_all_default_spend_kinds().unwrap();
        let names: Vec<_> = kinds.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, DEFAULT_SPEND_KIND_NAMES);
    }

    #[test]
    fn test_ping() {
        let store = test_store();
        store.open().unwrap();
        store.close().unwrap();
    }

    #[test]
    fn test_duplicate_user_is_conflict() {
        let store = store_with_alice();
        let err = store
            .store_user(&User::new("other@example.com", "alice", "hash", Vec::new()))
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn test_duplicate_spend_kind_is_conflict() {
        let store = store_with_alice();
        store.store_spend_kind("alice", &SpendKind::new("food")).unwrap();
        let err = store
            .store_spend_kind("alice", &SpendKind::new("food"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn test_store_spending_reuses_existing_kind() {
        let store = store_with_alice();
        let food = store.store_spend_kind("alice", &SpendKind::new("food")).unwrap();

        // The kind id on the input is ignored; lookup is by name.
        store
            .store_spending("alice", &Spending::new("EUR", 9.5, SpendKind::with_id(999, "food")))
            .unwrap();

        let spends = store.get_spends("alice").unwrap();
        assert_eq!(spends[0].kind.id, food);
        assert_eq!(store.get_spend_kinds("alice").unwrap().len(), 1);
    }

    #[test]
    fn test_timestamp_survives_round_trip() {
        let store = store_with_alice();
        let ts = DateTime::parse_from_rfc3339("2024-03-01T12:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        store
            .store_spending(
                "alice",
                &Spending::new("USD", 1.0, SpendKind::new("rent")).with_timestamp(ts),
            )
            .unwrap();

        assert_eq!(store.get_spends("alice").unwrap()[0].timestamp, ts);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ispend.db");

        let id = {
            let store = SqliteStore::open(&path).unwrap();
            store
                .store_user(&User::new("alice@example.com", "alice", "hash", Vec::new()))
                .unwrap();
            store
                .store_spending("alice", &Spending::new("EUR", 3.0, SpendKind::new("food")))
                .unwrap()
        };

        let store = SqliteStore::open(&path).unwrap();
        let user = store.get_user("alice", true).unwrap();
        assert_eq!(user.spends.len(), 1);
        assert_eq!(user.spends[0].id, id);
        assert_eq!(store.get_all_default_spend_kinds().unwrap().len(), 4);
    }
}
