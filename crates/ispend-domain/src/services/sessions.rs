//! Login sessions: one opaque token per logged-in username.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use ispend_cache::TtlTracker;
use ispend_types::Timestamp;
use parking_lot::Mutex;
use rand::Rng;
use rand::distr::Alphanumeric;
use subtle::ConstantTimeEq;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::error::{SessionError, SessionResult};

/// Length of generated session tokens.
pub const SESSION_ID_LENGTH: usize = 45;

/// Default interval between background sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Configuration for [`SessionRegistry`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Idle time after which a session is treated as gone. `None` keeps
    /// sessions until logout.
    pub ttl: Option<Duration>,

    /// How often the background sweeper drops expired sessions.
    pub sweep_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: None,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

/// An authenticated login.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginSession {
    pub username: String,
    pub session_id: String,
    pub created_at: Timestamp,
}

struct Sessions {
    by_username: HashMap<String, LoginSession>,
    ttl: TtlTracker,
}

impl Sessions {
    /// Drop `username`'s session if it outlived the TTL. Returns whether a
    /// live session remains.
    fn live(&mut self, username: &str) -> bool {
        if !self.by_username.contains_key(username) {
            return false;
        }
        if self.ttl.is_expired(username) {
            self.by_username.remove(username);
            self.ttl.remove(username);
            debug!(username, "Session expired");
            return false;
        }
        true
    }
}

/// Registry of login sessions keyed by username.
///
/// Issuing a session for a username that already has one replaces it.
pub struct SessionRegistry {
    inner: Mutex<Sessions>,
    config: SessionConfig,
}

impl SessionRegistry {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            inner: Mutex::new(Sessions {
                by_username: HashMap::new(),
                ttl: TtlTracker::new(config.ttl),
            }),
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Start a session for `username` and return its token.
    pub fn new_session(&self, username: &str) -> String {
        let session = LoginSession {
            username: username.to_string(),
            session_id: generate_session_id(),
            created_at: ispend_types::now(),
        };
        let token = session.session_id.clone();

        let mut inner = self.inner.lock();
        inner.ttl.touch(username.to_string());
        if inner
            .by_username
            .insert(username.to_string(), session)
            .is_some()
        {
            debug!(username, "Replaced existing session");
        } else {
            debug!(username, "Session created");
        }
        token
    }

    /// End `username`'s session.
    pub fn remove(&self, username: &str) -> SessionResult<()> {
        let mut inner = self.inner.lock();
        if !inner.live(username) {
            return Err(SessionError::NotFound(username.to_string()));
        }
        inner.by_username.remove(username);
        inner.ttl.remove(username);
        debug!(username, "Session removed");
        Ok(())
    }

    /// Get the session for `username`.
    pub fn get_by_username(&self, username: &str) -> SessionResult<LoginSession> {
        let mut inner = self.inner.lock();
        if !inner.live(username) {
            return Err(SessionError::NotFound(username.to_string()));
        }
        inner.ttl.touch(username.to_string());
        inner
            .by_username
            .get(username)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(username.to_string()))
    }

    /// Get the session holding `session_id`.
    pub fn get_by_session_id(&self, session_id: &str) -> SessionResult<LoginSession> {
        let mut inner = self.inner.lock();
        let username = inner
            .by_username
            .values()
            .find(|s| constant_time_eq(&s.session_id, session_id))
            .map(|s| s.username.clone());

        match username {
            Some(username) if inner.live(&username) => {
                inner.ttl.touch(username.clone());
                inner
                    .by_username
                    .get(&username)
                    .cloned()
                    .ok_or(SessionError::NotFound("session".to_string()))
            }
            _ => Err(SessionError::NotFound("session".to_string())),
        }
    }

    /// Whether `session_id` is the live session of `username`.
    pub fn is_user_logged_in(&self, session_id: &str, username: &str) -> bool {
        let mut inner = self.inner.lock();
        if !inner.live(username) {
            return false;
        }
        let matches = inner
            .by_username
            .get(username)
            .is_some_and(|s| constant_time_eq(&s.session_id, session_id));
        if matches {
            inner.ttl.touch(username.to_string());
        }
        trace!(username, logged_in = matches, "Checked session");
        matches
    }

    /// Drop every expired session, returning how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let mut inner = self.inner.lock();
        let expired = inner.ttl.drain_expired();
        let mut count = 0;
        for username in expired {
            if inner.by_username.remove(&username).is_some() {
                count += 1;
            }
        }
        if count > 0 {
            debug!(count, "Swept expired sessions");
        }
        count
    }

    /// Number of sessions held, expired ones included until swept.
    pub fn len(&self) -> usize {
        self.inner.lock().by_username.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().by_username.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

/// Periodically sweep expired sessions. Returns `None` when sessions don't
/// expire.
pub fn spawn_sweeper(registry: Arc<SessionRegistry>) -> Option<JoinHandle<()>> {
    if registry.config.ttl.is_none() {
        return None;
    }
    let period = registry.config.sweep_interval;

    Some(tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.tick().await;
        loop {
            interval.tick().await;
            registry.sweep_expired();
        }
    }))
}

fn generate_session_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_ID_LENGTH)
        .map(char::from)
        .collect()
}

/// Compare two strings in constant time.
fn constant_time_eq(a: &str, b: &str) -> bool {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    if a_bytes.len() == b_bytes.len() {
        a_bytes.ct_eq(b_bytes).into()
    } else {
        // Keep timing consistent with the equal-length path.
        let _ = a_bytes.ct_eq(a_bytes);
        false
    }
}
