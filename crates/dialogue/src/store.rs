//! In-memory session and profile stores

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

use sales_agent_config::SessionConfig;
use sales_agent_core::{
    ConversationSession, Error, ProfileStore, Result, SessionStore, UserProfile,
};

/// Session store backed by a `RwLock<HashMap>`
///
/// Records do not survive restarts.
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, ConversationSession>>,
    timeout: Duration,
    history_limit: usize,
    affect_history_limit: usize,
}

impl InMemorySessionStore {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            timeout: Duration::seconds(i64::try_from(config.timeout_secs).unwrap_or(i64::MAX)),
            history_limit: config.history_limit,
            affect_history_limit: config.affect_history_limit,
        }
    }

    fn fresh(&self, id: &str, now: DateTime<Utc>) -> ConversationSession {
        ConversationSession::with_limits(id, now, self.history_limit, self.affect_history_limit)
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(&SessionConfig::default())
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_or_create(&self, id: &str, now: DateTime<Utc>) -> Result<ConversationSession> {
        if id.trim().is_empty() {
            return Err(Error::InvalidInput("empty session id".to_string()));
        }

        {
            let sessions = self.sessions.read();
            if let Some(session) = sessions.get(id) {
                if !session.is_expired(now, self.timeout) {
                    return Ok(session.clone());
                }
            } else {
                return Ok(self.fresh(id, now));
            }
        }

        // Expired: drop the stale row so the fresh session starts at revision 0
        let mut sessions = self.sessions.write();
        if let Some(session) = sessions.get(id) {
            if !session.is_expired(now, self.timeout) {
                return Ok(session.clone());
            }
            tracing::info!(
                session_id = %id,
                idle_secs = now.signed_duration_since(session.last_activity).num_seconds(),
                "Session expired, starting fresh"
            );
            sessions.remove(id);
        }
        Ok(self.fresh(id, now))
    }

    async fn save(&self, mut session: ConversationSession) -> Result<()> {
        let mut sessions = self.sessions.write();
        let stored_revision = sessions.get(&session.id).map(|s| s.revision).unwrap_or(0);
        if stored_revision != session.revision {
            tracing::warn!(
                session_id = %session.id,
                expected = stored_revision,
                actual = session.revision,
                "Rejected stale session write"
            );
            return Err(Error::StaleSession {
                id: session.id,
                expected: stored_revision,
                actual: session.revision,
            });
        }
        session.revision += 1;
        sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn expire(&self, id: &str) -> Result<()> {
        self.sessions.write().remove(id);
        Ok(())
    }

    async fn count(&self) -> usize {
        self.sessions.read().len()
    }
}

/// Profile store backed by a `RwLock<HashMap>`
#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<String, UserProfile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get_or_create(&self, user_id: &str, now: DateTime<Utc>) -> Result<UserProfile> {
        if user_id.trim().is_empty() {
            return Err(Error::InvalidInput("empty user id".to_string()));
        }
        Ok(self
            .profiles
            .read()
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| UserProfile::new(user_id, now)))
    }

    async fn get(&self, user_id: &str) -> Result<Option<UserProfile>> {
        Ok(self.profiles.read().get(user_id).cloned())
    }

    async fn save(&self, profile: UserProfile) -> Result<()> {
        self.profiles
            .write()
            .insert(profile.user_id.clone(), profile);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sales_agent_core::TurnRole;

    #[tokio::test]
    async fn test_get_or_create_returns_stored() {
        let store = InMemorySessionStore::default();
        let now = Utc::now();

        let mut session = store.get_or_create("s1", now).await.unwrap();
        session.push_turn(TurnRole::User, "hello", now);
        store.save(session).await.unwrap();

        let loaded = store.get_or_create("s1", now).await.unwrap();
        assert_eq!(loaded.history_len(), 1);
        assert_eq!(loaded.revision, 1);
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn test_expired_session_replaced() {
        let store = InMemorySessionStore::default();
        let now = Utc::now();

        let mut session = store.get_or_create("s1", now).await.unwrap();
        session.push_turn(TurnRole::User, "hello", now);
        store.save(session).await.unwrap();

        let later = now + Duration::hours(5);
        let fresh = store.get_or_create("s1", later).await.unwrap();
        assert_eq!(fresh.history_len(), 0);
        assert_eq!(fresh.revision, 0);
        assert_eq!(store.count().await, 0);
        store.save(fresh).await.unwrap();
    }

    #[tokio::test]
    async fn test_stale_write_rejected() {
        let store = InMemorySessionStore::default();
        let now = Utc::now();

        let first = store.get_or_create("s1", now).await.unwrap();
        let second = store.get_or_create("s1", now).await.unwrap();
        store.save(first).await.unwrap();

        let err = store.save(second).await.unwrap_err();
        assert!(matches!(
            err,
            Error::StaleSession {
                expected: 1,
                actual: 0,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_expire() {
        let store = InMemorySessionStore::default();
        let now = Utc::now();
        let session = store.get_or_create("s1", now).await.unwrap();
        store.save(session).await.unwrap();
        store.expire("s1").await.unwrap();
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test]
    async fn test_profile_round_trip() {
        let store = InMemoryProfileStore::new();
        let now = Utc::now();

        assert!(store.get("u1").await.unwrap().is_none());
        let mut profile = store.get_or_create("u1", now).await.unwrap();
        profile.record_view("P1");
        store.save(profile).await.unwrap();

        let loaded = store.get("u1").await.unwrap().unwrap();
        assert_eq!(loaded.views("P1"), 1);
    }
}
