//! Persistence interfaces for sessions and profiles

use chrono::{DateTime, Utc};

use crate::profile::UserProfile;
use crate::session::ConversationSession;
use crate::Result;
use async_trait::async_trait;

/// Session persistence
///
/// Expiry is lazy: an expired record is dropped the next time its id is
/// requested, never by a background sweep.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Load the session for `id`, creating a fresh one when the id is
    /// unknown or the stored record has expired
    async fn get_or_create(&self, id: &str, now: DateTime<Utc>) -> Result<ConversationSession>;

    /// Write back a session loaded from this store
    ///
    /// Fails with `Error::StaleSession` when the record changed since it was
    /// loaded.
    async fn save(&self, session: ConversationSession) -> Result<()>;

    /// Drop a session
    async fn expire(&self, id: &str) -> Result<()>;

    /// Number of live records (used by tests and diagnostics)
    async fn count(&self) -> usize;
}

/// User profile persistence; profiles are never expired
#[async_trait]
pub trait ProfileStore: Send + Sync + 'static {
    async fn get_or_create(&self, user_id: &str, now: DateTime<Utc>) -> Result<UserProfile>;

    async fn get(&self, user_id: &str) -> Result<Option<UserProfile>>;

    async fn save(&self, profile: UserProfile) -> Result<()>;
}
