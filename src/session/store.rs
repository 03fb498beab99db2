//! Session storage
//!
//! [`SessionStore`] is the seam between the support desk and wherever
//! sessions live. The only implementation keeps everything in memory; nothing
//! is persisted across restarts.

use super::types::{ChatMessage, ChatSession};
use crate::error::{HelpdeskError, Result};
use crate::sentiment::{calculate_aggregate, AggregateSentiment, Rating, SentimentData, ServiceLevel};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Default number of sessions returned by [`SessionStore::history`]
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Storage for support sessions and the sentiment history
///
/// Implementations must keep exactly one active session at all times.
pub trait SessionStore: Send + Sync {
    /// Snapshot of the active session
    fn active_session(&self) -> Result<ChatSession>;

    /// Append a message to the active session
    fn add_message(&self, message: ChatMessage) -> Result<ChatMessage>;

    /// Set the rating on a message of the active session
    ///
    /// Overwrites any previous rating and appends a matching entry to the
    /// sentiment history.
    ///
    /// # Errors
    ///
    /// Returns [`HelpdeskError::MessageNotFound`] when the id is not part of
    /// the active session.
    fn rate_message(&self, message_id: &str, rating: Rating) -> Result<ChatMessage>;

    /// Change the active session's service level
    fn set_service_level(&self, level: ServiceLevel) -> Result<ChatSession>;

    /// Close the active session and start a new one at the same level
    ///
    /// Returns `(closed, new_active)`.
    fn close_active(&self) -> Result<(ChatSession, ChatSession)>;

    /// Closed sessions, most recently ended first
    fn history(&self, limit: usize) -> Result<Vec<ChatSession>>;

    /// Every session, closed ones first, active last
    fn sessions(&self) -> Result<Vec<ChatSession>>;

    /// Append to the sentiment history
    fn record_sentiment(&self, data: SentimentData) -> Result<()>;

    /// Full sentiment history, oldest first
    fn sentiment_history(&self) -> Result<Vec<SentimentData>>;

    /// Aggregate over the trailing window of the sentiment history
    fn aggregate(&self, window_minutes: u32) -> Result<AggregateSentiment> {
        Ok(calculate_aggregate(&self.sentiment_history()?, window_minutes))
    }

    /// Most recent sentiment entry
    fn latest_sentiment(&self) -> Result<Option<SentimentData>> {
        Ok(self.sentiment_history()?.pop())
    }
}

#[derive(Debug)]
struct StoreState {
    active: ChatSession,
    closed: Vec<ChatSession>,
    sentiment: Vec<SentimentData>,
}

/// In-memory [`SessionStore`]
///
/// # Examples
///
/// ```
/// use helpdesk::session::{InMemorySessionStore, SessionStore};
/// use helpdesk::sentiment::ServiceLevel;
///
/// let store = InMemorySessionStore::new(ServiceLevel::Basic);
/// let (closed, active) = store.close_active().unwrap();
/// assert!(!closed.is_active);
/// assert!(active.is_active);
/// assert_eq!(store.history(10).unwrap().len(), 1);
/// ```
#[derive(Debug)]
pub struct InMemorySessionStore {
    state: RwLock<StoreState>,
}

impl InMemorySessionStore {
    /// Create a store with a fresh active session
    pub fn new(level: ServiceLevel) -> Self {
        Self {
            state: RwLock::new(StoreState {
                active: ChatSession::start(level),
                closed: Vec::new(),
                sentiment: Vec::new(),
            }),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreState>> {
        self.state.read().map_err(|_| {
            HelpdeskError::Session("Failed to acquire read lock on session store".to_string())
                .into()
        })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreState>> {
        self.state.write().map_err(|_| {
            HelpdeskError::Session("Failed to acquire write lock on session store".to_string())
                .into()
        })
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(ServiceLevel::default())
    }
}

impl SessionStore for InMemorySessionStore {
    fn active_session(&self) -> Result<ChatSession> {
        Ok(self.read()?.active.clone())
    }

    fn add_message(&self, message: ChatMessage) -> Result<ChatMessage> {
        let mut state = self.write()?;
        state.active.messages.push(message.clone());
        Ok(message)
    }

    fn rate_message(&self, message_id: &str, rating: Rating) -> Result<ChatMessage> {
        let mut state = self.write()?;
        let level = state.active.service_level;
        let session_id = state.active.id.clone();

        let message = state
            .active
            .message_mut(message_id)
            .ok_or_else(|| HelpdeskError::MessageNotFound(message_id.to_string()))?;
        message.sentiment = Some(rating);
        let rated = message.clone();

        state
            .sentiment
            .push(SentimentData::from_rating(rating, level, session_id));

        tracing::debug!(message_id, ?rating, "Message rated");
        Ok(rated)
    }

    fn set_service_level(&self, level: ServiceLevel) -> Result<ChatSession> {
        let mut state = self.write()?;
        state.active.service_level = level;
        Ok(state.active.clone())
    }

    fn close_active(&self) -> Result<(ChatSession, ChatSession)> {
        let mut state = self.write()?;
        let level = state.active.service_level;
        let mut closed = std::mem::replace(&mut state.active, ChatSession::start(level));
        closed.close();
        state.closed.push(closed.clone());

        tracing::info!(
            session_id = %closed.id,
            overall_sentiment = closed.overall_sentiment,
            messages = closed.messages.len(),
            "Session closed"
        );
        Ok((closed, state.active.clone()))
    }

    fn history(&self, limit: usize) -> Result<Vec<ChatSession>> {
        let state = self.read()?;
        let mut closed = state.closed.clone();
        closed.sort_by(|a, b| b.end_time.cmp(&a.end_time));
        closed.truncate(limit);
        Ok(closed)
    }

    fn sessions(&self) -> Result<Vec<ChatSession>> {
        let state = self.read()?;
        let mut all = state.closed.clone();
        all.push(state.active.clone());
        Ok(all)
    }

    fn record_sentiment(&self, data: SentimentData) -> Result<()> {
        self.write()?.sentiment.push(data);
        Ok(())
    }

    fn sentiment_history(&self) -> Result<Vec<SentimentData>> {
        Ok(self.read()?.sentiment.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentiment::Trend;

    #[test]
    fn test_new_store_has_one_active_session() {
        let store = InMemorySessionStore::new(ServiceLevel::Premium);
        let sessions = store.sessions().unwrap();
        assert_eq!(sessions.len(), 1);
        assert!(sessions[0].is_active);
        assert_eq!(sessions[0].service_level, ServiceLevel::Premium);
    }

    #[test]
    fn test_close_with_no_ratings_is_neutral() {
        let store = InMemorySessionStore::default();
        store
            .add_message(ChatMessage::user("hi", ServiceLevel::Basic))
            .unwrap();
        let (closed, _) = store.close_active().unwrap();
        assert_eq!(closed.overall_sentiment, 0.5);
    }

    #[test]
    fn test_close_keeps_service_level() {
        let store = InMemorySessionStore::default();
        store.set_service_level(ServiceLevel::Enterprise).unwrap();
        let (closed, active) = store.close_active().unwrap();
        assert_eq!(closed.service_level, ServiceLevel::Enterprise);
        assert_eq!(active.service_level, ServiceLevel::Enterprise);
        assert_ne!(closed.id, active.id);
    }

    #[test]
    fn test_exactly_one_active_after_any_sequence() {
        let store = InMemorySessionStore::default();
        for i in 0..7 {
            if i % 3 == 0 {
                store
                    .add_message(ChatMessage::user("msg", ServiceLevel::Basic))
                    .unwrap();
            }
            store.close_active().unwrap();
            let active = store
                .sessions()
                .unwrap()
                .iter()
                .filter(|s| s.is_active)
                .count();
            assert_eq!(active, 1);
        }
        assert_eq!(store.sessions().unwrap().len(), 8);
    }

    #[test]
    fn test_rating_up_and_down_gives_half() {
        let store = InMemorySessionStore::default();
        let a = store.add_message(ChatMessage::bot("one")).unwrap();
        let b = store.add_message(ChatMessage::bot("two")).unwrap();
        store.rate_message(&a.id, Rating::Up).unwrap();
        store.rate_message(&b.id, Rating::Down).unwrap();
        let (closed, _) = store.close_active().unwrap();
        assert_eq!(closed.overall_sentiment, 0.5);
    }

    #[test]
    fn test_rerating_overwrites() {
        let store = InMemorySessionStore::default();
        let message = store.add_message(ChatMessage::bot("reply")).unwrap();
        store.rate_message(&message.id, Rating::Down).unwrap();
        let rated = store.rate_message(&message.id, Rating::Up).unwrap();
        assert_eq!(rated.sentiment, Some(Rating::Up));
        let (closed, _) = store.close_active().unwrap();
        assert_eq!(closed.overall_sentiment, 1.0);
    }

    #[test]
    fn test_rating_appends_sentiment_history() {
        let store = InMemorySessionStore::default();
        let session_id = store.active_session().unwrap().id;
        let message = store.add_message(ChatMessage::bot("reply")).unwrap();
        store.rate_message(&message.id, Rating::Up).unwrap();

        let history = store.sentiment_history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].score, 1.0);
        assert_eq!(history[0].chat_id.as_deref(), Some(session_id.as_str()));
        assert_eq!(history[0].user_rating, Some(Rating::Up));
    }

    #[test]
    fn test_rating_unknown_message_fails() {
        let store = InMemorySessionStore::default();
        let err = store.rate_message("missing", Rating::Up).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HelpdeskError>(),
            Some(HelpdeskError::MessageNotFound(_))
        ));
    }

    #[test]
    fn test_rating_closed_session_message_fails() {
        let store = InMemorySessionStore::default();
        let message = store.add_message(ChatMessage::bot("old")).unwrap();
        store.close_active().unwrap();
        assert!(store.rate_message(&message.id, Rating::Up).is_err());
    }

    #[test]
    fn test_history_newest_first_and_limited() {
        let store = InMemorySessionStore::default();
        let mut ids = Vec::new();
        for _ in 0..4 {
            let (closed, _) = store.close_active().unwrap();
            ids.push(closed.id);
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        let history = store.history(3).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].id, ids[3]);
        assert_eq!(history[2].id, ids[1]);
        assert!(history.iter().all(|s| !s.is_active));
    }

    #[test]
    fn test_aggregate_uses_history() {
        let store = InMemorySessionStore::default();
        assert_eq!(store.aggregate(5).unwrap(), AggregateSentiment::neutral());
        store
            .record_sentiment(SentimentData::new(0.2, ServiceLevel::Basic))
            .unwrap();
        store
            .record_sentiment(SentimentData::new(0.9, ServiceLevel::Basic))
            .unwrap();
        let aggregate = store.aggregate(5).unwrap();
        assert_eq!(aggregate.samples, 2);
        assert_eq!(aggregate.trend, Trend::Up);
        assert_eq!(store.latest_sentiment().unwrap().unwrap().score, 0.9);
    }
}
