//! Support desk and session store behavior across sessions

mod common;

use common::ScriptedBackend;
use helpdesk::error::HelpdeskError;
use helpdesk::sentiment::{Rating, ServiceLevel, Trend};
use helpdesk::session::{InMemorySessionStore, MessageKind, SessionStore, SupportDesk};
use std::sync::Arc;

fn desk(backend: ScriptedBackend) -> SupportDesk {
    let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new(ServiceLevel::Premium));
    SupportDesk::new(store, Arc::new(backend), 5)
}

#[tokio::test]
async fn test_exactly_one_active_session() {
    let desk = desk(ScriptedBackend::replying("ok", None));
    desk.send_message("first").await.unwrap();
    desk.close_session().unwrap();
    desk.send_message("second").await.unwrap();
    desk.close_session().unwrap();

    let sessions = desk.store().sessions().unwrap();
    assert_eq!(sessions.len(), 3);
    assert_eq!(sessions.iter().filter(|s| s.is_active).count(), 1);
    assert!(sessions.last().unwrap().is_active);
    assert!(sessions.iter().all(|s| s.service_level == ServiceLevel::Premium));
}

#[tokio::test]
async fn test_overall_sentiment_from_ratings() {
    let desk = desk(ScriptedBackend::replying("Sure thing.", None));
    let first = desk.send_message("Where is my parcel?").await.unwrap();
    let second = desk.send_message("And the invoice?").await.unwrap();

    desk.rate_message(&first.bot_message.id, Rating::Up).unwrap();
    desk.rate_message(&second.bot_message.id, Rating::Down).unwrap();
    // Last rating wins
    desk.rate_message(&second.bot_message.id, Rating::Neutral)
        .unwrap();

    let (closed, active) = desk.close_session().unwrap();
    assert_eq!(closed.rated_count(), 2);
    assert!((closed.overall_sentiment - 0.75).abs() < 1e-9);
    assert!(closed.end_time.is_some());
    assert_eq!(active.messages.len(), 1);
    assert_eq!(active.messages[0].kind, MessageKind::Bot);
}

#[tokio::test]
async fn test_unrated_session_closes_neutral() {
    let desk = desk(ScriptedBackend::replying("ok", None));
    desk.send_message("hello").await.unwrap();
    let (closed, _) = desk.close_session().unwrap();
    assert_eq!(closed.overall_sentiment, 0.5);
}

#[tokio::test]
async fn test_rating_unknown_message() {
    let desk = desk(ScriptedBackend::replying("ok", None));
    let err = desk.rate_message("missing", Rating::Up).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<HelpdeskError>(),
        Some(HelpdeskError::MessageNotFound(id)) if id == "missing"
    ));
}

#[tokio::test]
async fn test_history_most_recent_first_with_limit() {
    let desk = desk(ScriptedBackend::replying("ok", None));
    let mut closed_ids = Vec::new();
    for _ in 0..3 {
        let (closed, _) = desk.close_session().unwrap();
        closed_ids.push(closed.id);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let history = desk.history(2).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, closed_ids[2]);
    assert_eq!(history[1].id, closed_ids[1]);
}

#[tokio::test]
async fn test_exchange_sentiment_feeds_aggregate() {
    let desk = desk(ScriptedBackend::replying("Glad to help!", Some(0.9)));
    desk.send_message("This is broken and terrible")
        .await
        .unwrap();
    desk.send_message("Thanks, that was great and helpful")
        .await
        .unwrap();

    let aggregate = desk.aggregate(5).unwrap();
    assert_eq!(aggregate.samples, 4);
    assert_eq!(aggregate.trend, Trend::Up);
}
