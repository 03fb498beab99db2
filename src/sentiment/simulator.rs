//! Timer-driven sentiment stream
//!
//! The simulator emits one generated observation immediately on start and
//! then one per interval until stopped. Subscribers receive values through a
//! broadcast channel; dropping the receiver unsubscribes.

use super::{generate_sentiment, Scenario, SentimentData};
use metrics::increment_counter;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Default emission interval
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(2000);

const CHANNEL_CAPACITY: usize = 256;

struct Run {
    scenario: Scenario,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Recurring sentiment generator
///
/// # Examples
///
/// ```no_run
/// use helpdesk::sentiment::{Scenario, SentimentSimulator};
/// use std::time::Duration;
///
/// # async fn example() {
/// let simulator = SentimentSimulator::new();
/// let mut rx = simulator.subscribe();
/// simulator.start(Scenario::Balanced, Duration::from_millis(500));
/// let first = rx.recv().await.unwrap();
/// assert!((0.0..=1.0).contains(&first.score));
/// simulator.stop();
/// # }
/// ```
pub struct SentimentSimulator {
    sender: broadcast::Sender<SentimentData>,
    run: Mutex<Option<Run>>,
}

impl SentimentSimulator {
    /// Create an idle simulator
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            run: Mutex::new(None),
        }
    }

    /// Register a new subscriber
    pub fn subscribe(&self) -> broadcast::Receiver<SentimentData> {
        self.sender.subscribe()
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Start emitting values for `scenario`
    ///
    /// Any previous run is stopped first. One value is sent before this
    /// returns; the rest come from a spawned task, so this must be called
    /// from within a Tokio runtime.
    pub fn start(&self, scenario: Scenario, interval: Duration) {
        self.stop();

        let interval = if interval.is_zero() {
            DEFAULT_INTERVAL
        } else {
            interval
        };

        emit(&self.sender, scenario);

        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let sender = self.sender.clone();
        let handle = tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
            loop {
                tokio::select! {
                    _ = task_cancel.cancelled() => break,
                    _ = ticker.tick() => emit(&sender, scenario),
                }
            }
            tracing::debug!(%scenario, "Sentiment simulator stopped");
        });

        tracing::info!(%scenario, interval_ms = interval.as_millis() as u64, "Sentiment simulator started");

        if let Ok(mut run) = self.run.lock() {
            *run = Some(Run {
                scenario,
                cancel,
                handle,
            });
        }
    }

    /// Stop the current run, if any
    pub fn stop(&self) {
        let previous = match self.run.lock() {
            Ok(mut run) => run.take(),
            Err(_) => {
                tracing::warn!("Simulator state lock poisoned; nothing to stop");
                None
            }
        };
        if let Some(run) = previous {
            run.cancel.cancel();
            run.handle.abort();
        }
    }

    /// Scenario of the current run
    pub fn running_scenario(&self) -> Option<Scenario> {
        self.run
            .lock()
            .ok()
            .and_then(|run| run.as_ref().map(|r| r.scenario))
    }

    /// Whether a run is active
    pub fn is_running(&self) -> bool {
        self.running_scenario().is_some()
    }
}

impl Default for SentimentSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SentimentSimulator {
    fn drop(&mut self) {
        self.stop();
    }
}

fn emit(sender: &broadcast::Sender<SentimentData>, scenario: Scenario) {
    let data = generate_sentiment(&mut rand::rng(), scenario, None);
    increment_counter!("helpdesk_simulator_ticks_total", "scenario" => scenario.to_string());
    // No subscribers is not an error for a simulator
    let _ = sender.send(data);
}
