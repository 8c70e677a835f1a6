//! Periodic subscription controller.

use crate::engine::SyncEngine;
use crate::source::RecordSource;
use crate::timestamp::{SubscriptionStatus, SyncState};
use bimsync_document::Document;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// A running timer task and its stop signal.
struct ActiveSubscription {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Toggles a document between idle and periodically synchronized.
///
/// While subscribed, a timer task on the tokio runtime fires every
/// `sync_interval` and runs one engine cycle with the current timestamp.
/// Cycles run on the blocking pool and the task waits for each one before
/// the next tick, so cycles never overlap; ticks missed while a cycle (or a
/// manual import) is running are skipped.
///
/// Unsubscribing stops future ticks. A cycle already in flight is allowed
/// to finish.
pub struct SubscriptionController<S: RecordSource + 'static> {
    engine: Arc<SyncEngine<S>>,
    runtime: Handle,
    active: Mutex<Option<ActiveSubscription>>,
    /// Tasks told to stop that may still be finishing a cycle.
    draining: Mutex<Vec<JoinHandle<()>>>,
}

impl<S: RecordSource + 'static> SubscriptionController<S> {
    /// Creates an unsubscribed controller that spawns onto `runtime`.
    pub fn new(engine: Arc<SyncEngine<S>>, runtime: Handle) -> Self {
        Self {
            engine,
            runtime,
            active: Mutex::new(None),
            draining: Mutex::new(Vec::new()),
        }
    }

    /// Gets the engine driven by this controller.
    pub fn engine(&self) -> &Arc<SyncEngine<S>> {
        &self.engine
    }

    /// Returns the current subscription status.
    pub fn status(&self) -> SubscriptionStatus {
        if self.active.lock().is_some() {
            SubscriptionStatus::Subscribed
        } else {
            SubscriptionStatus::Unsubscribed
        }
    }

    /// Returns true while subscribed.
    pub fn is_subscribed(&self) -> bool {
        self.status() == SubscriptionStatus::Subscribed
    }

    /// Returns the session's sync state.
    pub fn state(&self) -> SyncState {
        SyncState {
            last_sync_timestamp: self.engine.timestamps().get(),
            subscription_status: self.status(),
        }
    }

    /// Flips between unsubscribed and subscribed, returning the new status.
    ///
    /// On subscribe, a timestamp that was never set is initialized to the
    /// current time first, so the first cycle only pulls records newer than
    /// the subscription itself.
    pub fn toggle_subscription<D: Document + 'static>(
        &self,
        document: Arc<D>,
    ) -> SubscriptionStatus {
        let mut active = self.active.lock();

        if let Some(subscription) = active.take() {
            // Receivers may already be gone if the task ended
            let _ = subscription.stop.send(true);
            let mut draining = self.draining.lock();
            draining.retain(|task| !task.is_finished());
            draining.push(subscription.task);
            tracing::info!("subscription stopped");
            return SubscriptionStatus::Unsubscribed;
        }

        let timestamps = self.engine.timestamps();
        if !timestamps.is_initialized() {
            let now = timestamps.initialize();
            tracing::info!(timestamp = now, "sync timestamp initialized");
        }

        let period = self.engine.config().sync_interval.max(Duration::from_millis(1));
        let (stop, stop_rx) = watch::channel(false);
        let task = self.runtime.spawn(run_subscription(
            Arc::clone(&self.engine),
            document,
            period,
            stop_rx,
        ));

        *active = Some(ActiveSubscription { stop, task });
        tracing::info!(
            interval_ms = period.as_millis() as u64,
            timestamp = timestamps.get(),
            "subscription started"
        );
        SubscriptionStatus::Subscribed
    }

    /// Stops the subscription, if any, and waits for every timer task to exit.
    pub async fn shutdown(&self) {
        let mut tasks: Vec<JoinHandle<()>> = self.draining.lock().drain(..).collect();
        if let Some(subscription) = self.active.lock().take() {
            let _ = subscription.stop.send(true);
            tasks.push(subscription.task);
        }

        for task in tasks {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "subscription task failed");
            }
        }
    }
}

/// Timer loop of one subscription.
async fn run_subscription<S, D>(
    engine: Arc<SyncEngine<S>>,
    document: Arc<D>,
    period: Duration,
    mut stop: watch::Receiver<bool>,
) where
    S: RecordSource + 'static,
    D: Document + 'static,
{
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            // Fires on stop, or when the controller is dropped
            _ = stop.changed() => break,
        }
        if *stop.borrow() {
            break;
        }

        let engine = Arc::clone(&engine);
        let document = Arc::clone(&document);
        let cycle = tokio::task::spawn_blocking(move || run_tick(&engine, &*document));
        if let Err(e) = cycle.await {
            tracing::error!(error = %e, "sync cycle panicked");
        }
    }

    tracing::debug!("subscription task exited");
}

/// Runs one subscription cycle, reporting failures through the log.
fn run_tick<S: RecordSource, D: Document>(engine: &SyncEngine<S>, document: &D) {
    let project_id = document.project_identifier();
    let since = engine.timestamps().get();

    match engine.try_synchronize(document, &project_id, since) {
        None => tracing::debug!(since, "cycle already in flight, tick skipped"),
        Some(Ok(_)) => {}
        Some(Err(e)) if e.is_retryable() => {
            tracing::warn!(error = %e, since, "sync cycle failed, retrying on next tick");
        }
        Some(Err(e)) => {
            tracing::error!(error = %e, since, "sync cycle failed");
        }
    }
}
