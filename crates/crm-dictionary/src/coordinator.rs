//! Refresh coordinator: the timed, hook, pub/sub and gauge loops.
//!
//! All four loops run under [`supervise`], so any failure, including a
//! panic, is logged and the loop is restarted after its cooldown.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, error, info};

use crm_core::defaults::{
    GAUGE_INTERVAL_SECS, HOOK_POLL_INTERVAL_MS, HOOK_RESTART_COOLDOWN_MS,
    PUBSUB_RESTART_COOLDOWN_SECS, UPDATE_CHANNEL,
};
use crm_core::{Error, Result, UpdateSubscriber};

use crate::dictionary::Dictionary;
use crate::stats::DictionaryStats;
use crate::supervisor::{shutdown_requested, supervise, RestartPolicy};

/// Restart policies of the coordinator's loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorPolicies {
    pub timed: RestartPolicy,
    pub hook: RestartPolicy,
    pub pubsub: RestartPolicy,
    pub gauge: RestartPolicy,
}

impl CoordinatorPolicies {
    /// The timed loop restarts after one sync interval.
    pub fn new(sync_interval: Duration) -> Self {
        Self {
            timed: RestartPolicy::new("timed_sync", sync_interval),
            hook: RestartPolicy::new(
                "hook_sync",
                Duration::from_millis(HOOK_RESTART_COOLDOWN_MS),
            ),
            pubsub: RestartPolicy::new(
                "pubsub_listener",
                Duration::from_secs(PUBSUB_RESTART_COOLDOWN_SECS),
            ),
            gauge: RestartPolicy::new("gauge", Duration::from_secs(GAUGE_INTERVAL_SECS)),
        }
    }
}

/// Handle for controlling a running coordinator.
pub struct CoordinatorHandle {
    shutdown_tx: watch::Sender<bool>,
    stats_rx: watch::Receiver<DictionaryStats>,
    tasks: JoinSet<()>,
}

impl CoordinatorHandle {
    /// Latest stats snapshot published by the gauge loop.
    pub fn stats(&self) -> DictionaryStats {
        self.stats_rx.borrow().clone()
    }

    /// Receiver notified on every gauge tick.
    pub fn stats_receiver(&self) -> watch::Receiver<DictionaryStats> {
        self.stats_rx.clone()
    }

    /// Signal every loop to stop and wait for them.
    ///
    /// A refresh already running is allowed to finish.
    pub async fn shutdown(mut self) {
        info!(
            subsystem = "dictionary",
            component = "coordinator",
            "Coordinator shutting down"
        );
        self.shutdown_tx.send_replace(true);
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(e) = joined {
                error!(
                    subsystem = "dictionary",
                    component = "coordinator",
                    error = %e,
                    "Coordinator task ended abnormally"
                );
            }
        }
        info!(
            subsystem = "dictionary",
            component = "coordinator",
            "Coordinator stopped"
        );
    }
}

/// Keeps a [`Dictionary`] fresh.
pub struct Coordinator {
    dictionary: Dictionary,
    subscriber: Arc<dyn UpdateSubscriber>,
    policies: CoordinatorPolicies,
}

impl Coordinator {
    pub fn new(dictionary: Dictionary, subscriber: Arc<dyn UpdateSubscriber>) -> Self {
        let policies = CoordinatorPolicies::new(dictionary.config().sync_interval);
        Self {
            dictionary,
            subscriber,
            policies,
        }
    }

    /// Override the restart policies.
    pub fn with_policies(mut self, policies: CoordinatorPolicies) -> Self {
        self.policies = policies;
        self
    }

    /// Spawn the loops and return a handle for controlling them.
    pub fn start(self) -> CoordinatorHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (stats_tx, stats_rx) = watch::channel(DictionaryStats::default());
        let stats_tx = Arc::new(stats_tx);
        let sync_interval = self.dictionary.config().sync_interval;

        info!(
            subsystem = "dictionary",
            component = "coordinator",
            sync_interval_secs = sync_interval.as_secs(),
            hook_poll_ms = HOOK_POLL_INTERVAL_MS,
            "Starting dictionary coordinator"
        );

        let mut tasks = JoinSet::new();

        let dictionary = self.dictionary.clone();
        tasks.spawn(supervise(self.policies.timed, shutdown_rx.clone(), move |shutdown| {
            timed_loop(dictionary.clone(), sync_interval, shutdown)
        }));

        let dictionary = self.dictionary.clone();
        tasks.spawn(supervise(self.policies.hook, shutdown_rx.clone(), move |shutdown| {
            hook_loop(dictionary.clone(), shutdown)
        }));

        let dictionary = self.dictionary.clone();
        let subscriber = self.subscriber;
        tasks.spawn(supervise(self.policies.pubsub, shutdown_rx.clone(), move |shutdown| {
            pubsub_loop(dictionary.clone(), subscriber.clone(), shutdown)
        }));

        let dictionary = self.dictionary;
        tasks.spawn(supervise(self.policies.gauge, shutdown_rx, move |shutdown| {
            gauge_loop(dictionary.clone(), stats_tx.clone(), shutdown)
        }));

        CoordinatorHandle {
            shutdown_tx,
            stats_rx,
            tasks,
        }
    }
}

/// Full refresh every `period`, the first one immediately.
async fn timed_loop(
    dictionary: Dictionary,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = shutdown_requested(&mut shutdown) => return Ok(()),
            _ = ticker.tick() => {}
        }
        dictionary.sync_all().await;
        dictionary.info().await;
    }
}

/// Full refresh whenever the should-update flag is set.
///
/// The flag is cleared before the refresh starts, so invalidations that
/// arrive within one poll window collapse into a single refresh.
async fn hook_loop(dictionary: Dictionary, mut shutdown: watch::Receiver<bool>) -> Result<()> {
    let grain = Duration::from_millis(HOOK_POLL_INTERVAL_MS);
    loop {
        tokio::select! {
            _ = shutdown_requested(&mut shutdown) => return Ok(()),
            _ = sleep(grain) => {}
        }
        if dictionary.take_update_flag().await {
            debug!(
                subsystem = "dictionary",
                component = "coordinator",
                op = "hook_sync",
                "Update requested, refreshing"
            );
            dictionary.sync_all().await;
            dictionary.info().await;
        }
    }
}

/// Set the should-update flag on every message of the update channel.
///
/// The subscription ending is a failure; the supervisor resubscribes.
async fn pubsub_loop(
    dictionary: Dictionary,
    subscriber: Arc<dyn UpdateSubscriber>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let mut messages = subscriber.subscribe(UPDATE_CHANNEL).await?;
    info!(
        subsystem = "dictionary",
        component = "pubsub",
        channel = UPDATE_CHANNEL,
        "Subscribed to update channel"
    );

    loop {
        let payload = tokio::select! {
            _ = shutdown_requested(&mut shutdown) => return Ok(()),
            message = messages.next() => message,
        };
        match payload {
            Some(payload) => {
                debug!(
                    subsystem = "dictionary",
                    component = "pubsub",
                    channel = UPDATE_CHANNEL,
                    payload = %payload,
                    "Update received"
                );
                dictionary.mark_to_update(true).await;
            }
            None => {
                return Err(Error::PubSub(format!(
                    "subscription to {UPDATE_CHANNEL} closed"
                )))
            }
        }
    }
}

/// Publish a stats snapshot every gauge interval.
async fn gauge_loop(
    dictionary: Dictionary,
    stats_tx: Arc<watch::Sender<DictionaryStats>>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let period = Duration::from_secs(GAUGE_INTERVAL_SECS);
    loop {
        let stats = dictionary.stats().await;
        debug!(
            subsystem = "dictionary",
            component = "gauge",
            users = stats.users,
            federations = stats.federations,
            companies = stats.companies,
            projects = stats.projects,
            tags = stats.tags,
            failing_categories = stats.last_errors.len(),
            "Dictionary gauges"
        );
        stats_tx.send_replace(stats);

        tokio::select! {
            _ = shutdown_requested(&mut shutdown) => return Ok(()),
            _ = sleep(period) => {}
        }
    }
}
