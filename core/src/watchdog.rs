//! Lease renewal watchdog
//!
//! Polls the remaining lease time of the tracked deployment and submits a
//! fresh deployment before the lease runs out. One watchdog is one tokio
//! task; the caller owns it through the [`WatchdogHandle`] returned by
//! [`LeaseWatchdog::start`].
//!
//! A tick never fails the watchdog. Lease lookups and renewals that error or
//! run past `tick_timeout` are logged, counted and retried on the next tick.

use crate::error::{DeployError, Result};
use crate::gateway::DeploymentGateway;
use crate::ledger::{DeploymentLedger, LedgerRecord};
use crate::manifest::{render, DeploymentConfig};
use crate::settings::WatchdogSettings;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// True when a lease with `remaining_secs` left must be renewed now
pub fn needs_renewal(remaining_secs: i64, threshold: Duration) -> bool {
    let threshold = i64::try_from(threshold.as_secs()).unwrap_or(i64::MAX);
    remaining_secs <= threshold
}

/// What to do about consecutive failed ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenewalPolicy {
    /// Failures in a row before each further one is logged as an alert
    pub alert_after: u32,
    /// Failures in a row after which the watchdog stops itself
    pub give_up_after: Option<u32>,
}

impl Default for RenewalPolicy {
    fn default() -> Self {
        Self {
            alert_after: 3,
            give_up_after: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchdogConfig {
    pub poll_interval: Duration,
    pub redeploy_threshold: Duration,
    pub tick_timeout: Duration,
    pub policy: RenewalPolicy,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self::from_settings(&WatchdogSettings::default())
    }
}

impl WatchdogConfig {
    pub fn from_settings(settings: &WatchdogSettings) -> Self {
        Self {
            poll_interval: Duration::from_secs(settings.poll_interval_secs),
            redeploy_threshold: Duration::from_secs(settings.redeploy_threshold_secs),
            tick_timeout: Duration::from_secs(settings.tick_timeout_secs),
            policy: RenewalPolicy {
                alert_after: settings.alert_after_failures,
                give_up_after: settings.give_up_after_failures,
            },
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_redeploy_threshold(mut self, threshold: Duration) -> Self {
        self.redeploy_threshold = threshold;
        self
    }

    pub fn with_tick_timeout(mut self, tick_timeout: Duration) -> Self {
        self.tick_timeout = tick_timeout;
        self
    }

    pub fn with_policy(mut self, policy: RenewalPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(DeployError::invalid_config("poll interval must be greater than zero"));
        }
        if self.redeploy_threshold.is_zero() {
            return Err(DeployError::invalid_config(
                "redeploy threshold must be greater than zero",
            ));
        }
        if self.tick_timeout.is_zero() {
            return Err(DeployError::invalid_config("tick timeout must be greater than zero"));
        }
        if self.policy.give_up_after == Some(0) {
            return Err(DeployError::invalid_config(
                "give_up_after must be at least one failure",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchdogState {
    Running,
    Stopped,
    /// Stopped itself after too many consecutive failures
    GaveUp,
}

/// Point-in-time view of a running watchdog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchdogStatus {
    pub tracked_deployment: Option<String>,
    pub last_remaining_secs: Option<i64>,
    pub consecutive_failures: u32,
    pub renewals: u32,
    pub ticks: u64,
    pub last_error: Option<String>,
    pub state: WatchdogState,
}

impl WatchdogStatus {
    fn new(tracked_deployment: Option<String>) -> Self {
        Self {
            tracked_deployment,
            last_remaining_secs: None,
            consecutive_failures: 0,
            renewals: 0,
            ticks: 0,
            last_error: None,
            state: WatchdogState::Running,
        }
    }
}

enum TickOutcome {
    Healthy { remaining_secs: i64 },
    Renewed { remaining_secs: i64 },
}

/// Builder for a watchdog; `start` consumes it
pub struct LeaseWatchdog {
    gateway: Arc<dyn DeploymentGateway>,
    config: WatchdogConfig,
    ledger: Option<Arc<DeploymentLedger>>,
}

impl LeaseWatchdog {
    pub fn new(gateway: Arc<dyn DeploymentGateway>, config: WatchdogConfig) -> Self {
        Self {
            gateway,
            config,
            ledger: None,
        }
    }

    /// Record every successful renewal in `ledger`
    pub fn with_ledger(mut self, ledger: Arc<DeploymentLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Check once right away, then keep checking every `poll_interval`
    ///
    /// The first check (and renewal, if due) has completed by the time this
    /// returns. `initial_deployment` of `None` means nothing is running yet,
    /// so the first check deploys `initial_config`.
    pub async fn start(
        self,
        initial_config: DeploymentConfig,
        initial_deployment: Option<String>,
    ) -> Result<WatchdogHandle> {
        self.config.validate()?;
        initial_config.validate()?;

        let (config_tx, config_rx) = watch::channel(initial_config);
        let (status_tx, status_rx) = watch::channel(WatchdogStatus::new(initial_deployment.clone()));
        let cancel = CancellationToken::new();

        info!(
            deployment_id = initial_deployment.as_deref().unwrap_or("<none>"),
            poll_interval_secs = self.config.poll_interval.as_secs(),
            redeploy_threshold_secs = self.config.redeploy_threshold.as_secs(),
            "Starting lease watchdog"
        );

        let mut worker = Worker {
            gateway: self.gateway,
            config: self.config,
            ledger: self.ledger,
            current_config: config_rx,
            tracked: initial_deployment,
            consecutive_failures: 0,
            status_tx,
        };

        let keep_going = worker.run_tick().await;
        let task = tokio::spawn(worker.run(cancel.clone(), keep_going));

        Ok(WatchdogHandle {
            cancel,
            task: Some(task),
            config_tx,
            status_rx,
        })
    }
}

struct Worker {
    gateway: Arc<dyn DeploymentGateway>,
    config: WatchdogConfig,
    ledger: Option<Arc<DeploymentLedger>>,
    current_config: watch::Receiver<DeploymentConfig>,
    tracked: Option<String>,
    consecutive_failures: u32,
    status_tx: watch::Sender<WatchdogStatus>,
}

impl Worker {
    async fn run(mut self, cancel: CancellationToken, keep_going: bool) {
        if keep_going {
            let period = self.config.poll_interval;
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                // Cancellation also drops a tick that is still in flight.
                let keep_going = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    keep_going = self.run_tick() => keep_going,
                };
                if !keep_going {
                    break;
                }
            }
        }

        self.status_tx.send_modify(|status| {
            if status.state == WatchdogState::Running {
                status.state = WatchdogState::Stopped;
            }
        });
        info!(
            deployment_id = self.tracked.as_deref().unwrap_or("<none>"),
            "Lease watchdog stopped"
        );
    }

    /// One bounded check; false once the failure policy says to give up
    async fn run_tick(&mut self) -> bool {
        let limit = self.config.tick_timeout;
        let result = match timeout(limit, self.tick()).await {
            Ok(result) => result,
            Err(_) => Err(DeployError::Timeout {
                operation: "watchdog tick".to_string(),
                duration: limit,
            }),
        };

        match result {
            Ok(outcome) => {
                self.consecutive_failures = 0;
                let tracked = self.tracked.clone();
                self.status_tx.send_modify(|status| {
                    status.ticks += 1;
                    status.consecutive_failures = 0;
                    status.last_error = None;
                    status.tracked_deployment = tracked;
                    match outcome {
                        TickOutcome::Healthy { remaining_secs } => {
                            status.last_remaining_secs = Some(remaining_secs);
                        }
                        TickOutcome::Renewed { remaining_secs } => {
                            status.last_remaining_secs = Some(remaining_secs);
                            status.renewals += 1;
                        }
                    }
                });
                true
            }
            Err(e) => self.record_failure(e),
        }
    }

    fn record_failure(&mut self, err: DeployError) -> bool {
        self.consecutive_failures += 1;
        let failures = self.consecutive_failures;
        let policy = self.config.policy;
        let deployment_id = self.tracked.as_deref().unwrap_or("<none>");

        if failures > policy.alert_after {
            error!(
                deployment_id,
                failures,
                error = %err,
                "Lease watchdog keeps failing; the workload may go down when its lease ends"
            );
        } else {
            warn!(deployment_id, failures, error = %err, "Lease watchdog tick failed");
        }

        let gave_up = policy.give_up_after.is_some_and(|limit| failures >= limit);
        if gave_up {
            error!(
                deployment_id,
                failures, "Lease watchdog giving up after repeated failures"
            );
        }

        let message = err.to_string();
        self.status_tx.send_modify(|status| {
            status.ticks += 1;
            status.consecutive_failures = failures;
            status.last_error = Some(message);
            if gave_up {
                status.state = WatchdogState::GaveUp;
            }
        });
        !gave_up
    }

    async fn tick(&mut self) -> Result<TickOutcome> {
        let remaining_secs = match &self.tracked {
            Some(id) => self.gateway.get_remaining_time(id).await?,
            // Nothing deployed yet: treat as long expired.
            None => -Utc::now().timestamp(),
        };

        let threshold = self.config.redeploy_threshold;
        if !needs_renewal(remaining_secs, threshold) {
            debug!(
                deployment_id = self.tracked.as_deref().unwrap_or("<none>"),
                remaining_secs, "Lease healthy"
            );
            return Ok(TickOutcome::Healthy { remaining_secs });
        }

        info!(
            deployment_id = self.tracked.as_deref().unwrap_or("<none>"),
            remaining_secs,
            threshold_secs = threshold.as_secs(),
            "Deployment expiring soon, initiating redeployment"
        );

        let config = self.current_config.borrow().clone();
        let manifest = render(&config)?;
        let deployment = self
            .gateway
            .create_deployment(&manifest)
            .await
            .map_err(|e| e.within("redeploy"))?;

        let previous = self.tracked.replace(deployment.id.clone());
        info!(
            deployment_id = %deployment.id,
            previous = previous.as_deref().unwrap_or("<none>"),
            "Redeployment successful"
        );

        if let Some(ledger) = &self.ledger {
            let description = match &previous {
                Some(old) => format!("Perpetual renewal of {}", old),
                None => "Perpetual initial deployment".to_string(),
            };
            let record = LedgerRecord::for_deployment(&config.name, description, &deployment);
            if let Err(e) = ledger.append_async(record).await {
                warn!(deployment_id = %deployment.id, error = %e, "Failed to record renewal");
            }
        }

        Ok(TickOutcome::Renewed { remaining_secs })
    }
}

/// Owner's grip on a running watchdog. Dropping it stops the watchdog.
pub struct WatchdogHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
    config_tx: watch::Sender<DeploymentConfig>,
    status_rx: watch::Receiver<WatchdogStatus>,
}

impl WatchdogHandle {
    /// Stop scheduling ticks and abandon any tick in flight. Idempotent.
    pub fn stop(&self) {
        if !self.cancel.is_cancelled() {
            debug!("Stop requested for lease watchdog");
            self.cancel.cancel();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled() || self.task.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Stop and wait for the task to exit
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Lease watchdog task ended abnormally");
            }
        }
    }

    /// Replace the configuration used for the next renewal
    pub fn update_config(&self, config: DeploymentConfig) -> Result<()> {
        config.validate()?;
        info!(name = %config.name, image = %config.image, "Updated watchdog deployment config");
        self.config_tx.send_replace(config);
        Ok(())
    }

    pub fn current_config(&self) -> DeploymentConfig {
        self.config_tx.borrow().clone()
    }

    pub fn status(&self) -> WatchdogStatus {
        self.status_rx.borrow().clone()
    }

    pub fn tracked_deployment(&self) -> Option<String> {
        self.status_rx.borrow().tracked_deployment.clone()
    }

    /// Follow status changes as they happen
    pub fn subscribe(&self) -> watch::Receiver<WatchdogStatus> {
        self.status_rx.clone()
    }
}

impl Drop for WatchdogHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testing::ScriptedGateway;
    use tokio::time::sleep;

    const POLL: Duration = Duration::from_secs(300);
    const THRESHOLD: Duration = Duration::from_secs(600);

    fn config() -> WatchdogConfig {
        WatchdogConfig::default()
            .with_poll_interval(POLL)
            .with_redeploy_threshold(THRESHOLD)
            .with_tick_timeout(Duration::from_secs(30))
    }

    fn bot(image: &str) -> DeploymentConfig {
        DeploymentConfig::new("bot1", image)
    }

    #[test]
    fn threshold_is_inclusive() {
        let cases = [
            (300, true),
            (599, true),
            (600, true),
            (601, false),
            (86_400, false),
            (0, true),
            (-1_700_000_000, true),
        ];
        for (remaining, expected) in cases {
            assert_eq!(needs_renewal(remaining, THRESHOLD), expected, "remaining={}", remaining);
        }
    }

    #[test]
    fn config_validation_rejects_zero_values() {
        assert!(config().validate().is_ok());
        assert!(config().with_poll_interval(Duration::ZERO).validate().is_err());
        assert!(config().with_redeploy_threshold(Duration::ZERO).validate().is_err());
        let policy = RenewalPolicy {
            alert_after: 1,
            give_up_after: Some(0),
        };
        assert!(config().with_policy(policy).validate().is_err());
    }

    #[test]
    fn config_from_settings_uses_seconds() {
        let settings = WatchdogSettings {
            poll_interval_secs: 60,
            redeploy_threshold_secs: 120,
            tick_timeout_secs: 10,
            alert_after_failures: 5,
            give_up_after_failures: Some(9),
        };
        let config = WatchdogConfig::from_settings(&settings);
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(config.redeploy_threshold, Duration::from_secs(120));
        assert_eq!(config.policy.give_up_after, Some(9));
    }

    #[tokio::test(start_paused = true)]
    async fn renews_immediately_when_already_under_threshold() {
        let gateway = Arc::new(ScriptedGateway::new().with_deployment("dep-0", Some(300)));
        let handle = LeaseWatchdog::new(gateway.clone(), config())
            .start(bot("bot1:latest"), Some("dep-0".to_string()))
            .await
            .unwrap();

        // No time has passed yet.
        assert_eq!(gateway.create_calls(), 1);
        assert!(gateway.created_manifests()[0].contains("bot1:latest"));
        let status = handle.status();
        assert_eq!(status.tracked_deployment.as_deref(), Some("dep-1"));
        assert_eq!(status.renewals, 1);
        assert_eq!(status.last_remaining_secs.map(|s| s <= 300), Some(true));
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn healthy_lease_is_left_alone() {
        let gateway = Arc::new(ScriptedGateway::new().with_deployment("dep-0", Some(86_400)));
        let handle = LeaseWatchdog::new(gateway.clone(), config())
            .start(bot("bot1:latest"), Some("dep-0".to_string()))
            .await
            .unwrap();

        sleep(POLL * 3 + Duration::from_secs(1)).await;
        assert_eq!(gateway.lease_calls(), 4);
        assert_eq!(gateway.create_calls(), 0);
        assert_eq!(handle.tracked_deployment().as_deref(), Some("dep-0"));
        assert_eq!(handle.status().ticks, 4);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn no_tracked_deployment_deploys_on_start() {
        let gateway = Arc::new(ScriptedGateway::new());
        let handle = LeaseWatchdog::new(gateway.clone(), config())
            .start(bot("bot1:latest"), None)
            .await
            .unwrap();

        assert_eq!(gateway.create_calls(), 1);
        assert_eq!(gateway.lease_calls(), 0);
        assert_eq!(handle.tracked_deployment().as_deref(), Some("dep-1"));
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn pending_lease_is_not_redeployed() {
        let gateway = Arc::new(ScriptedGateway::new().with_pending_leases());
        let handle = LeaseWatchdog::new(gateway.clone(), config())
            .start(bot("bot1:latest"), None)
            .await
            .unwrap();
        assert_eq!(gateway.create_calls(), 1);

        sleep(POLL * 5 + Duration::from_secs(1)).await;
        assert_eq!(gateway.create_calls(), 1);
        let status = handle.status();
        assert_eq!(status.tracked_deployment.as_deref(), Some("dep-1"));
        assert_eq!(status.consecutive_failures, 5);
        assert!(status.last_error.unwrap().contains("has no lease yet"));
        assert_eq!(status.state, WatchdogState::Running);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn lease_failure_does_not_stop_next_tick() {
        let gateway = Arc::new(ScriptedGateway::new().with_deployment("dep-0", Some(86_400)));
        gateway.fail_next_lease_calls(1);

        let handle = LeaseWatchdog::new(gateway.clone(), config())
            .start(bot("bot1:latest"), Some("dep-0".to_string()))
            .await
            .unwrap();

        let status = handle.status();
        assert_eq!(status.consecutive_failures, 1);
        assert!(status.last_error.unwrap().contains("bridge busy"));
        assert_eq!(status.state, WatchdogState::Running);

        sleep(POLL + Duration::from_secs(1)).await;
        assert_eq!(gateway.lease_calls(), 2);
        let status = handle.status();
        assert_eq!(status.consecutive_failures, 0);
        assert!(status.last_error.is_none());
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failed_renewal_keeps_old_deployment_and_retries() {
        let gateway = Arc::new(ScriptedGateway::new().with_deployment("dep-0", Some(300)));
        gateway.fail_next_creates(1);

        let handle = LeaseWatchdog::new(gateway.clone(), config())
            .start(bot("bot1:latest"), Some("dep-0".to_string()))
            .await
            .unwrap();
        assert_eq!(handle.tracked_deployment().as_deref(), Some("dep-0"));
        assert_eq!(handle.status().consecutive_failures, 1);

        sleep(POLL + Duration::from_secs(1)).await;
        assert_eq!(gateway.create_calls(), 2);
        assert_eq!(handle.tracked_deployment().as_deref(), Some("dep-1"));
        assert_eq!(handle.status().renewals, 1);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent_and_silences_gateway() {
        let gateway = Arc::new(ScriptedGateway::new().with_deployment("dep-0", Some(86_400)));
        let handle = LeaseWatchdog::new(gateway.clone(), config())
            .start(bot("bot1:latest"), Some("dep-0".to_string()))
            .await
            .unwrap();
        assert_eq!(gateway.lease_calls(), 1);

        handle.stop();
        handle.stop();
        assert!(handle.is_stopped());

        sleep(POLL * 5).await;
        assert_eq!(gateway.lease_calls(), 1);
        assert_eq!(handle.status().state, WatchdogState::Stopped);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_stops_watchdog() {
        let gateway = Arc::new(ScriptedGateway::new().with_deployment("dep-0", Some(86_400)));
        let handle = LeaseWatchdog::new(gateway.clone(), config())
            .start(bot("bot1:latest"), Some("dep-0".to_string()))
            .await
            .unwrap();
        drop(handle);

        sleep(POLL * 3).await;
        assert_eq!(gateway.lease_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_configured_failures() {
        let gateway = Arc::new(ScriptedGateway::new().with_deployment("dep-0", Some(60)));
        gateway.fail_all_creates();

        let policy = RenewalPolicy {
            alert_after: 1,
            give_up_after: Some(2),
        };
        let handle = LeaseWatchdog::new(gateway.clone(), config().with_policy(policy))
            .start(bot("bot1:latest"), Some("dep-0".to_string()))
            .await
            .unwrap();
        let updates = handle.subscribe();

        sleep(POLL * 6).await;
        assert_eq!(gateway.create_calls(), 2);
        assert_eq!(updates.borrow().state, WatchdogState::GaveUp);
        let status = handle.status();
        assert_eq!(status.state, WatchdogState::GaveUp);
        assert_eq!(status.consecutive_failures, 2);
        assert!(handle.is_stopped());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_tick_times_out_and_counts_as_failure() {
        let gateway = Arc::new(
            ScriptedGateway::new()
                .with_deployment("dep-0", Some(86_400))
                .with_lease_delay(Duration::from_secs(120)),
        );
        let handle = LeaseWatchdog::new(gateway.clone(), config())
            .start(bot("bot1:latest"), Some("dep-0".to_string()))
            .await
            .unwrap();

        let status = handle.status();
        assert_eq!(status.consecutive_failures, 1);
        assert!(status.last_error.unwrap().contains("timed out"));
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn renewal_uses_latest_config() {
        let gateway = Arc::new(
            ScriptedGateway::new()
                .with_deployment("dep-0", Some(300))
                .with_new_lease_secs(120),
        );
        let handle = LeaseWatchdog::new(gateway.clone(), config())
            .start(bot("bot1:v1"), Some("dep-0".to_string()))
            .await
            .unwrap();
        assert!(gateway.created_manifests()[0].contains("bot1:v1"));

        handle.update_config(bot("bot1:v2")).unwrap();
        assert_eq!(handle.current_config().image, "bot1:v2");
        assert!(handle.update_config(bot("")).is_err());

        sleep(POLL + Duration::from_secs(1)).await;
        let manifests = gateway.created_manifests();
        assert_eq!(manifests.len(), 2);
        assert!(manifests[1].contains("bot1:v2"));
        assert_eq!(handle.tracked_deployment().as_deref(), Some("dep-2"));
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn renewals_are_recorded_in_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Arc::new(DeploymentLedger::new(dir.path().join("deployments.csv")));
        let gateway = Arc::new(ScriptedGateway::new().with_deployment("dep-0", Some(10)));

        let handle = LeaseWatchdog::new(gateway.clone(), config())
            .with_ledger(ledger.clone())
            .start(bot("bot1:latest"), Some("dep-0".to_string()))
            .await
            .unwrap();

        let records = ledger.records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].agent_name, "bot1");
        assert_eq!(records[0].deployment_id, "dep-1");
        assert!(records[0].description.contains("dep-0"));
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn start_rejects_invalid_config() {
        let gateway = Arc::new(ScriptedGateway::new());
        let result = LeaseWatchdog::new(gateway.clone(), config().with_poll_interval(Duration::ZERO))
            .start(bot("bot1:latest"), None)
            .await;
        assert!(matches!(result, Err(DeployError::InvalidConfig { .. })));
        assert_eq!(gateway.create_calls(), 0);
    }
}
