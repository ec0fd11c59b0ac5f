//! PERPETUAL_DEPLOYMENT: keep a workload alive past its lease

use super::{has_credentials, ActionOutcome};
use crate::error::Result;
use crate::gateway::DeploymentGateway;
use crate::ledger::DeploymentLedger;
use crate::manifest::DeploymentConfig;
use crate::settings::Settings;
use crate::util::describe_duration;
use crate::watchdog::{LeaseWatchdog, WatchdogConfig, WatchdogHandle};
use std::sync::Arc;

pub struct PerpetualDeploymentAction {
    gateway: Arc<dyn DeploymentGateway>,
    config: WatchdogConfig,
    ledger: Option<Arc<DeploymentLedger>>,
}

impl PerpetualDeploymentAction {
    pub const NAME: &'static str = "PERPETUAL_DEPLOYMENT";
    pub const DESCRIPTION: &'static str =
        "Maintains continuous deployment by monitoring and redeploying before expiration";

    pub fn new(gateway: Arc<dyn DeploymentGateway>, config: WatchdogConfig) -> Self {
        Self {
            gateway,
            config,
            ledger: None,
        }
    }

    pub fn with_ledger(mut self, ledger: Arc<DeploymentLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn validate(settings: &Settings) -> bool {
        has_credentials(settings)
    }

    /// Start watching `deployment_id` (or deploy `config` first when `None`)
    ///
    /// The caller owns the returned handle; dropping it ends the monitoring.
    pub async fn handle(
        &self,
        config: DeploymentConfig,
        deployment_id: Option<String>,
    ) -> Result<(WatchdogHandle, ActionOutcome)> {
        let mut watchdog = LeaseWatchdog::new(self.gateway.clone(), self.config.clone());
        if let Some(ledger) = &self.ledger {
            watchdog = watchdog.with_ledger(ledger.clone());
        }
        let handle = watchdog.start(config, deployment_id).await?;

        let text = format!(
            "Perpetual deployment monitoring started. Will check every {} and redeploy when less than {} remaining.",
            describe_duration(self.config.poll_interval),
            describe_duration(self.config.redeploy_threshold),
        );
        let tracked = handle.tracked_deployment();
        Ok((handle, ActionOutcome::succeeded(text, tracked)))
    }
}
