//! Plugin assembly
//!
//! Builds one shared gateway from settings and hands it to every action and
//! provider, so the credential is validated exactly once.

use crate::actions::{DeployAgentAction, PerpetualDeploymentAction};
use crate::error::{DeployError, Result};
use crate::extractor::{ContentExtractor, LlmExtractor};
use crate::gateway::{DeploymentGateway, HttpGateway};
use crate::ledger::DeploymentLedger;
use crate::providers::{DeploymentProvider, WalletProvider};
use crate::settings::Settings;
use crate::watchdog::WatchdogConfig;
use std::sync::Arc;

pub const PLUGIN_NAME: &str = "spheron";
pub const PLUGIN_DESCRIPTION: &str = "Spheron Protocol plugin for deploying and sustaining agents";

pub struct SpheronPlugin {
    settings: Settings,
    gateway: Arc<dyn DeploymentGateway>,
    ledger: Arc<DeploymentLedger>,
}

impl SpheronPlugin {
    /// Validate settings and connect the HTTP gateway
    pub fn from_settings(settings: Settings) -> Result<Self> {
        settings.validate()?;
        let gateway = Arc::new(HttpGateway::new(&settings.spheron)?);
        tracing::info!(
            network = %settings.spheron.network,
            gateway = %settings.spheron.gateway_url,
            "Spheron plugin initialized"
        );
        Ok(Self::with_gateway(settings, gateway))
    }

    /// Use an existing gateway instead of building one
    pub fn with_gateway(settings: Settings, gateway: Arc<dyn DeploymentGateway>) -> Self {
        let ledger = Arc::new(DeploymentLedger::new(settings.storage.ledger_path.clone()));
        Self {
            settings,
            gateway,
            ledger,
        }
    }

    pub fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    pub fn description(&self) -> &'static str {
        PLUGIN_DESCRIPTION
    }

    pub fn action_names(&self) -> Vec<&'static str> {
        vec![DeployAgentAction::NAME, PerpetualDeploymentAction::NAME]
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        vec![DeploymentProvider::NAME, WalletProvider::NAME]
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn gateway(&self) -> Arc<dyn DeploymentGateway> {
        self.gateway.clone()
    }

    pub fn ledger(&self) -> Arc<DeploymentLedger> {
        self.ledger.clone()
    }

    pub fn watchdog_config(&self) -> WatchdogConfig {
        WatchdogConfig::from_settings(&self.settings.watchdog)
    }

    /// The chat-completions extractor described by `[llm]`
    pub fn default_extractor(&self) -> Result<Arc<dyn ContentExtractor>> {
        let extractor = LlmExtractor::new(
            &self.settings.llm,
            self.settings.storage.default_image.clone(),
        )?;
        Ok(Arc::new(extractor))
    }

    /// DEPLOY_AGENT wired to the shared gateway and ledger
    pub fn deploy_action(&self, extractor: Arc<dyn ContentExtractor>) -> Result<DeployAgentAction> {
        require(DeployAgentAction::validate(&self.settings))?;
        Ok(DeployAgentAction::new(
            self.gateway(),
            extractor,
            self.ledger(),
            self.settings.storage.deployments_dir.clone(),
        ))
    }

    /// PERPETUAL_DEPLOYMENT with the given watchdog timings
    pub fn perpetual_action(&self, config: WatchdogConfig) -> Result<PerpetualDeploymentAction> {
        require(PerpetualDeploymentAction::validate(&self.settings))?;
        Ok(PerpetualDeploymentAction::new(self.gateway(), config).with_ledger(self.ledger()))
    }

    pub fn deployment_provider(&self) -> DeploymentProvider {
        DeploymentProvider::new(self.gateway())
    }

    pub fn wallet_provider(&self) -> WalletProvider {
        WalletProvider::new(self.gateway())
    }
}

fn require(credentials_ok: bool) -> Result<()> {
    if credentials_ok {
        Ok(())
    } else {
        Err(DeployError::MissingConfig {
            key: "SPHERON_PRIVATE_KEY".to_string(),
        })
    }
}
