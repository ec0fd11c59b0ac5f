//! DEPLOY_AGENT: analyse content and deploy an agent when warranted

use super::{has_credentials, ActionOutcome};
use crate::error::Result;
use crate::extractor::{ContentExtractor, DeploymentRequest, Extraction};
use crate::gateway::DeploymentGateway;
use crate::ledger::{DeploymentLedger, LedgerRecord};
use crate::manifest::{render, save_manifest};
use crate::settings::Settings;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

pub struct DeployAgentAction {
    gateway: Arc<dyn DeploymentGateway>,
    extractor: Arc<dyn ContentExtractor>,
    ledger: Arc<DeploymentLedger>,
    deployments_dir: PathBuf,
}

impl DeployAgentAction {
    pub const NAME: &'static str = "DEPLOY_AGENT";
    pub const DESCRIPTION: &'static str =
        "Analyze social media content and deploy an AI agent if needed";

    pub fn new(
        gateway: Arc<dyn DeploymentGateway>,
        extractor: Arc<dyn ContentExtractor>,
        ledger: Arc<DeploymentLedger>,
        deployments_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            gateway,
            extractor,
            ledger,
            deployments_dir: deployments_dir.into(),
        }
    }

    /// Whether `settings` allow this action to run at all
    pub fn validate(settings: &Settings) -> bool {
        has_credentials(settings)
    }

    /// Extract, decide, and deploy
    ///
    /// Invalid or declined extractions come back as unsuccessful outcomes
    /// without touching the filesystem or the gateway.
    pub async fn handle(&self, text: &str) -> Result<ActionOutcome> {
        match self.extractor.extract(text).await? {
            Extraction::Invalid { reason } => {
                warn!(%reason, "Extractor produced an invalid deployment request");
                Ok(ActionOutcome::rejected(format!(
                    "Invalid deployment configuration generated.\nReason: {}",
                    reason
                )))
            }
            Extraction::Declined { reason } => {
                info!(%reason, "Deployment not recommended");
                Ok(ActionOutcome::rejected(format!(
                    "Deployment not recommended at this time.\nReason: {}",
                    reason
                )))
            }
            Extraction::Deploy(request) => self.deploy(&request).await,
        }
    }

    /// Deploy an already validated request
    pub async fn deploy(&self, request: &DeploymentRequest) -> Result<ActionOutcome> {
        let manifest = render(&request.config)?;
        let manifest_path = save_manifest(&self.deployments_dir, &request.config, &manifest)?;

        let deployment = self.gateway.create_deployment(&manifest).await?;
        info!(
            name = %request.name,
            deployment_id = %deployment.id,
            manifest = %manifest_path.display(),
            "Agent deployment created"
        );

        let record = LedgerRecord::for_deployment(&request.name, &request.description, &deployment);
        let logged = match self.ledger.append_async(record).await {
            Ok(()) => format!(
                "Deployment has been logged to {}.",
                self.ledger.path().display()
            ),
            Err(e) => {
                warn!(deployment_id = %deployment.id, error = %e, "Failed to log deployment");
                "The deployment could not be written to the ledger.".to_string()
            }
        };

        let text = format!(
            "Agent deployment initiated successfully:\n\
             - Name: {}\n\
             - Description: {}\n\
             - Deployment ID: {}\n\
             - Status: {}\n\
             - Capabilities: {}\n\
             \n\
             {}\n\
             You can monitor the deployment status using the Spheron service.",
            request.name,
            request.description,
            deployment.id,
            deployment.status,
            request.capabilities.join(", "),
            logged,
        );
        Ok(ActionOutcome::succeeded(text, Some(deployment.id)))
    }
}
