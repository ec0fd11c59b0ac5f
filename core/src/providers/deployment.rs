use crate::error::Result;
use crate::gateway::{Deployment, DeploymentGateway, DeploymentStatus};
use crate::util::describe_duration;
use std::sync::Arc;
use std::time::Duration;

pub struct DeploymentProvider {
    gateway: Arc<dyn DeploymentGateway>,
}

impl DeploymentProvider {
    pub const NAME: &'static str = "SPHERON_DEPLOYMENT";

    pub fn new(gateway: Arc<dyn DeploymentGateway>) -> Self {
        Self { gateway }
    }

    pub async fn get_deployment(&self, id: &str) -> Result<Deployment> {
        self.gateway.get_deployment(id).await
    }

    pub async fn get_deployment_status(&self, id: &str) -> Result<DeploymentStatus> {
        self.gateway.get_deployment_status(id).await
    }

    pub async fn get_deployment_logs(&self, id: &str) -> Result<Vec<String>> {
        self.gateway.get_deployment_logs(id).await
    }

    /// Seconds left on the deployment's lease, `<= 0` once expired
    pub async fn get_remaining_time(&self, id: &str) -> Result<i64> {
        self.gateway.get_remaining_time(id).await
    }

    /// One-line summary suitable for an agent's context
    pub async fn describe(&self, id: &str) -> Result<String> {
        let deployment = self.gateway.get_deployment(id).await?;
        let remaining = self.gateway.get_remaining_time(id).await?;
        let lease = match remaining {
            r if r > 0 => format!("{} remaining", describe_duration(Duration::from_secs(r as u64))),
            _ => "lease expired".to_string(),
        };
        Ok(format!(
            "Deployment {} is {} ({}, lease {}).",
            deployment.id,
            deployment.status,
            lease,
            deployment.lease_id.as_deref().unwrap_or("none"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testing::ScriptedGateway;

    fn provider() -> DeploymentProvider {
        DeploymentProvider::new(Arc::new(
            ScriptedGateway::new()
                .with_deployment("dep-7", Some(7200))
                .with_deployment("dep-8", None),
        ))
    }

    #[tokio::test]
    async fn exposes_status_and_logs() {
        let provider = provider();
        assert_eq!(
            provider.get_deployment_status("dep-7").await.unwrap(),
            DeploymentStatus::Active
        );
        assert_eq!(
            provider.get_deployment_logs("dep-7").await.unwrap(),
            vec!["dep-7 started".to_string()]
        );
        let remaining = provider.get_remaining_time("dep-7").await.unwrap();
        assert!((7190..=7200).contains(&remaining));
    }

    #[tokio::test]
    async fn unknown_deployment_errors_with_context() {
        let err = provider().get_deployment_status("nope").await.unwrap_err();
        assert!(err.to_string().starts_with("failed to get deployment status"));
    }

    #[tokio::test]
    async fn describe_summarises_lease() {
        let provider = provider();
        let text = provider.describe("dep-8").await.unwrap();
        assert_eq!(text, "Deployment dep-8 is active (lease expired, lease lease-dep-8).");

        let text = provider.describe("dep-7").await.unwrap();
        assert!(text.starts_with("Deployment dep-7 is active ("));
        assert!(text.contains("remaining"));
    }
}
