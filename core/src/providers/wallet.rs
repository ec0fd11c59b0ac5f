use crate::error::Result;
use crate::gateway::{DeploymentGateway, Transaction};
use std::sync::Arc;

pub struct WalletProvider {
    gateway: Arc<dyn DeploymentGateway>,
}

impl WalletProvider {
    pub const NAME: &'static str = "SPHERON_WALLET";

    pub fn new(gateway: Arc<dyn DeploymentGateway>) -> Self {
        Self { gateway }
    }

    pub async fn get_balance(&self) -> Result<String> {
        self.gateway.get_balance().await
    }

    pub async fn get_transaction_history(&self) -> Result<Vec<Transaction>> {
        self.gateway.get_transaction_history().await
    }

    pub async fn get_formatted_balance(&self) -> Result<String> {
        let balance = self.get_balance().await?;
        Ok(format!("Current Spheron Balance: {}", balance))
    }
}
