//! Remote deployment gateway
//!
//! The marketplace SDK is consumed through [`DeploymentGateway`]: a narrow,
//! async, individually failable call surface for deployments, leases and
//! escrow. Nothing here depends on the SDK's own retry or transport rules.

pub mod http;
#[cfg(test)]
pub mod testing;

pub use http::HttpGateway;

use crate::error::{DeployError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Deployment status as reported upstream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeploymentStatus {
    Created,
    Active,
    Closed,
    Failed,
    /// Any value this crate does not know about, kept verbatim
    Other(String),
}

impl Default for DeploymentStatus {
    fn default() -> Self {
        Self::Other("unknown".to_string())
    }
}

impl From<String> for DeploymentStatus {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "created" => Self::Created,
            "active" => Self::Active,
            "closed" => Self::Closed,
            "failed" => Self::Failed,
            _ => Self::Other(value),
        }
    }
}

impl From<DeploymentStatus> for String {
    fn from(value: DeploymentStatus) -> Self {
        value.to_string()
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeploymentStatus::Created => write!(f, "created"),
            DeploymentStatus::Active => write!(f, "active"),
            DeploymentStatus::Closed => write!(f, "closed"),
            DeploymentStatus::Failed => write!(f, "failed"),
            DeploymentStatus::Other(s) => write!(f, "{}", s),
        }
    }
}

/// A deployment as owned by the gateway. This crate only ever holds its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub id: String,
    #[serde(default)]
    pub status: DeploymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lease_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<String>,
}

/// Snapshot of a lease. Never cached beyond one watchdog tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseInfo {
    pub lease_id: String,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub end_time: Option<DateTime<Utc>>,
}

impl LeaseInfo {
    /// Seconds left on the lease at `now`
    ///
    /// `max(0, end - now)`. A lease without an end time reports `-now`, so it
    /// always reads as already expired.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        match self.end_time {
            Some(end) => (end - now).num_seconds().max(0),
            None => -now.timestamp(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscrowReceipt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    pub amount: String,
}

/// Call contract of the marketplace SDK
///
/// Every call resolves with data or fails with a describable
/// [`DeployError`].
#[async_trait]
pub trait DeploymentGateway: Send + Sync {
    async fn create_deployment(&self, manifest: &str) -> Result<Deployment>;

    async fn get_deployment(&self, id: &str) -> Result<Deployment>;

    async fn update_deployment(&self, id: &str, manifest: &str) -> Result<Deployment>;

    async fn close_deployment(&self, id: &str) -> Result<()>;

    async fn get_lease_info(&self, lease_id: &str) -> Result<LeaseInfo>;

    async fn get_balance(&self) -> Result<String>;

    async fn get_transaction_history(&self) -> Result<Vec<Transaction>>;

    async fn deposit(&self, amount: &str) -> Result<EscrowReceipt>;

    async fn withdraw(&self, amount: &str) -> Result<EscrowReceipt>;

    async fn get_deployment_status(&self, id: &str) -> Result<DeploymentStatus> {
        self.get_deployment(id)
            .await
            .map(|d| d.status)
            .map_err(|e| e.within("get deployment status"))
    }

    async fn get_deployment_logs(&self, id: &str) -> Result<Vec<String>> {
        self.get_deployment(id)
            .await
            .map(|d| d.logs)
            .map_err(|e| e.within("get deployment logs"))
    }

    /// Lease snapshot for a deployment
    ///
    /// Fails while the deployment has no lease assigned yet.
    async fn get_deployment_lease(&self, id: &str) -> Result<LeaseInfo> {
        let deployment = self.get_deployment(id).await?;
        match deployment.lease_id {
            Some(lease_id) => self.get_lease_info(&lease_id).await,
            None => Err(DeployError::gateway(
                "get deployment lease",
                format!("deployment {} has no lease yet", id),
            )),
        }
    }

    async fn get_remaining_time(&self, id: &str) -> Result<i64> {
        self.get_deployment_lease(id)
            .await
            .map(|lease| lease.remaining_secs(Utc::now()))
            .map_err(|e| e.within("get deployment remaining time"))
    }
}
