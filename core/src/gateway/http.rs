//! HTTP gateway
//!
//! Talks JSON to the SDK bridge at `spheron.gateway_url`. The bridge signs
//! and submits on-chain operations; this client only carries the
//! credential, the network selector and the provider proxy URL.

use super::{Deployment, DeploymentGateway, EscrowReceipt, LeaseInfo, Transaction};
use crate::error::{DeployError, Result};
use crate::settings::{Network, SpheronSettings};
use crate::util::{sanitize_base_url, validate_private_key};
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client as HttpClient, RequestBuilder, StatusCode,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const NETWORK_HEADER: &str = "x-spheron-network";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ManifestRequest<'a> {
    manifest: &'a str,
    provider_proxy_url: &'a str,
}

#[derive(Serialize)]
struct EscrowRequest<'a> {
    amount: &'a str,
}

#[derive(Deserialize)]
struct BalanceResponse {
    #[serde(alias = "amount")]
    balance: serde_json::Value,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TransactionsResponse {
    List(Vec<Transaction>),
    Wrapped { transactions: Vec<Transaction> },
}

/// Gateway client built once from settings and shared behind an `Arc`
pub struct HttpGateway {
    base_url: String,
    provider_proxy_url: String,
    network: Network,
    timeout: Duration,
    http_client: HttpClient,
}

impl HttpGateway {
    /// Build the client
    ///
    /// Fails with `MissingConfig` when no credential is configured.
    pub fn new(settings: &SpheronSettings) -> Result<Self> {
        let private_key = validate_private_key(settings.private_key.as_deref().unwrap_or_default())?;
        let base_url = sanitize_base_url(&settings.gateway_url, "gateway_url")?;
        let provider_proxy_url =
            sanitize_base_url(&settings.provider_proxy_url, "provider_proxy_url")?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", private_key))
            .map_err(|e| DeployError::invalid_config(e.to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            NETWORK_HEADER,
            HeaderValue::from_str(&settings.network.to_string())
                .map_err(|e| DeployError::invalid_config(e.to_string()))?,
        );

        let timeout = settings.request_timeout();
        let http_client = HttpClient::builder()
            .timeout(timeout)
            .user_agent(concat!("spheron-agent/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| DeployError::invalid_config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            provider_proxy_url,
            network: settings.network,
            timeout,
            http_client,
        })
    }

    pub fn network(&self) -> Network {
        self.network
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// URL of one resource under `collection`, with `id` as a single encoded segment
    fn resource_url(&self, operation: &str, collection: &str, id: &str) -> Result<String> {
        if id.trim().is_empty() || id == "." || id == ".." {
            return Err(DeployError::gateway(operation, format!("invalid id '{}'", id)));
        }
        Ok(self.url(&format!("{}/{}", collection, urlencoding::encode(id))))
    }

    async fn execute(&self, operation: &str, request: RequestBuilder) -> Result<String> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                DeployError::Timeout {
                    operation: operation.to_string(),
                    duration: self.timeout,
                }
            } else {
                DeployError::gateway(operation, e.to_string())
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DeployError::gateway(operation, e.to_string()))?;

        if status.is_success() {
            return Ok(body);
        }

        let message = match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                format!("credential rejected ({})", status)
            }
            _ if body.trim().is_empty() => status.to_string(),
            _ => format!("{}: {}", status, body.trim()),
        };
        tracing::debug!(operation, status = status.as_u16(), "Gateway call failed");
        Err(DeployError::gateway_status(operation, status.as_u16(), message))
    }

    async fn call<T: DeserializeOwned>(&self, operation: &str, request: RequestBuilder) -> Result<T> {
        let body = self.execute(operation, request).await?;
        serde_json::from_str(&body).map_err(|e| {
            DeployError::gateway(operation, format!("unexpected response body: {}", e))
        })
    }
}

#[async_trait]
impl DeploymentGateway for HttpGateway {
    async fn create_deployment(&self, manifest: &str) -> Result<Deployment> {
        let body = ManifestRequest {
            manifest,
            provider_proxy_url: &self.provider_proxy_url,
        };
        self.call(
            "create deployment",
            self.http_client.post(self.url("deployments")).json(&body),
        )
        .await
    }

    async fn get_deployment(&self, id: &str) -> Result<Deployment> {
        let url = self.resource_url("get deployment", "deployments", id)?;
        self.call("get deployment", self.http_client.get(url)).await
    }

    async fn update_deployment(&self, id: &str, manifest: &str) -> Result<Deployment> {
        let body = ManifestRequest {
            manifest,
            provider_proxy_url: &self.provider_proxy_url,
        };
        let url = self.resource_url("update deployment", "deployments", id)?;
        self.call("update deployment", self.http_client.put(url).json(&body))
            .await
    }

    async fn close_deployment(&self, id: &str) -> Result<()> {
        let url = self.resource_url("close deployment", "deployments", id)?;
        self.execute("close deployment", self.http_client.delete(url))
            .await
            .map(|_| ())
    }

    async fn get_lease_info(&self, lease_id: &str) -> Result<LeaseInfo> {
        let url = self.resource_url("get lease details", "leases", lease_id)?;
        self.call("get lease details", self.http_client.get(url)).await
    }

    async fn get_balance(&self) -> Result<String> {
        let response: BalanceResponse = self
            .call("get balance", self.http_client.get(self.url("escrow/balance")))
            .await?;
        Ok(match response.balance {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        })
    }

    async fn get_transaction_history(&self) -> Result<Vec<Transaction>> {
        let response: TransactionsResponse = self
            .call(
                "get transaction history",
                self.http_client.get(self.url("escrow/transactions")),
            )
            .await?;
        Ok(match response {
            TransactionsResponse::List(list) => list,
            TransactionsResponse::Wrapped { transactions } => transactions,
        })
    }

    async fn deposit(&self, amount: &str) -> Result<EscrowReceipt> {
        self.call(
            "deposit",
            self.http_client
                .post(self.url("escrow/deposit"))
                .json(&EscrowRequest { amount }),
        )
        .await
    }

    async fn withdraw(&self, amount: &str) -> Result<EscrowReceipt> {
        self.call(
            "withdraw",
            self.http_client
                .post(self.url("escrow/withdraw"))
                .json(&EscrowRequest { amount }),
        )
        .await
    }
}
