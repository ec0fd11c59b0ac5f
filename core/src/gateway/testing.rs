//! Scripted in-memory gateway for unit tests

use super::{Deployment, DeploymentGateway, DeploymentStatus, EscrowReceipt, LeaseInfo, Transaction};
use crate::error::{DeployError, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

#[derive(Default)]
struct ScriptState {
    deployments: HashMap<String, Deployment>,
    leases: HashMap<String, LeaseInfo>,
    next_id: u32,
    new_lease_secs: i64,
    fail_lease_calls: u32,
    lease_delay: Option<std::time::Duration>,
    fail_creates: u32,
    fail_all_creates: bool,
    pending_leases: bool,
    lease_calls: u32,
    created: Vec<String>,
    closed: Vec<String>,
    updated: Vec<(String, String)>,
    balance: String,
    transactions: Vec<Transaction>,
}

pub struct ScriptedGateway {
    state: Mutex<ScriptState>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ScriptState {
                new_lease_secs: 24 * 3600,
                balance: "0".to_string(),
                ..ScriptState::default()
            }),
        }
    }

    /// Register an existing deployment whose lease ends `remaining_secs` from now
    /// (`None` = lease with no end time).
    pub fn with_deployment(self, id: &str, remaining_secs: Option<i64>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let lease_id = format!("lease-{}", id);
            state.deployments.insert(
                id.to_string(),
                Deployment {
                    id: id.to_string(),
                    status: DeploymentStatus::Active,
                    lease_id: Some(lease_id.clone()),
                    logs: vec![format!("{} started", id)],
                },
            );
            state.leases.insert(
                lease_id.clone(),
                LeaseInfo {
                    lease_id,
                    end_time: remaining_secs.map(|s| Utc::now() + Duration::seconds(s)),
                },
            );
        }
        self
    }

    pub fn with_balance(self, balance: &str) -> Self {
        self.state.lock().unwrap().balance = balance.to_string();
        self
    }

    pub fn with_transactions(self, transactions: Vec<Transaction>) -> Self {
        self.state.lock().unwrap().transactions = transactions;
        self
    }

    /// Lease length handed to deployments created from now on
    pub fn with_new_lease_secs(self, secs: i64) -> Self {
        self.state.lock().unwrap().new_lease_secs = secs;
        self
    }

    /// Make every lease lookup take `delay` before answering
    pub fn with_lease_delay(self, delay: std::time::Duration) -> Self {
        self.state.lock().unwrap().lease_delay = Some(delay);
        self
    }

    /// Deployments created from now on have no lease assigned
    pub fn with_pending_leases(self) -> Self {
        self.state.lock().unwrap().pending_leases = true;
        self
    }

    pub fn fail_next_lease_calls(&self, n: u32) {
        self.state.lock().unwrap().fail_lease_calls = n;
    }

    pub fn fail_next_creates(&self, n: u32) {
        self.state.lock().unwrap().fail_creates = n;
    }

    pub fn fail_all_creates(&self) {
        self.state.lock().unwrap().fail_all_creates = true;
    }

    pub fn lease_calls(&self) -> u32 {
        self.state.lock().unwrap().lease_calls
    }

    pub fn created_manifests(&self) -> Vec<String> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn create_calls(&self) -> usize {
        self.created_manifests().len()
    }

    pub fn closed(&self) -> Vec<String> {
        self.state.lock().unwrap().closed.clone()
    }

    pub fn updated(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().updated.clone()
    }
}

#[async_trait]
impl DeploymentGateway for ScriptedGateway {
    async fn create_deployment(&self, manifest: &str) -> Result<Deployment> {
        let mut state = self.state.lock().unwrap();
        state.created.push(manifest.to_string());
        if state.fail_all_creates {
            return Err(DeployError::gateway("create deployment", "no provider bids"));
        }
        if state.fail_creates > 0 {
            state.fail_creates -= 1;
            return Err(DeployError::gateway("create deployment", "no provider bids"));
        }

        state.next_id += 1;
        let id = format!("dep-{}", state.next_id);
        if state.pending_leases {
            let deployment = Deployment {
                id: id.clone(),
                status: DeploymentStatus::Created,
                lease_id: None,
                logs: Vec::new(),
            };
            state.deployments.insert(id, deployment.clone());
            return Ok(deployment);
        }
        let lease_id = format!("lease-{}", id);
        let end_time = Utc::now() + Duration::seconds(state.new_lease_secs);
        state.leases.insert(
            lease_id.clone(),
            LeaseInfo {
                lease_id: lease_id.clone(),
                end_time: Some(end_time),
            },
        );
        let deployment = Deployment {
            id: id.clone(),
            status: DeploymentStatus::Created,
            lease_id: Some(lease_id),
            logs: Vec::new(),
        };
        state.deployments.insert(id, deployment.clone());
        Ok(deployment)
    }

    async fn get_deployment(&self, id: &str) -> Result<Deployment> {
        self.state
            .lock()
            .unwrap()
            .deployments
            .get(id)
            .cloned()
            .ok_or_else(|| DeployError::gateway_status("get deployment", 404, format!("{} not found", id)))
    }

    async fn update_deployment(&self, id: &str, manifest: &str) -> Result<Deployment> {
        let mut state = self.state.lock().unwrap();
        state.updated.push((id.to_string(), manifest.to_string()));
        state
            .deployments
            .get(id)
            .cloned()
            .ok_or_else(|| DeployError::gateway_status("update deployment", 404, format!("{} not found", id)))
    }

    async fn close_deployment(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        match state.deployments.get_mut(id) {
            Some(deployment) => {
                deployment.status = DeploymentStatus::Closed;
                state.closed.push(id.to_string());
                Ok(())
            }
            None => Err(DeployError::gateway_status(
                "close deployment",
                404,
                format!("{} not found", id),
            )),
        }
    }

    async fn get_lease_info(&self, lease_id: &str) -> Result<LeaseInfo> {
        let delay = {
            let mut state = self.state.lock().unwrap();
            state.lease_calls += 1;
            state.lease_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().unwrap();
        if state.fail_lease_calls > 0 {
            state.fail_lease_calls -= 1;
            return Err(DeployError::gateway_status("get lease details", 503, "bridge busy"));
        }
        state
            .leases
            .get(lease_id)
            .cloned()
            .ok_or_else(|| DeployError::gateway_status("get lease details", 404, format!("{} not found", lease_id)))
    }

    async fn get_balance(&self) -> Result<String> {
        Ok(self.state.lock().unwrap().balance.clone())
    }

    async fn get_transaction_history(&self) -> Result<Vec<Transaction>> {
        Ok(self.state.lock().unwrap().transactions.clone())
    }

    async fn deposit(&self, amount: &str) -> Result<EscrowReceipt> {
        Ok(EscrowReceipt {
            tx_hash: Some("0xdeposit".to_string()),
            amount: amount.to_string(),
        })
    }

    async fn withdraw(&self, amount: &str) -> Result<EscrowReceipt> {
        Ok(EscrowReceipt {
            tx_hash: Some("0xwithdraw".to_string()),
            amount: amount.to_string(),
        })
    }
}

/// Serve exactly one request with a canned response; yields the raw request text.
pub async fn serve_once(status: u16, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|l| {
                        let lower = l.to_lowercase();
                        lower
                            .strip_prefix("content-length:")
                            .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                    })
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        let response = format!(
            "HTTP/1.1 {} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        String::from_utf8_lossy(&buf).to_string()
    });
    (format!("http://{}", addr), handle)
}
