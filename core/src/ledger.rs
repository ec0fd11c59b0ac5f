//! Append-only deployment ledger
//!
//! One CSV row per deployment event. The header is written only when the
//! file is new, so the log survives restarts and keeps growing.

use crate::error::{DeployError, Result};
use crate::gateway::Deployment;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    #[serde(rename = "Agent Name")]
    pub agent_name: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Deployment ID")]
    pub deployment_id: String,
    #[serde(rename = "Timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "Status")]
    pub status: String,
}

impl LedgerRecord {
    pub fn for_deployment(
        agent_name: impl Into<String>,
        description: impl Into<String>,
        deployment: &Deployment,
    ) -> Self {
        Self {
            agent_name: agent_name.into(),
            description: description.into(),
            deployment_id: deployment.id.clone(),
            timestamp: Utc::now(),
            status: deployment.status.to_string(),
        }
    }
}

pub struct DeploymentLedger {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl DeploymentLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &LedgerRecord) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let needs_header = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;

        tracing::debug!(
            deployment_id = %record.deployment_id,
            path = %self.path.display(),
            "Recorded deployment"
        );
        Ok(())
    }

    /// [`append`](Self::append) on the blocking pool, for use from async tasks
    pub async fn append_async(self: &Arc<Self>, record: LedgerRecord) -> Result<()> {
        let ledger = Arc::clone(self);
        tokio::task::spawn_blocking(move || ledger.append(&record))
            .await
            .map_err(|e| DeployError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
    }

    /// Every row in the ledger, oldest first
    pub fn records(&self) -> Result<Vec<LedgerRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut records = Vec::new();
        for row in reader.deserialize() {
            records.push(row?);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::DeploymentStatus;

    fn deployment(id: &str) -> Deployment {
        Deployment {
            id: id.to_string(),
            status: DeploymentStatus::Created,
            lease_id: None,
            logs: Vec::new(),
        }
    }

    #[test]
    fn header_written_once_and_rows_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployments.csv");

        let ledger = DeploymentLedger::new(&path);
        ledger
            .append(&LedgerRecord::for_deployment("bot1", "first, with comma", &deployment("dep-1")))
            .unwrap();

        // A fresh handle on the same file simulates a restart.
        let ledger = DeploymentLedger::new(&path);
        ledger
            .append(&LedgerRecord::for_deployment("bot1", "renewal", &deployment("dep-2")))
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content.matches("Agent Name,Description,Deployment ID,Timestamp,Status").count(),
            1
        );

        let records = ledger.records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].description, "first, with comma");
        assert_eq!(records[1].deployment_id, "dep-2");
        assert_eq!(records[1].status, "created");
    }

    #[test]
    fn missing_ledger_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = DeploymentLedger::new(dir.path().join("nested").join("log.csv"));
        assert!(ledger.records().unwrap().is_empty());
    }

    #[tokio::test]
    async fn async_append_runs_off_the_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Arc::new(DeploymentLedger::new(dir.path().join("log.csv")));
        for id in ["dep-1", "dep-2"] {
            ledger
                .append_async(LedgerRecord::for_deployment("bot1", "renewal", &deployment(id)))
                .await
                .unwrap();
        }
        let ids: Vec<_> = ledger
            .records()
            .unwrap()
            .into_iter()
            .map(|r| r.deployment_id)
            .collect();
        assert_eq!(ids, vec!["dep-1", "dep-2"]);
    }

    #[test]
    fn append_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = DeploymentLedger::new(dir.path().join("nested").join("log.csv"));
        ledger
            .append(&LedgerRecord::for_deployment("a", "b", &deployment("dep-9")))
            .unwrap();
        assert_eq!(ledger.records().unwrap().len(), 1);
    }
}
