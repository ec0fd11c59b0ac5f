//! Deployment configuration model

use crate::error::{DeployError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

pub const DEFAULT_CPU_UNITS: f64 = 2.0;
pub const DEFAULT_MEMORY: &str = "2Gi";
pub const DEFAULT_STORAGE: &str = "10Gi";
pub const DEFAULT_DURATION: &str = "24h";
pub const DEFAULT_REPLICAS: u32 = 1;

/// Everything needed to describe one workload
///
/// Immutable once submitted. Optional fields fall back to the defaults
/// above when rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentConfig {
    pub name: String,
    pub image: String,
    #[serde(default = "default_replicas")]
    pub replicas: u32,
    #[serde(default)]
    pub ports: Vec<PortMapping>,
    #[serde(default)]
    pub env: Vec<EnvVar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute_resources: Option<ComputeResources>,
    /// Lease duration, e.g. 30min, 1h, 24h, 1d, 1mon
    #[serde(default = "default_duration")]
    pub duration: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortMapping {
    pub container_port: u16,
    pub service_port: u16,
}

impl PortMapping {
    pub fn same(port: u16) -> Self {
        Self {
            container_port: port,
            service_port: port,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

impl EnvVar {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeResources {
    #[serde(default = "default_cpu")]
    pub cpu: f64,
    #[serde(default = "default_memory")]
    pub memory: String,
    #[serde(default = "default_storage")]
    pub storage: String,
}

impl Default for ComputeResources {
    fn default() -> Self {
        Self {
            cpu: DEFAULT_CPU_UNITS,
            memory: DEFAULT_MEMORY.to_string(),
            storage: DEFAULT_STORAGE.to_string(),
        }
    }
}

fn default_replicas() -> u32 {
    DEFAULT_REPLICAS
}

fn default_duration() -> String {
    DEFAULT_DURATION.to_string()
}

fn default_cpu() -> f64 {
    DEFAULT_CPU_UNITS
}

fn default_memory() -> String {
    DEFAULT_MEMORY.to_string()
}

fn default_storage() -> String {
    DEFAULT_STORAGE.to_string()
}

fn duration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[1-9][0-9]*(min|h|d|mon)$").expect("valid regex"))
}

impl DeploymentConfig {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            replicas: DEFAULT_REPLICAS,
            ports: Vec::new(),
            env: Vec::new(),
            compute_resources: None,
            duration: DEFAULT_DURATION.to_string(),
        }
    }

    pub fn with_port(mut self, port: PortMapping) -> Self {
        self.ports.push(port);
        self
    }

    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push(EnvVar::new(name, value));
        self
    }

    pub fn with_resources(mut self, resources: ComputeResources) -> Self {
        self.compute_resources = Some(resources);
        self
    }

    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = duration.into();
        self
    }

    pub fn with_replicas(mut self, replicas: u32) -> Self {
        self.replicas = replicas;
        self
    }

    /// Resources to request, defaults applied
    pub fn resources(&self) -> ComputeResources {
        self.compute_resources.clone().unwrap_or_default()
    }

    /// The same config with every default made explicit
    pub fn normalized(&self) -> Self {
        Self {
            compute_resources: Some(self.resources()),
            ..self.clone()
        }
    }

    pub fn env_value(&self, name: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.value.as_str())
    }

    /// Directory-safe form of the workload name
    pub fn slug(&self) -> String {
        self.name.to_lowercase()
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(DeployError::invalid_config("deployment name cannot be empty"));
        }
        if self.name.chars().any(char::is_whitespace) {
            return Err(DeployError::invalid_config(format!(
                "deployment name '{}' cannot contain whitespace",
                self.name
            )));
        }
        if self.image.trim().is_empty() {
            return Err(DeployError::invalid_config(format!(
                "deployment '{}' has no container image",
                self.name
            )));
        }
        if self.replicas == 0 {
            return Err(DeployError::invalid_config("replicas must be at least 1"));
        }

        for port in &self.ports {
            if port.container_port == 0 || port.service_port == 0 {
                return Err(DeployError::invalid_config(format!(
                    "port mapping {}:{} is out of range",
                    port.container_port, port.service_port
                )));
            }
        }

        let mut seen = HashSet::new();
        for var in &self.env {
            if var.name.is_empty() || var.name.contains('=') {
                return Err(DeployError::invalid_config(format!(
                    "invalid environment variable name '{}'",
                    var.name
                )));
            }
            if !seen.insert(var.name.as_str()) {
                return Err(DeployError::invalid_config(format!(
                    "duplicate environment variable '{}'",
                    var.name
                )));
            }
        }

        if let Some(resources) = &self.compute_resources {
            if !resources.cpu.is_finite() || resources.cpu <= 0.0 {
                return Err(DeployError::invalid_config(format!(
                    "cpu units must be a positive number, got {}",
                    resources.cpu
                )));
            }
            if resources.memory.trim().is_empty() {
                return Err(DeployError::invalid_config("memory size cannot be empty"));
            }
            if resources.storage.trim().is_empty() {
                return Err(DeployError::invalid_config("storage size cannot be empty"));
            }
        }

        if !duration_pattern().is_match(&self.duration) {
            return Err(DeployError::invalid_config(format!(
                "unsupported lease duration '{}' (expected e.g. 30min, 1h, 24h, 1d, 1mon)",
                self.duration
            )));
        }

        Ok(())
    }

    /// Read a config from a YAML (or JSON) file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: DeploymentConfig = serde_yml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }
}
