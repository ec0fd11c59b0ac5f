//! Typed view of a rendered manifest
//!
//! Used to inspect manifests on disk and to check that rendering loses
//! nothing.

use super::config::{ComputeResources, DeploymentConfig, EnvVar, PortMapping};
use crate::error::{DeployError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub services: BTreeMap<String, ServiceSpec>,
    pub profiles: ProfilesSpec,
    pub deployment: BTreeMap<String, BTreeMap<String, DeploymentTarget>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub image: String,
    #[serde(default)]
    pub expose: Vec<ExposeSpec>,
    /// `NAME=value` entries
    #[serde(default)]
    pub env: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposeSpec {
    pub port: u16,
    #[serde(rename = "as")]
    pub as_port: u16,
    #[serde(default)]
    pub to: Vec<ExposeTarget>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposeTarget {
    #[serde(default)]
    pub global: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfilesSpec {
    pub name: String,
    pub duration: String,
    pub mode: String,
    #[serde(default)]
    pub tier: Vec<String>,
    pub compute: BTreeMap<String, ComputeProfile>,
    #[serde(default)]
    pub placement: BTreeMap<String, PlacementSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeProfile {
    pub resources: ResourcesSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourcesSpec {
    pub cpu: CpuSpec,
    pub memory: SizeSpec,
    pub storage: Vec<SizeSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuSpec {
    pub units: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeSpec {
    pub size: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementSpec {
    #[serde(default)]
    pub pricing: BTreeMap<String, PricingSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingSpec {
    pub token: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentTarget {
    pub profile: String,
    pub count: u32,
}

impl Manifest {
    pub fn parse(text: &str) -> Result<Self> {
        serde_yml::from_str(text)
            .map_err(|e| DeployError::manifest(format!("could not parse manifest: {}", e)))
    }

    /// Name of the single service this manifest deploys
    pub fn service_name(&self) -> Result<&str> {
        let mut names = self.services.keys();
        match (names.next(), names.next()) {
            (Some(name), None) => Ok(name.as_str()),
            (None, _) => Err(DeployError::manifest("manifest declares no services")),
            (Some(_), Some(_)) => Err(DeployError::manifest(
                "manifest declares more than one service",
            )),
        }
    }

    /// Recover the deployment config this manifest was rendered from
    pub fn to_config(&self) -> Result<DeploymentConfig> {
        let name = self.service_name()?.to_string();
        let service = &self.services[&name];

        let ports = service
            .expose
            .iter()
            .map(|e| PortMapping {
                container_port: e.port,
                service_port: e.as_port,
            })
            .collect();

        let env = service
            .env
            .iter()
            .map(|entry| {
                entry
                    .split_once('=')
                    .map(|(k, v)| EnvVar::new(k, v))
                    .ok_or_else(|| {
                        DeployError::manifest(format!("malformed env entry '{}'", entry))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let compute = self.profiles.compute.get(&name).ok_or_else(|| {
            DeployError::manifest(format!("no compute profile for '{}'", name))
        })?;
        let storage = compute
            .resources
            .storage
            .first()
            .ok_or_else(|| DeployError::manifest("compute profile has no storage entry"))?;

        let replicas = self
            .deployment
            .get(&name)
            .and_then(|targets| targets.values().next())
            .map(|target| target.count)
            .ok_or_else(|| {
                DeployError::manifest(format!("no deployment target for '{}'", name))
            })?;

        Ok(DeploymentConfig {
            name,
            image: service.image.clone(),
            replicas,
            ports,
            env,
            compute_resources: Some(ComputeResources {
                cpu: compute.resources.cpu.units,
                memory: compute.resources.memory.size.clone(),
                storage: storage.size.clone(),
            }),
            duration: self.profiles.duration.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HAND_WRITTEN: &str = r#"
version: "1.0"
services:
  relay:
    image: nostr/relay:0.9
    expose:
      - port: 7000
        as: 80
        to:
          - global: true
    env:
      - MODE=public
profiles:
  name: relay
  duration: 12h
  mode: provider
  tier:
    - community
  compute:
    relay:
      resources:
        cpu:
          units: 1
        memory:
          size: 1Gi
        storage:
          - size: 5Gi
  placement:
    westcoast:
      pricing:
        relay:
          token: USDT
          amount: 0.1
deployment:
  relay:
    westcoast:
      profile: relay
      count: 2
"#;

    #[test]
    fn parses_unquoted_hand_written_manifest() {
        let config = Manifest::parse(HAND_WRITTEN).unwrap().to_config().unwrap();
        assert_eq!(config.name, "relay");
        assert_eq!(config.ports, vec![PortMapping { container_port: 7000, service_port: 80 }]);
        assert_eq!(config.env_value("MODE"), Some("public"));
        assert_eq!(config.replicas, 2);
        assert_eq!(config.duration, "12h");
        assert_eq!(config.resources().cpu, 1.0);
    }

    #[test]
    fn malformed_env_entry_is_reported() {
        let text = HAND_WRITTEN.replace("MODE=public", "MODE");
        let err = Manifest::parse(&text).unwrap().to_config().unwrap_err();
        assert!(matches!(err, DeployError::Manifest { .. }));
    }

    #[test]
    fn garbage_is_not_a_manifest() {
        assert!(Manifest::parse("just: [some, yaml").is_err());
        assert!(Manifest::parse("version: 1").is_err());
    }
}
