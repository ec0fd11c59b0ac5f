//! Content-to-config extraction
//!
//! Free text goes in, a deployment decision comes out. The generator behind
//! [`ContentExtractor`] is a black box; [`validate_extraction`] is the only
//! place its output is trusted, and nothing reaches the manifest builder
//! without passing it.

pub mod llm;

pub use llm::LlmExtractor;

use crate::error::Result;
use crate::manifest::{ComputeResources, DeploymentConfig, EnvVar, PortMapping};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Env var carrying the agent's display name into the container
pub const AGENT_NAME_ENV: &str = "AGENT_NAME";

/// A validated request to deploy an agent
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentRequest {
    pub name: String,
    pub description: String,
    pub personality: String,
    pub capabilities: Vec<String>,
    pub deployment_reason: String,
    pub config: DeploymentConfig,
}

/// Result of analysing content
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// Well-formed and the generator recommends deploying
    Deploy(DeploymentRequest),
    /// Well-formed but the generator advises against deploying
    Declined { reason: String },
    /// Output did not match the expected shape
    Invalid { reason: String },
}

#[async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> Result<Extraction>;
}

fn required_str<'a>(obj: &'a Map<String, Value>, key: &str) -> std::result::Result<&'a str, String> {
    match obj.get(key) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(format!("`{}` must be a string", key)),
        None => Err(format!("missing required field `{}`", key)),
    }
}

fn optional_str<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
) -> std::result::Result<Option<&'a str>, String> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(format!("`{}` must be a string", key)),
    }
}

fn parse_capabilities(obj: &Map<String, Value>) -> std::result::Result<Vec<String>, String> {
    let items = match obj.get("capabilities") {
        Some(Value::Array(items)) => items,
        Some(_) => return Err("`capabilities` must be an array of strings".to_string()),
        None => return Err("missing required field `capabilities`".to_string()),
    };
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(s.clone()),
            _ => Err("`capabilities` must be an array of strings".to_string()),
        })
        .collect()
}

/// Ports may be bare numbers or `{containerPort, servicePort}` objects
fn parse_ports(value: Option<&Value>) -> std::result::Result<Vec<PortMapping>, String> {
    let items = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => return Err("`ports` must be an array".to_string()),
    };

    items
        .iter()
        .map(|item| match item {
            Value::Number(n) => n
                .as_u64()
                .and_then(|p| u16::try_from(p).ok())
                .map(PortMapping::same)
                .ok_or_else(|| format!("invalid port {}", n)),
            Value::Object(_) => serde_json::from_value::<PortMapping>(item.clone())
                .map_err(|e| format!("invalid port mapping: {}", e)),
            _ => Err("`ports` entries must be numbers or port mappings".to_string()),
        })
        .collect()
}

/// Env may be a `{NAME: value}` object or a list of `{name, value}`
fn parse_env(value: Option<&Value>) -> std::result::Result<Vec<EnvVar>, String> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Object(map)) => map
            .iter()
            .map(|(name, value)| match value {
                Value::String(s) => Ok(EnvVar::new(name, s.as_str())),
                Value::Number(_) | Value::Bool(_) => Ok(EnvVar::new(name, value.to_string())),
                _ => Err(format!("env var `{}` must be a scalar", name)),
            })
            .collect(),
        Some(list @ Value::Array(_)) => serde_json::from_value::<Vec<EnvVar>>(list.clone())
            .map_err(|e| format!("invalid env list: {}", e)),
        Some(_) => Err("`env` must be an object or a list".to_string()),
    }
}

fn service_name(display_name: &str) -> String {
    display_name.split_whitespace().collect::<Vec<_>>().join("-")
}

fn build_request(
    obj: &Map<String, Value>,
    default_image: Option<&str>,
) -> std::result::Result<Extraction, String> {
    let name = required_str(obj, "name")?.trim();
    let description = required_str(obj, "description")?;
    let personality = required_str(obj, "personality")?;
    let capabilities = parse_capabilities(obj)?;
    let should_deploy = match obj.get("shouldDeploy") {
        Some(Value::Bool(b)) => *b,
        Some(_) => return Err("`shouldDeploy` must be a boolean".to_string()),
        None => return Err("missing required field `shouldDeploy`".to_string()),
    };
    let deployment_reason = required_str(obj, "deploymentReason")?;

    if !should_deploy {
        return Ok(Extraction::Declined {
            reason: deployment_reason.to_string(),
        });
    }

    if name.is_empty() {
        return Err("`name` must not be empty".to_string());
    }

    let image = optional_str(obj, "image")?
        .filter(|s| !s.trim().is_empty())
        .or(default_image)
        .ok_or_else(|| "no container image given and no default image configured".to_string())?;

    let mut config = DeploymentConfig::new(service_name(name), image.trim());
    config.ports = parse_ports(obj.get("ports"))?;
    config.env = parse_env(obj.get("env"))?;
    if let Some(resources) = obj.get("computeResources").filter(|v| !v.is_null()) {
        config.compute_resources = Some(
            serde_json::from_value::<ComputeResources>(resources.clone())
                .map_err(|e| format!("invalid computeResources: {}", e))?,
        );
    }
    if let Some(duration) = optional_str(obj, "duration")? {
        config.duration = duration.to_string();
    }
    if let Some(replicas) = obj.get("replicas").filter(|v| !v.is_null()) {
        config.replicas = replicas
            .as_u64()
            .and_then(|r| u32::try_from(r).ok())
            .ok_or_else(|| "`replicas` must be a positive integer".to_string())?;
    }
    if config.env_value(AGENT_NAME_ENV).is_none() {
        config.env.push(EnvVar::new(AGENT_NAME_ENV, name));
    }

    config.validate().map_err(|e| e.to_string())?;

    Ok(Extraction::Deploy(DeploymentRequest {
        name: name.to_string(),
        description: description.to_string(),
        personality: personality.to_string(),
        capabilities,
        deployment_reason: deployment_reason.to_string(),
        config,
    }))
}

/// Check generator output and turn it into a decision
///
/// Never fails: malformed output becomes [`Extraction::Invalid`].
pub fn validate_extraction(value: &Value, default_image: Option<&str>) -> Extraction {
    let Some(obj) = value.as_object() else {
        return Extraction::Invalid {
            reason: "expected a JSON object".to_string(),
        };
    };

    build_request(obj, default_image).unwrap_or_else(|reason| Extraction::Invalid { reason })
}
