//! Manifest rendering
//!
//! String scalars go through `json_encode` so any name, image or env value
//! lands in the document as a valid double-quoted YAML scalar.

use super::config::DeploymentConfig;
use crate::error::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tera::{Context, Tera};

pub const MANIFEST_FILE_NAME: &str = "spheron.yaml";

const MANIFEST_TEMPLATE: &str = r#"version: "1.0"

services:
  {{ name | json_encode() }}:
    image: {{ image | json_encode() }}
{%- if ports %}
    expose:
{%- for p in ports %}
      - port: {{ p.containerPort }}
        as: {{ p.servicePort }}
        to:
          - global: true
{%- endfor %}
{%- endif %}
{%- if env %}
    env:
{%- for entry in env %}
      - {{ entry | json_encode() }}
{%- endfor %}
{%- endif %}

profiles:
  name: {{ name | json_encode() }}
  duration: {{ duration | json_encode() }}
  mode: provider
  tier:
    - community
    - secure
  compute:
    {{ name | json_encode() }}:
      resources:
        cpu:
          units: {{ cpu }}
        memory:
          size: {{ memory | json_encode() }}
        storage:
          - size: {{ storage | json_encode() }}
  placement:
    {{ region }}:
      pricing:
        {{ name | json_encode() }}:
          token: {{ token }}
          amount: {{ amount }}

deployment:
  {{ name | json_encode() }}:
    {{ region }}:
      profile: {{ name | json_encode() }}
      count: {{ replicas }}
"#;

/// Fixed placement every manifest is priced against
pub const PLACEMENT_REGION: &str = "westcoast";
pub const PRICING_TOKEN: &str = "USDT";
pub const PRICING_AMOUNT: f64 = 0.1;

#[derive(Serialize)]
struct TemplateView<'a> {
    name: &'a str,
    image: &'a str,
    ports: &'a [super::config::PortMapping],
    env: Vec<String>,
    cpu: f64,
    memory: String,
    storage: String,
    duration: &'a str,
    replicas: u32,
    region: &'static str,
    token: &'static str,
    amount: f64,
}

/// Render a deployment config into a manifest document
///
/// Pure and deterministic: same config, same text. A config that fails
/// [`DeploymentConfig::validate`] is not rendered.
pub fn render(config: &DeploymentConfig) -> Result<String> {
    config.validate()?;
    let resources = config.resources();
    let view = TemplateView {
        name: &config.name,
        image: &config.image,
        ports: &config.ports,
        env: config
            .env
            .iter()
            .map(|e| format!("{}={}", e.name, e.value))
            .collect(),
        cpu: resources.cpu,
        memory: resources.memory,
        storage: resources.storage,
        duration: &config.duration,
        replicas: config.replicas,
        region: PLACEMENT_REGION,
        token: PRICING_TOKEN,
        amount: PRICING_AMOUNT,
    };

    let context = Context::from_serialize(&view)?;
    let rendered = Tera::one_off(MANIFEST_TEMPLATE, &context, false)?;
    Ok(rendered.trim().to_string())
}

/// Render and write `<dir>/<name>/spheron.yaml`, returning the written path
pub fn write_manifest(dir: &Path, config: &DeploymentConfig) -> Result<PathBuf> {
    let manifest = render(config)?;
    save_manifest(dir, config, &manifest)
}

/// Write already rendered manifest text to `<dir>/<name>/spheron.yaml`
pub fn save_manifest(dir: &Path, config: &DeploymentConfig, manifest: &str) -> Result<PathBuf> {
    let target_dir = dir.join(config.slug());
    std::fs::create_dir_all(&target_dir)?;
    let path = target_dir.join(MANIFEST_FILE_NAME);
    std::fs::write(&path, manifest)?;
    tracing::debug!(path = %path.display(), "Wrote deployment manifest");
    Ok(path)
}
