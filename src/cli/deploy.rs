//! deploy / render / inspect / update / close

use anyhow::{Context, Result};
use console::Style;
use spheron_agent_core::manifest::{render, Manifest};
use spheron_agent_core::{DeploymentConfig, SpheronPlugin};
use std::path::Path;

pub async fn handle_deploy(plugin: &SpheronPlugin, text: &str) -> Result<bool> {
    let extractor = plugin
        .default_extractor()
        .context("Failed to set up the content extractor")?;
    let action = plugin
        .deploy_action(extractor)
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    let outcome = action
        .handle(text)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))
        .context("Failed to deploy agent")?;

    let style = if outcome.success {
        Style::new().green()
    } else {
        Style::new().yellow()
    };
    println!("{}", style.apply_to(&outcome.text));
    Ok(outcome.success)
}

pub fn handle_render(config: &Path, out: Option<&Path>) -> Result<()> {
    let config = DeploymentConfig::from_file(config)
        .with_context(|| format!("Failed to load deployment config {}", config.display()))?;
    let manifest = render(&config)?;

    match out {
        Some(path) => {
            std::fs::write(path, format!("{}\n", manifest))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "{} {}",
                Style::new().green().apply_to("Wrote"),
                path.display()
            );
        }
        None => println!("{}", manifest),
    }
    Ok(())
}

pub fn handle_inspect(manifest: &Path) -> Result<()> {
    let text = std::fs::read_to_string(manifest)
        .with_context(|| format!("Failed to read {}", manifest.display()))?;
    let config = Manifest::parse(&text)?.to_config()?;
    print!("{}", serde_yml::to_string(&config)?);
    Ok(())
}

pub async fn handle_update(plugin: &SpheronPlugin, id: &str, config: &Path) -> Result<()> {
    let config = DeploymentConfig::from_file(config)
        .with_context(|| format!("Failed to load deployment config {}", config.display()))?;
    let manifest = render(&config)?;
    let deployment = plugin.gateway().update_deployment(id, &manifest).await?;
    println!(
        "{} {} ({})",
        Style::new().green().apply_to("Updated"),
        deployment.id,
        deployment.status
    );
    Ok(())
}

pub async fn handle_close(plugin: &SpheronPlugin, id: &str) -> Result<()> {
    plugin.gateway().close_deployment(id).await?;
    println!("{} {}", Style::new().green().apply_to("Closed"), id);
    Ok(())
}
