//! status / logs / remaining / history

use anyhow::Result;
use console::Style;
use spheron_agent_core::ledger::DeploymentLedger;
use spheron_agent_core::util::describe_duration;
use spheron_agent_core::SpheronPlugin;
use std::time::Duration;

pub async fn handle_status(plugin: &SpheronPlugin, id: &str, json: bool) -> Result<()> {
    let provider = plugin.deployment_provider();
    if json {
        let deployment = provider.get_deployment(id).await?;
        println!("{}", serde_json::to_string_pretty(&deployment)?);
    } else {
        println!("{}", provider.describe(id).await?);
    }
    Ok(())
}

pub async fn handle_logs(plugin: &SpheronPlugin, id: &str) -> Result<()> {
    let logs = plugin.deployment_provider().get_deployment_logs(id).await?;
    if logs.is_empty() {
        println!("{}", Style::new().dim().apply_to("No logs yet."));
    }
    for line in logs {
        println!("{}", line);
    }
    Ok(())
}

pub async fn handle_remaining(plugin: &SpheronPlugin, id: &str) -> Result<()> {
    let remaining = plugin.deployment_provider().get_remaining_time(id).await?;
    if remaining > 0 {
        println!(
            "{} ({}s)",
            describe_duration(Duration::from_secs(remaining as u64)),
            remaining
        );
    } else {
        println!("{}", Style::new().red().apply_to("Lease expired"));
    }
    Ok(())
}

pub fn handle_history(ledger: &DeploymentLedger) -> Result<()> {
    let records = ledger.records()?;
    if records.is_empty() {
        println!("No deployments recorded in {}", ledger.path().display());
        return Ok(());
    }

    let bold = Style::new().bold();
    for record in records {
        println!(
            "{}  {}  {}  {}  {}",
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            bold.apply_to(&record.agent_name),
            record.deployment_id,
            record.status,
            record.description
        );
    }
    Ok(())
}
