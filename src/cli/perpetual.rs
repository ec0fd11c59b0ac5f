use anyhow::{Context, Result};
use console::Style;
use spheron_agent_core::watchdog::WatchdogState;
use spheron_agent_core::{DeploymentConfig, SpheronPlugin};
use std::path::Path;
use std::time::Duration;

/// Run the watchdog in the foreground until Ctrl+C or until it gives up
pub async fn handle_perpetual(
    plugin: &SpheronPlugin,
    config: &Path,
    deployment_id: Option<String>,
    interval: Option<u64>,
    threshold: Option<u64>,
) -> Result<()> {
    let config = DeploymentConfig::from_file(config)
        .with_context(|| format!("Failed to load deployment config {}", config.display()))?;

    let mut watchdog_config = plugin.watchdog_config();
    if let Some(secs) = interval {
        watchdog_config = watchdog_config.with_poll_interval(Duration::from_secs(secs));
    }
    if let Some(secs) = threshold {
        watchdog_config = watchdog_config.with_redeploy_threshold(Duration::from_secs(secs));
    }

    let action = plugin
        .perpetual_action(watchdog_config)
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    let (handle, outcome) = action
        .handle(config, deployment_id)
        .await
        .context("Failed to start perpetual deployment monitoring")?;

    let blue = Style::new().blue();
    println!("{}", Style::new().green().apply_to(&outcome.text));
    if let Some(id) = &outcome.deployment_id {
        println!("Tracking {}", blue.apply_to(id));
    }

    let mut updates = handle.subscribe();
    let mut tracked = outcome.deployment_id;
    let mut gave_up = false;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("\nStopping lease watchdog...");
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = updates.borrow_and_update().clone();
                if status.tracked_deployment != tracked {
                    tracked = status.tracked_deployment.clone();
                    if let Some(id) = &tracked {
                        println!("Renewed, now tracking {}", blue.apply_to(id));
                    }
                }
                if status.state == WatchdogState::GaveUp {
                    gave_up = true;
                    break;
                }
            }
        }
    }

    let status = handle.status();
    handle.shutdown().await;
    if gave_up {
        anyhow::bail!(
            "Lease watchdog gave up after {} consecutive failures (last error: {})",
            status.consecutive_failures,
            status.last_error.as_deref().unwrap_or("unknown")
        );
    }
    Ok(())
}
