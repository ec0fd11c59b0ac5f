//! balance / transactions / deposit / withdraw

use anyhow::{Context, Result};
use console::Style;
use spheron_agent_core::SpheronPlugin;

pub async fn handle_balance(plugin: &SpheronPlugin) -> Result<()> {
    let text = plugin.wallet_provider().get_formatted_balance().await?;
    println!("{}", text);
    Ok(())
}

pub async fn handle_transactions(plugin: &SpheronPlugin) -> Result<()> {
    let history = plugin.wallet_provider().get_transaction_history().await?;
    if history.is_empty() {
        println!("No transactions.");
        return Ok(());
    }

    for tx in history {
        let when = tx
            .timestamp
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}  {:<10} {} {}  {}",
            when,
            tx.kind,
            tx.amount,
            tx.token.as_deref().unwrap_or(""),
            tx.tx_hash.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

fn check_amount(amount: &str) -> Result<()> {
    let value: f64 = amount
        .trim()
        .parse()
        .with_context(|| format!("'{}' is not a number", amount))?;
    if !(value.is_finite() && value > 0.0) {
        anyhow::bail!("amount must be greater than zero");
    }
    Ok(())
}

pub async fn handle_deposit(plugin: &SpheronPlugin, amount: &str) -> Result<()> {
    check_amount(amount)?;
    let receipt = plugin.gateway().deposit(amount.trim()).await?;
    println!(
        "{} {} {}",
        Style::new().green().apply_to("Deposited"),
        receipt.amount,
        receipt.tx_hash.as_deref().unwrap_or("")
    );
    Ok(())
}

pub async fn handle_withdraw(plugin: &SpheronPlugin, amount: &str) -> Result<()> {
    check_amount(amount)?;
    let receipt = plugin.gateway().withdraw(amount.trim()).await?;
    println!(
        "{} {} {}",
        Style::new().green().apply_to("Withdrew"),
        receipt.amount,
        receipt.tx_hash.as_deref().unwrap_or("")
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_must_be_positive_numbers() {
        assert!(check_amount("10").is_ok());
        assert!(check_amount(" 0.5 ").is_ok());
        assert!(check_amount("0").is_err());
        assert!(check_amount("-3").is_err());
        assert!(check_amount("ten").is_err());
        assert!(check_amount("NaN").is_err());
    }
}
