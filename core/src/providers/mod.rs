//! Read-only views over the gateway for the host agent

pub mod deployment;
pub mod wallet;

pub use deployment::DeploymentProvider;
pub use wallet::WalletProvider;
