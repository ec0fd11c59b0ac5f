pub mod actions;
pub mod error;
pub mod extractor;
pub mod gateway;
pub mod ledger;
pub mod manifest;
pub mod plugin;
pub mod providers;
pub mod settings;
pub mod util;
pub mod watchdog;

// Re-exports for convenience
pub use error::{DeployError, Result};
pub use gateway::{DeploymentGateway, HttpGateway};
pub use manifest::DeploymentConfig;
pub use plugin::SpheronPlugin;
pub use settings::Settings;
pub use watchdog::{LeaseWatchdog, WatchdogConfig, WatchdogHandle};
