//! Settings
//!
//! Loaded once at startup from `spheron-agent.toml` (or the platform config
//! dir), then overridden by `SPHERON_*` environment variables.

use crate::error::{DeployError, OptionExt, Result};
use crate::util::{sanitize_base_url, validate_private_key};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_PROVIDER_PROXY_URL: &str = "http://localhost:3040";
const SETTINGS_FILE_NAME: &str = "spheron-agent.toml";

/// Target marketplace network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Testnet,
    Mainnet,
}

impl std::str::FromStr for Network {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "testnet" => Ok(Network::Testnet),
            "mainnet" => Ok(Network::Mainnet),
            other => Err(DeployError::invalid_config(format!(
                "unknown network '{}', expected 'testnet' or 'mainnet'",
                other
            ))),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Testnet => write!(f, "testnet"),
            Network::Mainnet => write!(f, "mainnet"),
        }
    }
}

/// Unified settings file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub spheron: SpheronSettings,
    #[serde(default)]
    pub watchdog: WatchdogSettings,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub storage: StorageSettings,
}

/// Marketplace credentials and endpoints
#[derive(Clone, Serialize, Deserialize)]
pub struct SpheronSettings {
    /// Deployment credential. Required by every action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    #[serde(default)]
    pub network: Network,
    #[serde(default = "default_proxy_url")]
    pub provider_proxy_url: String,
    /// Base URL of the SDK bridge the HTTP gateway talks to
    #[serde(default = "default_proxy_url")]
    pub gateway_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for SpheronSettings {
    fn default() -> Self {
        Self {
            private_key: None,
            network: Network::default(),
            provider_proxy_url: default_proxy_url(),
            gateway_url: default_proxy_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl fmt::Debug for SpheronSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpheronSettings")
            .field(
                "private_key",
                &self.private_key.as_ref().map(|_| "<redacted>"),
            )
            .field("network", &self.network)
            .field("provider_proxy_url", &self.provider_proxy_url)
            .field("gateway_url", &self.gateway_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl SpheronSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Lease renewal watchdog tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchdogSettings {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_redeploy_threshold_secs")]
    pub redeploy_threshold_secs: u64,
    #[serde(default = "default_tick_timeout_secs")]
    pub tick_timeout_secs: u64,
    /// Consecutive failed ticks before every further failure is raised as an alert
    #[serde(default = "default_alert_after_failures")]
    pub alert_after_failures: u32,
    /// Consecutive failed ticks after which the watchdog stops itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub give_up_after_failures: Option<u32>,
}

impl Default for WatchdogSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            redeploy_threshold_secs: default_redeploy_threshold_secs(),
            tick_timeout_secs: default_tick_timeout_secs(),
            alert_after_failures: default_alert_after_failures(),
            give_up_after_failures: None,
        }
    }
}

/// OpenAI-compatible endpoint used by the content extractor
#[derive(Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            api_key: None,
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

impl fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmSettings")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Where manifests and the deployment ledger are written
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default = "default_deployments_dir")]
    pub deployments_dir: PathBuf,
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,
    /// Image used when the extractor does not name one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_image: Option<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            deployments_dir: default_deployments_dir(),
            ledger_path: default_ledger_path(),
            default_image: None,
        }
    }
}

fn default_proxy_url() -> String {
    DEFAULT_PROVIDER_PROXY_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_secs() -> u64 {
    5 * 60
}

fn default_redeploy_threshold_secs() -> u64 {
    10 * 60
}

fn default_tick_timeout_secs() -> u64 {
    60
}

fn default_alert_after_failures() -> u32 {
    3
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    120
}

fn default_deployments_dir() -> PathBuf {
    PathBuf::from("deployments")
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("deployments.csv")
}

impl Settings {
    /// Load settings from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DeployError::SettingsNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            DeployError::invalid_config(format!("{}: {}", path.display(), e))
        })
    }

    /// Resolve settings for a run: explicit path, standard locations, or defaults,
    /// followed by environment overrides.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let mut settings = match explicit {
            Some(path) => Self::load(path)?,
            None => match find_settings_file() {
                Some(path) => {
                    tracing::debug!(path = %path.display(), "Loading settings file");
                    Self::load(path)?
                }
                None => Self::default(),
            },
        };
        settings.apply_env_overrides();
        Ok(settings)
    }

    /// Apply `SPHERON_*` environment overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup
    ///
    /// Empty values are ignored; invalid values are logged and ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("SPHERON_PRIVATE_KEY") {
            self.spheron.private_key = Some(key);
        }

        if let Some(network) = get("SPHERON_NETWORK") {
            match network.parse::<Network>() {
                Ok(network) => self.spheron.network = network,
                Err(e) => tracing::warn!(error = %e, "Ignoring SPHERON_NETWORK"),
            }
        }

        if let Some(url) = get("SPHERON_PROVIDER_PROXY_URL") {
            self.spheron.provider_proxy_url = url;
        }

        if let Some(url) = get("SPHERON_GATEWAY_URL") {
            self.spheron.gateway_url = url;
        }

        if let Some(api_key) = get("SPHERON_LLM_API_KEY") {
            self.llm.api_key = Some(api_key);
        }

        if let Some(model) = get("SPHERON_LLM_MODEL") {
            self.llm.model = model;
        }

        if let Some(url) = get("SPHERON_LLM_BASE_URL") {
            self.llm.base_url = url;
        }
    }

    /// Validate everything an action needs before it touches the network
    pub fn validate(&self) -> Result<()> {
        self.private_key()?;
        sanitize_base_url(&self.spheron.provider_proxy_url, "provider_proxy_url")?;
        sanitize_base_url(&self.spheron.gateway_url, "gateway_url")?;

        if self.spheron.request_timeout_secs == 0 {
            return Err(DeployError::invalid_config(
                "spheron.request_timeout_secs must be greater than zero",
            ));
        }
        if self.watchdog.poll_interval_secs == 0 {
            return Err(DeployError::invalid_config(
                "watchdog.poll_interval_secs must be greater than zero",
            ));
        }
        if self.watchdog.redeploy_threshold_secs == 0 {
            return Err(DeployError::invalid_config(
                "watchdog.redeploy_threshold_secs must be greater than zero",
            ));
        }
        if self.watchdog.tick_timeout_secs == 0 {
            return Err(DeployError::invalid_config(
                "watchdog.tick_timeout_secs must be greater than zero",
            ));
        }
        Ok(())
    }

    /// The validated deployment credential
    pub fn private_key(&self) -> Result<String> {
        let raw = self
            .spheron
            .private_key
            .as_deref()
            .ok_or_missing("SPHERON_PRIVATE_KEY")?;
        validate_private_key(raw)
    }
}

/// Find the settings file in standard locations
pub fn find_settings_file() -> Option<PathBuf> {
    if let Ok(cwd) = std::env::current_dir() {
        let path = cwd.join(SETTINGS_FILE_NAME);
        if path.exists() {
            return Some(path);
        }
    }

    if let Some(dir) = get_config_dir() {
        let path = dir.join("config.toml");
        if path.exists() {
            return Some(path);
        }
    }

    None
}

/// Get the configuration directory path
pub fn get_config_dir() -> Option<PathBuf> {
    if let Some(dir) = dirs::config_dir() {
        return Some(dir.join("spheron-agent"));
    }

    home::home_dir().map(|home| home.join(".config").join("spheron-agent"))
}
