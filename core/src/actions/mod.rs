//! User-facing actions
//!
//! Each action reports back through an [`ActionOutcome`] carrying the text
//! shown to the user. Rejections are outcomes; gateway failures are errors.

pub mod deploy;
pub mod perpetual;

pub use deploy::DeployAgentAction;
pub use perpetual::PerpetualDeploymentAction;

use crate::settings::Settings;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionOutcome {
    pub success: bool,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_id: Option<String>,
}

impl ActionOutcome {
    pub fn succeeded(text: impl Into<String>, deployment_id: Option<String>) -> Self {
        Self {
            success: true,
            text: text.into(),
            deployment_id,
        }
    }

    pub fn rejected(text: impl Into<String>) -> Self {
        Self {
            success: false,
            text: text.into(),
            deployment_id: None,
        }
    }
}

/// Actions only run with a usable deployment credential
pub(crate) fn has_credentials(settings: &Settings) -> bool {
    settings.private_key().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_must_be_present_and_usable() {
        let mut settings = Settings::default();
        assert!(!has_credentials(&settings));

        settings.spheron.private_key = Some("none".to_string());
        assert!(!has_credentials(&settings));

        settings.spheron.private_key = Some("0xabc".to_string());
        assert!(has_credentials(&settings));
    }
}
