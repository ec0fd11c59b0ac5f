//! Shared validation helpers for credentials and endpoint URLs

use crate::error::{DeployError, Result};
use std::time::Duration;

/// Sanitize a string value for safe use in HTTP headers
///
/// Header values cannot contain control characters, DEL, or line breaks.
pub fn sanitize_for_header(value: &str, field_name: &str) -> Result<String> {
    if value.is_empty() {
        return Err(DeployError::invalid_config(format!(
            "{} cannot be empty",
            field_name
        )));
    }

    for (index, ch) in value.char_indices() {
        if ch.is_control() || ch == '\u{7f}' {
            return Err(DeployError::invalid_config(format!(
                "{} contains invalid character at position {} ({:#06x}). \
                Control characters, newlines, carriage returns, and null bytes are not allowed.",
                field_name, index, ch as u32
            )));
        }
    }

    Ok(value.to_string())
}

/// Validate the deployment credential can be carried in an Authorization header
///
/// Blank values and the literal `none` count as missing.
pub fn validate_private_key(private_key: &str) -> Result<String> {
    let trimmed = private_key.trim();

    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        return Err(DeployError::MissingConfig {
            key: "SPHERON_PRIVATE_KEY".to_string(),
        });
    }

    sanitize_for_header(trimmed, "SPHERON_PRIVATE_KEY")?;

    let header_value = format!("Bearer {}", trimmed);
    header_value
        .parse::<reqwest::header::HeaderValue>()
        .map_err(|e| {
            DeployError::invalid_config(format!(
                "SPHERON_PRIVATE_KEY results in an invalid Authorization header ({} characters): {}",
                trimmed.len(),
                e
            ))
        })?;

    Ok(trimmed.to_string())
}

/// Sanitize a base URL for API requests
///
/// Rejects double-encoded values and anything that is not http(s).
pub fn sanitize_base_url(url: &str, field_name: &str) -> Result<String> {
    let trimmed = url.trim();

    if trimmed.is_empty() {
        return Err(DeployError::invalid_config(format!(
            "{} cannot be empty",
            field_name
        )));
    }

    if trimmed.contains("%2F") || trimmed.contains("%3D") || trimmed.contains("%20") {
        return Err(DeployError::invalid_config(format!(
            "{} appears to contain URL-encoded characters (e.g., %2F, %3D, %20). \
            Please verify the URL is not double-encoded.",
            field_name
        )));
    }

    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        return Err(DeployError::invalid_config(format!(
            "{} must start with 'http://' or 'https://'. Got: {}",
            field_name, trimmed
        )));
    }

    Ok(trimmed.trim_end_matches('/').to_string())
}

/// "5 minutes", "1 hour", "90 seconds"
pub fn describe_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (count, unit) = if secs >= 3600 && secs % 3600 == 0 {
        (secs / 3600, "hour")
    } else if secs >= 60 && secs % 60 == 0 {
        (secs / 60, "minute")
    } else {
        (secs, "second")
    };
    if count == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", count, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_for_header_invalid() {
        assert!(sanitize_for_header("abc123", "test").is_ok());
        assert!(sanitize_for_header("abc\n123", "test").is_err());
        assert!(sanitize_for_header("abc\r123", "test").is_err());
        assert!(sanitize_for_header("abc\x00123", "test").is_err());
        assert!(sanitize_for_header("abc\x7f123", "test").is_err());
    }

    #[test]
    fn test_validate_private_key() {
        assert_eq!(validate_private_key("  0xabc123 ").unwrap(), "0xabc123");
        assert!(matches!(
            validate_private_key(""),
            Err(DeployError::MissingConfig { .. })
        ));
        assert!(matches!(
            validate_private_key("NONE"),
            Err(DeployError::MissingConfig { .. })
        ));
        assert!(validate_private_key("0xab\ncd").is_err());
    }

    #[test]
    fn test_sanitize_base_url() {
        assert_eq!(
            sanitize_base_url("http://localhost:3040/", "url").unwrap(),
            "http://localhost:3040"
        );
        assert!(sanitize_base_url("", "url").is_err());
        assert!(sanitize_base_url("localhost:3040", "url").is_err());
        assert!(sanitize_base_url("https://api.example%2Fcom", "url").is_err());
    }

    #[test]
    fn durations_read_naturally() {
        assert_eq!(describe_duration(Duration::from_secs(300)), "5 minutes");
        assert_eq!(describe_duration(Duration::from_secs(60)), "1 minute");
        assert_eq!(describe_duration(Duration::from_secs(7200)), "2 hours");
        assert_eq!(describe_duration(Duration::from_secs(90)), "90 seconds");
    }
}
