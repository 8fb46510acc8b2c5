//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check default headers are valid on the wire
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>

use std::fmt;
use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue};

use crate::config::schema::AppConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Check `config` and collect every problem found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "server.request_timeout_secs",
            "must be greater than zero",
        ));
    }

    if config.client.timeout_secs == 0 {
        errors.push(ValidationError::new(
            "client.timeout_secs",
            "must be greater than zero",
        ));
    }

    for (name, value) in &config.client.default_headers {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::new(
                format!("client.default_headers.{}", name),
                "invalid header name",
            ));
        }
        if HeaderValue::from_str(value).is_err() {
            errors.push(ValidationError::new(
                format!("client.default_headers.{}", name),
                "invalid header value",
            ));
        }
    }

    if config.docs.enabled {
        if let Some(problem) = docs_path_problem(&config.docs.path) {
            errors.push(ValidationError::new("docs.path", problem));
        }
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "'{}' is not a socket address",
                config.observability.metrics_address
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// The docs endpoint is mounted as a static axum route, which rejects captures.
fn docs_path_problem(path: &str) -> Option<&'static str> {
    if !path.starts_with('/') {
        return Some("must start with '/'");
    }
    if path.contains(['{', '}']) {
        return Some("must not contain '{' or '}'");
    }
    if path
        .split('/')
        .any(|segment| segment.starts_with(':') || segment.starts_with('*'))
    {
        return Some("segments must not start with ':' or '*'");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&AppConfig::default()), Ok(()));
    }

    #[test]
    fn test_reports_every_error() {
        let mut config = AppConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.client.timeout_secs = 0;
        config.docs.path = "docs".into();
        config
            .client
            .default_headers
            .insert("bad header".into(), "ok".into());

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "client.timeout_secs",
                "client.default_headers.bad header",
                "docs.path",
            ]
        );
    }

    #[test]
    fn test_docs_path_ignored_when_disabled() {
        let mut config = AppConfig::default();
        config.docs.enabled = false;
        config.docs.path = String::new();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_docs_path_must_be_literal() {
        for path in ["/:docs", "/{x", "/api/{docs}", "/x}", "/files/*rest"] {
            let mut config = AppConfig::default();
            config.docs.path = path.into();

            let errors = validate_config(&config).unwrap_err();
            assert_eq!(errors.len(), 1, "{}", path);
            assert_eq!(errors[0].field, "docs.path");
        }

        let mut config = AppConfig::default();
        config.docs.path = "/api/v1/_docs".into();
        assert!(validate_config(&config).is_ok());
    }
}
