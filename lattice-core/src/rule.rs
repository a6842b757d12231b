//! Declared validation rules.
//!
//! A rule's config shape is tied to its type by construction (tagged enum),
//! so a regex rule can never carry an endpoint descriptor. What remains to
//! check at definition-save time is the content: patterns must compile,
//! names and endpoints must be non-empty. Evaluation never re-checks these.

use crate::error::DefinitionError;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Endpoint descriptor for api_call rules.
///
/// Passed opaque to the capability; the engine performs no network I/O.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ApiDescriptor {
    pub endpoint: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<i64>,
}

impl ApiDescriptor {
    /// Create a descriptor with no timeout hint.
    pub fn new(endpoint: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: method.into(),
            timeout_ms: None,
        }
    }
}

/// Type-specific rule parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleConfig {
    /// Payload value at `field` (dot-notation) must match `pattern`.
    Regex { field: String, pattern: String },
    /// Delegate to `Capabilities::run_function` with the named function.
    Function { function: String },
    /// Delegate to `Capabilities::call_api` with the descriptor.
    ApiCall { descriptor: ApiDescriptor },
}

impl RuleConfig {
    /// Rule type name as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            RuleConfig::Regex { .. } => "regex",
            RuleConfig::Function { .. } => "function",
            RuleConfig::ApiCall { .. } => "api_call",
        }
    }
}

/// A declared validation rule, unique by name within its definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ValidationRule {
    pub name: String,
    #[serde(flatten)]
    pub config: RuleConfig,
}

impl ValidationRule {
    /// Create a regex rule.
    pub fn regex(
        name: impl Into<String>,
        field: impl Into<String>,
        pattern: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            config: RuleConfig::Regex {
                field: field.into(),
                pattern: pattern.into(),
            },
        }
    }

    /// Create a function rule.
    pub fn function(name: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: RuleConfig::Function {
                function: function.into(),
            },
        }
    }

    /// Create an api_call rule.
    pub fn api_call(name: impl Into<String>, descriptor: ApiDescriptor) -> Self {
        Self {
            name: name.into(),
            config: RuleConfig::ApiCall { descriptor },
        }
    }

    /// Check the config content. Called at definition-save time.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        let invalid = |reason: String| DefinitionError::InvalidRuleConfig {
            rule: self.name.clone(),
            reason,
        };

        if self.name.is_empty() {
            return Err(DefinitionError::InvalidRuleConfig {
                rule: "<unnamed>".to_string(),
                reason: "rule name must not be empty".to_string(),
            });
        }

        match &self.config {
            RuleConfig::Regex { field, pattern } => {
                if field.is_empty() {
                    return Err(invalid("regex field must not be empty".to_string()));
                }
                Regex::new(pattern)
                    .map_err(|e| invalid(format!("pattern does not compile: {}", e)))?;
            }
            RuleConfig::Function { function } => {
                if function.is_empty() {
                    return Err(invalid("function name must not be empty".to_string()));
                }
            }
            RuleConfig::ApiCall { descriptor } => {
                if descriptor.endpoint.is_empty() {
                    return Err(invalid("endpoint must not be empty".to_string()));
                }
                if descriptor.method.is_empty() {
                    return Err(invalid("method must not be empty".to_string()));
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regex_rule_valid() {
        let rule = ValidationRule::regex("email_format", "email", r"^[^@\s]+@[^@\s]+$");
        assert!(rule.validate().is_ok());
    }

    #[test]
    fn test_regex_rule_bad_pattern_rejected() {
        let rule = ValidationRule::regex("broken", "email", "([unclosed");
        let err = rule.validate().unwrap_err();
        assert!(matches!(err, DefinitionError::InvalidRuleConfig { .. }));
        assert!(format!("{}", err).contains("broken"));
    }

    #[test]
    fn test_regex_rule_empty_field_rejected() {
        let rule = ValidationRule::regex("r", "", ".*");
        assert!(rule.validate().is_err());
    }

    #[test]
    fn test_function_rule_empty_name_rejected() {
        let rule = ValidationRule::function("r", "");
        assert!(rule.validate().is_err());
    }

    #[test]
    fn test_api_call_rule_empty_endpoint_rejected() {
        let rule = ValidationRule::api_call("r", ApiDescriptor::new("", "POST"));
        assert!(rule.validate().is_err());
    }

    #[test]
    fn test_empty_rule_name_rejected() {
        let rule = ValidationRule::function("", "check");
        assert!(rule.validate().is_err());
    }

    #[test]
    fn test_rule_config_wire_format() {
        let rule = ValidationRule::regex("email_format", "email", ".+");
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["name"], "email_format");
        assert_eq!(json["type"], "regex");
        assert_eq!(json["field"], "email");

        let api = ValidationRule::api_call(
            "credit_check",
            ApiDescriptor::new("https://risk.internal/check", "POST"),
        );
        let json = serde_json::to_value(&api).unwrap();
        assert_eq!(json["type"], "api_call");
        assert_eq!(json["descriptor"]["method"], "POST");
    }

    #[test]
    fn test_rule_kinds() {
        assert_eq!(ValidationRule::function("r", "f").config.kind(), "function");
        assert_eq!(ValidationRule::regex("r", "f", ".*").config.kind(), "regex");
    }
}
