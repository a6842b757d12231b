//! LATTICE Rules - Declared Rule Evaluation
//!
//! Runs a definition's validation rules against an instance payload.
//! External effects (function execution, API calls) go through the injected
//! `Capabilities` interface - the evaluator never performs I/O itself and
//! never retries; retry policy, if any, belongs to the capability.
//!
//! Rules execute in declaration order without short-circuiting, so a single
//! round trip reports every failure. Capability faults become rule failures,
//! not engine errors.

use async_trait::async_trait;
use lattice_core::path::lookup_path;
use lattice_core::result::ValidationResult;
use lattice_core::rule::{ApiDescriptor, RuleConfig, ValidationRule};
use lattice_core::CapabilityError;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

// ============================================================================
// CAPABILITY INTERFACE
// ============================================================================

/// Injected external-effect interface.
///
/// Owned by the hosting application; the engine only calls it. Calls may
/// block or be asynchronous - the evaluator awaits each one before
/// aggregating results.
#[async_trait]
pub trait Capabilities: Send + Sync {
    /// Run a registered named function against the payload.
    async fn run_function(&self, name: &str, payload: &Value) -> Result<Value, CapabilityError>;

    /// Call an external API described by the descriptor.
    async fn call_api(
        &self,
        descriptor: &ApiDescriptor,
        payload: &Value,
    ) -> Result<Value, CapabilityError>;
}

// ============================================================================
// RULE EVALUATOR
// ============================================================================

/// Evaluate every rule in declaration order, collecting all failures.
///
/// Pass criterion for function and api_call rules: the capability returns
/// JSON `true`. Any other value, or a `CapabilityError`, fails the rule -
/// attributed to the rule's name, never fatal.
pub async fn evaluate(
    rules: &[ValidationRule],
    payload: &Value,
    capabilities: &dyn Capabilities,
) -> ValidationResult {
    let mut result = ValidationResult::valid();

    for rule in rules {
        match &rule.config {
            RuleConfig::Regex { field, pattern } => {
                check_regex_rule(&rule.name, field, pattern, payload, &mut result);
            }
            RuleConfig::Function { function } => {
                match capabilities.run_function(function, payload).await {
                    Ok(value) => check_capability_verdict(&rule.name, &value, &mut result),
                    Err(err) => result.add_error(
                        rule.name.clone(),
                        format!("rule '{}' failed: {}", rule.name, err),
                    ),
                }
            }
            RuleConfig::ApiCall { descriptor } => {
                match capabilities.call_api(descriptor, payload).await {
                    Ok(value) => check_capability_verdict(&rule.name, &value, &mut result),
                    Err(err) => result.add_error(
                        rule.name.clone(),
                        format!("rule '{}' failed: {}", rule.name, err),
                    ),
                }
            }
        }
    }

    result
}

fn check_regex_rule(
    rule_name: &str,
    field: &str,
    pattern: &str,
    payload: &Value,
    result: &mut ValidationResult,
) {
    let regex = match Regex::new(pattern) {
        Ok(regex) => regex,
        // Save-time validation compiles every pattern; a definition that
        // bypassed it still degrades to a rule failure here.
        Err(err) => {
            result.add_error(field, format!("rule '{}' failed: {}", rule_name, err));
            return;
        }
    };

    match lookup_path(payload, field).and_then(Value::as_str) {
        Some(text) if regex.is_match(text) => {}
        Some(_) => result.add_error(
            field,
            format!("rule '{}' failed: value does not match pattern", rule_name),
        ),
        None => result.add_error(
            field,
            format!("rule '{}' failed: field missing or not a string", rule_name),
        ),
    }
}

fn check_capability_verdict(rule_name: &str, value: &Value, result: &mut ValidationResult) {
    if value != &Value::Bool(true) {
        result.add_error(
            rule_name,
            format!("rule '{}' failed: capability returned {}", rule_name, value),
        );
    }
}

// ============================================================================
// SCRIPTED CAPABILITIES (deterministic test double)
// ============================================================================

/// Deterministic capability double for tests and local evaluation.
///
/// Functions and endpoints answer from pre-scripted responses; anything not
/// scripted fails the way a real capability would.
#[derive(Debug, Default)]
pub struct ScriptedCapabilities {
    functions: HashMap<String, Result<Value, CapabilityError>>,
    endpoints: HashMap<String, Result<Value, CapabilityError>>,
}

impl ScriptedCapabilities {
    /// Create an empty script: every call fails as unregistered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a function response.
    pub fn with_function(mut self, name: impl Into<String>, response: Value) -> Self {
        self.functions.insert(name.into(), Ok(response));
        self
    }

    /// Script a function failure.
    pub fn with_function_error(mut self, name: impl Into<String>, error: CapabilityError) -> Self {
        self.functions.insert(name.into(), Err(error));
        self
    }

    /// Script an endpoint response, keyed by endpoint URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>, response: Value) -> Self {
        self.endpoints.insert(endpoint.into(), Ok(response));
        self
    }

    /// Script an endpoint failure, keyed by endpoint URL.
    pub fn with_endpoint_error(
        mut self,
        endpoint: impl Into<String>,
        error: CapabilityError,
    ) -> Self {
        self.endpoints.insert(endpoint.into(), Err(error));
        self
    }
}

#[async_trait]
impl Capabilities for ScriptedCapabilities {
    async fn run_function(&self, name: &str, _payload: &Value) -> Result<Value, CapabilityError> {
        match self.functions.get(name) {
            Some(response) => response.clone(),
            None => Err(CapabilityError::FunctionNotRegistered {
                name: name.to_string(),
            }),
        }
    }

    async fn call_api(
        &self,
        descriptor: &ApiDescriptor,
        _payload: &Value,
    ) -> Result<Value, CapabilityError> {
        match self.endpoints.get(&descriptor.endpoint) {
            Some(response) => response.clone(),
            None => Err(CapabilityError::CallFailed {
                reason: format!("no route to {}", descriptor.endpoint),
            }),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
