//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the matcher name against the built-in strategies
//! - Validate value ranges (weight within 0..=1)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::RouterConfig;
use crate::routing::builtin_registry;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("discovery.env must not be empty")]
    EmptyEnv,

    #[error("discovery.tag must not be empty when set")]
    EmptyTag,

    #[error("discovery.matcher {0:?} is not one of: {1}")]
    UnknownMatcher(String, String),

    #[error("discovery.weight {0} must be between 0 and 1")]
    WeightOutOfRange(f64),

    #[error("catalog.path must not be empty")]
    EmptyCatalogPath,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let discovery = &config.discovery;

    if discovery.env.trim().is_empty() {
        errors.push(ValidationError::EmptyEnv);
    }
    if discovery.tag.as_deref().is_some_and(|t| t.trim().is_empty()) {
        errors.push(ValidationError::EmptyTag);
    }
    let registry = builtin_registry();
    if registry.resolve(&discovery.matcher).is_err() {
        errors.push(ValidationError::UnknownMatcher(
            discovery.matcher.clone(),
            registry.names().join(", "),
        ));
    }
    if let Some(weight) = discovery.weight {
        if !(0.0..=1.0).contains(&weight) {
            errors.push(ValidationError::WeightOutOfRange(weight));
        }
    }
    if config.catalog.path.trim().is_empty() {
        errors.push(ValidationError::EmptyCatalogPath);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid() {
        let mut config = RouterConfig::default();
        config.discovery.env = "prod".into();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_all_errors_reported() {
        let mut config = RouterConfig::default();
        config.discovery.tag = Some(" ".into());
        config.discovery.matcher = "fuzzy".into();
        config.discovery.weight = Some(1.5);
        config.catalog.path = String::new();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::EmptyEnv,
                ValidationError::EmptyTag,
                ValidationError::UnknownMatcher("fuzzy".into(), "glob, iprefix, prefix, regex".into()),
                ValidationError::WeightOutOfRange(1.5),
                ValidationError::EmptyCatalogPath,
            ]
        );
    }
}
