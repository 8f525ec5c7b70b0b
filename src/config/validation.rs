//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (root page > 0, timeouts > 0, addresses parse)
//! - Reject slash options the decoder would silently ignore
//! - Detect parameter sets that could never consume a segment
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DecoderConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::DecoderConfig;
use crate::decoder::slash::SlashOptions;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("path_cache.root_page_id must be greater than 0")]
    ZeroRootPage,

    #[error("invalid bind address: {0}")]
    BindAddress(String),

    #[error("timeouts.request_secs must be greater than 0")]
    ZeroTimeout,

    #[error("unrecognized append_missing_slash option: {0}")]
    SlashOption(String),

    #[error("parameter set name must not be empty")]
    EmptyParameterSetName,

    #[error("parameter set '{0}' declares no variables")]
    EmptyParameterSet(String),

    #[error("space_character must be ASCII punctuation, got {0:?}")]
    SpaceCharacter(char),
}

/// Check a configuration for semantic errors.
pub fn validate_config(config: &DecoderConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.path_cache.root_page_id == 0 {
        errors.push(ValidationError::ZeroRootPage);
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    let (_, unknown) = SlashOptions::parse(&config.init.append_missing_slash);
    errors.extend(unknown.into_iter().map(ValidationError::SlashOption));

    for (name, set) in &config.parameter_sets {
        if name.trim().is_empty() {
            errors.push(ValidationError::EmptyParameterSetName);
        } else if set.variables.is_empty() {
            errors.push(ValidationError::EmptyParameterSet(name.clone()));
        }
    }

    let space = config.init.space_character;
    if !space.is_ascii_punctuation() {
        errors.push(ValidationError::SpaceCharacter(space));
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
    use crate::config::schema::ParameterSetConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&DecoderConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = DecoderConfig::default();
        config.path_cache.root_page_id = 0;
        config.init.append_missing_slash = "redirect[308], ifNotFile".to_string();
        config
            .parameter_sets
            .insert("article".to_string(), ParameterSetConfig::default());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::ZeroRootPage,
                ValidationError::SlashOption("redirect[308]".to_string()),
                ValidationError::EmptyParameterSet("article".to_string()),
            ]
        );
    }

    #[test]
    fn test_rejects_alphanumeric_space_character() {
        let mut config = DecoderConfig::default();
        config.init.space_character = 'x';
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::SpaceCharacter('x')]);
    }
}
