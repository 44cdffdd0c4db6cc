//! Configuration validation.
//!
//! Checks config values before any data is read.

use crate::domain::error::FlowError;
use crate::domain::grouping::GroupBy;
use crate::ports::config_port::ConfigPort;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), FlowError> {
    validate_data_dir(config)?;
    validate_suffix(config)?;
    validate_group_by(config)?;
    validate_preview_rows(config)?;
    Ok(())
}

fn validate_data_dir(config: &dyn ConfigPort) -> Result<(), FlowError> {
    match config.get_string("data", "dir") {
        Some(s) if s.trim().is_empty() => Err(FlowError::ConfigInvalid {
            section: "data".to_string(),
            key: "dir".to_string(),
            reason: "dir must not be empty".to_string(),
        }),
        _ => Ok(()),
    }
}

fn validate_suffix(config: &dyn ConfigPort) -> Result<(), FlowError> {
    match config.get_string("data", "suffix") {
        Some(s) if s.trim().is_empty() => Err(FlowError::ConfigInvalid {
            section: "data".to_string(),
            key: "suffix".to_string(),
            reason: "suffix must not be empty".to_string(),
        }),
        _ => Ok(()),
    }
}

fn validate_group_by(config: &dyn ConfigPort) -> Result<(), FlowError> {
    if let Some(value) = config.get_string("features", "group_by") {
        value
            .parse::<GroupBy>()
            .map_err(|reason| FlowError::ConfigInvalid {
                section: "features".to_string(),
                key: "group_by".to_string(),
                reason,
            })?;
    }
    Ok(())
}

fn validate_preview_rows(config: &dyn ConfigPort) -> Result<(), FlowError> {
    let value = config.get_int("output", "preview_rows", 0);
    if value < 0 {
        return Err(FlowError::ConfigInvalid {
            section: "output".to_string(),
            key: "preview_rows".to_string(),
            reason: "preview_rows must be non-negative".to_string(),
        });
    }
    Ok(())
}
