//! Input validation utilities.
//!
//! Common checks for command-line parameters and paths, returning structured
//! [`ShardError`](crate::errors::ShardError)s with consistent messages.

use std::fs;
use std::path::Path;

use crate::errors::{Result, ShardError};

/// Validate that a file exists.
///
/// ```
/// use samshard_lib::validation::validate_file_exists;
///
/// assert!(validate_file_exists("/nonexistent/file.sam", "Input SAM").is_err());
/// ```
pub fn validate_file_exists<P: AsRef<Path>>(path: P, description: &str) -> Result<()> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(ShardError::InvalidFileFormat {
            file_type: description.to_string(),
            path: path.display().to_string(),
            reason: "File does not exist".to_string(),
        });
    }
    Ok(())
}

/// Validate that a directory exists.
pub fn validate_dir_exists<P: AsRef<Path>>(path: P, description: &str) -> Result<()> {
    let path = path.as_ref();
    if !path.is_dir() {
        return Err(ShardError::InvalidFileFormat {
            file_type: description.to_string(),
            path: path.display().to_string(),
            reason: "Directory does not exist".to_string(),
        });
    }
    Ok(())
}

/// Validate that an integer parameter is at least one.
pub fn validate_positive(value: u64, name: &str) -> Result<()> {
    if value == 0 {
        return Err(ShardError::InvalidParameter {
            parameter: name.to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }
    Ok(())
}

/// Validate that the output-buffer slack factor is a finite number above one.
///
/// ```
/// use samshard_lib::validation::validate_slack_factor;
///
/// assert!(validate_slack_factor(1.05).is_ok());
/// assert!(validate_slack_factor(1.0).is_err());
/// ```
pub fn validate_slack_factor(value: f64) -> Result<()> {
    if !value.is_finite() || value <= 1.0 {
        return Err(ShardError::InvalidParameter {
            parameter: "slack-factor".to_string(),
            reason: format!("must be a finite value greater than 1, got {value}"),
        });
    }
    Ok(())
}

/// Ensures `path` is a usable output directory, creating it (and parents) when missing.
///
/// A path that exists but is not a directory is fatal.
pub fn prepare_output_dir<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        if !path.is_dir() {
            return Err(ShardError::NotADirectory { path: path.to_path_buf() });
        }
        return Ok(());
    }
    fs::create_dir_all(path)?;
    Ok(())
}

/// Parses a byte size with an optional binary suffix (`K`, `M`, `G`, with or without `B`).
///
/// Used as a clap `value_parser`.
///
/// ```
/// use samshard_lib::validation::parse_byte_size;
///
/// assert_eq!(parse_byte_size("512K").unwrap(), 512 * 1024);
/// assert_eq!(parse_byte_size("64M").unwrap(), 64 * 1024 * 1024);
/// assert_eq!(parse_byte_size("1000").unwrap(), 1000);
/// assert!(parse_byte_size("lots").is_err());
/// ```
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn parse_byte_size(s: &str) -> std::result::Result<u64, String> {
    let upper = s.trim().to_uppercase();
    if upper.is_empty() {
        return Err("Empty size value".to_string());
    }
    let trimmed = upper.strip_suffix('B').unwrap_or(&upper);
    let (digits, multiplier) = match trimmed.chars().last() {
        Some('K') => (&trimmed[..trimmed.len() - 1], 1u64 << 10),
        Some('M') => (&trimmed[..trimmed.len() - 1], 1u64 << 20),
        Some('G') => (&trimmed[..trimmed.len() - 1], 1u64 << 30),
        _ => (trimmed, 1),
    };
    let value: f64 = digits.trim().parse().map_err(|_| format!("Invalid size: '{s}'"))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("Invalid size: '{s}'"));
    }
    Ok((value * multiplier as f64) as u64)
}
