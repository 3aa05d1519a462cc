use thiserror::Error;

/// Rejected grid configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },

    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },
}

pub type Result<T, E = ConfigError> = std::result::Result<T, E>;

/// Checks that a length-like setting is finite and non-negative.
pub(crate) fn check_length(field: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(ConfigError::NonFinite { field });
    }
    if value < 0.0 {
        return Err(ConfigError::Negative { field, value });
    }
    Ok(())
}
