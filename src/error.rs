//! Error handling for sale price evaluation

use crate::saleprice::models::FieldKind;

/// Failure while evaluating a single product variation.
///
/// Absent configuration and empty fields are never errors; they switch the
/// corresponding gate off.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SalepriceError {
    #[error("Invalid timestamp in field '{field}': {value:?}")]
    InvalidTimestamp { field: String, value: String },

    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),

    #[error("Field '{field}' holds a {found} value, expected {expected}")]
    FieldTypeMismatch {
        field: String,
        expected: FieldKind,
        found: FieldKind,
    },

    #[error("Discount in field '{field}' must be between 0 and 100, got {value}")]
    DiscountOutOfRange { field: String, value: String },

    #[error("Currency mismatch: {left} vs {right}")]
    CurrencyMismatch { left: String, right: String },

    #[error("Amount out of range: {0}")]
    AmountOverflow(String),

    #[error("Unknown date format: {0}")]
    UnknownDateFormat(String),

    #[error("Invalid date format pattern: {0:?}")]
    InvalidDateFormat(String),
}

/// Failure while loading or validating settings
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Settings document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Setting '{setting}' names unknown field '{field}'")]
    UnknownField { setting: &'static str, field: String },

    #[error("Setting '{setting}' names field '{field}' of kind {found}, expected {expected}")]
    WrongFieldKind {
        setting: &'static str,
        field: String,
        expected: FieldKind,
        found: FieldKind,
    },

    #[error("Failed to read env file: {0}")]
    EnvFile(#[from] dotenvy::Error),

    #[error("Unknown site timezone: {0}")]
    InvalidTimezone(String),
}

pub type Result<T> = std::result::Result<T, SalepriceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_names_the_field() {
        let err = SalepriceError::InvalidTimestamp {
            field: "field_from".to_string(),
            value: "yesterday-ish".to_string(),
        };
        assert!(err.to_string().contains("field_from"));

        let err = SalepriceError::FieldTypeMismatch {
            field: "field_discount".to_string(),
            expected: FieldKind::Number,
            found: FieldKind::Text,
        };
        assert_eq!(
            err.to_string(),
            "Field 'field_discount' holds a text value, expected number"
        );
    }

    #[test]
    fn test_config_error_from_json() {
        let err: ConfigError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, ConfigError::Json(_)));
    }
}
