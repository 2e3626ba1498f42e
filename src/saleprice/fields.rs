//! Typed access to the configured sale fields.
//!
//! Settings only carry field names. `SaleFields` checks those names against
//! the variation type's field definitions once, then reads values with the
//! expected kind on every evaluation.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;

use crate::config::SalepriceSettings;
use crate::error::{ConfigError, Result, SalepriceError};

use super::models::{FieldKind, FieldValue, Price, ProductVariation};

/// Storage format of datetime fields (always UTC)
pub const STORAGE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
/// Storage format of date-only fields
pub const DATE_STORAGE_FORMAT: &str = "%Y-%m-%d";

/// Field definitions of a product variation type
#[derive(Debug, Clone, Default)]
pub struct FieldSchema {
    fields: BTreeMap<String, FieldKind>,
}

impl FieldSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.insert(name.into(), kind);
        self
    }

    pub fn kind_of(&self, name: &str) -> Option<FieldKind> {
        self.fields.get(name).copied()
    }
}

/// Validated field names, one per sale setting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaleFields {
    discount: Option<String>,
    saleprice: Option<String>,
    on_sale: Option<String>,
    on_sale_from: Option<String>,
    on_sale_until: Option<String>,
}

impl SaleFields {
    /// Check every configured name against the schema.
    pub fn from_settings(
        settings: &SalepriceSettings,
        schema: &FieldSchema,
    ) -> std::result::Result<Self, ConfigError> {
        let settings = settings.clone().normalized();

        let check = |setting: &'static str,
                     name: Option<String>,
                     expected: FieldKind|
         -> std::result::Result<Option<String>, ConfigError> {
            let Some(name) = name else {
                return Ok(None);
            };
            match schema.kind_of(&name) {
                None => Err(ConfigError::UnknownField {
                    setting,
                    field: name,
                }),
                Some(found) if found != expected => Err(ConfigError::WrongFieldKind {
                    setting,
                    field: name,
                    expected,
                    found,
                }),
                Some(_) => Ok(Some(name)),
            }
        };

        Ok(Self {
            discount: check("discount_field", settings.discount_field, FieldKind::Number)?,
            saleprice: check("saleprice_field", settings.saleprice_field, FieldKind::Price)?,
            on_sale: check("on_sale_field", settings.on_sale_field, FieldKind::Boolean)?,
            on_sale_from: check(
                "on_sale_from_field",
                settings.on_sale_from_field,
                FieldKind::Timestamp,
            )?,
            on_sale_until: check(
                "on_sale_until_field",
                settings.on_sale_until_field,
                FieldKind::Timestamp,
            )?,
        })
    }

    /// Take the names as given, for hosts without field definitions.
    ///
    /// Kinds are still enforced when values are read.
    pub fn from_names(settings: &SalepriceSettings) -> Self {
        let settings = settings.clone().normalized();
        Self {
            discount: settings.discount_field,
            saleprice: settings.saleprice_field,
            on_sale: settings.on_sale_field,
            on_sale_from: settings.on_sale_from_field,
            on_sale_until: settings.on_sale_until_field,
        }
    }

    pub fn discount_field(&self) -> Option<&str> {
        self.discount.as_deref()
    }

    pub fn saleprice_field(&self) -> Option<&str> {
        self.saleprice.as_deref()
    }

    pub fn on_sale_field(&self) -> Option<&str> {
        self.on_sale.as_deref()
    }

    pub fn on_sale_from_field(&self) -> Option<&str> {
        self.on_sale_from.as_deref()
    }

    pub fn on_sale_until_field(&self) -> Option<&str> {
        self.on_sale_until.as_deref()
    }

    /// Whether a discount or a sale price is configured and filled in.
    pub fn has_price_source(&self, variation: &ProductVariation) -> bool {
        let filled = |name: Option<&str>| name.and_then(|n| variation.field(n)).is_some();
        filled(self.discount_field()) || filled(self.saleprice_field())
    }

    /// Discount percentage, if configured and filled in.
    pub fn discount(&self, variation: &ProductVariation) -> Result<Option<Decimal>> {
        let Some((name, value)) = lookup(variation, self.discount_field()) else {
            return Ok(None);
        };
        match value {
            FieldValue::Number(number) => Ok(Some(*number)),
            other => Err(mismatch(name, FieldKind::Number, other)),
        }
    }

    /// Absolute sale price, if configured and filled in.
    pub fn saleprice(&self, variation: &ProductVariation) -> Result<Option<Price>> {
        let Some((name, value)) = lookup(variation, self.saleprice_field()) else {
            return Ok(None);
        };
        match value {
            FieldValue::Price(price) => Ok(Some(price.clone())),
            other => Err(mismatch(name, FieldKind::Price, other)),
        }
    }

    /// `None` when no flag field is configured, otherwise whether it is set.
    ///
    /// An empty flag field counts as unchecked.
    pub fn on_sale_flag(&self, variation: &ProductVariation) -> Option<bool> {
        let name = self.on_sale_field()?;
        Some(
            variation
                .field(name)
                .map(FieldValue::is_truthy)
                .unwrap_or(false),
        )
    }

    pub fn on_sale_from(&self, variation: &ProductVariation) -> Result<Option<DateTime<Utc>>> {
        timestamp(variation, self.on_sale_from_field())
    }

    pub fn on_sale_until(&self, variation: &ProductVariation) -> Result<Option<DateTime<Utc>>> {
        timestamp(variation, self.on_sale_until_field())
    }
}

fn lookup<'a>(
    variation: &'a ProductVariation,
    name: Option<&'a str>,
) -> Option<(&'a str, &'a FieldValue)> {
    let name = name?;
    variation.field(name).map(|value| (name, value))
}

fn mismatch(field: &str, expected: FieldKind, found: &FieldValue) -> SalepriceError {
    SalepriceError::FieldTypeMismatch {
        field: field.to_string(),
        expected,
        found: found.kind(),
    }
}

fn timestamp(variation: &ProductVariation, name: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    let Some((name, value)) = lookup(variation, name) else {
        return Ok(None);
    };
    match value {
        FieldValue::Timestamp(raw) => parse_storage_timestamp(name, raw).map(Some),
        other => Err(mismatch(name, FieldKind::Timestamp, other)),
    }
}

/// Parse a stored datetime value as a UTC instant.
///
/// Accepts the datetime storage format, date-only values (midnight UTC) and
/// RFC 3339.
pub fn parse_storage_timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, STORAGE_FORMAT) {
        return Ok(naive.and_utc());
    }

    if let Some(naive) = NaiveDate::parse_from_str(raw, DATE_STORAGE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(naive.and_utc());
    }

    DateTime::parse_from_rfc3339(raw)
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|_| SalepriceError::InvalidTimestamp {
            field: field.to_string(),
            value: raw.to_string(),
        })
}
