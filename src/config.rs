//! Sale price settings.
//!
//! The host persists five field names plus the site timezone. They arrive
//! either as the exported settings document (JSON) or as `SALEPRICE_*`
//! environment variables.

use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::str::FromStr;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const ENV_DISCOUNT_FIELD: &str = "SALEPRICE_DISCOUNT_FIELD";
pub const ENV_SALEPRICE_FIELD: &str = "SALEPRICE_SALEPRICE_FIELD";
pub const ENV_ON_SALE_FIELD: &str = "SALEPRICE_ON_SALE_FIELD";
pub const ENV_ON_SALE_FROM_FIELD: &str = "SALEPRICE_ON_SALE_FROM_FIELD";
pub const ENV_ON_SALE_UNTIL_FIELD: &str = "SALEPRICE_ON_SALE_UNTIL_FIELD";
pub const ENV_SITE_TIMEZONE: &str = "SALEPRICE_SITE_TIMEZONE";

const DEFAULT_SITE_TIMEZONE: &str = "UTC";

/// Field names configured for sale price evaluation.
///
/// `None` (or an empty string in the source document) disables the feature
/// the field drives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SalepriceSettings {
    pub discount_field: Option<String>,
    pub saleprice_field: Option<String>,
    pub on_sale_field: Option<String>,
    pub on_sale_from_field: Option<String>,
    pub on_sale_until_field: Option<String>,
    /// Used when a variation has no store
    pub site_timezone: String,
}

impl Default for SalepriceSettings {
    fn default() -> Self {
        Self {
            discount_field: None,
            saleprice_field: None,
            on_sale_field: None,
            on_sale_from_field: None,
            on_sale_until_field: None,
            site_timezone: DEFAULT_SITE_TIMEZONE.to_string(),
        }
    }
}

impl SalepriceSettings {
    /// Parse the exported settings document.
    pub fn from_json(document: &str) -> Result<Self, ConfigError> {
        let settings: SalepriceSettings = serde_json::from_str(document)?;
        Ok(settings.normalized())
    }

    /// Read settings from the process environment, loading `.env` first.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!("Failed to load .env file: {}", e);
            }
        }
        Ok(Self::from_vars(|key| env::var(key).ok()))
    }

    /// Read settings from a dotenv file without touching the process
    /// environment.
    pub fn from_env_file(path: &Path) -> Result<Self, ConfigError> {
        let vars = dotenvy::from_path_iter(path)?.collect::<Result<HashMap<_, _>, _>>()?;
        Ok(Self::from_vars(|key| vars.get(key).cloned()))
    }

    /// Build settings from any key lookup (environment, test map).
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            discount_field: read(ENV_DISCOUNT_FIELD),
            saleprice_field: read(ENV_SALEPRICE_FIELD),
            on_sale_field: read(ENV_ON_SALE_FIELD),
            on_sale_from_field: read(ENV_ON_SALE_FROM_FIELD),
            on_sale_until_field: read(ENV_ON_SALE_UNTIL_FIELD),
            site_timezone: read(ENV_SITE_TIMEZONE)
                .unwrap_or_else(|| DEFAULT_SITE_TIMEZONE.to_string()),
        }
        .normalized()
    }

    /// Trim names and turn blank ones into `None`.
    pub fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
        }

        let site_timezone = match self.site_timezone.trim() {
            "" => DEFAULT_SITE_TIMEZONE.to_string(),
            tz => tz.to_string(),
        };

        Self {
            discount_field: clean(self.discount_field),
            saleprice_field: clean(self.saleprice_field),
            on_sale_field: clean(self.on_sale_field),
            on_sale_from_field: clean(self.on_sale_from_field),
            on_sale_until_field: clean(self.on_sale_until_field),
            site_timezone,
        }
    }

    pub fn site_timezone(&self) -> Result<Tz, ConfigError> {
        Tz::from_str(&self.site_timezone)
            .map_err(|_| ConfigError::InvalidTimezone(self.site_timezone.clone()))
    }
}
