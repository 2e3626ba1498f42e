//! Sale eligibility service.
//!
//! Decides whether a variation is on sale at a given instant and exposes the
//! sale window for display. Everything here is a pure function of the
//! variation, the validated fields and the instant passed in.

use std::fmt::Write;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::config::SalepriceSettings;
use crate::error::{ConfigError, Result, SalepriceError};

use super::fields::{FieldSchema, SaleFields};
use super::models::ProductVariation;

/// Sale window bounds in a concrete timezone
#[derive(Debug, Clone, PartialEq)]
pub struct SaleWindow {
    pub from: Option<DateTime<Tz>>,
    pub until: Option<DateTime<Tz>>,
}

impl SaleWindow {
    /// Express the same instants in another timezone.
    pub fn with_timezone(&self, tz: Tz) -> SaleWindow {
        SaleWindow {
            from: self.from.map(|instant| instant.with_timezone(&tz)),
            until: self.until.map(|instant| instant.with_timezone(&tz)),
        }
    }

    /// Render both bounds with a strftime pattern.
    pub fn format(&self, pattern: &str) -> Result<FormattedWindow> {
        Ok(FormattedWindow {
            from: self
                .from
                .as_ref()
                .map(|instant| format_instant(instant, pattern))
                .transpose()?,
            until: self
                .until
                .as_ref()
                .map(|instant| format_instant(instant, pattern))
                .transpose()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedWindow {
    pub from: Option<String>,
    pub until: Option<String>,
}

/// Eligibility plus the window that made it so
#[derive(Debug, Clone, PartialEq)]
pub struct SaleStatus {
    pub on_sale: bool,
    /// Only set when `on_sale` is true
    pub window: Option<SaleWindow>,
}

/// Decides sale eligibility for product variations
#[derive(Debug, Clone)]
pub struct SalepriceService {
    fields: SaleFields,
    site_timezone: Tz,
}

impl SalepriceService {
    pub fn new(fields: SaleFields, site_timezone: Tz) -> Self {
        Self {
            fields,
            site_timezone,
        }
    }

    /// Validate settings against the variation type's fields and build the
    /// service.
    pub fn from_settings(
        settings: &SalepriceSettings,
        schema: &FieldSchema,
    ) -> std::result::Result<Self, ConfigError> {
        let fields = SaleFields::from_settings(settings, schema)?;
        Ok(Self::new(fields, settings.site_timezone()?))
    }

    pub fn fields(&self) -> &SaleFields {
        &self.fields
    }

    pub fn site_timezone(&self) -> Tz {
        self.site_timezone
    }

    /// Timezone of the variation's canonical store, or the site timezone
    /// when it has no store.
    pub fn store_timezone(&self, variation: &ProductVariation) -> Result<Tz> {
        match variation.canonical_store() {
            Some(store) => parse_timezone(&store.timezone),
            None => Ok(self.site_timezone),
        }
    }

    /// Check whether the variation is on sale at `now`.
    ///
    /// Gates run in order and the first one that fails decides:
    /// 1. a discount or sale price must be configured and filled in
    /// 2. a configured "on sale" flag must be set
    /// 3. `now` must be strictly after a configured start
    /// 4. `now` must not be after a configured end
    pub fn is_on_sale(&self, variation: &ProductVariation, now: DateTime<Utc>) -> Result<bool> {
        if !self.fields.has_price_source(variation) {
            debug!("Variation {} not on sale: no discount or sale price", variation.id);
            return Ok(false);
        }

        if self.fields.on_sale_flag(variation) == Some(false) {
            debug!("Variation {} not on sale: flag unchecked", variation.id);
            return Ok(false);
        }

        if let Some(from) = self.fields.on_sale_from(variation)? {
            let tz = self.store_timezone(variation)?;
            if now.with_timezone(&tz) <= from.with_timezone(&tz) {
                debug!("Variation {} not on sale: starts {}", variation.id, from);
                return Ok(false);
            }
        }

        if let Some(until) = self.fields.on_sale_until(variation)? {
            let tz = self.store_timezone(variation)?;
            if now.with_timezone(&tz) > until.with_timezone(&tz) {
                debug!("Variation {} not on sale: ended {}", variation.id, until);
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Sale window in the store timezone, `None` when not on sale.
    pub fn sale_window(
        &self,
        variation: &ProductVariation,
        now: DateTime<Utc>,
    ) -> Result<Option<SaleWindow>> {
        Ok(self.evaluate(variation, now)?.window)
    }

    /// Eligibility and window in one pass.
    pub fn evaluate(&self, variation: &ProductVariation, now: DateTime<Utc>) -> Result<SaleStatus> {
        if !self.is_on_sale(variation, now)? {
            return Ok(SaleStatus {
                on_sale: false,
                window: None,
            });
        }

        let tz = self.store_timezone(variation)?;
        let window = SaleWindow {
            from: self
                .fields
                .on_sale_from(variation)?
                .map(|instant| instant.with_timezone(&tz)),
            until: self
                .fields
                .on_sale_until(variation)?
                .map(|instant| instant.with_timezone(&tz)),
        };

        Ok(SaleStatus {
            on_sale: true,
            window: Some(window),
        })
    }
}

pub(crate) fn parse_timezone(name: &str) -> Result<Tz> {
    Tz::from_str(name.trim()).map_err(|_| SalepriceError::InvalidTimezone(name.to_string()))
}

fn format_instant(instant: &DateTime<Tz>, pattern: &str) -> Result<String> {
    let mut rendered = String::new();
    write!(rendered, "{}", instant.format(pattern))
        .map_err(|_| SalepriceError::InvalidDateFormat(pattern.to_string()))?;
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::saleprice::models::{FieldKind, FieldValue, Price, Store};
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap()
    }

    fn service(settings: SalepriceSettings) -> SalepriceService {
        SalepriceService::new(SaleFields::from_names(&settings), chrono_tz::UTC)
    }

    fn all_fields() -> SalepriceSettings {
        SalepriceSettings {
            discount_field: Some("field_discount".to_string()),
            saleprice_field: Some("field_saleprice".to_string()),
            on_sale_field: Some("field_on_sale".to_string()),
            on_sale_from_field: Some("field_from".to_string()),
            on_sale_until_field: Some("field_until".to_string()),
            ..SalepriceSettings::default()
        }
    }

    fn discounted() -> ProductVariation {
        ProductVariation::new("v1", Price::new(dec!(100.00), "USD"))
            .with_field("field_discount", FieldValue::Number(dec!(25)))
            .with_field("field_on_sale", FieldValue::Boolean(true))
    }

    fn storage(instant: DateTime<Utc>) -> FieldValue {
        FieldValue::Timestamp(instant.format("%Y-%m-%dT%H:%M:%S").to_string())
    }

    // ==================== presence gate ====================

    #[test]
    fn test_not_on_sale_without_price_source() {
        let service = service(all_fields());
        let variation = ProductVariation::new("v1", Price::new(dec!(100.00), "USD"))
            .with_field("field_on_sale", FieldValue::Boolean(true))
            .with_field("field_from", storage(noon() - Duration::days(1)))
            .with_field("field_until", storage(noon() + Duration::days(1)));

        assert!(!service.is_on_sale(&variation, noon()).unwrap());
    }

    #[test]
    fn test_presence_gate_short_circuits_malformed_window() {
        let service = service(all_fields());
        let variation = ProductVariation::new("v1", Price::new(dec!(100.00), "USD"))
            .with_field("field_from", FieldValue::Timestamp("garbage".to_string()));

        assert!(!service.is_on_sale(&variation, noon()).unwrap());
    }

    #[test]
    fn test_nothing_configured_is_never_on_sale() {
        let service = service(SalepriceSettings::default());
        assert!(!service.is_on_sale(&discounted(), noon()).unwrap());
    }

    // ==================== flag gate ====================

    #[test]
    fn test_unchecked_flag_blocks_sale() {
        let service = service(all_fields());
        let variation = discounted().with_field("field_on_sale", FieldValue::Boolean(false));
        assert!(!service.is_on_sale(&variation, noon()).unwrap());
    }

    #[test]
    fn test_missing_flag_value_blocks_sale() {
        let service = service(all_fields());
        let mut variation = discounted();
        variation.fields.remove("field_on_sale");
        assert!(!service.is_on_sale(&variation, noon()).unwrap());
    }

    #[test]
    fn test_flag_not_configured_is_ignored() {
        let service = service(SalepriceSettings {
            discount_field: Some("field_discount".to_string()),
            ..SalepriceSettings::default()
        });
        let variation = discounted().with_field("field_on_sale", FieldValue::Boolean(false));
        assert!(service.is_on_sale(&variation, noon()).unwrap());
    }

    // ==================== window gates ====================

    #[test]
    fn test_window_start_is_exclusive() {
        let service = service(all_fields());
        let variation = discounted().with_field("field_from", storage(noon()));

        assert!(!service.is_on_sale(&variation, noon()).unwrap());
        assert!(service
            .is_on_sale(&variation, noon() + Duration::seconds(1))
            .unwrap());
    }

    #[test]
    fn test_window_end_is_inclusive() {
        let service = service(all_fields());
        let variation = discounted().with_field("field_until", storage(noon()));

        assert!(service.is_on_sale(&variation, noon()).unwrap());
        assert!(!service
            .is_on_sale(&variation, noon() + Duration::seconds(1))
            .unwrap());
    }

    #[test]
    fn test_inside_window() {
        let service = service(all_fields());
        let variation = discounted()
            .with_field("field_from", storage(noon() - Duration::hours(1)))
            .with_field("field_until", storage(noon() + Duration::hours(1)));
        assert!(service.is_on_sale(&variation, noon()).unwrap());
    }

    #[test]
    fn test_malformed_window_is_an_error() {
        let service = service(all_fields());
        let variation =
            discounted().with_field("field_until", FieldValue::Timestamp("31/12/2026".to_string()));

        let err = service.is_on_sale(&variation, noon()).unwrap_err();
        assert!(matches!(err, SalepriceError::InvalidTimestamp { ref field, .. } if field == "field_until"));
    }

    #[test]
    fn test_invalid_store_timezone_is_an_error() {
        let service = service(all_fields());
        let variation = discounted()
            .with_field("field_from", storage(noon() - Duration::hours(1)))
            .with_store(Store::new("1", "Nowhere/Special"));

        let err = service.is_on_sale(&variation, noon()).unwrap_err();
        assert_eq!(err, SalepriceError::InvalidTimezone("Nowhere/Special".to_string()));
    }

    #[test]
    fn test_store_timezone_does_not_shift_instants() {
        let service = service(all_fields());
        let variation = discounted()
            .with_field("field_from", storage(noon()))
            .with_store(Store::new("1", "Pacific/Auckland"));

        assert!(!service.is_on_sale(&variation, noon()).unwrap());
        assert!(service
            .is_on_sale(&variation, noon() + Duration::minutes(1))
            .unwrap());
    }

    // ==================== timezone resolution ====================

    #[test]
    fn test_store_timezone_falls_back_to_site() {
        let service = SalepriceService::new(
            SaleFields::from_names(&all_fields()),
            chrono_tz::America::Cancun,
        );
        assert_eq!(
            service.store_timezone(&discounted()).unwrap(),
            chrono_tz::America::Cancun
        );

        let variation = discounted()
            .with_store(Store::new("b", "Asia/Tokyo"))
            .with_store(Store::new("a", "Europe/Paris"));
        assert_eq!(
            service.store_timezone(&variation).unwrap(),
            chrono_tz::Europe::Paris
        );
    }

    // ==================== window accessor ====================

    #[test]
    fn test_sale_window_in_store_timezone() {
        let service = service(all_fields());
        let variation = discounted()
            .with_field("field_from", FieldValue::Timestamp("2026-06-01T00:00:00".to_string()))
            .with_store(Store::new("1", "America/New_York"));

        let window = service.sale_window(&variation, noon()).unwrap().unwrap();
        let from = window.from.unwrap();
        assert_eq!(from.timezone(), chrono_tz::America::New_York);
        assert_eq!(from.format("%Y-%m-%d %H:%M").to_string(), "2026-05-31 20:00");
        assert!(window.until.is_none());
    }

    #[test]
    fn test_sale_window_absent_when_not_on_sale() {
        let service = service(all_fields());
        let variation = discounted().with_field("field_from", storage(noon() + Duration::days(1)));
        assert_eq!(service.sale_window(&variation, noon()).unwrap(), None);
    }

    #[test]
    fn test_window_format() {
        let window = SaleWindow {
            from: Some(chrono_tz::UTC.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap()),
            until: None,
        };
        let formatted = window
            .with_timezone(chrono_tz::Europe::Madrid)
            .format("%d/%m/%Y %H:%M")
            .unwrap();
        assert_eq!(formatted.from.as_deref(), Some("01/06/2026 11:00"));
        assert_eq!(formatted.until, None);
    }

    #[test]
    fn test_window_format_rejects_bad_pattern() {
        let window = SaleWindow {
            from: Some(chrono_tz::UTC.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap()),
            until: None,
        };
        let err = window.format("%Q").unwrap_err();
        assert!(matches!(err, SalepriceError::InvalidDateFormat(_)));
    }

    #[test]
    fn test_from_settings_validates() {
        let schema = FieldSchema::new().with_field("field_discount", FieldKind::Number);
        let settings = SalepriceSettings {
            discount_field: Some("field_discount".to_string()),
            site_timezone: "Atlantis/Capital".to_string(),
            ..SalepriceSettings::default()
        };
        let err = SalepriceService::from_settings(&settings, &schema).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimezone(_)));
    }
}
