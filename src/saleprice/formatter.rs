//! Sale price display builder.
//!
//! Combines the resolver chain and the eligibility service into the values
//! a sale price template shows: resolved and original price, savings, and
//! the sale window dates.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::format::{Item, StrftimeItems};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SalepriceError};

use super::calculators::calculate_savings;
use super::models::{Context, ProductVariation};
use super::resolvers::ChainPriceResolver;
use super::responses::SalepriceDisplay;
use super::services::{parse_timezone, SalepriceService};

/// Named date formats available to the formatter
#[derive(Debug, Clone)]
pub struct DateFormats {
    patterns: BTreeMap<String, String>,
}

impl Default for DateFormats {
    fn default() -> Self {
        let patterns = [
            ("short", "%m/%d/%Y - %H:%M"),
            ("medium", "%a, %m/%d/%Y - %H:%M"),
            ("long", "%A, %B %-d, %Y - %H:%M"),
            ("html_date", "%Y-%m-%d"),
            ("html_datetime", "%Y-%m-%dT%H:%M:%S%z"),
            ("fallback", "%a, %m/%d/%Y - %H:%M"),
        ]
        .into_iter()
        .map(|(name, pattern)| (name.to_string(), pattern.to_string()))
        .collect();

        Self { patterns }
    }
}

impl DateFormats {
    /// Register a format, rejecting patterns chrono cannot render.
    pub fn insert(&mut self, name: impl Into<String>, pattern: impl Into<String>) -> Result<()> {
        let pattern = pattern.into();
        if StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error)) {
            return Err(SalepriceError::InvalidDateFormat(pattern));
        }
        self.patterns.insert(name.into(), pattern);
        Ok(())
    }

    pub fn pattern(&self, name: &str) -> Result<&str> {
        self.patterns
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| SalepriceError::UnknownDateFormat(name.to_string()))
    }
}

/// Display options of the sale price formatter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatterSettings {
    pub date_format: String,
    pub show_savings_number: bool,
    pub show_savings_percentage: bool,
}

impl Default for FormatterSettings {
    fn default() -> Self {
        Self {
            date_format: "medium".to_string(),
            show_savings_number: false,
            show_savings_percentage: false,
        }
    }
}

pub struct SalepriceFormatter {
    chain: ChainPriceResolver,
    service: Arc<SalepriceService>,
    settings: FormatterSettings,
    date_formats: DateFormats,
}

impl SalepriceFormatter {
    pub fn new(
        chain: ChainPriceResolver,
        service: Arc<SalepriceService>,
        settings: FormatterSettings,
        date_formats: DateFormats,
    ) -> Self {
        Self {
            chain,
            service,
            settings,
            date_formats,
        }
    }

    /// Formatter over the standard chain (sale price, then list price).
    pub fn with_defaults(service: Arc<SalepriceService>, settings: FormatterSettings) -> Self {
        Self::new(
            ChainPriceResolver::with_saleprice(service.clone()),
            service,
            settings,
            DateFormats::default(),
        )
    }

    pub fn settings(&self) -> &FormatterSettings {
        &self.settings
    }

    /// Timezone dates are shown in: the context store's, else the site's.
    pub fn display_timezone(&self, context: &Context) -> Result<Tz> {
        match &context.store {
            Some(store) => parse_timezone(&store.timezone),
            None => Ok(self.service.site_timezone()),
        }
    }

    /// Build the display values for one variation.
    ///
    /// The chain decides the price; `evaluate` supplies the on-sale flag and
    /// window. Both read `context.time`, so they agree on eligibility even
    /// when the chain holds resolvers other than the sale price one.
    pub fn view(&self, variation: &ProductVariation, context: &Context) -> Result<SalepriceDisplay> {
        let original_price = variation.price().clone();
        let price = self.chain.resolve(variation, Decimal::ONE, context)?;
        let savings = calculate_savings(&original_price, &price)?;

        let status = self.service.evaluate(variation, context.time)?;

        let (on_sale_from, on_sale_until) = match &status.window {
            Some(window) => {
                let pattern = self.date_formats.pattern(&self.settings.date_format)?;
                let formatted = window
                    .with_timezone(self.display_timezone(context)?)
                    .format(pattern)?;
                (formatted.from, formatted.until)
            }
            None => (None, None),
        };

        Ok(SalepriceDisplay {
            price,
            original_price,
            savings_number: savings.amount,
            savings_percentage: savings.percentage,
            show_savings_number: self.settings.show_savings_number,
            show_savings_percentage: self.settings.show_savings_percentage,
            on_sale: status.on_sale,
            on_sale_from,
            on_sale_until,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SalepriceSettings;
    use crate::saleprice::fields::SaleFields;
    use crate::saleprice::models::{FieldValue, Price, Store};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn service() -> Arc<SalepriceService> {
        let settings = SalepriceSettings {
            discount_field: Some("field_discount".to_string()),
            on_sale_from_field: Some("field_from".to_string()),
            on_sale_until_field: Some("field_until".to_string()),
            ..SalepriceSettings::default()
        };
        Arc::new(SalepriceService::new(
            SaleFields::from_names(&settings),
            chrono_tz::UTC,
        ))
    }

    fn context() -> Context {
        Context::new(Utc.with_ymd_and_hms(2026, 7, 10, 12, 0, 0).unwrap())
    }

    fn on_sale() -> ProductVariation {
        ProductVariation::new("v1", Price::new(dec!(80.00), "USD"))
            .with_field("field_discount", FieldValue::Number(dec!(25)))
            .with_field("field_from", FieldValue::Timestamp("2026-07-01T00:00:00".into()))
            .with_field("field_until", FieldValue::Timestamp("2026-07-31T23:59:59".into()))
    }

    #[test]
    fn test_view_on_sale() {
        let formatter = SalepriceFormatter::with_defaults(
            service(),
            FormatterSettings {
                date_format: "html_date".to_string(),
                show_savings_number: true,
                show_savings_percentage: true,
            },
        );

        let view = formatter.view(&on_sale(), &context()).unwrap();

        assert!(view.on_sale);
        assert_eq!(view.price, Price::new(dec!(60.00), "USD"));
        assert_eq!(view.original_price, Price::new(dec!(80.00), "USD"));
        assert_eq!(view.savings_number, Price::new(dec!(20.00), "USD"));
        assert_eq!(view.savings_percentage, Some(dec!(25)));
        assert!(view.show_savings_number);
        assert_eq!(view.on_sale_from.as_deref(), Some("2026-07-01"));
        assert_eq!(view.on_sale_until.as_deref(), Some("2026-07-31"));
    }

    #[test]
    fn test_view_dates_use_context_store_timezone() {
        let formatter = SalepriceFormatter::with_defaults(
            service(),
            FormatterSettings {
                date_format: "short".to_string(),
                ..FormatterSettings::default()
            },
        );
        let context = context().with_store(Store::new("mx", "America/Mexico_City"));

        let view = formatter.view(&on_sale(), &context).unwrap();
        assert_eq!(view.on_sale_from.as_deref(), Some("06/30/2026 - 18:00"));
    }

    #[test]
    fn test_view_not_on_sale() {
        let formatter = SalepriceFormatter::with_defaults(service(), FormatterSettings::default());
        let variation = ProductVariation::new("v2", Price::new(dec!(80.00), "USD"));

        let view = formatter.view(&variation, &context()).unwrap();
        assert!(!view.on_sale);
        assert_eq!(view.price, view.original_price);
        assert!(view.savings_number.is_zero());
        assert_eq!(view.savings_percentage, Some(dec!(0)));
        assert_eq!(view.on_sale_from, None);
        assert_eq!(view.on_sale_until, None);
    }

    #[test]
    fn test_view_flag_matches_price_at_window_start() {
        let formatter = SalepriceFormatter::with_defaults(service(), FormatterSettings::default());
        let start = Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap();

        let view = formatter.view(&on_sale(), &Context::new(start)).unwrap();
        assert!(!view.on_sale);
        assert_eq!(view.price, view.original_price);

        let view = formatter
            .view(&on_sale(), &Context::new(start + chrono::Duration::seconds(1)))
            .unwrap();
        assert!(view.on_sale);
        assert_eq!(view.price, Price::new(dec!(60.00), "USD"));
    }

    #[test]
    fn test_view_zero_list_price() {
        let formatter = SalepriceFormatter::with_defaults(service(), FormatterSettings::default());
        let variation = ProductVariation::new("free", Price::new(dec!(0), "USD"));

        let view = formatter.view(&variation, &context()).unwrap();
        assert_eq!(view.savings_percentage, None);
    }

    #[test]
    fn test_view_unknown_date_format() {
        let formatter = SalepriceFormatter::with_defaults(
            service(),
            FormatterSettings {
                date_format: "custom_missing".to_string(),
                ..FormatterSettings::default()
            },
        );
        let err = formatter.view(&on_sale(), &context()).unwrap_err();
        assert_eq!(err, SalepriceError::UnknownDateFormat("custom_missing".to_string()));
    }

    #[test]
    fn test_view_serializes() {
        let formatter = SalepriceFormatter::with_defaults(service(), FormatterSettings::default());
        let view = formatter.view(&on_sale(), &context()).unwrap();
        let json = serde_json::to_value(&view).unwrap();

        let amount: Decimal = json["price"]["amount"].as_str().unwrap().parse().unwrap();
        assert_eq!(amount, dec!(60));
        assert_eq!(json["price"]["currency"], "USD");
        assert_eq!(json["savings_percentage"], "25");
        assert_eq!(json["on_sale"], true);
    }

    #[test]
    fn test_date_formats_reject_invalid_pattern() {
        let mut formats = DateFormats::default();
        assert!(formats.insert("day_only", "%d").is_ok());
        assert_eq!(formats.pattern("day_only").unwrap(), "%d");

        let err = formats.insert("broken", "%Q").unwrap_err();
        assert!(matches!(err, SalepriceError::InvalidDateFormat(_)));
    }
}
