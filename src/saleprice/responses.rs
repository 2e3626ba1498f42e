//! Serializable view of a sale price, for the presentation layer.

use rust_decimal::Decimal;
use serde::Serialize;

use super::models::Price;

/// Everything a template needs to show a sale price.
///
/// Amounts are unformatted; currency formatting belongs to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalepriceDisplay {
    /// Resolved price (sale price when on sale, list price otherwise)
    pub price: Price,
    pub original_price: Price,
    pub savings_number: Price,
    /// Whole-number savings percentage; `None` when the list price is zero
    #[serde(with = "rust_decimal::serde::str_option")]
    pub savings_percentage: Option<Decimal>,
    pub show_savings_number: bool,
    pub show_savings_percentage: bool,
    pub on_sale: bool,
    pub on_sale_from: Option<String>,
    pub on_sale_until: Option<String>,
}
