//! Catalog models consumed by the sale price engine.
//!
//! The host catalog owns these entities; this crate only reads them. Field
//! values are looked up by the names configured in the settings, so they are
//! kept in a name-keyed map of tagged values rather than as struct fields.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SalepriceError};

use super::calculators::round_money;

/// Money value: amount plus currency code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    #[serde(with = "rust_decimal::serde::str")]
    amount: Decimal,
    currency: String,
}

impl Price {
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Subtract another price in the same currency.
    pub fn subtract(&self, other: &Price) -> Result<Price> {
        if self.currency != other.currency {
            return Err(SalepriceError::CurrencyMismatch {
                left: self.currency.clone(),
                right: other.currency.clone(),
            });
        }
        let amount = self
            .amount
            .checked_sub(other.amount)
            .ok_or_else(|| SalepriceError::AmountOverflow(format!("{} - {}", self, other)))?;
        Ok(Price::new(amount, self.currency.clone()))
    }

    /// Scale the amount by a ratio (0.75 for a 25% discount).
    pub fn multiply(&self, ratio: Decimal) -> Price {
        Price::new(self.amount * ratio, self.currency.clone())
    }

    /// Round the amount with banker's rounding, for display.
    pub fn round(&self, places: u32) -> Price {
        Price::new(round_money(self.amount, places), self.currency.clone())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

/// Kind of value a field definition holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Number,
    Price,
    Boolean,
    Timestamp,
    Text,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Number => "number",
            FieldKind::Price => "price",
            FieldKind::Boolean => "boolean",
            FieldKind::Timestamp => "timestamp",
            FieldKind::Text => "text",
        };
        f.write_str(name)
    }
}

/// A single field value on a product variation.
///
/// Timestamps keep their raw storage string (UTC, `YYYY-MM-DDTHH:MM:SS` or
/// `YYYY-MM-DD`); they are parsed when a window gate needs them so that a
/// malformed value surfaces as an error on the item that carries it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Number(#[serde(with = "rust_decimal::serde::str")] Decimal),
    Price(Price),
    Boolean(bool),
    Timestamp(String),
    Text(String),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Number(_) => FieldKind::Number,
            FieldValue::Price(_) => FieldKind::Price,
            FieldValue::Boolean(_) => FieldKind::Boolean,
            FieldValue::Timestamp(_) => FieldKind::Timestamp,
            FieldValue::Text(_) => FieldKind::Text,
        }
    }

    /// Blank strings count as empty; every other value is present.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Timestamp(raw) | FieldValue::Text(raw) => raw.trim().is_empty(),
            _ => false,
        }
    }

    /// Flag semantics for the "on sale" checkbox field.
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Boolean(flag) => *flag,
            FieldValue::Number(number) => !number.is_zero(),
            FieldValue::Text(text) => {
                let text = text.trim();
                !text.is_empty() && text != "0"
            }
            FieldValue::Price(_) => true,
            FieldValue::Timestamp(raw) => !raw.trim().is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StoreId(pub String);

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Store a variation is sold in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    pub id: StoreId,
    /// IANA timezone name, e.g. "America/New_York"
    pub timezone: String,
}

impl Store {
    pub fn new(id: impl Into<String>, timezone: impl Into<String>) -> Self {
        Self {
            id: StoreId(id.into()),
            timezone: timezone.into(),
        }
    }
}

/// Purchasable product variation (the SKU being priced)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductVariation {
    pub id: String,
    pub price: Price,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
    #[serde(default)]
    pub stores: Vec<Store>,
}

impl ProductVariation {
    pub fn new(id: impl Into<String>, price: Price) -> Self {
        Self {
            id: id.into(),
            price,
            fields: BTreeMap::new(),
            stores: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn with_store(mut self, store: Store) -> Self {
        self.stores.push(store);
        self
    }

    /// List price before any resolver runs
    pub fn price(&self) -> &Price {
        &self.price
    }

    /// Look up a field, treating blank values as absent
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name).filter(|value| !value.is_empty())
    }

    /// Store whose timezone governs sale windows.
    ///
    /// Picks the smallest store id so the result does not depend on the
    /// order the host listed the stores in.
    pub fn canonical_store(&self) -> Option<&Store> {
        self.stores.iter().min_by(|a, b| a.id.cmp(&b.id))
    }
}

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Resolution context handed down the price resolver chain.
///
/// `time` is sampled once when the context is built and every gate in the
/// evaluation compares against it.
#[derive(Debug, Clone, PartialEq)]
pub struct Context {
    pub time: DateTime<Utc>,
    pub customer_id: Option<String>,
    pub store: Option<Store>,
    pub data: BTreeMap<String, String>,
}

impl Context {
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            time,
            customer_id: None,
            store: None,
            data: BTreeMap::new(),
        }
    }

    pub fn from_clock(clock: &dyn Clock) -> Self {
        Self::new(clock.now())
    }

    pub fn with_store(mut self, store: Store) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}
