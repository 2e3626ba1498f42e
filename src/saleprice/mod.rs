//! Sale price engine.
//!
//! Decides whether a product variation is on sale and resolves its
//! discounted price inside the host's price resolver chain.

pub mod calculators;
pub mod fields;
pub mod formatter;
pub mod models;
pub mod resolvers;
pub mod responses;
pub mod services;

// Re-export commonly used items
pub use calculators::{calculate_savings, round_money, Savings};
pub use fields::{FieldSchema, SaleFields};
pub use formatter::{DateFormats, FormatterSettings, SalepriceFormatter};
pub use models::{
    Clock, Context, FieldKind, FieldValue, FixedClock, Price, ProductVariation, Store, StoreId,
    SystemClock,
};
pub use resolvers::{ChainPriceResolver, ListPriceResolver, PriceResolver, SalepriceResolver};
pub use responses::SalepriceDisplay;
pub use services::{SaleStatus, SaleWindow, SalepriceService};
