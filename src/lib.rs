//! Sale prices for catalog product variations.
//!
//! Evaluates configurable discount, sale price, flag and time-window fields
//! to decide whether a variation is on sale, and plugs a resolver into the
//! host's price resolution chain.

pub mod config;
pub mod error;
pub mod saleprice;
pub mod telemetry;

pub use config::SalepriceSettings;
pub use error::{ConfigError, Result, SalepriceError};
pub use saleprice::{
    ChainPriceResolver, Context, Price, PriceResolver, ProductVariation, SalepriceFormatter,
    SalepriceResolver, SalepriceService,
};
