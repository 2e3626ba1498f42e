//! Price resolvers.
//!
//! A resolver either returns a concrete price or `None` ("no opinion") so the
//! chain moves on. The chain always ends with the list price.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::error::{Result, SalepriceError};

use super::calculators::apply_percentage_discount;
use super::models::{Context, Price, ProductVariation};
use super::services::SalepriceService;

pub trait PriceResolver: Send + Sync {
    fn resolve(
        &self,
        variation: &ProductVariation,
        quantity: Decimal,
        context: &Context,
    ) -> Result<Option<Price>>;
}

/// Resolves the discounted price of variations that are on sale.
///
/// Quantity is accepted for the chain interface only; there is no tiered
/// pricing.
#[derive(Debug, Clone)]
pub struct SalepriceResolver {
    service: Arc<SalepriceService>,
}

impl SalepriceResolver {
    pub fn new(service: Arc<SalepriceService>) -> Self {
        Self { service }
    }
}

impl PriceResolver for SalepriceResolver {
    fn resolve(
        &self,
        variation: &ProductVariation,
        _quantity: Decimal,
        context: &Context,
    ) -> Result<Option<Price>> {
        if !self.service.is_on_sale(variation, context.time)? {
            return Ok(None);
        }

        let fields = self.service.fields();

        // Discount wins over an absolute sale price.
        if let Some(percentage) = fields.discount(variation)? {
            if percentage < Decimal::ZERO || percentage > Decimal::ONE_HUNDRED {
                return Err(SalepriceError::DiscountOutOfRange {
                    field: fields.discount_field().unwrap_or_default().to_string(),
                    value: percentage.to_string(),
                });
            }
            return Ok(Some(apply_percentage_discount(variation.price(), percentage)));
        }

        fields.saleprice(variation)
    }
}

/// Last link of every chain: the variation's own price
#[derive(Debug, Clone, Copy, Default)]
pub struct ListPriceResolver;

impl ListPriceResolver {
    pub fn list_price(&self, variation: &ProductVariation) -> Price {
        variation.price().clone()
    }
}

impl PriceResolver for ListPriceResolver {
    fn resolve(
        &self,
        variation: &ProductVariation,
        _quantity: Decimal,
        _context: &Context,
    ) -> Result<Option<Price>> {
        Ok(Some(self.list_price(variation)))
    }
}

/// Ordered resolvers queried until one has an opinion.
///
/// A `ListPriceResolver` is always appended after the given resolvers, so
/// resolution never ends without a price.
pub struct ChainPriceResolver {
    resolvers: Vec<Box<dyn PriceResolver>>,
    fallback: ListPriceResolver,
}

impl ChainPriceResolver {
    pub fn new(resolvers: Vec<Box<dyn PriceResolver>>) -> Self {
        Self {
            resolvers,
            fallback: ListPriceResolver,
        }
    }

    /// Number of links, the list price fallback included
    pub fn resolver_count(&self) -> usize {
        self.resolvers.len() + 1
    }

    /// Chain with the sale price resolver in front of the list price.
    pub fn with_saleprice(service: Arc<SalepriceService>) -> Self {
        Self::new(vec![Box::new(SalepriceResolver::new(service))])
    }

    /// Resolve a price, falling back to the list price.
    ///
    /// Resolver errors propagate; they never turn into a silent fallback.
    pub fn resolve(
        &self,
        variation: &ProductVariation,
        quantity: Decimal,
        context: &Context,
    ) -> Result<Price> {
        for resolver in &self.resolvers {
            if let Some(price) = resolver.resolve(variation, quantity, context)? {
                return Ok(price);
            }
        }

        debug!("No resolver priced variation {}, using list price", variation.id);
        Ok(self.fallback.list_price(variation))
    }

    /// Resolve prices for a listing; one bad item does not stop the rest.
    pub fn resolve_listing(
        &self,
        variations: &[ProductVariation],
        quantity: Decimal,
        context: &Context,
    ) -> Vec<Result<Price>> {
        variations
            .iter()
            .map(|variation| {
                let resolved = self.resolve(variation, quantity, context);
                if let Err(e) = &resolved {
                    warn!("Failed to resolve price for variation {}: {}", variation.id, e);
                }
                resolved
            })
            .collect()
    }
}
