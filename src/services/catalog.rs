//! Product catalog and the empirical distributions used to fill baskets
//!
//! The catalog is built once per process from a fixed seed and is read-only
//! afterwards, so it is shared between tasks behind an `Arc` without locking.
//!
//! Prices come from an oversampled lognormal pool (10x the catalog size), rounded
//! to tens, shifted so the pool minimum sits on the price floor and clipped into
//! the configured range. The catalog then picks its prices from that pool with
//! replacement. Quantities come from a pool of `floor(Exp(mean = 2) + 1)` draws,
//! which also supplies the number of lines per receipt.

use crate::domain::types::{Basket, Item, ReceiptLine};
use crate::error::SalesError;
use crate::infra::config::GoodsSettings;
use crate::infra::seed::rng_from_seed;
use rand::distributions::WeightedIndex;
use rand::Rng;
use rand_distr::{Distribution, Exp1, LogNormal};
use tracing::debug;

/// Pool size multiplier relative to the catalog size
const POOL_FACTOR: usize = 10;

/// Mean of the exponential quantity distribution (before the +1 shift)
const QUANTITY_MEAN: f64 = 2.0;

/// Smallest lognormal shape used when the empirical formula goes non-positive
pub const MIN_PRICE_SIGMA: f64 = 0.05;

/// Lognormal shape from the mean/max price ratio (empirical formula)
pub fn price_sigma(mean_price: u32, max_price: u32) -> f64 {
    let ratio = mean_price as f64 / max_price as f64;
    (1.38 - 0.6 * (ratio / 0.05)).max(MIN_PRICE_SIGMA)
}

/// Draw the oversampled price pool
pub fn price_pool<R: Rng + ?Sized>(
    goods: &GoodsSettings,
    pool_size: usize,
    rng: &mut R,
) -> Result<Vec<u32>, SalesError> {
    let sigma = price_sigma(goods.mean_price, goods.max_price);
    let lognormal = LogNormal::new((goods.mean_price as f64).ln(), sigma)
        .map_err(|e| SalesError::config(format!("invalid price distribution: {}", e)))?;

    let raw: Vec<f64> =
        (0..pool_size).map(|_| (lognormal.sample(rng) / 10.0).round() * 10.0).collect();
    let pool_min = raw.iter().copied().fold(f64::INFINITY, f64::min);

    let floor = goods.min_price as f64;
    let ceil = goods.max_price as f64;
    Ok(raw.into_iter().map(|p| (p - pool_min + floor).clamp(floor, ceil).round() as u32).collect())
}

/// Draw the quantity pool: `floor(Exp(mean = 2) + 1)`, always >= 1
pub fn quantity_pool<R: Rng + ?Sized>(pool_size: usize, rng: &mut R) -> Vec<u32> {
    (0..pool_size)
        .map(|_| {
            let x: f64 = Exp1.sample(rng);
            (x * QUANTITY_MEAN + 1.0).floor() as u32
        })
        .collect()
}

pub struct Catalog {
    items: Vec<Item>,
    quantities: Vec<u32>,
    categories: Vec<String>,
    name_prefix: Vec<String>,
}

impl Catalog {
    /// Build the full item universe and the quantity pool from a fixed seed
    pub fn build(goods: &GoodsSettings, seed: u64) -> Result<Self, SalesError> {
        let size = goods.catalog_size();
        if size == 0 {
            return Err(SalesError::config("catalog would be empty"));
        }
        let mut rng = rng_from_seed(seed);

        let pool = price_pool(goods, size * POOL_FACTOR, &mut rng)?;
        let prices: Vec<u32> = (0..size).map(|_| pool[rng.gen_range(0..pool.len())]).collect();

        let discount_dist = WeightedIndex::new(&goods.discount_probs)
            .map_err(|e| SalesError::config(format!("invalid discount probabilities: {}", e)))?;
        let discounts: Vec<f64> = (0..size)
            .map(|_| goods.discount_values[discount_dist.sample(&mut rng)])
            .collect();

        let keys = goods.category_capacity.iter().enumerate().flat_map(|(category, &capacity)| {
            (0..=capacity).map(move |item| (category as u16, item))
        });

        let items: Vec<Item> = keys
            .zip(prices)
            .zip(discounts)
            .map(|(((category_key, item_key), price), discount)| Item {
                category_key,
                item_key,
                price,
                discount,
            })
            .collect();

        let quantities = quantity_pool(size * POOL_FACTOR, &mut rng);

        debug!(
            items = %items.len(),
            quantity_pool = %quantities.len(),
            price_sigma = %price_sigma(goods.mean_price, goods.max_price),
            "catalog_built"
        );

        Ok(Self::from_parts(
            items,
            quantities,
            goods.categories.clone(),
            goods.name_prefix.clone(),
        ))
    }

    /// Assemble a catalog from prepared parts
    pub fn from_parts(
        items: Vec<Item>,
        quantities: Vec<u32>,
        categories: Vec<String>,
        name_prefix: Vec<String>,
    ) -> Self {
        Self { items, quantities, categories, name_prefix }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn quantities(&self) -> &[u32] {
        &self.quantities
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Draw one value from the quantity pool
    pub fn sample_quantity<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<u32, SalesError> {
        if self.quantities.is_empty() {
            return Err(SalesError::task("catalog", "quantity pool is empty"));
        }
        Ok(self.quantities[rng.gen_range(0..self.quantities.len())])
    }

    /// Sample `n` items and `n` quantities with replacement and pair them up
    pub fn get_basket<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<Basket, SalesError> {
        if n == 0 {
            return Ok(Basket::new());
        }
        if self.items.is_empty() {
            return Err(SalesError::task("catalog", "catalog has no items"));
        }

        let items: Vec<Item> =
            (0..n).map(|_| self.items[rng.gen_range(0..self.items.len())]).collect();
        let mut basket = Basket::with_capacity(n);
        for item in items {
            basket.push(ReceiptLine { item, quantity: self.sample_quantity(rng)? });
        }
        Ok(basket)
    }

    /// Display name: category prefix followed by the item key
    pub fn item_name(&self, item: &Item) -> String {
        let prefix = self.name_prefix.get(item.category_key as usize).map(String::as_str);
        format!("{}{}", prefix.unwrap_or("?"), item.item_key)
    }

    pub fn category_name(&self, item: &Item) -> &str {
        self.categories.get(item.category_key as usize).map(String::as_str).unwrap_or("unknown")
    }
}
