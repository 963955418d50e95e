use std::collections::HashMap;

use async_trait::async_trait;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::ports::{Product, ProductCatalog, WholesaleAccount};
use crate::domain::pricing::BulkTier;
use crate::schema::{bulk_pricing_tiers, products, wholesale_customers};

use super::blocking;
use super::models::{BulkPricingTierRow, ProductRow, WholesaleCustomerRow};

pub struct DieselProductCatalog {
    pool: DbPool,
}

impl DieselProductCatalog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductCatalog for DieselProductCatalog {
    async fn products_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Product>, DomainError> {
        let pool = self.pool.clone();
        let ids = ids.to_vec();
        blocking(move || {
            let mut conn = pool.get()?;

            let rows = products::table
                .filter(products::id.eq_any(&ids))
                .filter(products::active.eq(true))
                .select(ProductRow::as_select())
                .load(&mut conn)?;

            let tier_rows = bulk_pricing_tiers::table
                .filter(bulk_pricing_tiers::product_id.eq_any(&ids))
                .order((
                    bulk_pricing_tiers::product_id,
                    bulk_pricing_tiers::min_quantity,
                ))
                .select(BulkPricingTierRow::as_select())
                .load(&mut conn)?;

            let mut tiers_by_product: HashMap<Uuid, Vec<BulkTier>> = HashMap::new();
            for tier in tier_rows {
                tiers_by_product
                    .entry(tier.product_id)
                    .or_default()
                    .push(BulkTier {
                        min_quantity: tier.min_quantity,
                        max_quantity: tier.max_quantity,
                        discount_percent: tier.discount_percent,
                    });
            }

            Ok(rows
                .into_iter()
                .map(|p| {
                    let bulk_tiers = tiers_by_product.remove(&p.id).unwrap_or_default();
                    Product {
                        id: p.id,
                        name: p.name,
                        base_price: p.base_price,
                        active: p.active,
                        bulk_tiers,
                    }
                })
                .collect())
        })
        .await
    }

    async fn wholesale_by_code(&self, code: &str) -> Result<Option<WholesaleAccount>, DomainError> {
        let pool = self.pool.clone();
        let code = code.to_string();
        blocking(move || {
            let mut conn = pool.get()?;

            let row = wholesale_customers::table
                .filter(wholesale_customers::code.eq(&code))
                .select(WholesaleCustomerRow::as_select())
                .first(&mut conn)
                .optional()?;

            Ok(row.map(|w| WholesaleAccount {
                business_name: w.business_name,
                code: w.code,
                discount_percent: w.discount_percent,
                tier_min_items: w.tier_min_items,
                tier_max_items: w.tier_max_items,
                active: w.active,
            }))
        })
        .await
    }
}
