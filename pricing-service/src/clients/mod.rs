//! Collaborators the engine fetches catalog, inventory and usage data from.

mod http;

use crate::error::PricingError;
use crate::models::{DateRange, PricePlan, PricePlanRef, Product, UsageRecord};
use async_trait::async_trait;

pub use http::{HttpCatalogClient, HttpInventoryClient, HttpUsageClient};

/// Product catalog: price plan definitions.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn fetch_price_plan(&self, id: &str) -> Result<PricePlan, PricingError>;

    /// Members of a bundle, in reference order.
    async fn fetch_bundle_members(&self, plan: &PricePlan) -> Result<Vec<PricePlan>, PricingError> {
        self.fetch_refs(&plan.bundled_plan_refs).await
    }

    /// Alteration plans of a plan, in declaration order.
    async fn fetch_alteration_plans(&self, plan: &PricePlan) -> Result<Vec<PricePlan>, PricingError> {
        self.fetch_refs(&plan.alteration_refs).await
    }

    async fn fetch_refs(&self, refs: &[PricePlanRef]) -> Result<Vec<PricePlan>, PricingError> {
        let mut plans = Vec::with_capacity(refs.len());
        for plan_ref in refs {
            plans.push(self.fetch_price_plan(&plan_ref.id).await?);
        }
        Ok(plans)
    }
}

/// Product inventory: installed products.
#[async_trait]
pub trait InventoryClient: Send + Sync {
    async fn fetch_product(&self, id: &str) -> Result<Product, PricingError>;
}

/// Usage management: metered usage records.
#[async_trait]
pub trait UsageClient: Send + Sync {
    async fn fetch_usage_records(
        &self,
        product_id: &str,
        window: &DateRange,
    ) -> Result<Vec<UsageRecord>, PricingError>;
}
