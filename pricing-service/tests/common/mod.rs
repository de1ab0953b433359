#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use pricing_service::clients::{CatalogClient, InventoryClient, UsageClient};
use pricing_service::error::PricingError;
use pricing_service::models::{DateRange, PricePlan, Product, UsageRecord};
use pricing_service::services::{PricingEngine, PricingSettings};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const TEST_CURRENCY: &str = "EUR";

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn window(start: NaiveDate, end: NaiveDate) -> DateRange {
    DateRange::new(start, end).unwrap()
}

/// In-memory catalog counting every price plan fetch.
#[derive(Default)]
pub struct TestCatalog {
    plans: Mutex<HashMap<String, PricePlan>>,
    fetches: AtomicUsize,
}

impl TestCatalog {
    pub fn insert(&self, plan: PricePlan) {
        self.plans.lock().unwrap().insert(plan.id.clone(), plan);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogClient for TestCatalog {
    async fn fetch_price_plan(&self, id: &str) -> Result<PricePlan, PricingError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.plans
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| PricingError::NotFound(format!("catalog price plan {}", id)))
    }
}

#[derive(Default)]
pub struct TestInventory {
    products: Mutex<HashMap<String, Product>>,
}

impl TestInventory {
    pub fn insert(&self, product: Product) {
        self.products
            .lock()
            .unwrap()
            .insert(product.id.clone(), product);
    }
}

#[async_trait]
impl InventoryClient for TestInventory {
    async fn fetch_product(&self, id: &str) -> Result<Product, PricingError> {
        self.products
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| PricingError::NotFound(format!("inventory product {}", id)))
    }
}

/// In-memory usage service returning the dated records inside the requested window.
#[derive(Default)]
pub struct TestUsage {
    records: Mutex<HashMap<String, Vec<UsageRecord>>>,
    fetches: AtomicUsize,
    unavailable: Mutex<bool>,
}

impl TestUsage {
    pub fn insert(&self, product_id: &str, record: UsageRecord) {
        self.records
            .lock()
            .unwrap()
            .entry(product_id.to_string())
            .or_default()
            .push(record);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock().unwrap() = unavailable;
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UsageClient for TestUsage {
    async fn fetch_usage_records(
        &self,
        product_id: &str,
        window: &DateRange,
    ) -> Result<Vec<UsageRecord>, PricingError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if *self.unavailable.lock().unwrap() {
            return Err(PricingError::unavailable("usage", "connection refused"));
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(product_id)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| r.usage_date.is_some_and(|d| window.contains(d)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

pub struct TestEngine {
    pub engine: PricingEngine,
    pub catalog: Arc<TestCatalog>,
    pub inventory: Arc<TestInventory>,
    pub usage: Arc<TestUsage>,
}

impl TestEngine {
    /// Engine over empty in-memory collaborators, evaluating validity on `as_of`.
    pub fn new(as_of: NaiveDate) -> Self {
        let catalog = Arc::new(TestCatalog::default());
        let inventory = Arc::new(TestInventory::default());
        let usage = Arc::new(TestUsage::default());
        let engine = PricingEngine::new(
            catalog.clone(),
            inventory.clone(),
            usage.clone(),
            PricingSettings {
                default_currency: TEST_CURRENCY.to_string(),
                evaluation_date: Some(as_of),
            },
        );
        Self {
            engine,
            catalog,
            inventory,
            usage,
        }
    }

    pub fn with_plans<I>(self, plans: I) -> Self
    where
        I: IntoIterator<Item = PricePlan>,
    {
        for plan in plans {
            self.catalog.insert(plan);
        }
        self
    }
}
