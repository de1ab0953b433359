use super::{CatalogClient, InventoryClient, UsageClient};
use crate::config::CollaboratorSettings;
use crate::error::PricingError;
use crate::models::{DateRange, PricePlan, Product, UsageRecord};
use crate::services::metrics::record_fetch_duration;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use service_core::observability::TracedClientExt;
use std::time::{Duration, Instant};

/// GET-and-decode helper shared by the collaborator clients.
#[derive(Debug, Clone)]
struct JsonFetcher {
    client: Client,
    base_url: String,
    service: &'static str,
    request_id: Option<String>,
}

impl JsonFetcher {
    fn new(service: &'static str, settings: &CollaboratorSettings) -> Result<Self, PricingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| PricingError::Configuration(format!("{} HTTP client: {}", service, e)))?;

        Ok(Self {
            client,
            base_url: settings.url.trim_end_matches('/').to_string(),
            service,
            request_id: None,
        })
    }

    async fn get<T, Q>(&self, path: &str, query: &Q, subject: &str) -> Result<T, PricingError>
    where
        T: DeserializeOwned,
        Q: serde::Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let started = Instant::now();

        let response = self
            .client
            .traced_get(&url)
            .query(query)
            .request_id(self.request_id.as_deref())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(service = self.service, url = %url, error = %e, "Request failed");
                PricingError::unavailable(self.service, e.to_string())
            })?;
        record_fetch_duration(self.service, started.elapsed().as_secs_f64());

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                service = self.service,
                url = %url,
                status = %status,
                "Collaborator returned an error status"
            );
            return Err(status_error(self.service, status, subject, &body));
        }

        response.json::<T>().await.map_err(|e| {
            tracing::error!(service = self.service, url = %url, error = %e, "Undecodable response body");
            PricingError::unavailable(self.service, format!("invalid response body: {}", e))
        })
    }
}

fn status_error(service: &str, status: StatusCode, subject: &str, body: &str) -> PricingError {
    if status == StatusCode::NOT_FOUND {
        PricingError::NotFound(format!("{} {}", service, subject))
    } else if status.is_client_error() {
        PricingError::BadRequest(format!("{} rejected {}: {} {}", service, subject, status, body))
    } else {
        PricingError::unavailable(service, format!("{} for {}", status, subject))
    }
}

/// Catalog client reading `{base}/productOfferingPrice/{id}`.
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    fetcher: JsonFetcher,
}

impl HttpCatalogClient {
    pub fn new(settings: &CollaboratorSettings) -> Result<Self, PricingError> {
        Ok(Self {
            fetcher: JsonFetcher::new("catalog", settings)?,
        })
    }

    /// Forward `request_id` as `x-request-id` on every call.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.fetcher.request_id = Some(request_id.into());
        self
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    #[tracing::instrument(skip(self))]
    async fn fetch_price_plan(&self, id: &str) -> Result<PricePlan, PricingError> {
        let path = format!("/productOfferingPrice/{}", id);
        self.fetcher
            .get(&path, &[] as &[(&str, &str)], &format!("price plan {}", id))
            .await
    }
}

/// Inventory client reading `{base}/product/{id}`.
#[derive(Debug, Clone)]
pub struct HttpInventoryClient {
    fetcher: JsonFetcher,
}

impl HttpInventoryClient {
    pub fn new(settings: &CollaboratorSettings) -> Result<Self, PricingError> {
        Ok(Self {
            fetcher: JsonFetcher::new("inventory", settings)?,
        })
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.fetcher.request_id = Some(request_id.into());
        self
    }
}

#[async_trait]
impl InventoryClient for HttpInventoryClient {
    #[tracing::instrument(skip(self))]
    async fn fetch_product(&self, id: &str) -> Result<Product, PricingError> {
        let path = format!("/product/{}", id);
        self.fetcher
            .get(&path, &[] as &[(&str, &str)], &format!("product {}", id))
            .await
    }
}

/// Usage client reading `{base}/usage` filtered by product and date.
#[derive(Debug, Clone)]
pub struct HttpUsageClient {
    fetcher: JsonFetcher,
}

impl HttpUsageClient {
    pub fn new(settings: &CollaboratorSettings) -> Result<Self, PricingError> {
        Ok(Self {
            fetcher: JsonFetcher::new("usage", settings)?,
        })
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.fetcher.request_id = Some(request_id.into());
        self
    }
}

#[async_trait]
impl UsageClient for HttpUsageClient {
    #[tracing::instrument(skip(self, window), fields(window = %window))]
    async fn fetch_usage_records(
        &self,
        product_id: &str,
        window: &DateRange,
    ) -> Result<Vec<UsageRecord>, PricingError> {
        let start = window.start().to_string();
        let end = window.end().to_string();
        let query = [
            ("product.id", product_id),
            ("usageDate.gte", start.as_str()),
            ("usageDate.lte", end.as_str()),
        ];
        self.fetcher
            .get("/usage", &query, &format!("usage of product {}", product_id))
            .await
    }
}
