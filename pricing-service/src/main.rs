//! Pricing Service entry point.
//!
//! ```bash
//! pricing-service bill prod-42 --from 2025-01-01 --to 2025-01-31
//! pricing-service preview --plan pop-internet --item item.json --usage usage.json
//! ```

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use pricing_service::clients::{
    CatalogClient, HttpCatalogClient, HttpInventoryClient, HttpUsageClient,
};
use pricing_service::config::PricingConfig;
use pricing_service::models::{DateRange, OrderItem, UsageRecord};
use pricing_service::services::{init_metrics, PricingEngine, PricingSettings};
use serde::de::DeserializeOwned;
use service_core::error::AppError;
use service_core::observability::init_tracing;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "pricing-service")]
#[command(version)]
#[command(about = "Price plan calculation and bill-cycle generation", long_about = None)]
struct Cli {
    /// Correlation id forwarded to collaborator services
    #[arg(long, env = "REQUEST_ID")]
    request_id: Option<String>,

    /// Date used for validity checks instead of today
    #[arg(long, env = "PRICING_EVALUATION_DATE")]
    as_of: Option<NaiveDate>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bill an installed product over a window
    Bill {
        product_id: String,
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
    },
    /// Price an order item against a catalog price plan
    Preview {
        /// Price plan id
        #[arg(long)]
        plan: String,
        /// Order item JSON file
        #[arg(long)]
        item: PathBuf,
        /// Usage records JSON file, for usage plans
        #[arg(long)]
        usage: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!(error_kind = e.kind(), error = %e, "pricing-service failed");
        eprintln!("{}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = PricingConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );
    init_metrics();

    let request_id = cli
        .request_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    tracing::info!(
        version = %config.service_version,
        environment = %config.common.environment,
        request_id = %request_id,
        catalog_service_url = %config.catalog_service.url,
        inventory_service_url = %config.inventory_service.url,
        usage_service_url = %config.usage_service.url,
        default_currency = %config.default_currency,
        "Starting pricing-service"
    );

    let catalog =
        Arc::new(HttpCatalogClient::new(&config.catalog_service)?.with_request_id(&request_id));
    let inventory =
        Arc::new(HttpInventoryClient::new(&config.inventory_service)?.with_request_id(&request_id));
    let usage = Arc::new(HttpUsageClient::new(&config.usage_service)?.with_request_id(&request_id));
    let engine = PricingEngine::new(
        catalog.clone(),
        inventory,
        usage,
        PricingSettings {
            default_currency: config.default_currency.clone(),
            evaluation_date: cli.as_of,
        },
    );

    let output = match cli.command {
        Commands::Bill {
            product_id,
            from,
            to,
        } => {
            let window = DateRange::new(from, to)?;
            let statement = engine.calculate_bill_for_product(&product_id, window).await?;
            let total = match statement.total(&config.default_currency) {
                Ok(total) => Some(total),
                Err(e) => {
                    tracing::warn!(error = %e, "Statement lines cannot be totalled");
                    None
                }
            };
            if !statement.is_complete() {
                tracing::warn!(
                    failures = statement.failures.len(),
                    "Some price plans could not be billed"
                );
            }
            serde_json::json!({
                "requestId": request_id,
                "statement": statement,
                "total": total,
            })
        }
        Commands::Preview { plan, item, usage } => {
            let item: OrderItem = read_json(&item).await?;
            let usage: Option<Vec<UsageRecord>> = match usage {
                Some(path) => Some(read_json(&path).await?),
                None => None,
            };
            let plan = catalog.fetch_price_plan(&plan).await?;
            let components = engine
                .calculate_order_preview_price(&item, &plan, usage.as_deref())
                .await?;
            serde_json::json!({
                "requestId": request_id,
                "orderItemId": item.id,
                "components": components,
            })
        }
    };

    let rendered = serde_json::to_string_pretty(&output)
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to render output: {}", e)))?;
    println!("{}", rendered);
    Ok(())
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let raw = tokio::fs::read_to_string(path).await?;
    serde_json::from_str(&raw).map_err(|e| {
        AppError::BadRequest(anyhow::anyhow!("{} is not valid JSON input: {}", path.display(), e))
    })
}
