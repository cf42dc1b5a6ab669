//! # Device Fault Relay
//!
//! Serves `POST /api/odoo-report`, turning fault reports from the QR-code form
//! into Odoo maintenance requests.
//!
//! ## Configuration
//!
//! Read from the environment (a local `.env` file is loaded first):
//! `REPORT_KEY`, `ODOO_URL`, `ODOO_DB`, `ODOO_USER_ID`, `ODOO_PASSWORD`, and
//! optionally `PORT`, `BIND_HOST`, `DEVICE_REGISTRY_PATH`.

use std::sync::Arc;

use tracing::info;

use device_fault_relay::config::RelayConfig;
use device_fault_relay::create_app;
use device_fault_relay::erp::OdooRpcClient;
use device_fault_relay::registry::DeviceRegistry;
use device_fault_relay::relay::ReportRelay;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "device_fault_relay=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting device fault relay");

    let config = RelayConfig::from_env()?;

    let registry = DeviceRegistry::load(&config.registry_path)?;
    info!(
        "Loaded {} devices from {}",
        registry.len(),
        config.registry_path.display()
    );

    let erp = OdooRpcClient::new(config.odoo.clone());
    info!("Forwarding tickets to {}", config.odoo.url);

    let relay = ReportRelay::new(config.report_key.as_str(), Arc::new(registry), Arc::new(erp));
    let app = create_app(relay);

    // Bind and serve
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
