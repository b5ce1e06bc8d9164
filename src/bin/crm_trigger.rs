use lead_pipeline::campaign_client::CampaignClient;
use lead_pipeline::config::CrmConfig;
use lead_pipeline::crm_handler::{self, CrmState};
use lead_pipeline::services::ContactStoreService;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Entry point for the CRM campaign-trigger stage.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lead_pipeline=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = CrmConfig::from_env()?;

    let contacts = ContactStoreService::new(&config);
    let campaign = CampaignClient::new(&config).map_err(|e| anyhow::anyhow!("{}", e))?;

    let port = config.port;
    let state = Arc::new(CrmState {
        config,
        contacts,
        campaign,
    });

    let app = crm_handler::router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            // Request size limit: push deliveries are small JSON envelopes
            .layer(RequestBodyLimitLayer::new(1024 * 1024)),
    );

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("CRM trigger listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
