use lead_pipeline::config::VerifierConfig;
use lead_pipeline::pubsub::PubSubClient;
use lead_pipeline::services::EmailValidationService;
use lead_pipeline::verifier_handler::{self, VerifierState};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Entry point for the email-verification stage.
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
    let config = VerifierConfig::from_env()?;

    let validator = EmailValidationService::new(&config);
    let publisher = PubSubClient::new(config.pubsub_base_url.clone(), config.project.clone())
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let port = config.port;
    let state = Arc::new(VerifierState {
        config,
        validator,
        publisher,
    });

    let app = verifier_handler::router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            // Request size limit: push deliveries are small JSON envelopes
            .layer(RequestBodyLimitLayer::new(1024 * 1024)),
    );

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Email verifier listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
