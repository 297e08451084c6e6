use crate::cli::ServeArgs;
use crate::infra::{AppState, TracingNotifier};
use crate::routes::with_intake_routes;
use autopilot_studio::cache::QueryCache;
use autopilot_studio::config::AppConfig;
use autopilot_studio::error::AppError;
use autopilot_studio::intake::scoring::HttpScoringClient;
use autopilot_studio::intake::{IntakeService, MemoryIntakeStore};
use autopilot_studio::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{error, info};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry, config.environment)?;

    let endpoint = config.scoring.require_endpoint()?;
    let scorer = HttpScoringClient::new(endpoint, config.scoring.timeout).map_err(|err| {
        error!(error = %err, "could not build scoring client");
        AppError::Intake(err.into())
    })?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let intake_service = Arc::new(IntakeService::new(
        Arc::new(MemoryIntakeStore::default()),
        Arc::new(scorer),
        Arc::new(TracingNotifier),
        Arc::new(QueryCache::new(config.cache)),
    ));

    let app = with_intake_routes(intake_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        scoring_endpoint = endpoint,
        "intake qualification service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
