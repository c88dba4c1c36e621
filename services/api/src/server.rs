use crate::cli::ServeArgs;
use crate::infra::{default_sync_policy, AppState, InMemoryApplicationRepository};
use crate::routes::with_service_routes;
use admitflow::config::AppConfig;
use admitflow::error::AppError;
use admitflow::telemetry;
use admitflow::workflows::admissions::{AdmissionsService, HttpGalaxyGateway};
use admitflow::workflows::autofill::{HttpDocumentGateway, HttpExtractionGateway, PollPlan};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));

    let galaxy =
        HttpGalaxyGateway::new(&config.galaxy).map_err(|err| AppError::Server(axum::Error::new(err)))?;
    let documents = HttpDocumentGateway::new(&config.ocr)
        .map_err(|err| AppError::Server(axum::Error::new(err)))?;
    let extraction = HttpExtractionGateway::new(&config.ocr)
        .map_err(|err| AppError::Server(axum::Error::new(err)))?;

    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        steps: Arc::new(Mutex::new(HashMap::new())),
        documents: Arc::new(documents),
        extraction: Arc::new(extraction),
        poll_plan: PollPlan::from_config(&config.ocr),
    };

    let repository = Arc::new(InMemoryApplicationRepository::default());
    let service = Arc::new(AdmissionsService::new(
        repository,
        Arc::new(galaxy),
        default_sync_policy(),
    ));

    let app = with_service_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "admissions lifecycle service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
