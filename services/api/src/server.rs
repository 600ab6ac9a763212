use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use tracing::info;

use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryJobStore, InMemoryNotificationSink, InMemoryStudentDirectory};
use crate::routes::with_posting_routes;
use placements::config::AppConfig;
use placements::error::AppError;
use placements::telemetry;
use placements::workflows::postings::{
    load_roster, FanoutDispatcher, JobLifecycleService, LifecycleReconciler,
};

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
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryJobStore::default());
    let directory = Arc::new(InMemoryStudentDirectory::default());
    let sink = Arc::new(InMemoryNotificationSink::default());

    if let Some(path) = args.roster.take() {
        let students = load_roster(&path)?;
        info!(count = students.len(), path = %path.display(), "student roster loaded");
        directory.seed(students);
    }

    let dispatcher = FanoutDispatcher::new(directory, sink)
        .with_max_in_flight(config.reconciler.fanout_max_in_flight);
    let service = Arc::new(JobLifecycleService::new(store.clone(), dispatcher.clone()));

    // One owned background reconciler; extra instances elsewhere stay safe
    // thanks to the store's conditional transition.
    let reconciler = LifecycleReconciler::new(store, dispatcher)
        .with_tick_timeout(config.reconciler.tick_timeout());
    tokio::spawn(reconciler.run(config.reconciler.interval()));

    let app = with_posting_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "placement posting service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
