use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::get;
use k8s_nodegc_collector::GcStatus;
use tokio::sync::watch;

pub(crate) fn router(status: watch::Receiver<GcStatus>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/gc/status", get(gc_status))
        .with_state(status)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn gc_status(State(status): State<watch::Receiver<GcStatus>>) -> Json<GcStatus> {
    Json(status.borrow().clone())
}
