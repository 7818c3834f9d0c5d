use std::sync::Arc;

use k8s_nodegc_collector::NodeGc;
use k8s_nodegc_kubeapi::KubeApi;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use config::Config;

mod config;
mod http;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    tracing::info!("Starting k8s-nodegc-operator");

    let config = Config::from_env()?;
    let kubeapi = KubeApi::new().await?;
    let shutdown = CancellationToken::new();
    let mut reflectors = JoinSet::new();

    let (nodes, node_reflector) = kubeapi.node_cache();
    let (cilium_nodes, cilium_node_reflector) = kubeapi.cilium_node_cache();
    // Nodes are only consulted when CiliumNode CRD support is enabled.
    if config.gc.enable_cilium_node_crd {
        reflectors.spawn(node_reflector.run(shutdown.child_token()));
    }
    reflectors.spawn(cilium_node_reflector.run(shutdown.child_token()));

    let mut gc = NodeGc::new(
        config.gc.clone(),
        Arc::new(nodes),
        Arc::new(cilium_nodes),
        Arc::new(kubeapi),
    );
    gc.start().await;

    let app = http::router(gc.status());
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Listening on http://{addr}");
    }
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await;

    shutdown.cancel();
    gc.stop().await;
    while let Some(joined) = reflectors.join_next().await {
        if let Err(err) = joined {
            tracing::error!(%err, "Watch task did not finish cleanly");
        }
    }
    tracing::info!("Stopped k8s-nodegc-operator");

    served.map_err(Into::into)
}

/// Resolves on Ctrl-C, SIGTERM or once `token` is cancelled, cancelling `token` on the way out.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix;

        match unix::signal(unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
        () = token.cancelled() => {}
    }
    tracing::info!("Shutting down");
    token.cancel();
}
