use std::sync::Arc;

use eir_core::audit::InProcessAuditSink;
use eir_core::InMemoryRangeStore;
use eir_core::DecisionEngine;
use eir_daemon::config::Config;
use eir_daemon::diameter::{S13Handler, run_listener};
use eir_daemon::http::{self, AppState};
use eir_daemon::load::LoadMonitor;
use log::info;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1);
    let config = Arc::new(Config::load(config_path.as_deref())?);

    eir_core::init_logging(config.log_level_filter());
    info!("starting eir-daemon");

    let store = Arc::new(InMemoryRangeStore::new());
    let engine = Arc::new(DecisionEngine::new(store, config.engine));
    let load = LoadMonitor::new(config.max_connections);
    let (audit_sink, mut audit_rx) = InProcessAuditSink::new(1024);
    let audit_sink: Arc<dyn eir_core::audit::AuditSink> = Arc::new(audit_sink);

    tokio::spawn(async move {
        while let Some(record) = audit_rx.recv().await {
            log::info!(
                "audit imei={} status={:?} result_code={:?}",
                record.imei,
                record.status,
                record.result_code
            );
        }
    });

    let handler = Arc::new(S13Handler::new(
        engine.clone(),
        audit_sink,
        config.clone(),
        load.clone(),
    ));

    let shutdown = CancellationToken::new();
    let tasks = TaskTracker::new();

    let diameter_config = config.clone();
    let diameter_handler = handler.clone();
    let diameter_load = load.clone();
    let diameter_shutdown = shutdown.clone();
    let diameter_tasks = tasks.clone();
    let diameter_task = tokio::spawn(async move {
        run_listener(
            diameter_config,
            diameter_handler,
            diameter_load,
            diameter_shutdown,
            diameter_tasks,
        )
        .await
    });

    let http_state = AppState { engine, load };
    let app = http::router(http_state);
    let http_listener = tokio::net::TcpListener::bind(config.bind_addr_http).await?;
    info!("HTTP facade listening on {}", config.bind_addr_http);

    let http_shutdown = shutdown.clone();
    let http_task = tokio::spawn(async move {
        axum::serve(http_listener, app)
            .with_graceful_shutdown(async move { http_shutdown.cancelled().await })
            .await
    });

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    shutdown.cancel();
    tasks.close();

    let _ = diameter_task.await?;
    tasks.wait().await;
    let _ = http_task.await?;

    Ok(())
}
