//! Process lifecycle: wiring, serving and graceful shutdown.

use crate::config::{Settings, TransportKind};
use crate::routes::build_router;
use crate::state::AppState;
use anyhow::Context;
use doorlink_engine::{AccessEngine, DoorTracker, spawn_router};
use doorlink_network::{INBOUND_CHANNEL_CAPACITY, LoopbackTransport, MqttTransport, Publisher};
use doorlink_storage::{Database, seed_default_users};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Run the backend until Ctrl-C or SIGTERM.
///
/// # Errors
/// Fails before the HTTP listener is bound if the database cannot be opened,
/// the door record cannot be initialised or the configuration is invalid.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let db = Database::new(settings.database_config())
        .await
        .with_context(|| format!("failed to open database at {}", settings.database_path))?;
    info!(path = %settings.database_path, "database ready");

    if settings.seed_users {
        let seeded = seed_default_users(&db)
            .await
            .context("failed to seed default users")?;
        if seeded > 0 {
            info!(count = seeded, "seeded default users");
        }
    }

    let door = DoorTracker::new(&db, settings.door_id.clone())
        .initialize()
        .await
        .context("failed to initialise door record")?;
    info!(door_id = %door.door_id, state = %door.state, "door initialised");

    let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CHANNEL_CAPACITY);
    let (publisher, mqtt): (Arc<dyn Publisher>, Option<Arc<MqttTransport>>) =
        match settings.transport {
            TransportKind::Mqtt => {
                let config = settings.mqtt_config().context("invalid MQTT configuration")?;
                info!(host = %config.host, port = config.port, "connecting to MQTT broker");
                let transport = Arc::new(MqttTransport::start(config, inbound_tx));
                (transport.clone(), Some(transport))
            }
            TransportKind::Loopback => {
                warn!("loopback transport selected; no door controller is reachable");
                (Arc::new(LoopbackTransport::new(inbound_tx).without_echo()), None)
            }
        };

    let engine = AccessEngine::new(settings.engine_config(), &db, publisher)
        .context("failed to start access engine")?;

    let shutdown = CancellationToken::new();
    let router = spawn_router(engine.clone(), inbound_rx, shutdown.clone());

    let app = build_router(AppState::new(engine, db.clone()));
    let addr = settings.listen_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "HTTP API listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;
    if let Err(e) = &served {
        error!(error = %e, "HTTP server error");
    }

    info!("shutting down");
    shutdown.cancel();
    if let Err(e) = router.await {
        warn!(error = %e, "inbound router task failed");
    }
    if let Some(mqtt) = mqtt {
        mqtt.shutdown().await;
    }
    db.close().await;
    info!("shutdown complete");

    served.context("HTTP server failed")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received Ctrl+C"),
        () = terminate => info!("received SIGTERM"),
    }
}
