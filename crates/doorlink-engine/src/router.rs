use crate::decision::AccessEngine;
use doorlink_network::RawMessage;
use doorlink_protocol::InboundMessage;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, trace, warn};

/// Decodes raw transport messages and feeds them to the engine.
///
/// Messages are handled one at a time in arrival order. Malformed messages
/// are logged and dropped.
pub struct InboundRouter {
    engine: Arc<AccessEngine>,
    inbound: mpsc::Receiver<RawMessage>,
    shutdown: CancellationToken,
}

impl InboundRouter {
    pub fn new(
        engine: Arc<AccessEngine>,
        inbound: mpsc::Receiver<RawMessage>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            engine,
            inbound,
            shutdown,
        }
    }

    /// Run until cancelled or until every sender is gone.
    pub async fn run(mut self) {
        info!("inbound router started");
        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                message = self.inbound.recv() => match message {
                    Some(message) => self.route(message).await,
                    None => break,
                },
            }
        }
        info!("inbound router stopped");
    }

    async fn route(&self, message: RawMessage) {
        match InboundMessage::parse(&message.topic, &message.payload) {
            Ok(decoded) => {
                trace!(topic = %message.topic, "routing message");
                self.engine.handle(decoded).await;
            }
            Err(e) => warn!(topic = %message.topic, error = %e, "dropping inbound message"),
        }
    }
}

/// Spawn an [`InboundRouter`] on the current runtime.
pub fn spawn_router(
    engine: Arc<AccessEngine>,
    inbound: mpsc::Receiver<RawMessage>,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(InboundRouter::new(engine, inbound, shutdown).run())
}
