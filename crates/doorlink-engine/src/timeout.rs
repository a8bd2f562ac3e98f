//! Request timeouts.
//!
//! One task owns a [`DelayQueue`] holding a slot per pending request. Arming
//! and cancelling are messages, so a request resolved early frees its slot
//! instead of leaving a sleeping timer behind. On expiry the task hands the
//! id to [`AccessEngine::resolve_timeout`], which races the other resolvers
//! through the registry like any of them.

use crate::decision::AccessEngine;
use doorlink_core::RequestId;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Weak;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::time::{DelayQueue, delay_queue};
use tracing::{debug, trace};

#[derive(Debug)]
enum TimerCommand {
    Arm(RequestId, Duration),
    Cancel(RequestId),
}

/// Sending side of the timeout task. The task stops when every handle is gone.
#[derive(Debug, Clone)]
pub(crate) struct TimeoutHandle {
    commands: mpsc::UnboundedSender<TimerCommand>,
}

impl TimeoutHandle {
    /// Start the timeout task for `engine`. Must be called inside a runtime.
    pub(crate) fn spawn(engine: Weak<AccessEngine>) -> Self {
        Self::spawn_with(move |id| {
            let Some(engine) = engine.upgrade() else {
                return false;
            };
            tokio::spawn(async move { engine.resolve_timeout(id).await });
            true
        })
    }

    /// Start a timeout task that passes expired ids to `on_expire`.
    /// The task stops once `on_expire` returns `false`.
    fn spawn_with<F>(on_expire: F) -> Self
    where
        F: FnMut(RequestId) -> bool + Send + 'static,
    {
        let (commands, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(on_expire, rx));
        Self { commands }
    }

    pub(crate) fn arm(&self, id: RequestId, after: Duration) {
        // Send only fails once the task is gone, i.e. during shutdown.
        let _ = self.commands.send(TimerCommand::Arm(id, after));
    }

    pub(crate) fn cancel(&self, id: RequestId) {
        let _ = self.commands.send(TimerCommand::Cancel(id));
    }
}

async fn run<F>(mut on_expire: F, mut commands: mpsc::UnboundedReceiver<TimerCommand>)
where
    F: FnMut(RequestId) -> bool,
{
    let mut queue: DelayQueue<RequestId> = DelayQueue::new();
    let mut keys: HashMap<RequestId, delay_queue::Key> = HashMap::new();

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(TimerCommand::Arm(id, after)) => {
                    trace!(request_id = %id, timeout_ms = after.as_millis() as u64, "timer armed");
                    let key = queue.insert(id.clone(), after);
                    if let Some(previous) = keys.insert(id, key) {
                        queue.try_remove(&previous);
                    }
                }
                Some(TimerCommand::Cancel(id)) => {
                    if let Some(key) = keys.remove(&id) {
                        queue.try_remove(&key);
                        trace!(request_id = %id, "timer cancelled");
                    }
                }
                None => break,
            },
            Some(expired) = queue.next(), if !queue.is_empty() => {
                let id = expired.into_inner();
                keys.remove(&id);
                if !on_expire(id) {
                    break;
                }
            }
        }
    }
    debug!(armed = keys.len(), "timeout task stopped");
}
