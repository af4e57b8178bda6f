//! The read loop and concurrent event dispatch.
//!
//! Each inbound line is parsed once, then every event kind that answers
//! to its command is constructed and fired on its own task. A semaphore
//! caps how many handler tasks run at once; when the cap is reached the
//! read loop itself waits, which applies backpressure at the socket.

use std::sync::Arc;
use std::time::Duration;

use basalt_proto::Message;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::context::Context;
use crate::error::ConnectionError;
use crate::events::{Event, EventKind};
use crate::network::Connection;

/// How long to wait for still-running handlers after the read loop ends.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Run every hook registered for the event's kind, in registration
/// order. A failing hook is logged and does not stop the ones after it.
pub async fn fire_event(event: Event, conn: Option<Arc<Connection>>, ctx: Arc<Context>) {
    if !event.should_process(&ctx.config) {
        debug!(kind = ?event.kind(), "event suppressed");
        return;
    }
    for hook in ctx.hooks.get(event.kind()) {
        if let Err(e) = hook(event.clone(), conn.clone(), ctx.clone()).await {
            warn!(kind = ?event.kind(), error = %e, "event hook failed");
        }
    }
}

/// Read lines until the connection ends, firing events concurrently.
///
/// Returns `Ok(())` when the connection was closed deliberately, and
/// the terminal error otherwise (timeout, peer close, I/O failure).
pub async fn run(conn: Arc<Connection>, ctx: Arc<Context>) -> Result<(), ConnectionError> {
    let permits = Arc::new(Semaphore::new(ctx.config.max_in_flight));
    let mut tasks: JoinSet<()> = JoinSet::new();

    let result = loop {
        let line = match conn.read_line().await {
            Ok(line) => line,
            Err(_) if conn.is_done() => break Ok(()),
            Err(e) => break Err(e),
        };
        let msg = Message::parse(&line);

        for kind in EventKind::WIRE {
            if !kind.responds_to(&msg.command) {
                continue;
            }
            let Some(event) = Event::from_message(kind, &msg) else {
                debug!(command = %msg.command, ?kind, "malformed message for event");
                continue;
            };
            // Closed semaphores are never used here, so acquire cannot
            // fail; waiting here is the backpressure point.
            let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
                break;
            };
            let conn = Arc::clone(&conn);
            let ctx = Arc::clone(&ctx);
            tasks.spawn(async move {
                fire_event(event, Some(conn), ctx).await;
                drop(permit);
            });
        }

        // Reap whatever has finished without blocking the read.
        while tasks.try_join_next().is_some() {}
    };

    drain(&mut tasks).await;
    result
}

/// Give in-flight handlers a bounded window to finish, then abort the
/// stragglers.
async fn drain(tasks: &mut JoinSet<()>) {
    let deadline = tokio::time::sleep(DRAIN_TIMEOUT);
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            joined = tasks.join_next() => {
                if joined.is_none() {
                    return;
                }
            }
            _ = &mut deadline => {
                warn!(remaining = tasks.len(), "handlers still running at drain deadline; aborting");
                tasks.abort_all();
                while tasks.join_next().await.is_some() {}
                return;
            }
        }
    }
}
