//! The reconnect supervisor.
//!
//! Owns the connect / register / dispatch cycle and decides, when a
//! session ends, whether to retry with backoff or exit. Backoff is
//! linear: each consecutive failed attempt adds ten seconds, and a
//! session that reaches full registration resets the count.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::context::Context;
use crate::dispatch;
use crate::network::{self, Connection};

/// Added per consecutive failed attempt.
const BACKOFF_STEP: Duration = Duration::from_secs(10);

/// How a session came to an end.
enum SessionEnd {
    /// We disconnected on purpose.
    Quit,
    /// The connection, registration, or read loop failed.
    Failed,
}

/// Delay before the given retry attempt. Attempt 0 is the first
/// connect and waits not at all.
fn backoff_delay(attempt: u32) -> Duration {
    BACKOFF_STEP * attempt
}

/// Run sessions until one ends deliberately or the retry budget is
/// spent. Returns the process exit code.
pub async fn run(ctx: Arc<Context>) -> u8 {
    let mut tries: u32 = 0;

    loop {
        if tries > 0 {
            let delay = backoff_delay(tries);
            warn!(attempt = tries, delay_secs = delay.as_secs(), "reconnecting after delay");
            tokio::time::sleep(delay).await;
        }

        match connect_and_run(&ctx, &mut tries).await {
            SessionEnd::Quit => {
                info!("session ended deliberately");
                return 0;
            }
            SessionEnd::Failed => {
                tries += 1;
                if tries > ctx.config.retries {
                    error!(retries = ctx.config.retries, "retry budget exhausted");
                    return 1;
                }
            }
        }
    }
}

/// One full session: connect, register, join channels, run the read
/// loop, disconnect. `tries` resets to zero once registration succeeds.
async fn connect_and_run(ctx: &Arc<Context>, tries: &mut u32) -> SessionEnd {
    let config = &ctx.config;

    let conn = match Connection::connect(&config.server, config.port, config.secure).await {
        Ok(conn) => conn,
        Err(e) => {
            error!(server = %config.server, port = config.port, error = %e, "connect failed");
            return SessionEnd::Failed;
        }
    };
    info!(server = %config.server, port = config.port, "connected");

    if let Err(e) = network::register(&conn, config).await {
        error!(error = %e, "registration failed");
        return SessionEnd::Failed;
    }
    *tries = 0;

    if let Err(e) = conn.join(&config.channels).await {
        error!(error = %e, "channel join failed");
        conn.disconnect(&config.quit_msg).await;
        return SessionEnd::Failed;
    }

    let result = dispatch::run(Arc::clone(&conn), Arc::clone(ctx)).await;
    conn.disconnect(&config.quit_msg).await;

    match result {
        Ok(()) if !conn.timed_out() => SessionEnd::Quit,
        Ok(()) => SessionEnd::Failed,
        Err(e) => {
            error!(error = %e, "session ended with error");
            SessionEnd::Failed
        }
    }
}
