//! The engine's built-in event hooks.
//!
//! These give every event its baseline behavior: protocol bookkeeping
//! (PONG replies, nick tracking), logging, and the bridge from chat
//! messages to command dispatch. User hooks registered after these run
//! in addition, never instead.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use tracing::{debug, info, warn};

use crate::context::Context;
use crate::dispatch;
use crate::events::{CommandEvent, Event, EventKind};
use crate::hooks::{Hook, HookRegistryBuilder};
use crate::network::Connection;

macro_rules! hook {
    (|$event:ident, $conn:ident, $ctx:ident| $body:expr) => {
        Arc::new(move |$event, conn: Option<Arc<Connection>>, $ctx: Arc<Context>| {
            let fut: BoxFuture<'static, anyhow::Result<()>> = Box::pin(async move {
                let Some($conn) = conn else {
                    return Ok(());
                };
                $body
            });
            fut
        }) as Hook
    };
}

/// Install the baseline hook for each event kind.
pub fn register_default_hooks(builder: &mut HookRegistryBuilder) {
    builder.register(
        EventKind::Join,
        hook!(|event, _conn, _ctx| {
            let Event::Join(event) = event else {
                return Ok(());
            };
            debug!(nick = %event.source.nick, channel = %event.channel, "join");
            Ok(())
        }),
    );

    builder.register(
        EventKind::Part,
        hook!(|event, _conn, _ctx| {
            let Event::Part(event) = event else {
                return Ok(());
            };
            debug!(nick = %event.source.nick, channel = %event.channel, "part");
            Ok(())
        }),
    );

    builder.register(
        EventKind::JoinFailed,
        hook!(|event, _conn, _ctx| {
            let Event::JoinFailed(event) = event else {
                return Ok(());
            };
            warn!(channel = %event.channel, reason = event.reason, "could not join channel");
            Ok(())
        }),
    );

    builder.register(
        EventKind::Kick,
        hook!(|event, conn, _ctx| {
            let Event::Kick(event) = event else {
                return Ok(());
            };
            if event.targets(&conn.current_nick()) {
                warn!(
                    channel = %event.channel,
                    by = %event.source.nick,
                    "kicked from channel"
                );
            } else {
                debug!(
                    channel = %event.channel,
                    target = %event.target,
                    by = %event.source.nick,
                    "kick"
                );
            }
            Ok(())
        }),
    );

    builder.register(
        EventKind::Nick,
        hook!(|event, conn, _ctx| {
            let Event::Nick(event) = event else {
                return Ok(());
            };
            if event.is_from(&conn.current_nick()) {
                info!(nick = %event.nick, "nick changed");
                conn.set_current_nick(&event.nick);
            }
            Ok(())
        }),
    );

    builder.register(
        EventKind::Ping,
        hook!(|event, conn, _ctx| {
            let Event::Ping(event) = event else {
                return Ok(());
            };
            conn.send_line(&format!("PONG {}", event.challenge)).await?;
            Ok(())
        }),
    );

    builder.register(
        EventKind::Message,
        hook!(|event, conn, ctx| {
            let Event::Message(event) = event else {
                return Ok(());
            };
            let nick = conn.current_nick();
            let command_char = ctx.config.command_char;
            if !event.is_command(&nick, command_char) {
                return Ok(());
            }
            if let Some(cmd) = CommandEvent::derive(&event, &nick, command_char) {
                dispatch::fire_event(Event::Command(cmd), Some(conn), ctx.clone()).await;
            }
            Ok(())
        }),
    );

    builder.register(
        EventKind::Command,
        hook!(|event, conn, ctx| {
            let Event::Command(event) = event else {
                return Ok(());
            };
            let Some(command) = ctx.commands.lookup(&event.command) else {
                debug!(command = %event.command, "unknown command");
                return Ok(());
            };
            info!(
                command = %event.command,
                from = %event.source.nick,
                channel = %event.channel,
                "running command"
            );
            let handler = Arc::clone(command.handler());
            handler(event, conn, ctx.clone()).await
        }),
    );

    builder.register(
        EventKind::Shutdown,
        Arc::new(|_event, _conn: Option<Arc<Connection>>, _ctx: Arc<Context>| {
            let fut: BoxFuture<'static, anyhow::Result<()>> = Box::pin(async move {
                info!("shutting down");
                Ok(())
            });
            fut
        }) as Hook,
    );
}
