//! Commands the engine ships with.

use std::sync::Arc;

use crate::commands::{Command, CommandHandler, CommandRegistry, CommandRegistryError};
use crate::events::CommandEvent;

/// Where replies to a command go: the channel it was issued in, or the
/// sender's nick for direct messages.
pub fn reply_target(event: &CommandEvent) -> &str {
    if event.channel.starts_with('#') {
        &event.channel
    } else {
        &event.source.nick
    }
}

/// Register the built-in `help` and `source` commands.
pub fn register_builtins(registry: &mut CommandRegistry) -> Result<(), CommandRegistryError> {
    let help: CommandHandler = Arc::new(|event, conn, ctx| {
        Box::pin(async move {
            let nick = &event.source.nick;
            let reply = match ctx.commands.lookup(event.args.trim()) {
                Some(command) if !event.args.trim().is_empty() => {
                    let mut line = format!("<b>{}</b>", command.name());
                    if !command.aliases().is_empty() {
                        line.push_str(&format!(" (aliases: {})", command.aliases().join(", ")));
                    }
                    match command.help() {
                        Some(help) => format!("{line}: {help}"),
                        None => format!("{line}: no help available"),
                    }
                }
                _ => {
                    let mut names: Vec<&str> = ctx.commands.iter().map(Command::name).collect();
                    names.sort_unstable();
                    format!("<b>available commands:</b> {}", names.join(", "))
                }
            };
            conn.send_notice(nick, &basalt_proto::format::format(&reply))
                .await?;
            Ok(())
        })
    });

    let source: CommandHandler = Arc::new(|event, conn, _ctx| {
        Box::pin(async move {
            let reply = format!(
                "{} {} - {}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                env!("CARGO_PKG_REPOSITORY"),
            );
            conn.send_message(reply_target(&event), &reply).await?;
            Ok(())
        })
    });

    registry.add(
        Command::new("help", help)
            .with_aliases(["h"])
            .with_help("list commands, or show help for one: help <command>"),
    )?;
    registry.add(
        Command::new("source", source).with_help("where this bot's code lives"),
    )?;
    Ok(())
}
