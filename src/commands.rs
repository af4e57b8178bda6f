//! Named command registration and lookup.
//!
//! Commands are looked up by name or alias in registration order; the
//! first match wins. Re-registering a name replaces the old command in
//! place, which keeps its position in the lookup order.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use thiserror::Error;
use tracing::warn;

use crate::context::Context;
use crate::events::CommandEvent;
use crate::network::Connection;

/// An async callback invoked when its command is triggered.
pub type CommandHandler = Arc<
    dyn Fn(CommandEvent, Arc<Connection>, Arc<Context>) -> BoxFuture<'static, anyhow::Result<()>>
        + Send
        + Sync,
>;

/// Errors raised while registering commands.
#[derive(Debug, Error)]
pub enum CommandRegistryError {
    /// A name or alias of the new command is already taken by a command
    /// with a different name.
    #[error("command {new} conflicts with {existing} on {token:?}")]
    Conflict {
        /// Name of the command being registered.
        new: String,
        /// Name of the already-registered command.
        existing: String,
        /// The colliding name or alias.
        token: String,
    },
}

/// A named command with optional aliases and help text.
#[derive(Clone)]
pub struct Command {
    name: String,
    aliases: Vec<String>,
    help: Option<String>,
    handler: CommandHandler,
}

impl Command {
    /// Create a command with no aliases or help text.
    pub fn new(name: impl Into<String>, handler: CommandHandler) -> Self {
        Command {
            name: name.into(),
            aliases: Vec::new(),
            help: None,
            handler,
        }
    }

    /// Add alternate names the command also answers to.
    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    /// Attach help text shown by the `help` command.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// The command's primary name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Alternate names, in the order given.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Help text, if any.
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// The command's handler.
    pub fn handler(&self) -> &CommandHandler {
        &self.handler
    }

    fn answers_to(&self, token: &str) -> bool {
        self.name == token || self.aliases.iter().any(|a| a == token)
    }
}

/// Ordered command table. In strict mode a name or alias collision with
/// a different command is an error; otherwise it is logged and the
/// earlier registration keeps winning lookups.
pub struct CommandRegistry {
    commands: Vec<Command>,
    strict: bool,
}

impl CommandRegistry {
    /// Create an empty registry.
    pub fn new(strict: bool) -> Self {
        CommandRegistry {
            commands: Vec::new(),
            strict,
        }
    }

    /// Register a command. A command with the same name is replaced in
    /// place; a name or alias already taken by a *different* command is
    /// a conflict.
    pub fn add(&mut self, command: Command) -> Result<(), CommandRegistryError> {
        for existing in &self.commands {
            if existing.name == command.name {
                continue;
            }
            for token in std::iter::once(&command.name).chain(&command.aliases) {
                if existing.answers_to(token) {
                    if self.strict {
                        return Err(CommandRegistryError::Conflict {
                            new: command.name.clone(),
                            existing: existing.name.clone(),
                            token: token.clone(),
                        });
                    }
                    warn!(
                        new = %command.name,
                        existing = %existing.name,
                        token = %token,
                        "command name collision; earlier registration wins"
                    );
                }
            }
        }

        if let Some(slot) = self.commands.iter_mut().find(|c| c.name == command.name) {
            *slot = command;
        } else {
            self.commands.push(command);
        }
        Ok(())
    }

    /// First command whose name or an alias matches `token`, in
    /// registration order.
    pub fn lookup(&self, token: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.answers_to(token))
    }

    /// All registered commands, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }
}
