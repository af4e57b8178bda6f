//! Shared immutable state handed to every hook and command handler.

use crate::commands::CommandRegistry;
use crate::config::Config;
use crate::hooks::HookRegistry;

/// Everything a handler needs besides the connection: the loaded
/// configuration and both registries. Built once at startup and shared
/// behind an `Arc`.
pub struct Context {
    /// The loaded configuration.
    pub config: Config,
    /// Event hooks, frozen at startup.
    pub hooks: HookRegistry,
    /// Named commands, frozen at startup.
    pub commands: CommandRegistry,
}

impl Context {
    /// Assemble the shared state.
    pub fn new(config: Config, hooks: HookRegistry, commands: CommandRegistry) -> Self {
        Context {
            config,
            hooks,
            commands,
        }
    }
}
