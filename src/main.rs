//! basalt - an IRC bot engine.

use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use basalt::builtin;
use basalt::commands::CommandRegistry;
use basalt::config::Config;
use basalt::context::Context;
use basalt::dispatch;
use basalt::events::{self, Event};
use basalt::hooks::HookRegistryBuilder;
use basalt::supervisor;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "basalt.toml".to_string());

    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!(path = %config_path, error = %e, "Failed to load config");
            return ExitCode::FAILURE;
        }
    };

    info!(
        server = %config.server,
        port = config.port,
        nick = %config.nick,
        "Starting basalt"
    );

    let mut hooks = HookRegistryBuilder::new();
    events::register_default_hooks(&mut hooks);

    let mut commands = CommandRegistry::new(config.strict_commands);
    if let Err(e) = builtin::register_builtins(&mut commands) {
        error!(error = %e, "Failed to register built-in commands");
        return ExitCode::FAILURE;
    }

    let ctx = Arc::new(Context::new(config, hooks.build(), commands));

    let code = supervisor::run(Arc::clone(&ctx)).await;

    // Always fired exactly once, even when no connection was ever made.
    dispatch::fire_event(Event::Shutdown, None, ctx).await;

    ExitCode::from(code)
}
