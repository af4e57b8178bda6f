//! Hook registration and lookup.
//!
//! Hooks are registered once at startup, then the registry is frozen.
//! Lookup during dispatch is a plain map read with no locking.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::context::Context;
use crate::events::{Event, EventKind};
use crate::network::Connection;

/// An async callback fired when an event of its registered kind arrives.
/// The connection is absent only for the final `Shutdown` event when no
/// session was ever established.
pub type Hook = Arc<
    dyn Fn(Event, Option<Arc<Connection>>, Arc<Context>) -> BoxFuture<'static, anyhow::Result<()>>
        + Send
        + Sync,
>;

/// Accumulates hooks during startup; [`build`](Self::build) freezes them.
#[derive(Default)]
pub struct HookRegistryBuilder {
    hooks: HashMap<EventKind, Vec<Hook>>,
}

impl HookRegistryBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook for `kind`. Hooks fire in registration order.
    pub fn register(&mut self, kind: EventKind, hook: Hook) {
        self.hooks.entry(kind).or_default().push(hook);
    }

    /// Freeze the registered hooks.
    pub fn build(self) -> HookRegistry {
        HookRegistry { hooks: self.hooks }
    }
}

/// Immutable hook table, shared across all dispatch tasks.
pub struct HookRegistry {
    hooks: HashMap<EventKind, Vec<Hook>>,
}

impl HookRegistry {
    /// Hooks registered for `kind`, in registration order.
    pub fn get(&self, kind: EventKind) -> &[Hook] {
        self.hooks.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }
}
