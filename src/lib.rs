//! basalt - an extensible IRC bot engine.
//!
//! The engine keeps a persistent connection to an IRC server, performs the
//! registration handshake (with optional SASL), watches connection
//! liveness, and fans inbound lines out to concurrently executing event
//! hooks while serializing outbound writes. Extensions register hooks and
//! commands during startup, before the reconnect supervisor takes over;
//! both registries are frozen from then on.
//!
//! Module map:
//! - [`network`]: transport, connection lifecycle, handshake, watchdog
//! - [`events`]: the fixed event variant set and its default hooks
//! - [`hooks`] / [`commands`]: the two startup-built registries
//! - [`dispatch`]: the read loop and concurrent hook execution
//! - [`supervisor`]: the connect/retry/backoff control loop

pub mod builtin;
pub mod commands;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod hooks;
pub mod network;
pub mod supervisor;
