//! Connection management: transport, registration, liveness.

mod connection;
mod handshake;
mod transport;

pub use connection::{Connection, DEFAULT_FRAGMENT_LEN};
pub use handshake::register;
pub use transport::Transport;
