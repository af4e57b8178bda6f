//! # basalt-proto
//!
//! Line-level IRC protocol support for the basalt bot.
//!
//! ## Features
//!
//! - Infallible parsing of raw server lines into [`Message`] values
//! - Source-prefix parsing into [`User`] values
//! - CTCP ACTION (emote) envelope handling
//! - HTML-like markup translation to IRC formatting codes
//! - SASL PLAIN credential encoding
//! - Optional tokio line codec for async framing (feature `tokio`)
//!
//! The parser never fails: a malformed line degrades to a [`Message`] with
//! empty or absent fields rather than an error. Parameter text is kept raw;
//! callers split it according to the command they are handling.

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod format;
#[cfg(feature = "tokio")]
pub mod line;
pub mod message;
pub mod sasl;
pub mod user;

#[cfg(feature = "tokio")]
pub use self::line::{LineCodec, LineCodecError};
pub use self::message::Message;
pub use self::user::User;
