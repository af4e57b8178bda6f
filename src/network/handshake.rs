//! Connection registration.
//!
//! Implements the identify-then-branch handshake: optional SASL
//! capability request, NICK/USER, then a read loop that answers
//! authentication challenges and pings until the server signals the end
//! of registration or a fatal numeric.

use std::sync::Arc;
use std::time::Duration;

use basalt_proto::{sasl, Message};
use tracing::info;

use crate::config::{AuthKind, Config};
use crate::error::RegistrationError;

use super::connection::Connection;

/// Register with the server; on success the watchdog is started and the
/// connection is ready for the event loop.
pub async fn register(conn: &Arc<Connection>, config: &Config) -> Result<(), RegistrationError> {
    let nick = &config.nick;

    let auth_str = config
        .auth
        .as_ref()
        .filter(|auth| auth.kind == AuthKind::Sasl)
        .map(|auth| sasl::encode_plain(&auth.user, &auth.pass));

    if auth_str.is_some() {
        conn.send_line("CAP REQ sasl").await.map_err(close_on_err(conn))?;
    }
    conn.send_line(&format!("NICK {nick}"))
        .await
        .map_err(close_on_err(conn))?;
    conn.send_line(&format!("USER {nick} 0 * :basalt"))
        .await
        .map_err(close_on_err(conn))?;
    conn.set_current_nick(nick);

    loop {
        let line = conn.read_line().await.map_err(close_on_err(conn))?;
        let msg = Message::parse(&line);

        match msg.command.as_str() {
            "AUTHENTICATE" => {
                if let Some(ref encoded) = auth_str {
                    conn.send_line(&format!("AUTHENTICATE {encoded}"))
                        .await
                        .map_err(close_on_err(conn))?;
                }
            }
            "CAP" => {
                let args: Vec<&str> = msg.params.split_whitespace().collect();
                let acked_sasl = args.get(1) == Some(&"ACK")
                    && args
                        .get(2)
                        .is_some_and(|caps| caps.trim_start_matches(':').contains("sasl"));
                if acked_sasl {
                    conn.send_line("AUTHENTICATE PLAIN")
                        .await
                        .map_err(close_on_err(conn))?;
                }
            }
            // Servers may ping mid-handshake.
            "PING" => conn
                .send_line(&format!("PONG {}", msg.params))
                .await
                .map_err(close_on_err(conn))?,
            // End of MOTD or no MOTD: registration succeeded.
            "376" | "422" => break,
            "433" => {
                conn.force_close();
                return Err(RegistrationError::NickInUse);
            }
            "903" => conn.send_line("CAP END").await.map_err(close_on_err(conn))?,
            "904" => {
                conn.force_close();
                return Err(RegistrationError::SaslFailed);
            }
            _ => {}
        }
    }

    info!(nick = %nick, "registered with server");
    conn.start_watchdog(Duration::from_secs(config.ping_timeout));
    Ok(())
}

fn close_on_err(
    conn: &Arc<Connection>,
) -> impl Fn(crate::error::ConnectionError) -> RegistrationError + '_ {
    move |e| {
        conn.force_close();
        e.into()
    }
}
