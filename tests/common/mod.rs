//! Integration test common infrastructure.
//!
//! Provides an in-memory peer that plays the server side of a
//! connection, plus configuration and registry helpers.

use std::sync::Arc;
use std::time::Duration;

use basalt::config::Config;
use basalt::network::{Connection, Transport};
use basalt_proto::LineCodec;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{DuplexStream, ReadHalf, WriteHalf};
use tokio_util::codec::{FramedRead, FramedWrite};

/// The server side of an in-memory connection. Lines are framed the
/// same way the engine frames them.
pub struct FakeServer {
    reader: FramedRead<ReadHalf<DuplexStream>, LineCodec>,
    writer: FramedWrite<WriteHalf<DuplexStream>, LineCodec>,
}

#[allow(dead_code)]
impl FakeServer {
    /// Receive the next line the engine sent, or panic after a second.
    pub async fn recv(&mut self) -> String {
        tokio::time::timeout(Duration::from_secs(1), self.reader.next())
            .await
            .expect("timed out waiting for client line")
            .expect("client closed the connection")
            .expect("client sent an unreadable line")
    }

    /// Receive lines until one starts with `prefix`, returning it.
    pub async fn recv_until(&mut self, prefix: &str) -> String {
        loop {
            let line = self.recv().await;
            if line.starts_with(prefix) {
                return line;
            }
        }
    }

    /// Send one line to the engine.
    pub async fn send(&mut self, line: &str) {
        self.writer
            .send(line.to_string())
            .await
            .expect("failed to send server line");
    }
}

/// A connection wired to an in-memory fake server.
#[allow(dead_code)]
pub fn connected_pair() -> (Arc<Connection>, FakeServer) {
    let (client_io, server_io) = tokio::io::duplex(4096);

    let (client_read, client_write) = tokio::io::split(client_io);
    let transport = Transport::from_io(Box::new(client_read), Box::new(client_write));
    let conn = Connection::from_transport("fake.example.net", 6667, transport);

    let (server_read, server_write) = tokio::io::split(server_io);
    let server = FakeServer {
        reader: FramedRead::new(server_read, LineCodec::new()),
        writer: FramedWrite::new(server_write, LineCodec::new()),
    };

    (conn, server)
}

/// A config pointing at nothing in particular, with fast timeouts.
pub fn test_config() -> Config {
    Config {
        server: "fake.example.net".to_string(),
        nick: "basalt".to_string(),
        ..Config::default()
    }
}
