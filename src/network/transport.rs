//! Plain and TLS line transports.
//!
//! Both forms expose the same line-framed read/write halves, so the rest
//! of the engine never cares whether the socket is encrypted.

use std::io;
use std::sync::Arc;

use basalt_proto::LineCodec;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;
use tokio_util::codec::{FramedRead, FramedWrite};

/// Boxed read half of a connected stream.
pub type BoxedRead = Box<dyn AsyncRead + Send + Unpin>;
/// Boxed write half of a connected stream.
pub type BoxedWrite = Box<dyn AsyncWrite + Send + Unpin>;
/// Line-framed reader.
pub type LineReader = FramedRead<BoxedRead, LineCodec>;
/// Line-framed writer.
pub type LineWriter = FramedWrite<BoxedWrite, LineCodec>;

/// A connected, line-oriented bidirectional stream.
pub struct Transport {
    reader: LineReader,
    writer: LineWriter,
}

impl Transport {
    /// Connect to `host:port`, optionally wrapping the stream in TLS.
    pub async fn connect(host: &str, port: u16, secure: bool) -> io::Result<Self> {
        let stream = TcpStream::connect((host, port)).await?;

        if secure {
            let connector = TlsConnector::from(Arc::new(tls_config()?));
            let name = ServerName::try_from(host.to_string())
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
            let tls = connector.connect(name, stream).await?;
            let (read, write) = tokio::io::split(tls);
            Ok(Self::from_io(Box::new(read), Box::new(write)))
        } else {
            let (read, write) = stream.into_split();
            Ok(Self::from_io(Box::new(read), Box::new(write)))
        }
    }

    /// Frame an already-connected pair of halves.
    ///
    /// This is the seam tests use to run the engine over an in-memory
    /// duplex stream.
    pub fn from_io(read: BoxedRead, write: BoxedWrite) -> Self {
        Self {
            reader: FramedRead::new(read, LineCodec::new()),
            writer: FramedWrite::new(write, LineCodec::new()),
        }
    }

    /// Split into the framed reader and writer halves.
    pub fn into_split(self) -> (LineReader, LineWriter) {
        (self.reader, self.writer)
    }
}

fn tls_config() -> io::Result<ClientConfig> {
    let mut roots = RootCertStore::empty();
    for cert in rustls_native_certs::load_native_certs().certs {
        let _ = roots.add(cert);
    }
    if roots.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            "no native root certificates found",
        ));
    }
    Ok(ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth())
}
