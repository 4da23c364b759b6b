use crate::config::ReceiverConfig;
use crate::decoder::decode_status;
use crate::encoder::FrameEncoder;
use crate::error::{NadError, Result};
use crate::protocol::{Frame, LineCommand, DEVICE_SOURCES, TCP_PORT};
use crate::types::{DeviceStatus, TransportKind};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::{timeout, timeout_at, Instant};
use tokio_serial::{DataBits, Parity, SerialPortBuilderExt, SerialStream, StopBits};

const SERIAL_BAUD_RATE: u32 = 115_200;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REPLY_TIMEOUT: Duration = Duration::from_secs(2);
const DRAIN_WINDOW: Duration = Duration::from_millis(10);
const TCP_CONNECT_ATTEMPTS: u32 = 3;
const TCP_READ_TIMEOUT: Duration = Duration::from_secs(5);
const TCP_MAX_REPLY_READS: usize = 20;

/// Channel speaking the text line protocol
#[async_trait]
pub trait LineTransport: Send + Sync {
    /// Send a command and wait for the reply line addressed to it
    ///
    /// Returns `Ok(None)` when nothing matching arrives before the reply
    /// deadline.
    async fn send_and_receive(&self, command: &LineCommand) -> Result<Option<String>>;

    /// Send a command without waiting for a reply
    async fn send(&self, command: &LineCommand) -> Result<()>;
}

/// Channel speaking the binary TCP protocol
#[async_trait]
pub trait StatusTransport: Send + Sync {
    /// Send a frame; if it expects a reply, return the reply as hex
    async fn send_and_receive(&self, frame: &Frame) -> Result<Option<String>>;

    /// Read the whole main-zone state in one round trip
    ///
    /// Connection failures are errors; an unusable reply is `Ok(None)`.
    async fn status(&self) -> Result<Option<DeviceStatus>> {
        let reply = self.send_and_receive(&FrameEncoder::status_request()).await?;
        Ok(reply.as_deref().and_then(decode_status))
    }

    /// Sources the device itself offers, in display order
    fn available_sources(&self) -> Vec<String> {
        DEVICE_SOURCES
            .iter()
            .map(|(name, _)| name.to_string())
            .collect()
    }
}

/// Transport chosen for a configuration
#[derive(Clone)]
pub enum TransportHandle {
    Line(Arc<dyn LineTransport>),
    Status(Arc<dyn StatusTransport>),
}

impl TransportHandle {
    /// Build the transport named by `config.transport`
    ///
    /// No connection is made until the first operation.
    pub fn from_config(config: &ReceiverConfig) -> Result<Self> {
        let host = || {
            config
                .host
                .clone()
                .ok_or_else(|| NadError::Config("host is required".to_string()))
        };

        Ok(match config.transport {
            TransportKind::Rs232 => Self::Line(Arc::new(SerialTransport::serial(
                config.serial_port.clone(),
            ))),
            TransportKind::Telnet => {
                Self::Line(Arc::new(TelnetTransport::telnet(host()?, config.port)))
            }
            TransportKind::Tcp => Self::Status(Arc::new(TcpTransport::new(host()?))),
        })
    }
}

/// Opens the byte stream under a [`LineChannel`]
#[async_trait]
pub trait Connector: Send + Sync {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send;

    async fn connect(&self) -> Result<Self::Stream>;

    /// Human readable endpoint for logs
    fn describe(&self) -> String;

    /// Whether replies may carry telnet negotiation bytes
    fn is_telnet(&self) -> bool {
        false
    }
}

/// Local serial port, 115200 baud 8N1
pub struct SerialConnector {
    path: String,
}

impl SerialConnector {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Connector for SerialConnector {
    type Stream = SerialStream;

    async fn connect(&self) -> Result<SerialStream> {
        let stream = tokio_serial::new(&self.path, SERIAL_BAUD_RATE)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(REPLY_TIMEOUT)
            .open_native_async()?;
        Ok(stream)
    }

    fn describe(&self) -> String {
        self.path.clone()
    }
}

/// Telnet control port
pub struct TelnetConnector {
    host: String,
    port: u16,
}

impl TelnetConnector {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

#[async_trait]
impl Connector for TelnetConnector {
    type Stream = TcpStream;

    async fn connect(&self) -> Result<TcpStream> {
        let stream = timeout(
            CONNECT_TIMEOUT,
            TcpStream::connect((self.host.as_str(), self.port)),
        )
        .await
        .map_err(|_| NadError::Timeout)??;
        stream.set_nodelay(true)?;
        Ok(stream)
    }

    fn describe(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn is_telnet(&self) -> bool {
        true
    }
}

/// Line protocol channel over any connector
///
/// Shared by RS232 and Telnet. The connection opens lazily and is dropped
/// after an I/O error, so the next operation reconnects.
pub struct LineChannel<C: Connector> {
    connector: C,
    stream: Mutex<Option<BufReader<C::Stream>>>,
}

/// Line protocol over a serial port
pub type SerialTransport = LineChannel<SerialConnector>;

/// Line protocol over Telnet
pub type TelnetTransport = LineChannel<TelnetConnector>;

impl SerialTransport {
    pub fn serial(path: impl Into<String>) -> Self {
        Self::new(SerialConnector::new(path))
    }
}

impl TelnetTransport {
    pub fn telnet(host: impl Into<String>, port: u16) -> Self {
        Self::new(TelnetConnector::new(host, port))
    }
}

impl<C: Connector> LineChannel<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            stream: Mutex::new(None),
        }
    }

    async fn exchange(&self, command: &LineCommand, read_reply: bool) -> Result<Option<String>> {
        let mut guard = self.stream.lock().await;

        if guard.is_none() {
            tracing::info!("Connecting to {}", self.connector.describe());
            *guard = Some(BufReader::new(self.connector.connect().await?));
        }
        let Some(stream) = guard.as_mut() else {
            return Err(NadError::ConnectionClosed);
        };

        let result = round_trip(stream, command, read_reply, self.connector.is_telnet()).await;
        if let Err(e) = &result {
            tracing::warn!("Dropping connection to {}: {}", self.connector.describe(), e);
            *guard = None;
        }
        result
    }
}

#[async_trait]
impl<C: Connector> LineTransport for LineChannel<C> {
    async fn send_and_receive(&self, command: &LineCommand) -> Result<Option<String>> {
        self.exchange(command, true).await
    }

    async fn send(&self, command: &LineCommand) -> Result<()> {
        self.exchange(command, false).await.map(|_| ())
    }
}

async fn round_trip<S>(
    stream: &mut BufReader<S>,
    command: &LineCommand,
    read_reply: bool,
    telnet: bool,
) -> Result<Option<String>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    drain_pending(stream).await?;

    tracing::debug!("Sending: {}", command);
    let framed = format!("\r{}\r", command.to_wire());
    stream.get_mut().write_all(framed.as_bytes()).await?;
    stream.get_mut().flush().await?;

    if !read_reply {
        return Ok(None);
    }

    let expected = format!("{}=", command.key());
    let deadline = Instant::now() + REPLY_TIMEOUT;
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let read = match timeout_at(deadline, stream.read_until(b'\r', &mut buf)).await {
            Ok(read) => read?,
            Err(_) => {
                tracing::debug!("No reply to {}", command);
                return Ok(None);
            }
        };
        if read == 0 {
            return Err(NadError::ConnectionClosed);
        }

        let line = if telnet {
            String::from_utf8_lossy(&strip_telnet_commands(&buf)).into_owned()
        } else {
            String::from_utf8_lossy(&buf).into_owned()
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        tracing::debug!("Received: {}", line);
        if line.starts_with(&expected) {
            return Ok(Some(line.to_string()));
        }
    }
}

/// Discard anything the receiver sent since the last exchange
async fn drain_pending<S>(stream: &mut BufReader<S>) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let buffered = stream.buffer().len();
    stream.consume(buffered);

    let mut scratch = [0u8; 256];
    loop {
        match timeout(DRAIN_WINDOW, stream.get_mut().read(&mut scratch)).await {
            Ok(Ok(0)) => return Err(NadError::ConnectionClosed),
            Ok(Ok(n)) => tracing::trace!("Discarded {} stale bytes", n),
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Ok(()),
        }
    }
}

const IAC: u8 = 0xff;
const SB: u8 = 0xfa;
const SE: u8 = 0xf0;

/// Remove telnet IAC sequences from a received line
pub(crate) fn strip_telnet_commands(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != IAC {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        match bytes.get(i + 1) {
            Some(&IAC) => {
                out.push(IAC);
                i += 2;
            }
            // WILL, WONT, DO, DONT carry one option byte
            Some(&(0xfb..=0xfe)) => i += 3,
            Some(&SB) => {
                i += 2;
                while i < bytes.len() && !(bytes[i] == IAC && bytes.get(i + 1) == Some(&SE)) {
                    i += 1;
                }
                i += 2;
            }
            _ => i += 2,
        }
    }
    out
}

/// Binary protocol transport, one TCP connection per exchange
pub struct TcpTransport {
    host: String,
    port: u16,
    lock: Mutex<()>,
}

impl TcpTransport {
    pub fn new(host: impl Into<String>) -> Self {
        Self::with_port(host, TCP_PORT)
    }

    pub fn with_port(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            lock: Mutex::new(()),
        }
    }

    async fn open(&self) -> Result<TcpStream> {
        for attempt in 1..=TCP_CONNECT_ATTEMPTS {
            match timeout(
                CONNECT_TIMEOUT,
                TcpStream::connect((self.host.as_str(), self.port)),
            )
            .await
            {
                Ok(Ok(stream)) => return Ok(stream),
                Ok(Err(e)) => {
                    tracing::debug!(
                        "Connection attempt {} to {}:{} failed: {}",
                        attempt,
                        self.host,
                        self.port,
                        e
                    );
                }
                Err(_) => {
                    tracing::debug!(
                        "Connection attempt {} to {}:{} timed out",
                        attempt,
                        self.host,
                        self.port
                    );
                }
            }
        }

        Err(NadError::Unreachable {
            host: format!("{}:{}", self.host, self.port),
            attempts: TCP_CONNECT_ATTEMPTS,
        })
    }
}

#[async_trait]
impl StatusTransport for TcpTransport {
    async fn send_and_receive(&self, frame: &Frame) -> Result<Option<String>> {
        let bytes = frame
            .to_bytes()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

        let _guard = self.lock.lock().await;
        let mut stream = self.open().await?;

        tracing::debug!("Sending: {}", frame.hex());
        stream.write_all(&bytes).await?;

        if !frame.expects_reply() {
            return Ok(None);
        }

        let mut reply = String::new();
        let mut buf = [0u8; 1024];
        let mut reads = 0;
        while reply.len() < frame.hex().len() && reads < TCP_MAX_REPLY_READS {
            let n = timeout(TCP_READ_TIMEOUT, stream.read(&mut buf))
                .await
                .map_err(|_| NadError::Timeout)??;
            reads += 1;
            if n == 0 {
                break;
            }
            reply.push_str(&hex::encode(&buf[..n]));
        }

        tracing::debug!("Received: {}", reply);
        if reply.len() < frame.hex().len() {
            return Ok(None);
        }
        Ok(Some(reply))
    }
}
