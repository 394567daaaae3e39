use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::dns::{
    DNSPacket, EdnsOptions, QueryFlags, enums::DNSResourceType, header::DNSHeader, name::Name,
};
use crate::error::{Result, ValidatorError};
use crate::metrics::ValidatorMetrics;
use crate::statlog::StatLog;

/// Where the walker gets its raw responses from.
#[async_trait]
pub trait Upstream: Send {
    /// Send one query and return the undecoded response message.
    async fn query(&mut self, name: &Name, rtype: DNSResourceType) -> Result<Vec<u8>>;

    fn peer_addr(&self) -> Option<SocketAddr> {
        None
    }
}

/// Write one message with its 2-byte big-endian length prefix.
pub async fn write_framed<W>(writer: &mut W, message: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let len = u16::try_from(message.len()).map_err(|_| {
        ValidatorError::Transport(format!("message of {} bytes too long for TCP", message.len()))
    })?;
    let mut framed = Vec::with_capacity(message.len() + 2);
    framed.extend_from_slice(&len.to_be_bytes());
    framed.extend_from_slice(message);
    writer.write_all(&framed).await?;
    writer.flush().await?;
    Ok(())
}

/// Read exactly one length-prefixed message.
pub async fn read_framed<R>(reader: &mut R) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 2];
    reader
        .read_exact(&mut len_buf)
        .await
        .map_err(|e| ValidatorError::Transport(format!("reading length prefix: {}", e)))?;
    let len = u16::from_be_bytes(len_buf) as usize;

    let mut message = vec![0u8; len];
    reader.read_exact(&mut message).await.map_err(|e| {
        ValidatorError::Transport(format!("reading {} byte response: {}", len, e))
    })?;
    trace!(
        "Raw TCP response ({} bytes): {:02x?}",
        len,
        &message[..len.min(64)]
    );
    Ok(message)
}

/// One TCP connection to the upstream resolver, owned by one walk.
pub struct TcpTransport {
    stream: TcpStream,
    peer: SocketAddr,
    timeout: Duration,
    payload_size: u16,
}

impl TcpTransport {
    pub async fn connect(addr: SocketAddr, query_timeout: Duration, payload_size: u16) -> Result<Self> {
        let stream = timeout(query_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| ValidatorError::Transport(format!("connect to {} timed out", addr)))?
            .map_err(|e| ValidatorError::Transport(format!("connect to {}: {}", addr, e)))?;
        stream.set_nodelay(true)?;
        debug!("Connected to upstream {}", addr);

        Ok(Self {
            stream,
            peer: addr,
            timeout: query_timeout,
            payload_size,
        })
    }

    async fn exchange(&mut self, query: &[u8]) -> Result<Vec<u8>> {
        write_framed(&mut self.stream, query).await?;
        read_framed(&mut self.stream).await
    }
}

#[async_trait]
impl Upstream for TcpTransport {
    async fn query(&mut self, name: &Name, rtype: DNSResourceType) -> Result<Vec<u8>> {
        let id: u16 = rand::random();
        let query = DNSPacket::query(
            id,
            name,
            rtype,
            QueryFlags {
                recursion_desired: true,
                checking_disabled: true,
                authenticated_data: true,
            },
            EdnsOptions {
                udp_payload_size: self.payload_size,
                dnssec_ok: true,
            },
        )
        .serialize()?;
        trace!("Querying {} {} {} (id {})", self.peer, name, rtype, id);

        let response = timeout(self.timeout, self.exchange(&query))
            .await
            .map_err(|_| {
                ValidatorError::Transport(format!(
                    "query {} {} to {} timed out after {:?}",
                    name, rtype, self.peer, self.timeout
                ))
            })??;

        let header = DNSHeader::peek(&response)?;
        if header.id != id {
            return Err(ValidatorError::Transport(format!(
                "response id {} does not match query id {}",
                header.id, id
            )));
        }
        Ok(response)
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        Some(self.peer)
    }
}

/// Reports every query of the wrapped upstream to the metrics and stat log.
pub struct ObservedUpstream<U> {
    inner: U,
    metrics: Arc<ValidatorMetrics>,
    statlog: Option<Arc<StatLog>>,
}

impl<U: Upstream> ObservedUpstream<U> {
    pub fn new(inner: U, metrics: Arc<ValidatorMetrics>, statlog: Option<Arc<StatLog>>) -> Self {
        Self {
            inner,
            metrics,
            statlog,
        }
    }

    pub fn into_inner(self) -> U {
        self.inner
    }
}

#[async_trait]
impl<U: Upstream> Upstream for ObservedUpstream<U> {
    async fn query(&mut self, name: &Name, rtype: DNSResourceType) -> Result<Vec<u8>> {
        let started = Instant::now();
        let result = self.inner.query(name, rtype).await;
        let elapsed = started.elapsed();

        let rcode = result
            .as_ref()
            .ok()
            .and_then(|bytes| DNSHeader::peek(bytes).ok())
            .map(|header| header.rcode);
        self.metrics
            .record_upstream_query(rtype, elapsed, rcode.is_some());
        if let (Some(log), Some(rcode)) = (&self.statlog, rcode) {
            log.record(elapsed, rcode, self.inner.peer_addr(), name);
        }
        result
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        self.inner.peer_addr()
    }
}
