//! TCP peer transport
//!
//! Frames are `MAGIC` + big-endian u32 length + JSON message. Each
//! connection carries request/response pairs; the client side opens one
//! connection per call.

use crate::core::{Block, ChainSnapshot, Transaction};
use crate::network::message::{Message, MAGIC, MAX_MESSAGE_SIZE};
use crate::network::node::Node;
use crate::network::peer::{PeerClient, PeerError};
use bytes::{Buf, BufMut, BytesMut};
use futures::future::BoxFuture;
use futures::sink::SinkExt;
use futures::stream::StreamExt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{Decoder, Encoder, Framed};
use tokio_util::sync::CancellationToken;

/// Message codec for length-prefixed framing
pub struct MessageCodec;

impl Encoder<Message> for MessageCodec {
    type Error = std::io::Error;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let data = item
            .to_bytes()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;

        if data.len() > MAX_MESSAGE_SIZE {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Message too large: {} bytes", data.len()),
            ));
        }

        // Magic (4) + Length (4) + Data
        dst.reserve(8 + data.len());
        dst.put_slice(&MAGIC);
        dst.put_u32(data.len() as u32);
        dst.put_slice(&data);

        Ok(())
    }
}

impl Decoder for MessageCodec {
    type Item = Message;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // Need at least header
        if src.len() < 8 {
            return Ok(None);
        }

        if src[..4] != MAGIC {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "Invalid magic bytes",
            ));
        }

        let len = u32::from_be_bytes([src[4], src[5], src[6], src[7]]) as usize;
        if len > MAX_MESSAGE_SIZE {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Message too large: {} bytes", len),
            ));
        }

        if src.len() < 8 + len {
            src.reserve(8 + len - src.len());
            return Ok(None);
        }

        src.advance(8);
        let data = src.split_to(len);

        let msg = Message::from_bytes(&data)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;

        Ok(Some(msg))
    }
}

/// TCP server answering peer requests
pub struct Server {
    listener: TcpListener,
}

impl Server {
    /// Bind to a port on all interfaces
    pub async fn bind(port: u16) -> Result<Self, std::io::Error> {
        Self::bind_addr(&format!("0.0.0.0:{}", port)).await
    }

    /// Bind to an explicit address
    pub async fn bind_addr(addr: &str) -> Result<Self, std::io::Error> {
        let listener = TcpListener::bind(addr).await?;
        log::info!("Peer server listening on {}", listener.local_addr()?);
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.listener.local_addr()
    }

    /// Accept connections until `shutdown` fires
    pub async fn run(self, node: Arc<Node>, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        log::debug!("Incoming peer connection from {}", addr);
                        let node = node.clone();
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, addr, node).await {
                                log::warn!("Connection error with {}: {}", addr, e);
                            }
                        });
                    }
                    Err(e) => {
                        log::error!("Accept error: {}", e);
                    }
                },
                _ = shutdown.cancelled() => {
                    log::info!("Peer server shutting down");
                    break;
                }
            }
        }
    }
}

/// Serve requests on one inbound connection until the peer hangs up
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    node: Arc<Node>,
) -> Result<(), PeerError> {
    let mut framed = Framed::new(stream, MessageCodec);

    while let Some(frame) = framed.next().await {
        let request = frame?;
        log::debug!("Received {} from {}", request.type_name(), addr);

        let response = node.handle_peer_message(request).await;
        framed.send(response).await?;
    }

    log::debug!("Peer {} disconnected", addr);
    Ok(())
}

/// Connect to a peer
pub async fn connect_to_peer(addr: &str) -> Result<(TcpStream, SocketAddr), PeerError> {
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|e| PeerError::ConnectionFailed(e.to_string()))?;

    let peer_addr = stream
        .peer_addr()
        .map_err(|e| PeerError::ConnectionFailed(e.to_string()))?;

    Ok((stream, peer_addr))
}

/// `PeerClient` speaking the framed TCP protocol
#[derive(Debug, Clone, Default)]
pub struct TcpPeerClient;

impl TcpPeerClient {
    pub fn new() -> Self {
        Self
    }

    async fn request(&self, peer: &str, msg: Message) -> Result<Message, PeerError> {
        let (stream, _) = connect_to_peer(peer).await?;
        let mut framed = Framed::new(stream, MessageCodec);

        framed.send(msg).await?;

        match framed.next().await {
            Some(Ok(Message::Rejected { reason })) => Err(PeerError::Rejected(reason)),
            Some(Ok(response)) => Ok(response),
            Some(Err(e)) => Err(e.into()),
            None => Err(PeerError::Disconnected),
        }
    }
}

impl PeerClient for TcpPeerClient {
    fn send_transaction<'a>(
        &'a self,
        peer: &'a str,
        tx: Transaction,
    ) -> BoxFuture<'a, Result<u64, PeerError>> {
        Box::pin(async move {
            match self.request(peer, Message::NewTransaction(tx)).await? {
                Message::TransactionQueued { block_index } => Ok(block_index),
                other => Err(PeerError::UnexpectedResponse(other.type_name())),
            }
        })
    }

    fn send_block<'a>(
        &'a self,
        peer: &'a str,
        block: Block,
    ) -> BoxFuture<'a, Result<(), PeerError>> {
        Box::pin(async move {
            match self.request(peer, Message::NewBlock(block)).await? {
                Message::BlockAccepted { .. } => Ok(()),
                other => Err(PeerError::UnexpectedResponse(other.type_name())),
            }
        })
    }

    fn fetch_snapshot<'a>(&'a self, peer: &'a str) -> BoxFuture<'a, Result<ChainSnapshot, PeerError>> {
        Box::pin(async move {
            match self.request(peer, Message::GetSnapshot).await? {
                Message::Snapshot(snapshot) => Ok(snapshot),
                other => Err(PeerError::UnexpectedResponse(other.type_name())),
            }
        })
    }
}
