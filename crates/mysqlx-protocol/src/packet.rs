use crate::backend::{encode_message, put_frame};
use crate::frontend::parse_frame;
use crate::messages::{BackendMessage, Packet};
use bytes::BytesMut;
use mysqlx_core::error::XError;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

pub const DEFAULT_MAX_PACKET_SIZE: usize = 64 * 1024 * 1024;

/// Framed transport for one connection. Outgoing frames are buffered until
/// [`PacketIo::flush`].
#[derive(Debug)]
pub struct PacketIo<S> {
    stream: S,
    read_buf: BytesMut,
    write_buf: BytesMut,
    max_packet_size: usize,
}

impl<S> PacketIo<S> {
    pub fn new(stream: S, max_packet_size: usize) -> Self {
        Self {
            stream,
            read_buf: BytesMut::with_capacity(8 * 1024),
            write_buf: BytesMut::with_capacity(8 * 1024),
            max_packet_size,
        }
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    pub fn write_packet(&mut self, msg_type: u8, payload: &[u8]) {
        put_frame(&mut self.write_buf, msg_type, payload);
    }

    pub fn write_message(&mut self, msg: BackendMessage) {
        encode_message(&mut self.write_buf, msg);
    }

    pub fn pending_write(&self) -> usize {
        self.write_buf.len()
    }
}

impl<S: AsyncRead + Unpin> PacketIo<S> {
    /// Reads the next frame. `Ok(None)` means the peer closed cleanly
    /// between frames.
    ///
    /// Cancel safe: bytes already received stay buffered.
    pub async fn read_packet(&mut self) -> Result<Option<Packet>, XError> {
        loop {
            if let Some(packet) = parse_frame(&mut self.read_buf, self.max_packet_size)? {
                trace!(msg_type = packet.msg_type, len = packet.payload.len(), "frame received");
                return Ok(Some(packet));
            }
            let n = self.stream.read_buf(&mut self.read_buf).await?;
            if n == 0 {
                if self.read_buf.is_empty() {
                    return Ok(None);
                }
                return Err(XError::Framing(format!(
                    "connection closed with {} bytes of an incomplete frame",
                    self.read_buf.len()
                )));
            }
        }
    }
}

impl<S: AsyncWrite + Unpin> PacketIo<S> {
    pub async fn flush(&mut self) -> Result<(), XError> {
        if !self.write_buf.is_empty() {
            self.stream.write_all(&self.write_buf).await?;
            self.write_buf.clear();
        }
        self.stream.flush().await?;
        Ok(())
    }
}
