//! Length-prefixed packet framing over byte streams
//!
//! Every frame is `[4 bytes little-endian length][bincode payload]`.
//!
//! The two directions carry different limits: client intents are tiny, so the
//! server rejects anything above [`MAX_FRAME_SIZE`], while snapshots grow with
//! the room's food and are read against [`MAX_SNAPSHOT_FRAME_SIZE`].

use crate::Packet;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest frame the server accepts from a client
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;
/// Largest frame the client accepts from the server
pub const MAX_SNAPSHOT_FRAME_SIZE: usize = 256 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum FramingError {
    #[error("Connection closed")]
    ConnectionClosed,
    #[error("Frame too large: {0} bytes (max {1})")]
    FrameTooLarge(usize, usize),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Codec error: {0}")]
    Codec(#[from] bincode::Error),
}

/// Serializes a packet payload without the length prefix.
///
/// Broadcasts encode once and hand the same bytes to every recipient.
/// Size limits are enforced by the reader, not here.
pub fn encode_packet(packet: &Packet) -> Result<Vec<u8>, FramingError> {
    Ok(bincode::serialize(packet)?)
}

pub fn decode_packet(data: &[u8]) -> Result<Packet, FramingError> {
    Ok(bincode::deserialize(data)?)
}

pub async fn read_frame<R: AsyncRead + Unpin>(stream: &mut R) -> Result<Vec<u8>, FramingError> {
    read_frame_limited(stream, MAX_FRAME_SIZE).await
}

pub async fn read_frame_limited<R: AsyncRead + Unpin>(
    stream: &mut R,
    max_size: usize,
) -> Result<Vec<u8>, FramingError> {
    let mut len_buf = [0u8; 4];
    match stream.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            return Err(FramingError::ConnectionClosed);
        }
        Err(e) => return Err(FramingError::Io(e)),
    }

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > max_size {
        return Err(FramingError::FrameTooLarge(len, max_size));
    }

    let mut buf = vec![0u8; len];
    match stream.read_exact(&mut buf).await {
        Ok(_) => Ok(buf),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(FramingError::ConnectionClosed),
        Err(e) => Err(FramingError::Io(e)),
    }
}

pub async fn write_frame<W: AsyncWrite + Unpin>(
    stream: &mut W,
    data: &[u8],
) -> Result<(), FramingError> {
    let len = u32::try_from(data.len())
        .map_err(|_| FramingError::FrameTooLarge(data.len(), u32::MAX as usize))?;

    stream.write_all(&len.to_le_bytes()).await?;
    stream.write_all(data).await?;
    stream.flush().await?;
    Ok(())
}

pub async fn read_packet<R: AsyncRead + Unpin>(stream: &mut R) -> Result<Packet, FramingError> {
    let frame = read_frame(stream).await?;
    decode_packet(&frame)
}

/// Reads a server-to-client packet, allowing snapshot-sized frames
pub async fn read_snapshot_packet<R: AsyncRead + Unpin>(
    stream: &mut R,
) -> Result<Packet, FramingError> {
    let frame = read_frame_limited(stream, MAX_SNAPSHOT_FRAME_SIZE).await?;
    decode_packet(&frame)
}

pub async fn write_packet<W: AsyncWrite + Unpin>(
    stream: &mut W,
    packet: &Packet,
) -> Result<(), FramingError> {
    let data = encode_packet(packet)?;
    write_frame(stream, &data).await
}
