//! Length-prefixed framing: a big-endian `u32` byte count followed by the
//! msgpack-encoded [`Frame`].

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::BridgeError;
use crate::protocol::Frame;

pub const DEFAULT_MAX_FRAME_BYTES: usize = 64 * 1024 * 1024;

/// Serialize `frame`, refusing it when it would exceed `max` bytes on the wire.
pub fn encode_frame(frame: &Frame, max: usize) -> Result<Vec<u8>, BridgeError> {
    let bytes = frame.to_bytes()?;
    if bytes.len() > max || u32::try_from(bytes.len()).is_err() {
        return Err(BridgeError::FrameTooLarge {
            size: bytes.len(),
            max,
        });
    }
    Ok(bytes)
}

/// Write a body produced by [`encode_frame`] with its length prefix.
pub async fn write_encoded<W>(writer: &mut W, bytes: &[u8]) -> Result<(), BridgeError>
where
    W: AsyncWrite + Unpin,
{
    let len = u32::try_from(bytes.len()).map_err(|_| BridgeError::FrameTooLarge {
        size: bytes.len(),
        max: u32::MAX as usize,
    })?;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(bytes).await?;
    writer.flush().await?;
    Ok(())
}

pub async fn write_frame<W>(writer: &mut W, frame: &Frame, max: usize) -> Result<(), BridgeError>
where
    W: AsyncWrite + Unpin,
{
    let bytes = encode_frame(frame, max)?;
    write_encoded(writer, &bytes).await
}

/// Read the next frame. `Ok(None)` means the peer closed the stream cleanly
/// between frames.
pub async fn read_frame<R>(reader: &mut R, max: usize) -> Result<Option<Frame>, BridgeError>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > max {
        return Err(BridgeError::FrameTooLarge { size: len, max });
    }
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;
    Frame::from_bytes(&buf).map(Some)
}
