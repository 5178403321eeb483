//! Wire framing
//!
//! One frame = a `u32` little-endian length prefix followed by that
//! many bytes of UTF-8 JSON. The relay forwards the payload bytes
//! untouched, so this prefix is the only structure it understands.

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Sanity cap on a single frame; anything larger is a protocol error
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("frame of {0} bytes exceeds limit of {MAX_FRAME_LEN}")]
    Oversized(usize),
}

/// Read one length-prefixed frame
///
/// Returns `Ok(None)` on a clean EOF at a frame boundary (peer closed).
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Vec<u8>>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(FrameError::Io(e)),
    }

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        return Err(FrameError::Oversized(len));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(Some(payload))
}

/// Write one length-prefixed frame
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    if payload.len() > MAX_FRAME_LEN {
        return Err(FrameError::Oversized(payload.len()));
    }

    let mut data = Vec::with_capacity(4 + payload.len());
    data.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    data.extend_from_slice(payload);
    writer.write_all(&data).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip() {
        let mut buf = Vec::new();
        write_frame(&mut buf, b"{\"type\":\"order_created\"}")
            .await
            .unwrap();
        write_frame(&mut buf, b"").await.unwrap();

        let mut cursor = std::io::Cursor::new(buf);
        assert_eq!(
            read_frame(&mut cursor).await.unwrap().unwrap(),
            b"{\"type\":\"order_created\"}"
        );
        assert_eq!(read_frame(&mut cursor).await.unwrap().unwrap(), b"");
        assert!(read_frame(&mut cursor).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let mut buf = Vec::new();
        let mut header = ((MAX_FRAME_LEN + 1) as u32).to_le_bytes().to_vec();
        buf.append(&mut header);
        let mut cursor = std::io::Cursor::new(buf);
        assert!(matches!(
            read_frame(&mut cursor).await,
            Err(FrameError::Oversized(_))
        ));
    }

    #[tokio::test]
    async fn test_truncated_payload_is_io_error() {
        let mut buf = 8u32.to_le_bytes().to_vec();
        buf.extend_from_slice(b"abc");
        let mut cursor = std::io::Cursor::new(buf);
        assert!(matches!(
            read_frame(&mut cursor).await,
            Err(FrameError::Io(_))
        ));
    }
}
