use std::io::ErrorKind;

use ::tokio::io::{AsyncRead, AsyncReadExt};
use tracing::trace;

use crate::{Error, packet::check_payload_len, varint::MAX_VARINT_LEN};

/// Async [`crate::varint::read_varint`].
///
/// # Errors
/// [`Error::VarIntTooLong`] after five continuation bytes, or the reader's
/// I/O error.
pub async fn read_varint<R: AsyncRead + Unpin>(reader: &mut R) -> Result<(u64, usize), Error> {
    let mut value: u64 = 0;
    for i in 0..MAX_VARINT_LEN {
        let byte = reader.read_u8().await?;
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(Error::VarIntTooLong)
}

/// Async [`crate::packet::read_framed_payload`].
///
/// # Errors
/// Same as the blocking version.
pub async fn read_framed_payload<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, Error> {
    let (packet_len, _) = read_varint(reader).await?;
    let (packet_id, _) = read_varint(reader).await?;
    if packet_id != 0 {
        trace!(packet_id, "unexpected packet id in status response");
    }
    let (declared, _) = read_varint(reader).await?;
    trace!(packet_len, declared, "reading status payload");
    let expected = check_payload_len(declared)?;

    let mut payload = vec![0; expected];
    match reader.read_exact(&mut payload).await {
        Ok(_) => Ok(payload),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(Error::Connection(
            std::io::Error::new(ErrorKind::UnexpectedEof, "connection closed mid-payload"),
        )),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::response_packet;

    #[tokio::test]
    async fn test_read_payload() {
        let json = r#"{"players":{"online":1,"max":2}}"#;
        let packet = response_packet(json);
        let payload = read_framed_payload(&mut packet.as_slice()).await.unwrap();
        assert_eq!(payload, json.as_bytes());
    }

    #[tokio::test]
    async fn test_read_payload_split_across_reads() {
        let json = format!(r#"{{"description":"{}"}}"#, "y".repeat(5000));
        let packet = response_packet(&json);
        let (mid, _) = packet.split_at(packet.len() / 2);
        let mut reader = ::tokio::io::AsyncReadExt::chain(mid, &packet[mid.len()..]);
        let payload = read_framed_payload(&mut reader).await.unwrap();
        assert_eq!(payload.len(), json.len());
    }

    #[tokio::test]
    async fn test_too_long_varint() {
        let bytes = [0x80u8; 6];
        assert!(matches!(
            read_varint(&mut &bytes[..]).await,
            Err(Error::VarIntTooLong)
        ));
    }

    #[tokio::test]
    async fn test_early_close() {
        let packet = response_packet(r#"{"players":{"online":1,"max":2}}"#);
        let truncated = &packet[..packet.len() - 1];
        assert!(matches!(
            read_framed_payload(&mut &truncated[..]).await,
            Err(Error::Connection(_))
        ));
    }
}
