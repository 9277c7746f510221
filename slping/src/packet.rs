//! Packet framing for the status exchange.
//!
//! Every packet on the wire is `VarInt(length) ++ payload`, and the payload
//! starts with a VarInt packet id. The client sends a handshake announcing the
//! status state followed by an empty status request; the server answers with a
//! single packet holding a length-prefixed JSON string.

use std::io::{ErrorKind, Read};

use tracing::trace;

use crate::{
    Error,
    varint::{read_varint, varint_len, write_varint},
};

/// Largest JSON payload accepted from a server (1 MiB).
pub const MAX_PAYLOAD_LEN: u64 = 1024 * 1024;

const HANDSHAKE_ID: u32 = 0x00;
const STATUS_REQUEST_ID: u32 = 0x00;
/// Version-agnostic: servers answer a status ping whatever number is sent here.
const PROTOCOL_VERSION: u32 = 0;
const NEXT_STATE_STATUS: u32 = 1;

const SCRATCH_LEN: usize = 1024;

/// Appends a protocol string: VarInt byte length, then UTF-8 bytes.
///
/// Protocol strings can't exceed `i32::MAX` bytes; hosts are nowhere near that.
#[allow(clippy::cast_possible_truncation)]
pub fn write_string(out: &mut Vec<u8>, value: &str) {
    write_varint(out, value.len() as u32);
    out.extend_from_slice(value.as_bytes());
}

fn frame(payload: &[u8]) -> Vec<u8> {
    #[allow(clippy::cast_possible_truncation)]
    let len = payload.len() as u32;
    let mut packet = Vec::with_capacity(varint_len(len) + payload.len());
    write_varint(&mut packet, len);
    packet.extend_from_slice(payload);
    packet
}

/// The handshake packet switching the connection into the status state.
#[must_use]
pub fn handshake_packet(host: &str, port: u16) -> Vec<u8> {
    let mut payload = Vec::with_capacity(host.len() + 8);
    write_varint(&mut payload, HANDSHAKE_ID);
    write_varint(&mut payload, PROTOCOL_VERSION);
    write_string(&mut payload, host);
    payload.extend_from_slice(&port.to_be_bytes());
    write_varint(&mut payload, NEXT_STATE_STATUS);
    frame(&payload)
}

#[must_use]
pub fn status_request_packet() -> Vec<u8> {
    let mut payload = Vec::with_capacity(1);
    write_varint(&mut payload, STATUS_REQUEST_ID);
    frame(&payload)
}

/// Handshake and status request back to back, ready for a single write.
#[must_use]
pub fn status_exchange(host: &str, port: u16) -> Vec<u8> {
    let mut out = handshake_packet(host, port);
    out.extend(status_request_packet());
    out
}

/// Checks the JSON length a server declared against [`MAX_PAYLOAD_LEN`].
///
/// # Errors
/// [`Error::PayloadTooLarge`] when the server asks for more than that.
pub fn check_payload_len(len: u64) -> Result<usize, Error> {
    if len > MAX_PAYLOAD_LEN {
        return Err(Error::PayloadTooLarge(len));
    }
    usize::try_from(len).map_err(|_| Error::PayloadTooLarge(len))
}

/// Reads a status response packet off `reader` and returns its JSON bytes.
///
/// The outer packet length and the packet id are consumed and dropped; the
/// string length that follows decides how much is read. Short reads are
/// expected on a socket and are looped over.
///
/// # Errors
/// Framing errors from [`read_varint`], [`Error::PayloadTooLarge`] for an
/// oversized declaration, and an `UnexpectedEof` connection error if the
/// stream ends before the payload does.
pub fn read_framed_payload<R: Read>(reader: &mut R) -> Result<Vec<u8>, Error> {
    let (packet_len, _) = read_varint(reader)?;
    let (packet_id, _) = read_varint(reader)?;
    if packet_id != u64::from(STATUS_REQUEST_ID) {
        trace!(packet_id, "unexpected packet id in status response");
    }
    let (declared, _) = read_varint(reader)?;
    trace!(packet_len, declared, "reading status payload");
    let expected = check_payload_len(declared)?;

    let mut payload = Vec::with_capacity(expected);
    let mut scratch = [0u8; SCRATCH_LEN];
    while payload.len() < expected {
        let want = (expected - payload.len()).min(SCRATCH_LEN);
        match reader.read(&mut scratch[..want]) {
            Ok(0) => {
                return Err(Error::Connection(std::io::Error::new(
                    ErrorKind::UnexpectedEof,
                    format!(
                        "connection closed after {} of {expected} payload bytes",
                        payload.len()
                    ),
                )));
            }
            Ok(n) => payload.extend_from_slice(&scratch[..n]),
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(payload)
}
