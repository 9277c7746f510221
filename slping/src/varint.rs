//! The protocol's variable-length integer: 7 data bits per byte, least
//! significant group first, high bit set on every byte but the last.

use std::io::Read;

use crate::Error;

/// A VarInt never spans more than this many bytes.
pub const MAX_VARINT_LEN: usize = 5;

/// Appends the encoding of `value` to `out`.
pub fn write_varint(out: &mut Vec<u8>, value: u32) {
    let mut remaining = value;
    loop {
        let group = (remaining & 0x7f) as u8;
        remaining >>= 7;
        if remaining == 0 {
            out.push(group);
            return;
        }
        out.push(group | 0x80);
    }
}

#[must_use]
pub fn encode_varint(value: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(varint_len(value));
    write_varint(&mut out, value);
    out
}

/// Number of bytes [`write_varint`] emits for `value`.
#[must_use]
pub const fn varint_len(value: u32) -> usize {
    let mut remaining = value >> 7;
    let mut count = 1;
    while remaining != 0 {
        count += 1;
        remaining >>= 7;
    }
    count
}

/// Reads one VarInt a byte at a time, returning the value and how many bytes
/// it took.
///
/// Every read may block on the underlying stream.
///
/// # Errors
/// [`Error::VarIntTooLong`] if five bytes pass without a terminating byte, and
/// the reader's I/O error (including end of stream) otherwise.
pub fn read_varint<R: Read>(reader: &mut R) -> Result<(u64, usize), Error> {
    let mut value: u64 = 0;
    let mut byte = [0u8; 1];
    for i in 0..MAX_VARINT_LEN {
        reader.read_exact(&mut byte)?;
        value |= u64::from(byte[0] & 0x7f) << (7 * i);
        if byte[0] & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(Error::VarIntTooLong)
}
