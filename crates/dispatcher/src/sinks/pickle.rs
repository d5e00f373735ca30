//! Carbon pickle framing
//!
//! Encodes `[(path, (timestamp, value)), ...]` with pickle protocol 2 opcodes and prefixes
//! the payload with its length as a 4-byte big-endian integer, the format Carbon's pickle
//! receiver expects.

use std::num::TryFromIntError;

use bytes::{BufMut, Bytes, BytesMut};
use contracts::MetricPoint;

const PROTO: u8 = 0x80;
const PROTOCOL_VERSION: u8 = 2;
const EMPTY_LIST: u8 = b']';
const MARK: u8 = b'(';
const APPENDS: u8 = b'e';
const BINUNICODE: u8 = b'X';
const BININT: u8 = b'J';
const LONG1: u8 = 0x8a;
const BINFLOAT: u8 = b'G';
const TUPLE2: u8 = 0x86;
const STOP: u8 = b'.';

/// Pickle-encode a batch of points (no length prefix)
pub fn encode_points(points: &[MetricPoint]) -> Bytes {
    let mut buf = BytesMut::with_capacity(8 + points.len() * 48);
    buf.put_u8(PROTO);
    buf.put_u8(PROTOCOL_VERSION);
    buf.put_u8(EMPTY_LIST);

    if !points.is_empty() {
        buf.put_u8(MARK);
        for point in points {
            put_str(&mut buf, &point.path);
            put_int(&mut buf, point.epoch_seconds);
            buf.put_u8(BINFLOAT);
            buf.put_f64(point.value);
            buf.put_u8(TUPLE2);
            buf.put_u8(TUPLE2);
        }
        buf.put_u8(APPENDS);
    }

    buf.put_u8(STOP);
    buf.freeze()
}

/// Length-prefixed message ready for the socket
///
/// # Errors
/// Fails if the payload does not fit the 4-byte length prefix.
pub fn frame_points(points: &[MetricPoint]) -> Result<Bytes, TryFromIntError> {
    let payload = encode_points(points);
    let len = u32::try_from(payload.len())?;

    let mut message = BytesMut::with_capacity(4 + payload.len());
    message.put_u32(len);
    message.extend_from_slice(&payload);
    Ok(message.freeze())
}

fn put_str(buf: &mut BytesMut, s: &str) {
    buf.put_u8(BINUNICODE);
    buf.put_u32_le(s.len() as u32);
    buf.put_slice(s.as_bytes());
}

fn put_int(buf: &mut BytesMut, value: i64) {
    match i32::try_from(value) {
        Ok(small) => {
            buf.put_u8(BININT);
            buf.put_i32_le(small);
        }
        Err(_) => {
            let bytes = long_bytes(value);
            buf.put_u8(LONG1);
            buf.put_u8(bytes.len() as u8);
            buf.put_slice(&bytes);
        }
    }
}

/// Minimal little-endian two's complement representation
fn long_bytes(value: i64) -> Vec<u8> {
    let mut bytes = value.to_le_bytes().to_vec();
    while bytes.len() > 1 {
        let last = bytes[bytes.len() - 1];
        let sign_of_next = bytes[bytes.len() - 2] & 0x80;
        let redundant = (last == 0x00 && sign_of_next == 0) || (last == 0xff && sign_of_next != 0);
        if !redundant {
            break;
        }
        bytes.pop();
    }
    bytes
}
