//! Binary layout of the shared segment
//!
//! The producer writes plain C structs in native byte order with natural
//! alignment:
//!
//! ```text
//! offset 0   i32 n
//! offset 8   f64 start_ts
//! offset 16  f64 interval
//! offset 24  i32 limit
//! offset 32  Record[limit]      (f64 ts @0, i32 v @8, 16 bytes each)
//! ```
//!
//! Decoding never aliases the mapping: callers hand in bytes they already
//! copied out.

use serde::{Deserialize, Serialize};
use static_assertions::const_assert_eq;
use std::mem::{offset_of, size_of};

/// Segment header as laid out by the producer
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Header {
    /// Number of valid records
    pub n: i32,
    /// Timestamp of the first record
    pub start_ts: f64,
    /// Nominal spacing between record timestamps
    pub interval: f64,
    /// Capacity of the record array
    pub limit: i32,
}

/// One timestamped sample
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub ts: f64,
    pub v: i32,
}

/// Size of the header in bytes
pub const HEADER_SIZE: usize = size_of::<Header>();

/// Size of a single record in bytes
pub const RECORD_SIZE: usize = size_of::<Record>();

// Must stay in lockstep with the producer's compiler layout.
const_assert_eq!(HEADER_SIZE, 32);
const_assert_eq!(RECORD_SIZE, 16);
const_assert_eq!(offset_of!(Header, start_ts), 8);
const_assert_eq!(offset_of!(Header, limit), 24);
const_assert_eq!(offset_of!(Record, v), 8);

/// Byte offset of record `index`. No bounds checks.
pub const fn record_offset(index: usize) -> usize {
    HEADER_SIZE + index * RECORD_SIZE
}

/// Minimum segment length holding the header and `limit` records
pub const fn segment_len(limit: usize) -> usize {
    record_offset(limit)
}

/// Decode a header from exactly `HEADER_SIZE` bytes.
///
/// Field values are not validated.
///
/// # Panics
///
/// Panics if `bytes.len() != HEADER_SIZE`.
pub fn decode_header(bytes: &[u8]) -> Header {
    assert_eq!(
        bytes.len(),
        HEADER_SIZE,
        "header must be decoded from exactly {HEADER_SIZE} bytes"
    );
    Header {
        n: i32::from_ne_bytes(field(bytes, offset_of!(Header, n))),
        start_ts: f64::from_ne_bytes(field(bytes, offset_of!(Header, start_ts))),
        interval: f64::from_ne_bytes(field(bytes, offset_of!(Header, interval))),
        limit: i32::from_ne_bytes(field(bytes, offset_of!(Header, limit))),
    }
}

/// Decode a record from exactly `RECORD_SIZE` bytes.
///
/// # Panics
///
/// Panics if `bytes.len() != RECORD_SIZE`.
pub fn decode_record(bytes: &[u8]) -> Record {
    assert_eq!(
        bytes.len(),
        RECORD_SIZE,
        "record must be decoded from exactly {RECORD_SIZE} bytes"
    );
    Record {
        ts: f64::from_ne_bytes(field(bytes, offset_of!(Record, ts))),
        v: i32::from_ne_bytes(field(bytes, offset_of!(Record, v))),
    }
}

/// Encode a header the way the producer lays it out, padding zeroed
pub fn encode_header(header: &Header) -> [u8; HEADER_SIZE] {
    let mut out = [0u8; HEADER_SIZE];
    put(&mut out, offset_of!(Header, n), &header.n.to_ne_bytes());
    put(&mut out, offset_of!(Header, start_ts), &header.start_ts.to_ne_bytes());
    put(&mut out, offset_of!(Header, interval), &header.interval.to_ne_bytes());
    put(&mut out, offset_of!(Header, limit), &header.limit.to_ne_bytes());
    out
}

/// Encode a record, padding zeroed
pub fn encode_record(record: &Record) -> [u8; RECORD_SIZE] {
    let mut out = [0u8; RECORD_SIZE];
    put(&mut out, offset_of!(Record, ts), &record.ts.to_ne_bytes());
    put(&mut out, offset_of!(Record, v), &record.v.to_ne_bytes());
    out
}

fn field<const N: usize>(bytes: &[u8], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[offset..offset + N]);
    out
}

fn put(out: &mut [u8], offset: usize, bytes: &[u8]) {
    out[offset..offset + bytes.len()].copy_from_slice(bytes);
}
