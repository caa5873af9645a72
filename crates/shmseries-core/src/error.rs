//! Error types for shmseries

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("shared memory error: {0}")]
    SharedMemory(String),

    #[error("segment not found: {name}")]
    SegmentNotFound { name: String },

    #[error("index {index} out of range: segment holds {len} records")]
    IndexOutOfRange { index: i64, len: i32 },

    #[error("malformed layout: {0}")]
    MalformedLayout(String),

    #[error("reader is detached")]
    Detached,
}

pub type Result<T> = std::result::Result<T, Error>;
