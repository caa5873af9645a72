//! shmseries - Read-only access to a time-series buffer in shared memory
//!
//! An external producer creates a named segment holding a [`Header`]
//! followed by `limit` [`Record`]s. [`SegmentReader`] borrows that segment:
//! it never writes to it and never unlinks it.

pub mod error;
pub mod layout;
pub mod options;
pub mod reader;
pub mod shm;

pub use error::{Error, Result};
pub use layout::{Header, Record, HEADER_SIZE, RECORD_SIZE};
pub use options::{AttachOptions, Validation};
pub use reader::{Records, SegmentReader};
pub use shm::BorrowedSegment;
