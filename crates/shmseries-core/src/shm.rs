//! POSIX shared memory wrapper

use crate::layout::HEADER_SIZE;
use crate::{Error, Result};
use shared_memory::{Shmem, ShmemConf, ShmemError};
use std::io;

/// Non-owning handle to a shared memory region created by another process.
///
/// There is no constructor that creates a region and no way to unlink one:
/// dropping the handle only unmaps it from this process.
pub struct BorrowedSegment {
    inner: Shmem,
    name: String,
    size: usize,
}

impl BorrowedSegment {
    /// Open an existing shared memory region
    pub fn open(name: &str) -> Result<Self> {
        let mut shmem = ShmemConf::new()
            .os_id(name)
            .open()
            .map_err(|e| open_error(name, e))?;

        // Never unlink on drop, whatever the mapping layer decided.
        shmem.set_owner(false);

        let size = shmem.len();

        Ok(Self {
            inner: shmem,
            name: name.to_string(),
            size,
        })
    }

    /// Get the name of the shared memory region
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the size of the shared memory region
    pub fn size(&self) -> usize {
        self.size
    }

    /// Copy `out.len()` bytes starting at `offset` out of the mapping
    pub fn copy_to(&self, offset: usize, out: &mut [u8]) -> Result<()> {
        match offset.checked_add(out.len()) {
            Some(end) if end <= self.size => {}
            _ => {
                return Err(Error::MalformedLayout(format!(
                    "{} bytes at offset {} exceed segment '{}' of {} bytes",
                    out.len(),
                    offset,
                    self.name,
                    self.size
                )));
            }
        }

        // The producer may be writing concurrently; we only ever copy.
        unsafe {
            std::ptr::copy_nonoverlapping(
                self.inner.as_ptr().add(offset),
                out.as_mut_ptr(),
                out.len(),
            );
        }
        Ok(())
    }
}

fn open_error(name: &str, err: ShmemError) -> Error {
    match err {
        ShmemError::MapOpenFailed(code) => {
            match io::Error::from_raw_os_error(code as i32).kind() {
                io::ErrorKind::NotFound => Error::SegmentNotFound {
                    name: name.to_string(),
                },
                // mmap of a zero-length object: created but not yet sized by the producer
                io::ErrorKind::InvalidInput => Error::MalformedLayout(format!(
                    "segment '{}' is empty, smaller than the {} byte header",
                    name, HEADER_SIZE
                )),
                _ => Error::SharedMemory(err.to_string()),
            }
        }
        ShmemError::LinkDoesNotExist => Error::SegmentNotFound {
            name: name.to_string(),
        },
        other => Error::SharedMemory(other.to_string()),
    }
}
