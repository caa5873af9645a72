//! Test producer: creates and owns a segment the way the real producer does

#![allow(dead_code)]

use nix::fcntl::OFlag;
use nix::sys::mman::{shm_open, shm_unlink};
use nix::sys::stat::Mode;
use shared_memory::{Shmem, ShmemConf};
use std::os::fd::OwnedFd;
use shmseries_core::layout::{self, Header, Record};
use std::sync::atomic::{AtomicU32, Ordering};

pub fn unique_name(tag: &str) -> String {
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    format!(
        "/shmseries_test_{}_{}_{}",
        tag,
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::SeqCst)
    )
}

/// Owning side of a segment; unlinks it on drop
pub struct Producer {
    shmem: Shmem,
}

impl Producer {
    /// Create a segment sized for `header.limit` records and fill it
    pub fn create(name: &str, header: Header, records: &[Record]) -> Self {
        let size = layout::segment_len(header.limit.max(0) as usize);
        let mut producer = Self::create_raw(name, size);
        producer.write_header(&header);
        for (i, record) in records.iter().enumerate() {
            producer.write_record(i, record);
        }
        producer
    }

    /// Create a zero-filled segment of exactly `size` bytes
    pub fn create_raw(name: &str, size: usize) -> Self {
        let shmem = ShmemConf::new()
            .size(size)
            .os_id(name)
            .create()
            .expect("create test segment");
        assert!(shmem.is_owner());
        Self { shmem }
    }

    pub fn write_header(&mut self, header: &Header) {
        self.write_at(0, &layout::encode_header(header));
    }

    pub fn write_record(&mut self, index: usize, record: &Record) {
        self.write_at(layout::record_offset(index), &layout::encode_record(record));
    }

    pub fn bytes(&self) -> Vec<u8> {
        unsafe { self.shmem.as_slice() }.to_vec()
    }

    fn write_at(&mut self, offset: usize, bytes: &[u8]) {
        let slice = unsafe { self.shmem.as_slice_mut() };
        slice[offset..offset + bytes.len()].copy_from_slice(bytes);
    }
}

/// Segment opened with `O_CREAT` but never sized; unlinked on drop
pub struct UnsizedSegment {
    name: String,
    _fd: OwnedFd,
}

impl UnsizedSegment {
    pub fn create(name: &str) -> Self {
        let fd = shm_open(
            name,
            OFlag::O_CREAT | OFlag::O_EXCL | OFlag::O_RDWR,
            Mode::S_IRUSR | Mode::S_IWUSR,
        )
        .expect("create unsized segment");
        Self {
            name: name.to_string(),
            _fd: fd,
        }
    }
}

impl Drop for UnsizedSegment {
    fn drop(&mut self) {
        let _ = shm_unlink(self.name.as_str());
    }
}

/// The segment used throughout the reader tests
pub fn sample_segment(name: &str) -> Producer {
    Producer::create(
        name,
        Header {
            n: 3,
            start_ts: 100.0,
            interval: 0.5,
            limit: 5,
        },
        &[
            Record { ts: 100.0, v: 1 },
            Record { ts: 100.5, v: 2 },
            Record { ts: 101.0, v: 3 },
            Record { ts: 0.0, v: 0 },
            Record { ts: 0.0, v: 0 },
        ],
    )
}
