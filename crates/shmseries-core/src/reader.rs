//! Indexed reader over a borrowed time-series segment

use crate::layout::{self, Header, Record, HEADER_SIZE, RECORD_SIZE};
use crate::options::{AttachOptions, Validation};
use crate::shm::BorrowedSegment;
use crate::{Error, Result};
use tracing::{debug, warn};

/// Reader attached to a segment owned by an external producer.
///
/// The header is decoded once at attach and kept as a snapshot; `n` growing
/// in the live segment is only picked up by [`refresh`](Self::refresh) or a
/// new attach. Records are copied out of the mapping on every read.
pub struct SegmentReader {
    segment: BorrowedSegment,
    options: AttachOptions,
    /// Header snapshot, `None` once detached
    header: Option<Header>,
}

impl SegmentReader {
    /// Attach to an existing segment with strict header validation
    pub fn attach(name: &str) -> Result<Self> {
        Self::attach_with(name, AttachOptions::default())
    }

    /// Attach to an existing segment
    pub fn attach_with(name: &str, options: AttachOptions) -> Result<Self> {
        let segment = BorrowedSegment::open(name)?;
        let header = read_header(&segment, options.validation)?;

        debug!(
            segment = name,
            n = header.n,
            start_ts = header.start_ts,
            interval = header.interval,
            limit = header.limit,
            "attached to segment"
        );

        Ok(Self {
            segment,
            options,
            header: Some(header),
        })
    }

    /// Get the segment name
    pub fn name(&self) -> &str {
        self.segment.name()
    }

    /// Get the mapped length of the segment in bytes
    pub fn segment_len(&self) -> usize {
        self.segment.size()
    }

    pub fn options(&self) -> AttachOptions {
        self.options
    }

    pub fn is_attached(&self) -> bool {
        self.header.is_some()
    }

    /// Header snapshot taken at attach (or the last refresh)
    pub fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    /// Read record `index`, valid for `0 <= index < n` of the snapshot
    pub fn read(&self, index: i64) -> Result<Record> {
        let header = self.header.as_ref().ok_or(Error::Detached)?;
        if index < 0 || index >= i64::from(header.n) {
            return Err(Error::IndexOutOfRange {
                index,
                len: header.n,
            });
        }

        let mut buf = [0u8; RECORD_SIZE];
        self.segment.copy_to(layout::record_offset(index as usize), &mut buf)?;
        Ok(layout::decode_record(&buf))
    }

    /// Read every record of the snapshot, index 0 first
    pub fn read_all(&self) -> Result<Vec<Record>> {
        self.records()?.collect()
    }

    /// Lazy form of [`read_all`](Self::read_all)
    pub fn records(&self) -> Result<Records<'_>> {
        let header = self.header.as_ref().ok_or(Error::Detached)?;
        Ok(Records {
            reader: self,
            next: 0,
            end: i64::from(header.n.max(0)),
        })
    }

    /// Re-read the live header and replace the snapshot
    pub fn refresh(&mut self) -> Result<Header> {
        if self.header.is_none() {
            return Err(Error::Detached);
        }
        let header = read_header(&self.segment, self.options.validation)?;
        debug!(
            segment = self.segment.name(),
            n = header.n,
            limit = header.limit,
            "refreshed header snapshot"
        );
        self.header = Some(header);
        Ok(header)
    }

    /// Drop the header snapshot. The segment itself is left untouched.
    ///
    /// Calling this more than once is a no-op.
    pub fn detach(&mut self) {
        if self.header.take().is_some() {
            debug!(segment = self.segment.name(), "detached from segment");
        }
    }
}

/// Iterator over the records of a [`SegmentReader`] snapshot
pub struct Records<'a> {
    reader: &'a SegmentReader,
    next: i64,
    end: i64,
}

impl Iterator for Records<'_> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let record = self.reader.read(self.next);
        self.next += 1;
        Some(record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.end - self.next).max(0) as usize;
        (remaining, Some(remaining))
    }
}

/// Copy the header out of the segment and check it against `validation`
fn read_header(segment: &BorrowedSegment, validation: Validation) -> Result<Header> {
    if segment.size() < HEADER_SIZE {
        return Err(Error::MalformedLayout(format!(
            "segment '{}' is {} bytes, smaller than the {} byte header",
            segment.name(),
            segment.size(),
            HEADER_SIZE
        )));
    }

    let mut buf = [0u8; HEADER_SIZE];
    segment.copy_to(0, &mut buf)?;
    let header = layout::decode_header(&buf);

    if let Some(problem) = header_problem(&header, segment.size()) {
        match validation {
            Validation::Strict => {
                return Err(Error::MalformedLayout(format!(
                    "segment '{}': {}",
                    segment.name(),
                    problem
                )));
            }
            Validation::Lenient => warn!(segment = segment.name(), "{}", problem),
        }
    }

    Ok(header)
}

fn header_problem(header: &Header, segment_size: usize) -> Option<String> {
    if header.n < 0 {
        return Some(format!("negative record count {}", header.n));
    }
    if header.limit < 0 {
        return Some(format!("negative capacity {}", header.limit));
    }
    if header.n > header.limit {
        return Some(format!(
            "record count {} exceeds capacity {}",
            header.n, header.limit
        ));
    }
    let needed = layout::segment_len(header.limit as usize);
    if needed > segment_size {
        return Some(format!(
            "capacity {} needs {} bytes but only {} are mapped",
            header.limit, needed, segment_size
        ));
    }
    None
}
