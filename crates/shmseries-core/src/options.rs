//! Attach configuration

/// How strictly the header snapshot is checked at attach time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Validation {
    /// Reject negative counts, `n > limit`, and segments too small for `limit` records
    #[default]
    Strict,
    /// Accept any header; reads are still bounded by the mapped length
    Lenient,
}

/// Options for [`SegmentReader::attach_with`](crate::SegmentReader::attach_with)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AttachOptions {
    pub validation: Validation,
}

impl AttachOptions {
    /// Strict validation
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept whatever header the producer left behind
    pub fn lenient() -> Self {
        Self {
            validation: Validation::Lenient,
        }
    }

    pub fn validation(mut self, validation: Validation) -> Self {
        self.validation = validation;
        self
    }
}
