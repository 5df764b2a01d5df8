//! Conversion progress reporting.

use crate::book::Section;

/// Receives progress events while sections are converted.
///
/// Every method has an empty default, so implementors only handle what they
/// display.
pub trait ProgressSink {
    /// Conversion of `total` sections is about to start.
    fn start(&mut self, _total: usize) {}

    /// One section has been handled, converted or skipped.
    fn advance(&mut self, _section: &Section) {}

    fn finish(&mut self) {}
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {}
