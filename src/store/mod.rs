//! Read-only query surface over an indexed alignment file.
use crate::reads::AlignedRead;
use crate::utils::{GenomicRegion, Result};

mod hts;
#[cfg(test)]
pub mod test_utils;

pub use hts::HtsAlignmentStore;

/// Queries the extension engine issues against an alignment store.
///
/// Handles are cheap per-worker objects; they are never shared across threads.
pub trait AlignmentStore {
    /// Length of a contig, or `None` if the store does not know it.
    fn contig_length(&self, contig: &str) -> Option<u64>;

    /// Reads piled up at each reference column of `region`, one entry per
    /// read and column. Unmapped, secondary, QC-fail and duplicate records
    /// are excluded.
    fn pileup(&mut self, region: &GenomicRegion) -> Result<Vec<AlignedRead>>;

    /// Mapped reads overlapping `region`.
    fn fetch(&mut self, region: &GenomicRegion) -> Result<Vec<AlignedRead>>;
}
