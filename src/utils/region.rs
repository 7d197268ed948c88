use crate::utils::Result;
use std::fmt;

/// Half-open reference interval `[start, end)` on a named contig.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct GenomicRegion {
    pub contig: String,
    pub start: u64,
    pub end: u64,
}

impl GenomicRegion {
    pub fn new(contig: impl Into<String>, start: u64, end: u64) -> Result<Self> {
        if start >= end {
            return Err(format!("Invalid region: start {} >= end {}", start, end));
        }

        Ok(Self {
            contig: contig.into(),
            start,
            end,
        })
    }

    /// Builds a region from possibly out-of-range bounds, clamping the end to
    /// the contig length. Returns `None` when nothing is left of the interval.
    pub fn clamped(contig: &str, start: u64, end: u64, contig_len: u64) -> Option<Self> {
        Self::new(contig, start, end.min(contig_len)).ok()
    }

    #[inline]
    pub fn contains(&self, position: u64) -> bool {
        position >= self.start && position < self.end
    }

    #[inline]
    pub fn overlaps(&self, start: i64, end: i64) -> bool {
        start < self.end as i64 && end > self.start as i64
    }
}

impl fmt::Display for GenomicRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.contig, self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::GenomicRegion;

    #[test]
    fn init_region_from_invalid_interval_err() {
        assert_eq!(
            GenomicRegion::new("chr1", 200, 100),
            Err("Invalid region: start 200 >= end 100".to_string())
        );
        assert!(GenomicRegion::new("chr1", 100, 100).is_err());
    }

    #[test]
    fn clamped_region_respects_contig_length() {
        let region = GenomicRegion::clamped("chr1", 900, 1500, 1000).unwrap();
        assert_eq!(region.end, 1000);
        assert_eq!(region.start, 900);
        assert!(GenomicRegion::clamped("chr1", 1000, 1002, 1000).is_none());
    }

    #[test]
    fn region_contains_is_half_open() {
        let region = GenomicRegion::new("chr1", 10, 20).unwrap();
        assert!(region.contains(10));
        assert!(region.contains(19));
        assert!(!region.contains(20));
        assert!(!region.contains(9));
    }

    #[test]
    fn region_overlaps_reference_span() {
        let region = GenomicRegion::new("chr1", 999, 1000).unwrap();
        assert!(region.overlaps(950, 1000));
        assert!(!region.overlaps(950, 999));
        assert!(!region.overlaps(1000, 1050));
        assert_eq!(region.to_string(), "chr1:999-1000");
    }
}
