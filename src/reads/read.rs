//! Module for representing aligned short reads taken from alignment records.
//!

use rust_htslib::bam::{
    self,
    record::{Aux, Cigar},
};

/// Unmapped, secondary, QC-fail and duplicate records never enter a pileup.
const PILEUP_EXCLUDED_FLAGS: u16 = 0x4 | 0x100 | 0x200 | 0x400;

/// A short read aligned to a reference contig.
#[derive(PartialEq, Clone)]
pub struct AlignedRead {
    /// Read name.
    pub id: String,
    /// Name of the contig the read is aligned to.
    pub contig: String,
    /// SAM flag bits of the record.
    pub flags: u16,
    /// Flag indicating if the read is from the reverse strand.
    pub is_reverse: bool,
    /// Query bases as stored in the record, soft-clips included.
    pub bases: Vec<u8>,
    /// Base qualities, parallel to `bases`.
    pub quals: Vec<u8>,
    /// Mapping quality score.
    pub mapq: u8,
    /// 0-based position of the first aligned reference base.
    pub ref_start: i64,
    /// 0-based exclusive end of the aligned reference span.
    pub ref_end: i64,
    /// Number of soft-clipped bases at the start of the query.
    pub left_clip: usize,
    /// Number of soft-clipped bases at the end of the query.
    pub right_clip: usize,
    /// Flag indicating that the mate of this read did not map.
    pub mate_unmapped: bool,
    /// Sequence of the unmapped mate, carried in the `MT` tag.
    pub mate_seq: Option<Vec<u8>>,
}

impl std::fmt::Debug for AlignedRead {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Read")
            .field("id", &self.id)
            .field("span", &format!("{}:{}-{}", self.contig, self.ref_start, self.ref_end))
            .field("bases", &String::from_utf8_lossy(&self.bases))
            .field("clips", &(self.left_clip, self.right_clip))
            .finish()
    }
}

impl AlignedRead {
    /// Creates an `AlignedRead` from an HTSlib record.
    ///
    /// # Arguments
    /// * `rec` - A BAM record from HTSlib.
    /// * `contig` - Name of the contig the record was fetched from.
    pub fn from_hts_rec(rec: &bam::Record, contig: &str) -> AlignedRead {
        let id = String::from_utf8_lossy(rec.qname()).into_owned();
        let cigar = rec.cigar();
        let (left_clip, right_clip) = softclip_lengths(&cigar);

        AlignedRead {
            id,
            contig: contig.to_string(),
            flags: rec.flags(),
            is_reverse: rec.is_reverse(),
            bases: rec.seq().as_bytes(),
            quals: rec.qual().to_vec(),
            mapq: rec.mapq(),
            ref_start: rec.pos(),
            ref_end: cigar.end_pos(),
            left_clip,
            right_clip,
            mate_unmapped: rec.is_mate_unmapped(),
            mate_seq: get_mt_tag(rec),
        }
    }

    /// Whether the record is a primary, non-duplicate alignment that passed QC.
    pub fn is_pileup_eligible(&self) -> bool {
        self.flags & PILEUP_EXCLUDED_FLAGS == 0
    }
}

/// Leading and trailing soft-clip lengths, looking past any hard clips.
fn softclip_lengths(ops: &[Cigar]) -> (usize, usize) {
    let clip_len = |op: Option<&Cigar>| match op {
        Some(Cigar::SoftClip(len)) => *len as usize,
        _ => 0,
    };
    let not_hard = |op: &&Cigar| !matches!(op, Cigar::HardClip(_));
    let leading = clip_len(ops.iter().find(not_hard));
    let trailing = clip_len(ops.iter().rev().find(not_hard));
    // A fully clipped record has a single soft-clip op; count it once.
    if ops.iter().filter(not_hard).count() == 1 {
        return (leading, 0);
    }
    (leading, trailing)
}

/// Retrieves the MT (rescued mate sequence) tag from a BAM record.
///
/// # Returns
/// Returns `Some` with the mate's bases if the tag is present as a string, otherwise `None`.
pub fn get_mt_tag(rec: &bam::Record) -> Option<Vec<u8>> {
    match rec.aux(b"MT") {
        Ok(Aux::String(value)) if !value.is_empty() => Some(value.as_bytes().to_vec()),
        _ => None,
    }
}
