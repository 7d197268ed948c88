use bio::alignment::{pairwise::Aligner, AlignmentOperation};
use bio::alphabets::dna;

const MATCH_SCR: i32 = 1;

/// Penalties for aligning a flank against an assembled contig (non-negative)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlnScoring {
    pub mism_scr: i32,
    pub gapo_scr: i32,
    pub gape_scr: i32,
}

impl Default for AlnScoring {
    fn default() -> Self {
        Self {
            mism_scr: 2,
            gapo_scr: 5,
            gape_scr: 1,
        }
    }
}

/// Placement of a flank within a contig.
///
/// `start..end` is the span covered by the flank on the contig in the strand
/// given by `is_reverse`, i.e. on the reverse complement of the contig when
/// `is_reverse` is set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlankHit {
    pub start: usize,
    pub end: usize,
    pub is_reverse: bool,
    pub identity: f64,
}

/// Locates a flank sequence within a contig. Implementations return `None`
/// unless the whole flank aligns with acceptable quality.
pub trait FlankAligner: Send + Sync {
    fn locate(&self, flank: &[u8], contig: &[u8]) -> Option<FlankHit>;
}

/// Aligns the flank end-to-end against a local window of the contig, trying
/// the forward strand of the contig first.
#[derive(Debug, Clone)]
pub struct SemiglobalAligner {
    scoring: AlnScoring,
    min_identity: f64,
}

impl SemiglobalAligner {
    pub fn new(scoring: AlnScoring, min_identity: f64) -> Self {
        Self {
            scoring,
            min_identity,
        }
    }

    fn align_strand(&self, flank: &[u8], contig: &[u8], is_reverse: bool) -> Option<FlankHit> {
        let mism_scr = -self.scoring.mism_scr;
        let score = move |a: u8, b: u8| {
            if a.eq_ignore_ascii_case(&b) {
                MATCH_SCR
            } else {
                mism_scr
            }
        };
        let mut aligner = Aligner::with_capacity(
            flank.len(),
            contig.len(),
            -self.scoring.gapo_scr,
            -self.scoring.gape_scr,
            score,
        );
        let aln = aligner.semiglobal(flank, contig);

        if aln.xstart != 0 || aln.xend != flank.len() {
            return None;
        }

        let (matches, columns) = aln
            .operations
            .iter()
            .fold((0usize, 0usize), |(m, c), op| match op {
                AlignmentOperation::Match => (m + 1, c + 1),
                AlignmentOperation::Subst | AlignmentOperation::Ins | AlignmentOperation::Del => {
                    (m, c + 1)
                }
                _ => (m, c),
            });
        if columns == 0 {
            return None;
        }

        let identity = matches as f64 / columns as f64;
        if identity < self.min_identity {
            return None;
        }

        Some(FlankHit {
            start: aln.ystart,
            end: aln.yend,
            is_reverse,
            identity,
        })
    }
}

impl FlankAligner for SemiglobalAligner {
    fn locate(&self, flank: &[u8], contig: &[u8]) -> Option<FlankHit> {
        if flank.is_empty() || contig.is_empty() {
            return None;
        }
        self.align_strand(flank, contig, false)
            .or_else(|| self.align_strand(flank, &dna::revcomp(contig), true))
    }
}
