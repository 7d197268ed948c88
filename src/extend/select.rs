//! Breakpoint-aware selection of the reads handed to the local assembler.
use crate::flanks::{BreakpointSite, Orientation};
use crate::reads::AlignedRead;
use crate::store::AlignmentStore;
use crate::utils::{GenomicRegion, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectParams {
    pub min_mapq: u8,
    pub clip_tolerance: u32,
    /// Distance scanned on the anchored side of the breakpoint for reads
    /// with unmapped mates.
    pub mate_search_len: u64,
    /// Contribute only the clipped bases of soft-clipped reads.
    pub softclip_only: bool,
}

impl Default for SelectParams {
    fn default() -> Self {
        Self {
            min_mapq: 20,
            clip_tolerance: 2,
            mate_search_len: 500,
            softclip_only: false,
        }
    }
}

/// Candidate sequences for one breakpoint, soft-clipped reads first.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReadSet {
    pub seqs: Vec<Vec<u8>>,
    pub num_softclipped: usize,
    pub num_rescued: usize,
}

impl ReadSet {
    pub fn len(&self) -> usize {
        self.seqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seqs.is_empty()
    }
}

fn contig_len<S: AlignmentStore + ?Sized>(store: &S, contig: &str) -> Result<u64> {
    store
        .contig_length(contig)
        .ok_or_else(|| format!("Contig {} not found in alignment store", contig))
}

/// Reference column inspected for soft-clipped reads: the last anchored base
/// for right flanks (clamped to the contig start), the base after the
/// breakpoint for left flanks.
pub fn pileup_window(site: &BreakpointSite, contig_len: u64) -> Option<GenomicRegion> {
    let column = match site.orient {
        Orientation::Right => site.pos.saturating_sub(1),
        Orientation::Left => site.pos + 1,
    };
    GenomicRegion::clamped(&site.contig, column, column + 1, contig_len)
}

/// Interval scanned for reads whose unmapped mate lies in the insertion.
pub fn mate_window(site: &BreakpointSite, contig_len: u64, search_len: u64) -> Option<GenomicRegion> {
    let (start, end) = match site.orient {
        Orientation::Right => (site.pos.saturating_sub(search_len), site.pos),
        Orientation::Left => (site.pos + 1, site.pos + 1 + search_len),
    };
    GenomicRegion::clamped(&site.contig, start, end, contig_len)
}

fn softclipped_reads<S: AlignmentStore + ?Sized>(
    store: &mut S,
    site: &BreakpointSite,
    params: &SelectParams,
) -> Result<Vec<AlignedRead>> {
    let len = contig_len(store, &site.contig)?;
    let Some(region) = pileup_window(site, len) else {
        return Ok(Vec::new());
    };
    let reads = store
        .pileup(&region)?
        .into_iter()
        .filter(|r| r.mapq >= params.min_mapq)
        .filter(|r| r.is_softclipped_at(&site.contig, site.pos, site.orient, params.clip_tolerance))
        .collect();
    Ok(reads)
}

fn rescued_mates<S: AlignmentStore + ?Sized>(
    store: &mut S,
    site: &BreakpointSite,
    params: &SelectParams,
) -> Result<Vec<Vec<u8>>> {
    let len = contig_len(store, &site.contig)?;
    let Some(region) = mate_window(site, len, params.mate_search_len) else {
        return Ok(Vec::new());
    };

    let expect_reverse = site.orient.expects_reverse_strand();
    let mut mates = Vec::new();
    for read in store.fetch(&region)? {
        if read.is_reverse != expect_reverse || !read.mate_unmapped {
            continue;
        }
        match read.mate_seq {
            Some(seq) => mates.push(seq),
            None => log::trace!("{}: read {} has an unmapped mate but no MT tag", site, read.id),
        }
    }
    Ok(mates)
}

/// Collects the sequences to assemble for one breakpoint: soft-clipped reads
/// from the pileup followed by rescued mate sequences.
pub fn select_reads<S: AlignmentStore + ?Sized>(
    store: &mut S,
    site: &BreakpointSite,
    params: &SelectParams,
) -> Result<ReadSet> {
    let clipped: Vec<Vec<u8>> = softclipped_reads(store, site, params)?
        .into_iter()
        .map(|read| {
            if params.softclip_only {
                read.clipped_bases(site.orient).to_vec()
            } else {
                read.bases
            }
        })
        .collect();
    let mates = rescued_mates(store, site, params)?;

    let mut set = ReadSet {
        num_softclipped: clipped.len(),
        num_rescued: mates.len(),
        seqs: clipped,
    };
    set.seqs.extend(mates);
    Ok(set)
}

/// Overhang sequences and qualities of the reads clipped at the breakpoint,
/// each reading outward from it.
pub fn softclip_evidence<S: AlignmentStore + ?Sized>(
    store: &mut S,
    site: &BreakpointSite,
    params: &SelectParams,
) -> Result<(Vec<Vec<u8>>, Vec<Vec<u8>>)> {
    Ok(softclipped_reads(store, site, params)?
        .iter()
        .map(|r| (r.overhang_sequence(site.orient), r.overhang_qualities(site.orient)))
        .unzip())
}

/// Number of reads overlapping the reference base at the breakpoint.
pub fn count_runthrough_reads<S: AlignmentStore + ?Sized>(
    store: &mut S,
    site: &BreakpointSite,
) -> Result<usize> {
    let len = contig_len(store, &site.contig)?;
    match GenomicRegion::clamped(&site.contig, site.pos, site.pos + 1, len) {
        Some(region) => Ok(store.fetch(&region)?.len()),
        None => Ok(0),
    }
}
