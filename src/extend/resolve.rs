//! Splicing assembled sequence onto a flank.
use crate::flanks::Orientation;
use crate::utils::{FlankAligner, FlankHit};
use bio::alphabets::dna;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionResult {
    NotExtended,
    /// Strictly longer than the original flank, which it contains unchanged.
    Extended(Vec<u8>),
}

/// Extends `flank` with the first contig that contains it.
///
/// Contigs are tried in the order given; a contig that only matches on its
/// reverse strand is reverse complemented before splicing. The first contig
/// the flank aligns to decides the outcome, even if it adds no bases.
pub fn resolve<I>(flank: &[u8], contigs: I, orient: Orientation, aligner: &dyn FlankAligner) -> ExtensionResult
where
    I: IntoIterator<Item = Vec<u8>>,
{
    for contig in contigs {
        let Some(hit) = aligner.locate(flank, &contig) else {
            continue;
        };
        let contig = if hit.is_reverse {
            dna::revcomp(&contig)
        } else {
            contig
        };
        log::trace!(
            "Flank placed at {}-{} of a {} bp contig (identity {:.3})",
            hit.start,
            hit.end,
            contig.len(),
            hit.identity
        );
        return splice(flank, &contig, &hit, orient);
    }
    ExtensionResult::NotExtended
}

fn splice(flank: &[u8], contig: &[u8], hit: &FlankHit, orient: Orientation) -> ExtensionResult {
    let extension = match orient {
        Orientation::Right => &contig[hit.end..],
        Orientation::Left => &contig[..hit.start],
    };
    if extension.is_empty() {
        return ExtensionResult::NotExtended;
    }

    let mut seq = Vec::with_capacity(flank.len() + extension.len());
    match orient {
        Orientation::Right => {
            seq.extend_from_slice(flank);
            seq.extend_from_slice(extension);
        }
        Orientation::Left => {
            seq.extend_from_slice(extension);
            seq.extend_from_slice(flank);
        }
    }
    ExtensionResult::Extended(seq)
}
