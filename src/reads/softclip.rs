//! Lenient classification of soft-clipped reads at a breakpoint and extraction
//! of the clipped overhang.
//!
//! The clip site of a right-clipped read is the first reference base past its
//! aligned block (its exclusive alignment end); the clip site of a left-clipped
//! read is the base just before its alignment start. Alignment noise near
//! indels can shift the clip site by a few bases, so the test accepts any clip
//! site within `tolerance` bases of the breakpoint.
use super::AlignedRead;
use crate::flanks::Orientation;

impl AlignedRead {
    /// Reference coordinate where the clipped bases on the given side would sit.
    #[inline]
    pub fn clip_site(&self, orient: Orientation) -> i64 {
        match orient {
            Orientation::Right => self.ref_end,
            Orientation::Left => self.ref_start - 1,
        }
    }

    #[inline]
    pub fn clip_len(&self, orient: Orientation) -> usize {
        match orient {
            Orientation::Right => self.right_clip,
            Orientation::Left => self.left_clip,
        }
    }

    pub fn is_softclipped_at(
        &self,
        contig: &str,
        position: u64,
        orient: Orientation,
        tolerance: u32,
    ) -> bool {
        if self.contig != contig || self.clip_len(orient) == 0 {
            return false;
        }
        self.clip_site(orient).abs_diff(position as i64) <= tolerance as u64
    }

    /// Clipped bases on the given side, in read order.
    pub fn clipped_bases(&self, orient: Orientation) -> &[u8] {
        let len = self.clip_len(orient).min(self.bases.len());
        match orient {
            Orientation::Right => &self.bases[self.bases.len() - len..],
            Orientation::Left => &self.bases[..len],
        }
    }

    fn clipped_quals(&self, orient: Orientation) -> &[u8] {
        let len = self.clip_len(orient).min(self.quals.len());
        match orient {
            Orientation::Right => &self.quals[self.quals.len() - len..],
            Orientation::Left => &self.quals[..len],
        }
    }

    /// Clipped overhang reading outward from the breakpoint: the suffix as-is
    /// for right clips, the reversed prefix for left clips.
    pub fn overhang_sequence(&self, orient: Orientation) -> Vec<u8> {
        outward(self.clipped_bases(orient), orient)
    }

    /// Qualities of [`Self::overhang_sequence`], in the same order.
    pub fn overhang_qualities(&self, orient: Orientation) -> Vec<u8> {
        outward(self.clipped_quals(orient), orient)
    }
}

fn outward(values: &[u8], orient: Orientation) -> Vec<u8> {
    match orient {
        Orientation::Right => values.to_vec(),
        Orientation::Left => values.iter().rev().copied().collect(),
    }
}
