use super::AlignmentStore;
use crate::reads::AlignedRead;
use crate::utils::{GenomicRegion, Result};
use rust_htslib::bam::{self, header::HeaderRecord, Record};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

/// Writes a coordinate-sorted BAM with a BAI index to `dir/reads.bam`.
/// All records must be placed on the first contig (tid 0).
pub fn write_indexed_bam(dir: &Path, contigs: &[(&str, u64)], mut records: Vec<Record>) -> PathBuf {
    let path = dir.join("reads.bam");

    let mut header = bam::Header::new();
    let mut hd = HeaderRecord::new(b"HD");
    hd.push_tag(b"VN", "1.6").push_tag(b"SO", "coordinate");
    header.push_record(&hd);
    for (name, len) in contigs {
        let mut sq = HeaderRecord::new(b"SQ");
        sq.push_tag(b"SN", name).push_tag(b"LN", len);
        header.push_record(&sq);
    }

    records.sort_by_key(|r| (r.tid(), r.pos()));
    {
        let mut writer = bam::Writer::from_path(&path, &header, bam::Format::Bam).unwrap();
        for rec in &records {
            writer.write(rec).unwrap();
        }
    }
    bam::index::build(&path, None, bam::index::Type::Bai, 1).unwrap();
    path
}

/// In-memory store with the same column semantics as the htslib pileup.
#[derive(Clone, Default)]
pub struct MemoryStore {
    contig_lens: HashMap<String, u64>,
    reads: Vec<AlignedRead>,
    /// Contigs on which every query fails, to exercise I/O error paths.
    failing: Vec<String>,
}

impl MemoryStore {
    pub fn new(contigs: &[(&str, u64)]) -> Self {
        Self {
            contig_lens: contigs
                .iter()
                .map(|(name, len)| (name.to_string(), *len))
                .collect(),
            ..Default::default()
        }
    }

    pub fn with_reads(mut self, reads: impl IntoIterator<Item = AlignedRead>) -> Self {
        self.reads.extend(reads);
        self
    }

    pub fn failing_on(mut self, contig: &str) -> Self {
        self.failing.push(contig.to_string());
        self
    }

    fn check(&self, region: &GenomicRegion) -> Result<()> {
        if self.failing.contains(&region.contig) {
            return Err(format!("BAM fetch error for {}: simulated failure", region));
        }
        if !self.contig_lens.contains_key(&region.contig) {
            return Err(format!("BAM fetch error for {}: unknown contig", region));
        }
        Ok(())
    }

    fn on_contig<'a>(&'a self, region: &'a GenomicRegion) -> impl Iterator<Item = &'a AlignedRead> {
        self.reads.iter().filter(move |r| r.contig == region.contig)
    }
}

impl AlignmentStore for MemoryStore {
    fn contig_length(&self, contig: &str) -> Option<u64> {
        self.contig_lens.get(contig).copied()
    }

    fn pileup(&mut self, region: &GenomicRegion) -> Result<Vec<AlignedRead>> {
        self.check(region)?;
        let mut reads = Vec::new();
        for column in region.start..region.end {
            let column = column as i64;
            reads.extend(
                self.on_contig(region)
                    .filter(|r| r.is_pileup_eligible())
                    .filter(|r| r.ref_start <= column && column < r.ref_end)
                    .cloned(),
            );
        }
        Ok(reads)
    }

    fn fetch(&mut self, region: &GenomicRegion) -> Result<Vec<AlignedRead>> {
        self.check(region)?;
        Ok(self
            .on_contig(region)
            .filter(|r| region.overlaps(r.ref_start, r.ref_end))
            .cloned()
            .collect())
    }
}
