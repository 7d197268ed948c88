use super::AlignmentStore;
use crate::reads::AlignedRead;
use crate::utils::{GenomicRegion, InputSource, Result};
use rust_htslib::bam::{self, Read, Record};
use std::{collections::HashMap, path::Path};

const MAX_PILEUP_DEPTH: u32 = 8000;

/// Alignment store backed by an indexed BAM/CRAM file.
pub struct HtsAlignmentStore {
    reader: bam::IndexedReader,
    contig_lens: HashMap<String, u64>,
}

impl HtsAlignmentStore {
    /// Opens an indexed BAM/CRAM. `reference` is only used to decode CRAM.
    pub fn open(src: &InputSource, reference: Option<&Path>, threads: usize) -> Result<Self> {
        src.preflight_checks()?;
        let mut reader = match src {
            InputSource::Local(p) => bam::IndexedReader::from_path(p),
            InputSource::Remote(r) => bam::IndexedReader::from_url(r.url()),
        }
        .map_err(|e| src.format_error("Failed to open alignments from", e))?;

        if let Err(e) = reader.set_threads(threads) {
            log::warn!("Failed to set decompression threads: {e}");
        }

        if src.is_cram() {
            match reference {
                Some(path) => {
                    check_missing_faidx(path)?;
                    reader.set_reference(path).map_err(|e| {
                        format!("Failed to set reference {}: {}", path.display(), e)
                    })?;
                }
                None => log::debug!(
                    "No reference given for CRAM {}; htslib will resolve it from the header",
                    src
                ),
            }
        }

        let header = reader.header();
        let contig_lens = (0..header.target_count())
            .filter_map(|tid| {
                let name = String::from_utf8_lossy(header.tid2name(tid)).into_owned();
                header.target_len(tid).map(|len| (name, len))
            })
            .collect();

        Ok(Self {
            reader,
            contig_lens,
        })
    }

    fn fetch_region(&mut self, region: &GenomicRegion) -> Result<()> {
        self.reader
            .fetch((region.contig.as_str(), region.start as i64, region.end as i64))
            .map_err(|e| format!("BAM fetch error for {}: {}", region, e))
    }
}

impl AlignmentStore for HtsAlignmentStore {
    fn contig_length(&self, contig: &str) -> Option<u64> {
        self.contig_lens.get(contig).copied()
    }

    fn pileup(&mut self, region: &GenomicRegion) -> Result<Vec<AlignedRead>> {
        self.fetch_region(region)?;
        let mut pileups = self.reader.pileup();
        pileups.set_max_depth(MAX_PILEUP_DEPTH);

        let mut reads = Vec::new();
        for pileup in pileups {
            let pileup = pileup.map_err(|e| format!("Pileup error for {}: {}", region, e))?;
            // Columns outside the region come from reads that only partly overlap it
            if !region.contains(pileup.pos() as u64) {
                continue;
            }
            // htslib only drops unmapped records from the pileup itself
            reads.extend(
                pileup
                    .alignments()
                    .map(|alignment| AlignedRead::from_hts_rec(&alignment.record(), &region.contig))
                    .filter(AlignedRead::is_pileup_eligible),
            );
        }
        Ok(reads)
    }

    fn fetch(&mut self, region: &GenomicRegion) -> Result<Vec<AlignedRead>> {
        self.fetch_region(region)?;
        let mut reads = Vec::new();
        let mut record = Record::new();
        while let Some(result) = self.reader.read(&mut record) {
            result.map_err(|e| format!("BAM read error in {}: {}", region, e))?;
            if record.is_unmapped() {
                continue;
            }
            reads.push(AlignedRead::from_hts_rec(&record, &region.contig));
        }
        Ok(reads)
    }
}

fn check_missing_faidx(fasta: &Path) -> Result<()> {
    let ext = fasta.extension().and_then(|s| s.to_str()).unwrap_or("");
    let fai = fasta.with_extension(format!("{ext}.fai"));
    if !fai.exists() {
        return Err(format!(
            "Reference index not found: {}. Create it with 'samtools faidx {}'",
            fai.display(),
            fasta.display()
        ));
    }
    Ok(())
}
