//! Targeted local-assembly extension of one flank at a time.
mod resolve;
mod select;

pub use resolve::{resolve, ExtensionResult};
pub use select::{
    count_runthrough_reads, mate_window, pileup_window, select_reads, softclip_evidence, ReadSet,
    SelectParams,
};

use crate::assembly::LocalAssembler;
use crate::flanks::BreakpointSite;
use crate::store::AlignmentStore;
use crate::utils::{FlankAligner, Result};
use itertools::Itertools;

/// Runs selection, assembly and resolution for a single breakpoint.
pub struct Extender<'a> {
    params: SelectParams,
    assembler: &'a dyn LocalAssembler,
    aligner: &'a dyn FlankAligner,
}

impl<'a> Extender<'a> {
    pub fn new(params: SelectParams, assembler: &'a dyn LocalAssembler, aligner: &'a dyn FlankAligner) -> Self {
        Self {
            params,
            assembler,
            aligner,
        }
    }

    /// Attempts to extend `flank`. Algorithmic dead ends (no reads, failed or
    /// empty assembly, no placement) yield `NotExtended`; only store errors
    /// are returned as `Err`.
    pub fn extend<S: AlignmentStore + ?Sized>(
        &self,
        store: &mut S,
        site: &BreakpointSite,
        flank: &[u8],
    ) -> Result<ExtensionResult> {
        if log::log_enabled!(log::Level::Debug) {
            self.report_evidence(store, site)?;
        }

        let reads = select_reads(store, site, &self.params)?;
        if reads.is_empty() {
            log::debug!("{}: no candidate reads", site);
            return Ok(ExtensionResult::NotExtended);
        }
        log::trace!(
            "{}: assembling {} soft-clipped and {} rescued sequences",
            site,
            reads.num_softclipped,
            reads.num_rescued
        );

        let mut assembly = match self.assembler.assemble(&reads) {
            Ok(assembly) => assembly,
            Err(e) => {
                log::debug!("{}: assembly failed: {}", site, e);
                return Ok(ExtensionResult::NotExtended);
            }
        };
        let result = resolve(flank, assembly.extension_candidates(), site.orient, self.aligner);
        assembly.release();

        if result == ExtensionResult::NotExtended {
            log::debug!("{}: no contig extends the flank", site);
        }
        Ok(result)
    }

    fn report_evidence<S: AlignmentStore + ?Sized>(&self, store: &mut S, site: &BreakpointSite) -> Result<()> {
        let (seqs, quals) = softclip_evidence(store, site, &self.params)?;
        let runthrough = count_runthrough_reads(store, site)?;
        let mean_qual = |q: &Vec<u8>| {
            if q.is_empty() {
                0.0
            } else {
                q.iter().map(|&v| v as f64).sum::<f64>() / q.len() as f64
            }
        };
        log::debug!(
            "{}: {} soft-clipped, {} run-through; overhangs [{}]; mean quals [{}]",
            site,
            seqs.len(),
            runthrough,
            seqs.iter().map(|s| String::from_utf8_lossy(s)).join(","),
            quals.iter().map(|q| format!("{:.1}", mean_qual(q))).join(",")
        );
        Ok(())
    }
}
