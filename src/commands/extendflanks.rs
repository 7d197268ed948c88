use crate::assembly::MinimusAssembler;
use crate::cli::ExtendFlanksArgs;
use crate::extend::{ExtensionResult, Extender, SelectParams};
use crate::flanks::{read_flank_table, write_flank_table, FlankRecord};
use crate::store::{AlignmentStore, HtsAlignmentStore};
use crate::utils::{Result, SemiglobalAligner};
use rayon::{
    iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator},
    ThreadPoolBuilder,
};
use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

const PROGRESS_INTERVAL: usize = 100;
/// Lower bound on rows per rayon task; each task opens its own store handle.
const MIN_ROWS_PER_TASK: usize = 16;
const DECOMPRESSION_THREADS: usize = 1;

pub fn extendflanks(args: ExtendFlanksArgs) -> Result<()> {
    let mut table = read_flank_table(&args.flanks_path)?;
    log::debug!("Loaded {} flanks from {}", table.records.len(), args.flanks_path.display());

    let open_store = || HtsAlignmentStore::open(&args.reads_src, args.reference.as_deref(), DECOMPRESSION_THREADS);
    validate_contigs(&table.records, &open_store()?)?;

    let params = SelectParams {
        min_mapq: args.min_mapq,
        clip_tolerance: args.clip_tolerance,
        mate_search_len: args.mate_search_len,
        softclip_only: args.softclip_only,
    };
    let assembler = MinimusAssembler::new(
        args.toamos.clone(),
        args.minimus.clone(),
        Duration::from_secs(args.assembly_timeout),
        args.tmp_dir.clone(),
    );
    let aligner = SemiglobalAligner::new(args.aln_scoring, args.min_identity);
    let extender = Extender::new(params, &assembler, &aligner);

    log::info!("Running extendflanks on {} flanks", table.records.len());
    let records = std::mem::take(&mut table.records);
    table.records = extend_all(records, open_store, &extender, args.num_threads)?;

    log::info!("Saving results to {}", args.output_path.display());
    write_flank_table(&args.output_path, &table)?;

    println!("Extended {} of {} flanks", table.num_extended(), table.records.len());
    Ok(())
}

/// Rejects tables that reference contigs missing from the alignment store.
fn validate_contigs<S: AlignmentStore>(records: &[FlankRecord], store: &S) -> Result<()> {
    for record in records {
        if store.contig_length(&record.site.contig).is_none() {
            return Err(format!(
                "Line {}: contig '{}' not found in alignment store",
                record.line_number(),
                record.site.contig
            ));
        }
    }
    Ok(())
}

/// Extends every record, preserving input order. Each worker task owns a
/// store handle from `open_store`; a failure to open one aborts the run,
/// while per-row store errors leave that row unchanged.
pub fn extend_all<S, F>(
    records: Vec<FlankRecord>,
    open_store: F,
    extender: &Extender,
    num_threads: usize,
) -> Result<Vec<FlankRecord>>
where
    S: AlignmentStore,
    F: Fn() -> Result<S> + Sync + Send,
{
    let total = records.len();
    let processed = AtomicUsize::new(0);
    let num_extended = AtomicUsize::new(0);

    let pool = initialize_thread_pool(num_threads)?;
    let records = pool.install(|| {
        records
            .into_par_iter()
            .with_min_len(MIN_ROWS_PER_TASK)
            .map_init(&open_store, |store, record| -> Result<FlankRecord> {
                let store = store.as_mut().map_err(|e| e.clone())?;
                let record = extend_record(store, extender, record);
                if record.extended {
                    num_extended.fetch_add(1, Ordering::Relaxed);
                }
                let done = processed.fetch_add(1, Ordering::Relaxed) + 1;
                if done % PROGRESS_INTERVAL == 0 {
                    log::info!(
                        "Processed {} of {} flanks, extended {} so far",
                        done,
                        total,
                        num_extended.load(Ordering::Relaxed)
                    );
                }
                Ok(record)
            })
            .collect::<Result<Vec<_>>>()
    })?;

    log::info!(
        "Extended {} of {} flanks",
        num_extended.load(Ordering::Relaxed),
        total
    );
    Ok(records)
}

fn extend_record<S: AlignmentStore>(
    store: &mut S,
    extender: &Extender,
    mut record: FlankRecord,
) -> FlankRecord {
    record.extended = false;
    match extender.extend(store, &record.site, &record.consensus_seq) {
        Ok(ExtensionResult::Extended(seq)) => {
            log::debug!(
                "{}: extended flank from {} to {} bp",
                record.site,
                record.consensus_seq.len(),
                seq.len()
            );
            record.consensus_seq = seq;
            record.extended = true;
        }
        Ok(ExtensionResult::NotExtended) => {}
        Err(e) => log::warn!("{}: {}", record.site, e),
    }
    record
}

fn initialize_thread_pool(num_threads: usize) -> Result<rayon::ThreadPool> {
    log::debug!(
        "Initializing extension thread pool with {} threads...",
        num_threads
    );
    ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name(|i| format!("meflank-{}", i))
        .build()
        .map_err(|e| format!("Failed to initialize thread pool: {}", e))
}
