use super::{Assembly, AssemblyError, LocalAssembler, Workspace};
use crate::extend::ReadSet;
use std::{
    path::PathBuf,
    sync::atomic::{AtomicUsize, Ordering},
};

/// Returns a fixed contig list for every read set, written to a real
/// workspace so cleanup is exercised.
pub struct StaticAssembler {
    contigs: Vec<String>,
    tmp_root: Option<PathBuf>,
    calls: AtomicUsize,
}

impl StaticAssembler {
    pub fn new(contigs: &[&str]) -> Self {
        Self {
            contigs: contigs.iter().map(|c| c.to_string()).collect(),
            tmp_root: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn in_dir(mut self, root: PathBuf) -> Self {
        self.tmp_root = Some(root);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LocalAssembler for StaticAssembler {
    fn assemble(&self, reads: &ReadSet) -> Result<Assembly, AssemblyError> {
        assert!(!reads.is_empty(), "assembler invoked on an empty read set");
        self.calls.fetch_add(1, Ordering::SeqCst);
        let workspace = Workspace::create(self.tmp_root.as_deref())?;
        let path = workspace.path().join("asm.fasta");
        let fasta: String = self
            .contigs
            .iter()
            .enumerate()
            .map(|(i, c)| format!(">ctg{}\n{}\n", i, c))
            .collect();
        std::fs::write(&path, fasta).map_err(|e| AssemblyError::Io(e.to_string()))?;
        Ok(Assembly::new(workspace, path))
    }
}

pub struct FailingAssembler;

impl LocalAssembler for FailingAssembler {
    fn assemble(&self, _reads: &ReadSet) -> Result<Assembly, AssemblyError> {
        Err(AssemblyError::Failed {
            tool: "minimus".to_string(),
            status: "exit status: 1".to_string(),
        })
    }
}
