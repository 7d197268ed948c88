//! Local assembly of candidate reads into contigs.
use crate::extend::ReadSet;
use bio::io::fasta;
use std::{
    fmt,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};
use tempfile::TempDir;

mod minimus;
#[cfg(test)]
pub mod test_utils;

pub use minimus::MinimusAssembler;

const WORKSPACE_PREFIX: &str = "meflank-asm-";

#[derive(Debug, Clone, PartialEq)]
pub enum AssemblyError {
    /// The assembler binary could not be started.
    Spawn { tool: String, msg: String },
    /// The assembler exited unsuccessfully.
    Failed { tool: String, status: String },
    Timeout { tool: String, secs: f64 },
    Io(String),
}

impl fmt::Display for AssemblyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssemblyError::Spawn { tool, msg } => write!(f, "Failed to start {}: {}", tool, msg),
            AssemblyError::Failed { tool, status } => write!(f, "{} failed with {}", tool, status),
            AssemblyError::Timeout { tool, secs } => {
                write!(f, "{} did not finish within {:.1}s and was killed", tool, secs)
            }
            AssemblyError::Io(msg) => write!(f, "Assembly I/O error: {}", msg),
        }
    }
}

/// Assembles a non-empty read set into zero or more contigs.
pub trait LocalAssembler: Send + Sync {
    fn assemble(&self, reads: &ReadSet) -> Result<Assembly, AssemblyError>;
}

/// Uniquely named scratch directory owned by a single assembly attempt.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Creates a workspace under `root`, or the system temp dir if `None`.
    pub fn create(root: Option<&Path>) -> Result<Self, AssemblyError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);
        let dir = match root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(|e| AssemblyError::Io(format!("Failed to create assembly workspace: {}", e)))?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Deletes the workspace. Failures are logged and otherwise ignored.
    pub fn release(self) {
        let path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            log::warn!("Failed to remove assembly workspace {}: {}", path.display(), e);
        }
    }
}

/// Contigs produced by one assembly attempt together with their workspace.
///
/// The workspace is removed by [`Assembly::release`] or, failing that, when
/// the assembly is dropped.
#[derive(Debug)]
pub struct Assembly {
    workspace: Option<Workspace>,
    contigs_path: Option<PathBuf>,
}

impl Assembly {
    /// `contigs_path` is a FASTA file inside the workspace; a missing file
    /// means the assembler produced no contigs.
    pub fn new(workspace: Workspace, contigs_path: PathBuf) -> Self {
        Self {
            workspace: Some(workspace),
            contigs_path: Some(contigs_path),
        }
    }

    pub fn workspace_path(&self) -> Option<&Path> {
        self.workspace.as_ref().map(Workspace::path)
    }

    /// Streams the assembled contigs in the order the assembler wrote them.
    /// The stream can be taken once; later calls yield nothing.
    pub fn extension_candidates(&mut self) -> Contigs {
        let Some(path) = self.contigs_path.take() else {
            return Contigs::default();
        };
        if !path.exists() {
            log::trace!("No contigs written to {}", path.display());
            return Contigs::default();
        }
        match fasta::Reader::from_file(&path) {
            Ok(reader) => Contigs {
                records: Some(reader.records()),
            },
            Err(e) => {
                log::warn!("Failed to read contigs from {}: {}", path.display(), e);
                Contigs::default()
            }
        }
    }

    pub fn release(mut self) {
        if let Some(workspace) = self.workspace.take() {
            workspace.release();
        }
    }
}

impl Drop for Assembly {
    fn drop(&mut self) {
        if let Some(workspace) = self.workspace.take() {
            workspace.release();
        }
    }
}

/// Lazy iterator over contig sequences. A malformed record ends the stream.
#[derive(Default)]
pub struct Contigs {
    records: Option<fasta::Records<BufReader<File>>>,
}

impl Iterator for Contigs {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.records.as_mut()?.next()? {
            Ok(record) => Some(record.seq().to_vec()),
            Err(e) => {
                log::warn!("Malformed assembler output: {}", e);
                self.records = None;
                None
            }
        }
    }
}
