//! AMOS `minimus` backend: `toAmos` converts the reads to an AFG bank input,
//! `minimus` assembles it and writes `<prefix>.fasta`.
use super::{Assembly, AssemblyError, LocalAssembler, Workspace};
use crate::extend::ReadSet;
use bio::io::fasta;
use std::{
    fs::{self, File},
    path::{Path, PathBuf},
    process::{Child, Command, Stdio},
    thread,
    time::{Duration, Instant},
};

const READS_FILE: &str = "reads.fa";
const AFG_FILE: &str = "asm.afg";
const ASM_PREFIX: &str = "asm";
const CONTIGS_FILE: &str = "asm.fasta";
const TOOL_LOG: &str = "tools.log";
const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone)]
pub struct MinimusAssembler {
    toamos: PathBuf,
    minimus: PathBuf,
    timeout: Duration,
    tmp_root: Option<PathBuf>,
}

impl MinimusAssembler {
    pub fn new(toamos: PathBuf, minimus: PathBuf, timeout: Duration, tmp_root: Option<PathBuf>) -> Self {
        Self {
            toamos,
            minimus,
            timeout,
            tmp_root,
        }
    }

    /// Runs one tool inside the workspace, killing it once the timeout elapses.
    /// Tool output goes to a log file so a chatty tool cannot block on a pipe.
    fn run_tool(&self, tool: &Path, args: &[&str], workdir: &Path) -> Result<(), AssemblyError> {
        let name = tool.display().to_string();
        let log_path = workdir.join(TOOL_LOG);
        let log_file = File::options()
            .create(true)
            .append(true)
            .open(&log_path)
            .map_err(|e| AssemblyError::Io(format!("{}: {}", log_path.display(), e)))?;
        let log_err = log_file
            .try_clone()
            .map_err(|e| AssemblyError::Io(format!("{}: {}", log_path.display(), e)))?;

        let mut command = Command::new(tool);
        command
            .args(args)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(log_file)
            .stderr(log_err);
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }
        let mut child = command
            .spawn()
            .map_err(|e| AssemblyError::Spawn {
                tool: name.clone(),
                msg: e.to_string(),
            })?;

        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) if status.success() => return Ok(()),
                Ok(Some(status)) => {
                    if log::log_enabled!(log::Level::Trace) {
                        let output = fs::read_to_string(&log_path).unwrap_or_default();
                        log::trace!("{} output:\n{}", name, output.trim_end());
                    }
                    return Err(AssemblyError::Failed {
                        tool: name,
                        status: status.to_string(),
                    });
                }
                Ok(None) if started.elapsed() >= self.timeout => {
                    kill_tool(&mut child);
                    return Err(AssemblyError::Timeout {
                        tool: name,
                        secs: self.timeout.as_secs_f64(),
                    });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    kill_tool(&mut child);
                    return Err(AssemblyError::Io(format!("Waiting on {}: {}", name, e)));
                }
            }
        }
    }
}

/// Kills a tool together with everything it spawned, then reaps it.
/// Each tool leads its own process group, so the group id is the child's pid.
#[cfg(unix)]
fn kill_tool(child: &mut Child) {
    let pgid = child.id() as libc::pid_t;
    // SAFETY: killpg takes plain integers and touches no memory.
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } != 0 {
        let _ = child.kill();
    }
    let _ = child.wait();
}

#[cfg(not(unix))]
fn kill_tool(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn write_reads(path: &Path, reads: &ReadSet) -> Result<(), AssemblyError> {
    let to_err = |e: std::io::Error| AssemblyError::Io(format!("{}: {}", path.display(), e));
    let mut writer = fasta::Writer::to_file(path).map_err(to_err)?;
    for (i, seq) in reads.seqs.iter().enumerate() {
        writer.write(&format!("read_{}", i), None, seq).map_err(to_err)?;
    }
    writer.flush().map_err(to_err)
}

impl LocalAssembler for MinimusAssembler {
    fn assemble(&self, reads: &ReadSet) -> Result<Assembly, AssemblyError> {
        let workspace = Workspace::create(self.tmp_root.as_deref())?;
        let workdir = workspace.path();

        write_reads(&workdir.join(READS_FILE), reads)?;
        self.run_tool(&self.toamos, &["-s", READS_FILE, "-o", AFG_FILE], workdir)?;
        self.run_tool(&self.minimus, &[ASM_PREFIX], workdir)?;

        let contigs_path = workdir.join(CONTIGS_FILE);
        Ok(Assembly::new(workspace, contigs_path))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn read_set(seqs: &[&str]) -> ReadSet {
        ReadSet {
            seqs: seqs.iter().map(|s| s.as_bytes().to_vec()).collect(),
            num_softclipped: seqs.len(),
            num_rescued: 0,
        }
    }

    struct Fixture {
        bin: tempfile::TempDir,
        tmp_root: tempfile::TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                bin: tempfile::tempdir().unwrap(),
                tmp_root: tempfile::tempdir().unwrap(),
            }
        }

        fn assembler(&self, toamos: &str, minimus: &str, timeout: Duration) -> MinimusAssembler {
            MinimusAssembler::new(
                script(self.bin.path(), "toAmos", toamos),
                script(self.bin.path(), "minimus", minimus),
                timeout,
                Some(self.tmp_root.path().to_path_buf()),
            )
        }

        fn leftover_workspaces(&self) -> usize {
            fs::read_dir(self.tmp_root.path()).unwrap().count()
        }
    }

    const COPY_READS: &str = r#"[ "$1" = "-s" ] && [ "$3" = "-o" ] && cp "$2" "$4""#;

    #[test]
    fn test_assemble_reads_contigs() {
        let fx = Fixture::new();
        let minimus = r#"[ -s "$1.afg" ] && printf '>ctg1\nACGTACGTTTTTCCCC\n>ctg2\nGGGG\n' > "$1.fasta""#;
        let assembler = fx.assembler(COPY_READS, minimus, Duration::from_secs(10));
        let mut assembly = assembler.assemble(&read_set(&["ACGTACGTTTTT", "TTTTCCCC"])).unwrap();

        let workdir = assembly.workspace_path().unwrap().to_path_buf();
        let reads = fs::read_to_string(workdir.join(READS_FILE)).unwrap();
        assert_eq!(reads, ">read_0\nACGTACGTTTTT\n>read_1\nTTTTCCCC\n");

        let contigs: Vec<Vec<u8>> = assembly.extension_candidates().collect();
        assert_eq!(contigs, vec![b"ACGTACGTTTTTCCCC".to_vec(), b"GGGG".to_vec()]);
        assembly.release();
        assert_eq!(fx.leftover_workspaces(), 0);
    }

    #[test]
    fn test_no_output_means_no_contigs() {
        let fx = Fixture::new();
        let assembler = fx.assembler(COPY_READS, "exit 0", Duration::from_secs(10));
        let mut assembly = assembler.assemble(&read_set(&["ACGT"])).unwrap();
        assert_eq!(assembly.extension_candidates().count(), 0);
        drop(assembly);
        assert_eq!(fx.leftover_workspaces(), 0);
    }

    #[test]
    fn test_tool_failure() {
        let fx = Fixture::new();
        let assembler = fx.assembler("echo boom >&2; exit 3", "exit 0", Duration::from_secs(10));
        let err = assembler.assemble(&read_set(&["ACGT"])).unwrap_err();
        assert!(matches!(err, AssemblyError::Failed { ref tool, .. } if tool.ends_with("toAmos")));
        assert_eq!(fx.leftover_workspaces(), 0);
    }

    #[test]
    fn test_tool_timeout_kills_child() {
        let fx = Fixture::new();
        let assembler = fx.assembler(COPY_READS, "exec sleep 30", Duration::from_millis(200));
        let started = Instant::now();
        let err = assembler.assemble(&read_set(&["ACGT"])).unwrap_err();
        assert!(matches!(err, AssemblyError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(fx.leftover_workspaces(), 0);
    }

    #[test]
    fn test_tool_timeout_kills_descendants() {
        let fx = Fixture::new();
        let marker = fx.bin.path().join("stage_finished");
        let minimus = format!(r#"(sleep 1; touch "{}") & wait"#, marker.display());
        let assembler = fx.assembler(COPY_READS, &minimus, Duration::from_millis(200));
        let err = assembler.assemble(&read_set(&["ACGT"])).unwrap_err();
        assert!(matches!(err, AssemblyError::Timeout { .. }));
        thread::sleep(Duration::from_millis(1500));
        assert!(!marker.exists());
        assert_eq!(fx.leftover_workspaces(), 0);
    }

    #[test]
    fn test_missing_binary() {
        let fx = Fixture::new();
        let assembler = MinimusAssembler::new(
            fx.bin.path().join("no-such-toAmos"),
            fx.bin.path().join("no-such-minimus"),
            Duration::from_secs(1),
            Some(fx.tmp_root.path().to_path_buf()),
        );
        let err = assembler.assemble(&read_set(&["ACGT"])).unwrap_err();
        assert!(matches!(err, AssemblyError::Spawn { .. }));
        assert_eq!(fx.leftover_workspaces(), 0);
    }
}
