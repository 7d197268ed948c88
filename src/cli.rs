use crate::{
    preflight_fields,
    utils::{AlnScoring, InputSource, Result},
};
use clap::{ArgAction, ArgGroup, Parser, Subcommand, ValueEnum};
use log::{Level, LevelFilter};
use owo_colors::{
    colors::{Blue, Green, Magenta, Red, Yellow},
    OwoColorize, Stream, Style,
};
use std::{
    io::Write,
    path::{Path, PathBuf},
};

pub const FULL_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "meflank",
          version = FULL_VERSION,
          about = "Mobile element insertion flank extension by targeted local assembly",
          long_about = None,
          disable_help_subcommand = true,
          help_template = "{name} {version}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}{after-help}",
          )]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
    /// Enable or disable color output in logging
    #[arg(long, value_enum, default_value_t = Color::Auto, global = true, help_heading = "Advanced")]
    color: Color,

    /// Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        global = true
    )]
    pub verbosity: u8,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Extend insertion flanks by local assembly of clipped and mate-rescued reads")]
    Extendflanks(ExtendFlanksArgs),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Extendflanks(_) => "extendflanks",
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(group(ArgGroup::new("extendflanks")))]
#[command(arg_required_else_help(true))]
pub struct ExtendFlanksArgs {
    /// TSV table of flanks with contig, pos, orient and consensus_seq columns
    #[arg(
        short = 'f',
        long = "flanks",
        value_name = "FLANKS",
        value_parser = check_file_exists,
        required = true
    )]
    pub flanks_path: PathBuf,

    /// Indexed BAM/CRAM with short-read alignments
    #[arg(short = 'r', long = "reads", value_name = "READS", required = true)]
    pub reads_src: InputSource,

    /// Output TSV path
    #[arg(
        short = 'o',
        long = "output",
        value_name = "OUTPUT",
        default_value = "meflank.extendflanks.tsv",
        value_parser = check_prefix_path
    )]
    pub output_path: PathBuf,

    /// Number of threads
    #[arg(
        short = 't',
        long = "threads",
        value_name = "THREADS",
        default_value = "1",
        value_parser = threads_in_range
    )]
    pub num_threads: usize,

    /// Reference FASTA used to decode CRAM input
    #[arg(
        long = "reference",
        value_name = "FASTA",
        value_parser = check_file_exists,
        help_heading = "Advanced IO"
    )]
    pub reference: Option<PathBuf>,

    /// Minimum mapping quality of soft-clipped reads
    #[arg(
        long = "min-mapq",
        value_name = "MAPQ",
        default_value = "20",
        help_heading = "Advanced"
    )]
    pub min_mapq: u8,

    /// Maximum distance between a read's clip site and the breakpoint
    #[arg(
        long = "clip-tolerance",
        value_name = "BASES",
        default_value = "2",
        help_heading = "Advanced"
    )]
    pub clip_tolerance: u32,

    /// Length of the window searched for reads with unmapped mates
    #[arg(
        long = "mate-search-len",
        value_name = "BASES",
        default_value = "500",
        help_heading = "Advanced"
    )]
    pub mate_search_len: u64,

    /// Assemble only the clipped bases of soft-clipped reads
    #[arg(long = "softclip-only", help_heading = "Advanced")]
    pub softclip_only: bool,

    /// Minimum identity of the flank alignment to an assembled contig
    #[arg(
        long = "min-identity",
        value_name = "FRAC",
        default_value = "0.95",
        value_parser = ensure_unit_float,
        help_heading = "Advanced"
    )]
    pub min_identity: f64,

    /// Scoring function to align flanks to contigs (non-negative values): MISM,GAPO,GAPE
    #[arg(
        long = "aln-scoring",
        value_name = "SCORING",
        default_value = "2,5,1",
        value_parser = scoring_from_string,
        help_heading = "Advanced"
    )]
    pub aln_scoring: AlnScoring,

    /// Path to the AMOS toAmos executable
    #[arg(
        long = "toamos",
        value_name = "PATH",
        default_value = "toAmos",
        help_heading = "Advanced IO"
    )]
    pub toamos: PathBuf,

    /// Path to the AMOS minimus executable
    #[arg(
        long = "minimus",
        value_name = "PATH",
        default_value = "minimus",
        help_heading = "Advanced IO"
    )]
    pub minimus: PathBuf,

    /// Seconds each assembler invocation may run before it is killed
    #[arg(
        long = "assembly-timeout",
        value_name = "SECONDS",
        default_value = "120",
        value_parser = timeout_in_range,
        help_heading = "Advanced IO"
    )]
    pub assembly_timeout: u64,

    /// Directory for assembly workspaces (default: system temp dir)
    #[arg(
        long = "tmp-dir",
        value_name = "DIR",
        value_parser = check_dir_exists,
        help_heading = "Advanced IO"
    )]
    pub tmp_dir: Option<PathBuf>,
}

impl ExtendFlanksArgs {
    pub fn preflight(&self) -> Result<()> {
        preflight_fields!(self, reads_src)
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Color {
    Always,
    Auto,
    Never,
}

impl Color {
    fn apply(self) {
        match self {
            Color::Always => owo_colors::set_override(true),
            Color::Auto => {}
            Color::Never => owo_colors::set_override(false),
        }
    }
}

pub fn init_verbose(args: &Cli) {
    args.color.apply();

    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::from_default_env()
        .format(format_log)
        .filter_level(filter_level)
        .init();
}

#[inline(always)]
fn level_style(level: Level) -> (&'static str, Style) {
    match level {
        Level::Error => ("ERROR", Style::new().fg::<Red>().bold()),
        Level::Warn => ("WARN", Style::new().fg::<Yellow>()),
        Level::Info => ("INFO", Style::new().fg::<Green>()),
        Level::Debug => ("DEBUG", Style::new().fg::<Blue>()),
        Level::Trace => ("TRACE", Style::new().fg::<Magenta>()),
    }
}

fn format_log(buf: &mut env_logger::fmt::Formatter, record: &log::Record) -> std::io::Result<()> {
    let (label, style) = level_style(record.level());
    let ts = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    let painted_label = label.if_supports_color(Stream::Stderr, |t| style.style(t));
    writeln!(buf, "{ts} [{}] - {}", painted_label, record.args())
}

fn check_prefix_path(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            return Err(format!("Path does not exist: {}", parent_dir.display()));
        }
    }
    Ok(PathBuf::from(s))
}

fn threads_in_range(s: &str) -> Result<usize> {
    let thread: usize = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid thread number", s))?;
    if thread >= 1 {
        Ok(thread)
    } else {
        Err("Number of threads must be at least 1".into())
    }
}

fn timeout_in_range(s: &str) -> Result<u64> {
    let secs: u64 = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid number of seconds", s))?;
    if secs >= 1 {
        Ok(secs)
    } else {
        Err("Assembly timeout must be at least 1 second".into())
    }
}

fn check_file_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.exists() {
        Err(format!("File does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn check_dir_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.is_dir() {
        Err(format!("Directory does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn ensure_unit_float(s: &str) -> Result<f64> {
    let value = s
        .parse::<f64>()
        .map_err(|e| format!("Could not parse float: {}", e))?;
    if !(0.0..=1.0).contains(&value) {
        Err(format!(
            "The value must be between 0.0 and 1.0, got: {}",
            value
        ))
    } else {
        Ok(value)
    }
}

fn scoring_from_string(s: &str) -> Result<AlnScoring> {
    const NUM_EXPECTED_VALUES: usize = 3;
    let values: Vec<i32> = s.split(',').filter_map(|x| x.parse().ok()).collect();
    if values.len() != NUM_EXPECTED_VALUES {
        return Err(format!(
            "Expected {} comma-separated values in scoring. Got {} -> {}",
            NUM_EXPECTED_VALUES,
            values.len(),
            s
        ));
    }

    if values.iter().any(|&val| val < 0) {
        return Err(format!(
            "Negative values are not allowed in scoring. Got {}.",
            s
        ));
    }

    Ok(AlnScoring {
        mism_scr: values[0],
        gapo_scr: values[1],
        gape_scr: values[2],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> std::result::Result<ExtendFlanksArgs, clap::Error> {
        let flanks = tempfile::NamedTempFile::new().unwrap();
        let reads = tempfile::NamedTempFile::new().unwrap();
        let mut argv = vec![
            "meflank".to_string(),
            "extendflanks".to_string(),
            "-f".to_string(),
            flanks.path().display().to_string(),
            "-r".to_string(),
            reads.path().display().to_string(),
        ];
        argv.extend(extra.iter().map(|s| s.to_string()));
        let cli = Cli::try_parse_from(argv)?;
        match cli.command {
            Command::Extendflanks(args) => Ok(args),
        }
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.output_path, PathBuf::from("meflank.extendflanks.tsv"));
        assert_eq!(args.num_threads, 1);
        assert_eq!(args.min_mapq, 20);
        assert_eq!(args.clip_tolerance, 2);
        assert_eq!(args.mate_search_len, 500);
        assert!(!args.softclip_only);
        assert_eq!(args.min_identity, 0.95);
        assert_eq!(args.aln_scoring, AlnScoring::default());
        assert_eq!(args.toamos, PathBuf::from("toAmos"));
        assert_eq!(args.minimus, PathBuf::from("minimus"));
        assert_eq!(args.assembly_timeout, 120);
        assert!(args.tmp_dir.is_none());
    }

    #[test]
    fn test_advanced_options() {
        let args = parse(&[
            "--clip-tolerance",
            "0",
            "--softclip-only",
            "--aln-scoring",
            "3,4,2",
            "-t",
            "4",
        ])
        .unwrap();
        assert_eq!(args.clip_tolerance, 0);
        assert!(args.softclip_only);
        assert_eq!(
            args.aln_scoring,
            AlnScoring {
                mism_scr: 3,
                gapo_scr: 4,
                gape_scr: 2
            }
        );
        assert_eq!(args.num_threads, 4);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(parse(&["--min-identity", "1.5"]).is_err());
        assert!(parse(&["-t", "0"]).is_err());
        assert!(parse(&["--aln-scoring", "2,-5,1"]).is_err());
        assert!(parse(&["--assembly-timeout", "0"]).is_err());
        assert!(parse(&["--tmp-dir", "/definitely/not/a/dir"]).is_err());
        assert!(parse(&["-o", "/definitely/not/a/dir/out.tsv"]).is_err());
    }

    #[test]
    fn test_scoring_from_string() {
        assert!(scoring_from_string("1,2").is_err());
        assert_eq!(scoring_from_string("2,5,1"), Ok(AlnScoring::default()));
    }
}
