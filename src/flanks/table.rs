//! Reading and writing the tab-separated flank table.
//!
//! The output schema is the input column list with `consensus_seq` updated by
//! value and an `extended` column always placed last. An `extended` column
//! already present in the input is replaced rather than duplicated.
use super::{BreakpointSite, Orientation};
use crate::utils::Result;
use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

const CONTIG_COLUMN: &str = "contig";
const POS_COLUMN: &str = "pos";
const ORIENT_COLUMN: &str = "orient";
const CONSENSUS_COLUMN: &str = "consensus_seq";
pub const EXTENDED_COLUMN: &str = "extended";

/// One row of the flank table.
#[derive(Debug, Clone, PartialEq)]
pub struct FlankRecord {
    pub site: BreakpointSite,
    pub consensus_seq: Vec<u8>,
    pub extended: bool,
    /// All original fields in input column order.
    fields: Vec<String>,
    line_number: usize,
}

impl FlankRecord {
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// 1-based line of the row in the input table.
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

#[derive(Debug)]
pub struct FlankTable {
    columns: Vec<String>,
    consensus_idx: usize,
    extended_idx: Option<usize>,
    pub records: Vec<FlankRecord>,
}

fn column_index(columns: &[String], name: &str) -> Result<usize> {
    columns
        .iter()
        .position(|c| c == name)
        .ok_or_else(|| format!("Flank table is missing required column '{}'", name))
}

fn split_line(line: &str) -> Vec<&str> {
    line.trim_end_matches(['\n', '\r']).split('\t').collect()
}

impl FlankTable {
    pub fn parse<R: BufRead>(reader: R) -> Result<Self> {
        let mut lines = reader.lines().enumerate();

        let header = match lines.next() {
            Some((_, line)) => line.map_err(|e| format!("Error reading flank table header: {}", e))?,
            None => return Err("Flank table is empty: expected a header line".to_string()),
        };
        let columns: Vec<String> = split_line(&header).into_iter().map(str::to_string).collect();

        let contig_idx = column_index(&columns, CONTIG_COLUMN)?;
        let pos_idx = column_index(&columns, POS_COLUMN)?;
        let orient_idx = column_index(&columns, ORIENT_COLUMN)?;
        let consensus_idx = column_index(&columns, CONSENSUS_COLUMN)?;
        let extended_idx = columns.iter().position(|c| c == EXTENDED_COLUMN);

        let mut records = Vec::new();
        for (line_idx, line) in lines {
            let line_number = line_idx + 1;
            let line = line.map_err(|e| format!("Error reading line {}: {}", line_number, e))?;
            if line.trim().is_empty() {
                continue;
            }

            let fields = split_line(&line);
            if fields.len() != columns.len() {
                return Err(format!(
                    "Line {}: expected {} fields, found {}",
                    line_number,
                    columns.len(),
                    fields.len()
                ));
            }

            let contig = fields[contig_idx];
            if contig.is_empty() {
                return Err(format!("Line {}: empty contig name", line_number));
            }
            let pos: u64 = fields[pos_idx].parse().map_err(|_| {
                format!(
                    "Line {}: invalid position '{}': must be a non-negative integer",
                    line_number, fields[pos_idx]
                )
            })?;
            let orient: Orientation = fields[orient_idx]
                .parse()
                .map_err(|e| format!("Line {}: {}", line_number, e))?;

            records.push(FlankRecord {
                site: BreakpointSite::new(contig, pos, orient),
                consensus_seq: fields[consensus_idx].as_bytes().to_vec(),
                extended: false,
                fields: fields.into_iter().map(str::to_string).collect(),
                line_number,
            });
        }

        Ok(FlankTable {
            columns,
            consensus_idx,
            extended_idx,
            records,
        })
    }

    /// Output column names, `extended` last.
    pub fn output_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != self.extended_idx)
            .map(|(_, c)| c.as_str())
            .chain(std::iter::once(EXTENDED_COLUMN))
            .collect()
    }

    pub fn write<W: Write>(&self, mut writer: W) -> Result<()> {
        let to_err = |e: std::io::Error| format!("Error writing flank table: {}", e);

        writeln!(writer, "{}", self.output_columns().join("\t")).map_err(to_err)?;
        for record in &self.records {
            let consensus = String::from_utf8_lossy(&record.consensus_seq);
            let mut row: Vec<&str> = Vec::with_capacity(self.columns.len() + 1);
            for (i, field) in record.fields.iter().enumerate() {
                if Some(i) == self.extended_idx {
                    continue;
                }
                row.push(if i == self.consensus_idx {
                    consensus.as_ref()
                } else {
                    field
                });
            }
            row.push(if record.extended { "True" } else { "False" });
            writeln!(writer, "{}", row.join("\t")).map_err(to_err)?;
        }
        writer.flush().map_err(to_err)
    }

    pub fn num_extended(&self) -> usize {
        self.records.iter().filter(|r| r.extended).count()
    }
}

pub fn read_flank_table(path: &Path) -> Result<FlankTable> {
    let file = File::open(path)
        .map_err(|e| format!("Failed to open flank table {}: {}", path.display(), e))?;
    FlankTable::parse(BufReader::new(file))
        .map_err(|e| format!("Malformed flank table {}: {}", path.display(), e))
}

pub fn write_flank_table(path: &Path, table: &FlankTable) -> Result<()> {
    let file = File::create(path)
        .map_err(|e| format!("Failed to create output file {}: {}", path.display(), e))?;
    table.write(BufWriter::new(file))
}
