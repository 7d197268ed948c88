use crate::utils::Result;
use std::{fmt, str::FromStr};

/// Side of the breakpoint the inserted sequence lies on, relative to the flank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Left,
    Right,
}

impl Orientation {
    /// Strand of mapped reads whose unmapped mate points into the insertion.
    pub fn expects_reverse_strand(self) -> bool {
        matches!(self, Orientation::Left)
    }
}

impl FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "L" => Ok(Orientation::Left),
            "R" => Ok(Orientation::Right),
            _ => Err(format!("Invalid orientation '{}': expected 'L' or 'R'", s)),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Left => write!(f, "L"),
            Orientation::Right => write!(f, "R"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakpointSite {
    pub contig: String,
    /// 0-based reference position
    pub pos: u64,
    pub orient: Orientation,
}

impl BreakpointSite {
    pub fn new(contig: impl Into<String>, pos: u64, orient: Orientation) -> Self {
        Self {
            contig: contig.into(),
            pos,
            orient,
        }
    }
}

impl fmt::Display for BreakpointSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.contig, self.pos, self.orient)
    }
}
