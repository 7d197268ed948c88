mod site;
mod table;

pub use site::{BreakpointSite, Orientation};
pub use table::{read_flank_table, write_flank_table, FlankRecord, FlankTable};
