pub mod align;
pub mod input_source;
mod region;

pub use align::{AlnScoring, FlankAligner, FlankHit, SemiglobalAligner};
pub use input_source::{InputSource, Remote};
pub use region::GenomicRegion;

pub type Result<T> = std::result::Result<T, String>;

pub fn handle_error_and_exit(err: String) -> ! {
    log::error!("{}", err);
    std::process::exit(1);
}
