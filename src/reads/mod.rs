mod read;
mod softclip;
#[cfg(test)]
pub mod test_utils;

pub use read::{get_mt_tag, AlignedRead};
