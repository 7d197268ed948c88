pub mod assembly;
pub mod cli;
pub mod commands;
pub mod extend;
pub mod flanks;
pub mod reads;
pub mod store;
pub mod utils;
