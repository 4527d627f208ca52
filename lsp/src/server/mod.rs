mod analysis;
mod cli;
mod config;
mod entry;
mod handlers;
mod state;
mod text;

pub use cli::{analyze_file, is_safe_path};
pub use entry::run;
