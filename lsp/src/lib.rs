pub mod analyzer;
pub mod server;

pub use analyzer::{AnalyzerOptions, CrystalAnalyzer, DocumentSnapshot};
