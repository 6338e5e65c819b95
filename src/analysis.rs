mod msd;

pub use msd::{time_averaged_msd, AnalysisError, MsdAnalyzer};
