pub mod loaders;
pub mod outcome;
pub mod summary;
pub mod target;

pub use loaders::{load_targets_from_path, parse_targets};
pub use outcome::{AnalysisOutcome, SeoAnalysis};
pub use summary::{GroupStats, RankedEntry, SummaryStats};
pub use target::AnalysisTarget;
