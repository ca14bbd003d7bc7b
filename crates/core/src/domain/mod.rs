// Domain Layer - Pure business entities (funds, NAV history, benchmark, reports)

pub mod benchmark;
pub mod error;
pub mod fund;
pub mod nav;
pub mod report;

// Re-exports
pub use benchmark::{BenchmarkPoint, BenchmarkSeries};
pub use error::DomainError;
pub use fund::{Fund, FundCatalog, SchemeCode};
pub use nav::{NavHistory, NavPoint};
pub use report::{
    AnalysisRow, ComparisonPoint, FundAnalysis, FundSummary, RefreshFailure, RefreshReport,
};
