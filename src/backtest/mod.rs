pub mod outcome;
pub mod report;
pub mod runner;
pub mod synthetic;

pub use outcome::{BacktestOutcome, Rejection};
pub use report::{FileReportSink, MemoryReportSink, ZoneReport, ZoneReportSink};
pub use runner::{BacktestEngine, STRATEGY_TAG};
pub use synthetic::{MarketScenario, SyntheticDataGenerator};
