pub mod cache;
pub mod engine;
pub mod reconciler;
pub mod remote;
pub mod report;
pub mod scanner;

pub use cache::SnapshotCache;
pub use engine::CheckEngine;
pub use reconciler::{reconcile, ComparisonResult, SizeMismatch};
pub use remote::{RemoteRoot, RemoteScanner};
pub use report::{read_report, write_report, CheckReport, ReportStats};
pub use scanner::{LocalScanner, ScanFilter};
