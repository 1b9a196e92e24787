//! Backup reconciliation between a local directory tree and a cloud drive.
//!
//! The pipeline: acquire a [`Snapshot`] of each side (from cache or a fresh
//! scan), [`reconcile`](core::reconcile) them into a
//! [`ComparisonResult`](core::ComparisonResult), and persist a
//! [`CheckReport`](core::CheckReport). The remote side is reached through
//! the [`drive::DriveClient`] trait, so anything with a Drive-shaped
//! paginated listing API plugs in.

pub mod config;
pub mod core;
pub mod drive;
pub mod error;
pub mod logging;
pub mod snapshot;

pub use config::{CheckConfig, Tunables};
pub use core::{reconcile, CheckEngine, CheckReport, ComparisonResult};
pub use error::{CheckError, Result};
pub use snapshot::{FileRecord, Snapshot, Source};
