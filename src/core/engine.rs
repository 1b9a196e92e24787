//! Check pipeline.
//!
//! One run: consult the cache for each side, scan whatever is missing or
//! stale, reconcile the two snapshots, persist the report. The two
//! acquisitions have no data dependency and run concurrently; reconciliation
//! waits for both.

use crate::config::CheckConfig;
use crate::core::cache::SnapshotCache;
use crate::core::reconciler::reconcile;
use crate::core::remote::{RemoteRoot, RemoteScanner};
use crate::core::report::{write_report, CheckReport, ReportStats};
use crate::core::scanner::{LocalScanner, ScanFilter};
use crate::drive::DriveClient;
use crate::error::Result;
use crate::snapshot::{Snapshot, Source};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

pub struct CheckEngine {
    config: CheckConfig,
    client: Arc<dyn DriveClient>,
    cancelled: Arc<AtomicBool>,
}

impl CheckEngine {
    /// `client` is an already-authorized handle; credential acquisition
    /// happens outside the engine.
    pub fn new(config: CheckConfig, client: Arc<dyn DriveClient>) -> Self {
        Self {
            config,
            client,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared flag for wiring external interrupts (Ctrl-C) to the scanners.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub async fn run(&self) -> Result<CheckReport> {
        let started = Instant::now();
        let cache = SnapshotCache::new(self.config.cache_dir.clone());

        if self.config.clear_cache {
            cache.invalidate_all();
        }

        let (local, remote) = tokio::join!(
            self.acquire_local(&cache),
            self.acquire_remote(&cache)
        );
        let local = local?;
        let remote = remote?;

        let result = reconcile(&local, &remote);

        let mut warnings: Vec<String> = Vec::new();
        warnings.extend(local.warnings.iter().map(|w| format!("local: {w}")));
        warnings.extend(remote.warnings.iter().map(|w| format!("remote: {w}")));

        let report = CheckReport {
            generated_at: Utc::now(),
            local_root: local.root_identifier.clone(),
            remote_root: remote.root_identifier.clone(),
            duration_ms: started.elapsed().as_millis() as u64,
            statistics: ReportStats::from(&result),
            details: result,
            warnings,
        };

        write_report(&report, &self.config.output)?;

        info!(
            total_local = report.statistics.total_local,
            total_remote = report.statistics.total_remote,
            matching = report.statistics.in_both_matching,
            only_local = report.statistics.only_local,
            only_remote = report.statistics.only_remote,
            size_mismatch = report.statistics.size_mismatch,
            "check complete"
        );
        Ok(report)
    }

    async fn acquire_local(&self, cache: &SnapshotCache) -> Result<Snapshot> {
        let root_id = self.config.local_root.display().to_string();
        if let Some(snapshot) = self.usable_cached(cache, Source::Local, &root_id) {
            return Ok(snapshot);
        }

        let filter = ScanFilter::new(
            &self.config.tunables.ignore_dirs,
            &self.config.tunables.ignore_files,
        );
        let scanner = LocalScanner::new(filter).with_cancel(self.cancelled.clone());
        let snapshot = scanner.scan(&self.config.local_root).await?;

        // A failed store never fails the run; the snapshot is already in hand.
        if let Err(e) = cache.store(&snapshot) {
            warn!(error = %e, "failed to cache local snapshot");
        }
        Ok(snapshot)
    }

    async fn acquire_remote(&self, cache: &SnapshotCache) -> Result<Snapshot> {
        let root = RemoteRoot::from_folder(self.config.remote_folder.clone());
        if let Some(snapshot) = self.usable_cached(cache, Source::Remote, root.identifier()) {
            return Ok(snapshot);
        }

        let tunables = &self.config.tunables;
        let scanner = RemoteScanner::new(self.client.clone())
            .page_size(tunables.page_size)
            .max_retries(tunables.max_retries)
            .retry_base_delay_ms(tunables.retry_base_delay_ms)
            .max_in_flight(tunables.max_in_flight)
            .with_cancel(self.cancelled.clone());
        let snapshot = scanner.scan(&root).await?;

        if let Err(e) = cache.store(&snapshot) {
            warn!(error = %e, "failed to cache remote snapshot");
        }
        Ok(snapshot)
    }

    /// Applies the freshness policy to a cached snapshot: bypass flag first,
    /// then the configured age limit.
    fn usable_cached(
        &self,
        cache: &SnapshotCache,
        source: Source,
        root_identifier: &str,
    ) -> Option<Snapshot> {
        if self.config.bypass_cache {
            return None;
        }
        let snapshot = cache.load(source, root_identifier)?;

        let max_age = self.config.tunables.cache_max_age_secs;
        if max_age > 0 && snapshot.age_secs() > max_age {
            info!(source = %source, age_secs = snapshot.age_secs(), "cached snapshot too old, rescanning");
            return None;
        }
        Some(snapshot)
    }
}
