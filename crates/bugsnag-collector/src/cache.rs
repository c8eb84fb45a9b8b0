use std::{
    future::Future,
    sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use bugsnag_common::{
    error::{ExporterError, Result},
    time::{Clock, format_log_time},
};
use chrono::{DateTime, TimeDelta, Utc};
use futures::{
    FutureExt,
    future::{BoxFuture, Shared},
};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::metrics::MetricSnapshot;

type Refresh = Shared<BoxFuture<'static, Result<Arc<MetricSnapshot>>>>;

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub snapshot: Arc<MetricSnapshot>,
    pub updated_at: DateTime<Utc>,
}

/// Holds the last successful snapshot and runs at most one refresh at a time.
///
/// A refresh runs on its own task, so it completes and stores its result even
/// when every caller waiting on it has gone away.
#[derive(Clone)]
pub struct SnapshotCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    clock: Arc<dyn Clock>,
    entry: RwLock<Option<CacheEntry>>,
    in_flight: Mutex<Option<Refresh>>,
}

impl SnapshotCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                clock,
                entry: RwLock::new(None),
                in_flight: Mutex::new(None),
            }),
        }
    }

    pub fn current(&self) -> Result<Option<CacheEntry>> {
        Ok(self.inner.entry_read()?.clone())
    }

    /// Returns the cached snapshot while it is younger than `ttl`, otherwise
    /// starts `refresh` and waits for its outcome.
    ///
    /// Callers that miss while a refresh is running share that refresh, its
    /// error included. A failed refresh leaves the previous entry in place.
    pub async fn get_or_refresh<F, Fut>(
        &self,
        ttl: Duration,
        refresh: F,
    ) -> Result<Arc<MetricSnapshot>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<MetricSnapshot>> + Send + 'static,
    {
        let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);

        let running = {
            // Checked under the in-flight lock so a refresh finishing right now
            // is either seen in the entry or still joinable.
            let mut in_flight = self.inner.in_flight_lock()?;
            let now = self.inner.clock.now();
            if let Some(snapshot) = self.inner.fresh_snapshot(ttl, now)? {
                return Ok(snapshot);
            }

            match in_flight.as_ref() {
                Some(running) => running.clone(),
                None => {
                    let running = self.spawn_refresh(now, refresh());
                    *in_flight = Some(running.clone());
                    running
                }
            }
        };

        running.await
    }

    fn spawn_refresh<Fut>(&self, now: DateTime<Utc>, refresh: Fut) -> Refresh
    where
        Fut: Future<Output = Result<MetricSnapshot>> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            info!("retrieving data from Bugsnag API");
            let started_at = Instant::now();
            let outcome = refresh.await.map(Arc::new);
            inner.finish_refresh(now, &outcome, started_at.elapsed());
            outcome
        });

        let inner = Arc::clone(&self.inner);
        async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    // The task never reached finish_refresh.
                    inner.clear_in_flight();
                    Err(ExporterError::Internal(format!(
                        "snapshot refresh task failed: {err}"
                    )))
                }
            }
        }
        .boxed()
        .shared()
    }
}

impl CacheInner {
    fn finish_refresh(
        &self,
        now: DateTime<Utc>,
        outcome: &Result<Arc<MetricSnapshot>>,
        elapsed: Duration,
    ) {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        match outcome {
            Ok(snapshot) => match self.entry_write() {
                Ok(mut entry) => {
                    *entry = Some(CacheEntry {
                        snapshot: Arc::clone(snapshot),
                        updated_at: now,
                    });
                    info!(elapsed = ?elapsed, "stored fresh snapshot");
                }
                Err(err) => warn!(error = %err, "could not store fresh snapshot"),
            },
            Err(err) => {
                warn!(error = %err, kind = err.kind(), "scrape failed, keeping previous snapshot");
            }
        }

        *in_flight = None;
    }

    fn clear_in_flight(&self) {
        *self.in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }

    fn fresh_snapshot(
        &self,
        ttl: TimeDelta,
        now: DateTime<Utc>,
    ) -> Result<Option<Arc<MetricSnapshot>>> {
        let entry = self.entry_read()?;
        let Some(entry) = entry.as_ref() else {
            return Ok(None);
        };

        if now.signed_duration_since(entry.updated_at) > ttl {
            return Ok(None);
        }

        info!(
            "returning cached result from {}",
            format_log_time(&entry.updated_at)
        );
        Ok(Some(Arc::clone(&entry.snapshot)))
    }

    fn in_flight_lock(&self) -> Result<MutexGuard<'_, Option<Refresh>>> {
        self.in_flight
            .lock()
            .map_err(|_| ExporterError::Internal("snapshot refresh lock poisoned".to_string()))
    }

    fn entry_read(&self) -> Result<RwLockReadGuard<'_, Option<CacheEntry>>> {
        self.entry
            .read()
            .map_err(|_| ExporterError::Internal("snapshot cache lock poisoned".to_string()))
    }

    fn entry_write(&self) -> Result<RwLockWriteGuard<'_, Option<CacheEntry>>> {
        self.entry
            .write()
            .map_err(|_| ExporterError::Internal("snapshot cache lock poisoned".to_string()))
    }
}
