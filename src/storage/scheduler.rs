//! Background Snapshot Scheduler
//!
//! A Tokio task that writes a snapshot of the engine every `interval`.
//! Failures are logged and the next tick tries again; a failed save never
//! takes the server down.
//!
//! ## Design
//!
//! 1. Sleep for the configured interval (or stop on shutdown)
//! 2. Encode and write the snapshot on the blocking pool
//! 3. Log the outcome
//!
//! Dropping the returned handle stops the task.

use crate::storage::StorageEngine;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info};

/// A handle to the running snapshot scheduler.
#[derive(Debug)]
pub struct SnapshotScheduler {
    shutdown_tx: watch::Sender<bool>,
}

impl SnapshotScheduler {
    /// Starts periodic snapshots of `engine` into `path`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use cinderkv::storage::{SnapshotScheduler, StorageEngine};
    /// use std::sync::Arc;
    /// use std::time::Duration;
    ///
    /// let engine = Arc::new(StorageEngine::new());
    /// let scheduler = SnapshotScheduler::start(engine, "cinderkv.snap".into(), Duration::from_secs(60));
    ///
    /// // Dropping the handle stops the task
    /// drop(scheduler);
    /// ```
    pub fn start(engine: Arc<StorageEngine>, path: PathBuf, interval: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        info!(
            path = %path.display(),
            interval_secs = interval.as_secs(),
            "Snapshot scheduler started"
        );

        tokio::spawn(scheduler_loop(engine, path, interval, shutdown_rx));

        Self { shutdown_tx }
    }

    /// Stops the scheduler. Called automatically on drop.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
        debug!("Snapshot scheduler stopped");
    }
}

impl Drop for SnapshotScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn scheduler_loop(
    engine: Arc<StorageEngine>,
    path: PathBuf,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Snapshot scheduler received shutdown signal");
                    return;
                }
            }
        }

        let engine = Arc::clone(&engine);
        let target = path.clone();
        let outcome = tokio::task::spawn_blocking(move || engine.snapshot(&target)).await;

        match outcome {
            Ok(Ok(())) => debug!(path = %path.display(), "Periodic snapshot saved"),
            Ok(Err(e)) => error!(path = %path.display(), error = %e, "Periodic snapshot failed"),
            Err(e) => error!(error = %e, "Snapshot task panicked"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{snapshot, KeyspaceOps};

    #[tokio::test]
    async fn test_scheduler_writes_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.snap");

        let engine = Arc::new(StorageEngine::new());
        let mut db = engine.as_ref();
        db.set("name", "Ariz");

        let _scheduler =
            SnapshotScheduler::start(Arc::clone(&engine), path.clone(), Duration::from_millis(20));

        tokio::time::sleep(Duration::from_millis(200)).await;

        let mut restored = snapshot::load(&path).unwrap();
        assert_eq!(restored.get("name"), Some("Ariz".to_string()));
    }

    #[tokio::test]
    async fn test_scheduler_stops_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.snap");
        let engine = Arc::new(StorageEngine::new());

        {
            let _scheduler = SnapshotScheduler::start(
                Arc::clone(&engine),
                path.clone(),
                Duration::from_millis(10),
            );
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        // Give any in-flight save time to land, then clear it
        tokio::time::sleep(Duration::from_millis(50)).await;
        let _ = std::fs::remove_file(&path);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_scheduler_survives_write_failures() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the snapshot file should be makes every rename fail
        let path = dir.path().join("occupied");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), b"x").unwrap();

        let engine = Arc::new(StorageEngine::new());
        let scheduler =
            SnapshotScheduler::start(Arc::clone(&engine), path.clone(), Duration::from_millis(10));

        tokio::time::sleep(Duration::from_millis(60)).await;
        drop(scheduler);

        assert!(path.is_dir());
    }
}
