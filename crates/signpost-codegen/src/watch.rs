//! Development mode: rebuild the client whenever a handler file changes.
//!
//! Rebuilds run on a single worker. A change that arrives while a pass is
//! running queues one follow-up pass; further changes before that pass starts
//! fold into it. The generated file therefore always reflects one complete
//! discovery snapshot.

use signpost_config::FileWatcher;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

use crate::build::{build, BuildOptions};
use crate::discover::HANDLER_FILE;
use crate::error::CodegenError;

/// Serializes passes through one worker task.
#[derive(Debug)]
pub struct PassQueue {
    tx: mpsc::Sender<()>,
    worker: JoinHandle<()>,
}

impl PassQueue {
    /// Spawns the worker. `pass` runs on the blocking pool.
    ///
    /// A pass that panics is logged and the worker keeps serving requests.
    pub fn spawn<F>(pass: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let (tx, mut rx) = mpsc::channel::<()>(1);
        let worker = tokio::spawn(async move {
            let mut pass = Some(pass);
            while rx.recv().await.is_some() {
                let Some(mut run) = pass.take() else {
                    break;
                };
                match tokio::task::spawn_blocking(move || {
                    let completed = panic::catch_unwind(AssertUnwindSafe(&mut run)).is_ok();
                    (run, completed)
                })
                .await
                {
                    Ok((run, completed)) => {
                        if !completed {
                            tracing::error!("regeneration pass panicked; waiting for the next change");
                        }
                        pass = Some(run);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "regeneration worker failed");
                        break;
                    }
                }
            }
        });
        Self { tx, worker }
    }

    /// Requests a pass. Returns false if one is already queued.
    pub fn request(&self) -> bool {
        match self.tx.try_send(()) {
            Ok(()) => true,
            Err(TrySendError::Full(())) => {
                tracing::debug!("regeneration already queued");
                false
            }
            Err(TrySendError::Closed(())) => {
                tracing::warn!("regeneration worker stopped; change ignored");
                false
            }
        }
    }

    /// Runs any queued pass, then stops the worker.
    pub async fn close(self) {
        drop(self.tx);
        if let Err(e) = self.worker.await {
            tracing::error!(error = %e, "regeneration worker failed");
        }
    }
}

/// Builds once, then rebuilds on every handler file change.
///
/// Runs until the file watcher stops.
///
/// # Errors
///
/// Returns the first build's error, or an error if the app directories
/// cannot be watched.
pub async fn dev(options: BuildOptions) -> Result<(), CodegenError> {
    let first = options.clone();
    tokio::task::spawn_blocking(move || build(&first))
        .await
        .map_err(|e| CodegenError::io(&options.root, std::io::Error::other(e)))??;

    let mut watcher = FileWatcher::new()
        .with_debounce(Duration::from_millis(100))
        .watch_path_optional(options.root.join("app"))
        .watch_path_optional(options.root.join("src").join("app"))
        .recursive(true)
        .watch_file_names(&[HANDLER_FILE])
        .build()?;

    tracing::info!(root = %options.root.display(), "watching for route changes");

    let queue = PassQueue::spawn(move || {
        if let Err(e) = build(&options) {
            tracing::error!(error = %e, "regeneration failed");
        }
    });

    while let Some(event) = watcher.next().await {
        tracing::info!(path = %event.path.display(), kind = ?event.kind, "detected route change");
        queue.request();
    }

    queue.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_events_during_a_pass_coalesce() {
        let started = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&started);
        let queue = PassQueue::spawn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(200));
        });

        assert!(queue.request());
        while started.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        let accepted = (0..5).filter(|_| queue.request()).count();
        assert_eq!(accepted, 1);

        queue.close().await;
        assert_eq!(started.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_separate_requests_each_run() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let queue = PassQueue::spawn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        for expected in 1..=3 {
            assert!(queue.request());
            while runs.load(Ordering::SeqCst) < expected {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        }

        queue.close().await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_worker_survives_a_panicking_pass() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let queue = PassQueue::spawn(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("first pass fails");
            }
        });

        assert!(queue.request());
        while attempts.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        assert!(queue.request());

        queue.close().await;
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_dev_fails_on_invalid_base_url() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("app")).unwrap();
        std::fs::write(dir.path().join("app").join("route.rs"), "pub fn GET() {}").unwrap();

        let options = BuildOptions::new(dir.path()).with_base_url("not a url");
        assert!(matches!(
            dev(options).await,
            Err(CodegenError::BaseUrlInvalid)
        ));
    }
}
