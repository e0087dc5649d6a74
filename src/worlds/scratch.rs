// Scratch space - per-operation temporary directories with guaranteed teardown

use crate::worlds::error::{io_context, WorldError};
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

static SCRATCH_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Hands out uniquely named directories below a common root
#[derive(Debug, Clone)]
pub struct ScratchSpace {
    root: PathBuf,
}

impl ScratchSpace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a fresh directory named `<millis>-<purpose>-<counter>-<random>`.
    /// The final `create_dir` is not recursive, so a name collision fails
    /// instead of two operations sharing a directory.
    pub async fn acquire(&self, purpose: &str) -> Result<ScratchDir, WorldError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(io_context("creating scratch root"))?;

        let name = format!(
            "{}-{}-{}-{}",
            chrono::Utc::now().timestamp_millis(),
            sanitize_purpose(purpose),
            SCRATCH_COUNTER.fetch_add(1, Ordering::Relaxed),
            &Uuid::new_v4().simple().to_string()[..8]
        );
        let path = self.root.join(name);

        tokio::fs::create_dir(&path)
            .await
            .map_err(io_context(format!("creating {} scratch directory", purpose)))?;

        tracing::debug!("Acquired scratch directory: {}", path.display());
        Ok(ScratchDir {
            state: Arc::new(ScratchState {
                path,
                lifecycle: Mutex::new(Lifecycle {
                    abandoned: false,
                    workers: 0,
                }),
            }),
            released: false,
        })
    }

    /// Run `work` inside a freshly acquired directory and release it afterwards,
    /// whatever `work` returned. An error from `work` always wins over a release failure.
    pub async fn scoped<T, F, Fut>(&self, purpose: &str, work: F) -> Result<T, WorldError>
    where
        F: FnOnce(ScratchHandle) -> Fut,
        Fut: Future<Output = Result<T, WorldError>>,
    {
        let scratch = self.acquire(purpose).await?;
        let result = work(scratch.handle()).await;
        scratch.release().await;
        result
    }
}

#[derive(Debug)]
struct Lifecycle {
    /// Set once the owner released or dropped the directory
    abandoned: bool,
    /// Blocking tasks that may still write below the directory
    workers: usize,
}

#[derive(Debug)]
struct ScratchState {
    path: PathBuf,
    lifecycle: Mutex<Lifecycle>,
}

impl ScratchState {
    fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove_blocking(&self) {
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => tracing::debug!("Removed scratch directory: {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                "Failed to remove scratch directory {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

/// An acquired scratch directory. Dropping it without `release` (for example
/// when the owning future is cancelled) still removes the tree, synchronously,
/// or as soon as the last registered blocking worker finishes.
#[derive(Debug)]
pub struct ScratchDir {
    state: Arc<ScratchState>,
    released: bool,
}

impl ScratchDir {
    pub fn path(&self) -> &Path {
        &self.state.path
    }

    pub fn handle(&self) -> ScratchHandle {
        ScratchHandle {
            state: Arc::clone(&self.state),
        }
    }

    /// Remove the directory tree. Failures are logged, never returned.
    /// With blocking workers still running, the last of them removes it.
    pub async fn release(mut self) {
        self.released = true;
        let workers = {
            let mut lifecycle = self.state.lock();
            lifecycle.abandoned = true;
            lifecycle.workers
        };
        if workers > 0 {
            tracing::debug!(
                "Deferring removal of {} to {} running workers",
                self.path().display(),
                workers
            );
            return;
        }

        match tokio::fs::remove_dir_all(self.path()).await {
            Ok(()) => tracing::debug!("Released scratch directory: {}", self.path().display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                "Failed to release scratch directory {}: {}",
                self.path().display(),
                e
            ),
        }
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let mut lifecycle = self.state.lock();
        lifecycle.abandoned = true;
        if lifecycle.workers == 0 {
            self.state.remove_blocking();
        } else {
            tracing::debug!(
                "Scratch directory {} dropped with {} running workers",
                self.state.path.display(),
                lifecycle.workers
            );
        }
    }
}

/// Cheap reference to a scratch directory handed to the code working in it
#[derive(Debug, Clone)]
pub struct ScratchHandle {
    state: Arc<ScratchState>,
}

impl ScratchHandle {
    pub fn path(&self) -> &Path {
        &self.state.path
    }

    pub fn join(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.state.path.join(relative)
    }

    /// Register a blocking task writing below this directory. The tree is not
    /// removed while the returned worker is alive.
    pub fn worker(&self) -> BlockingWorker {
        self.state.lock().workers += 1;
        BlockingWorker {
            state: Arc::clone(&self.state),
        }
    }
}

/// Registration of a blocking task inside a scratch directory. Move it into
/// the task; when it drops after the owner gave the directory up, the tree is removed.
#[derive(Debug)]
pub struct BlockingWorker {
    state: Arc<ScratchState>,
}

impl BlockingWorker {
    /// True once the owning operation finished or was cancelled. Workers stop early.
    pub fn is_cancelled(&self) -> bool {
        self.state.lock().abandoned
    }
}

impl Drop for BlockingWorker {
    fn drop(&mut self) {
        let mut lifecycle = self.state.lock();
        lifecycle.workers = lifecycle.workers.saturating_sub(1);
        if lifecycle.abandoned && lifecycle.workers == 0 {
            self.state.remove_blocking();
        }
    }
}

fn sanitize_purpose(purpose: &str) -> String {
    let cleaned: String = purpose
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .take(32)
        .collect();

    if cleaned.is_empty() {
        "op".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
#[path = "tests/scratch_tests.rs"]
mod tests;
