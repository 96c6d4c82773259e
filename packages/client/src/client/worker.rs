use tokio::runtime::{Builder, Runtime};

use crate::error;

const DEFAULT_WORKER_THREADS: usize = 2;

/// Background threads that run executor jobs for [`AsyncDriver`](super::AsyncDriver)s.
///
/// Jobs go to the runtime's blocking pool, since the executor blocks its thread for
/// the whole exchange. At most `threads` jobs run at once; the rest queue. Share
/// one pool between drivers with `Arc`.
pub struct WorkerPool {
    runtime: Runtime,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool").finish_non_exhaustive()
    }
}

impl WorkerPool {
    pub fn new() -> crate::Result<Self> {
        Self::with_threads(DEFAULT_WORKER_THREADS)
    }

    pub fn with_threads(threads: usize) -> crate::Result<Self> {
        let threads = threads.max(1);
        let runtime = Builder::new_multi_thread()
            .worker_threads(threads)
            .max_blocking_threads(threads)
            .thread_name("courier-worker")
            .enable_all()
            .build()
            .map_err(error::builder)?;
        tracing::debug!(target: "courier::worker", threads, "Worker pool started");
        Ok(Self { runtime })
    }

    pub(crate) fn submit<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        drop(self.runtime.spawn_blocking(job));
    }
}
