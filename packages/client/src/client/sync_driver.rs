use std::sync::Arc;

use crate::consumer::ResponseConsumer;
use crate::executor::RequestExecutor;
use crate::http::RequestSpec;
use crate::progress::{CancellationFlag, DirectSink};

/// Runs exchanges on the caller's thread.
///
/// Progress callbacks, including the `..._processed` ones, are delivered inline and
/// `on_finish` runs before `execute` returns. Nothing is spawned.
#[derive(Debug, Clone, Default)]
pub struct SyncDriver {
    executor: Arc<RequestExecutor>,
}

impl SyncDriver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_executor(executor: Arc<RequestExecutor>) -> Self {
        Self { executor }
    }

    #[inline]
    pub fn executor(&self) -> &Arc<RequestExecutor> {
        &self.executor
    }

    /// Run one exchange and return the finished consumer.
    pub fn execute<C: ResponseConsumer>(&self, spec: RequestSpec, consumer: C) -> C {
        self.execute_cancellable(spec, consumer, &CancellationFlag::new())
    }

    /// Like [`execute`](Self::execute), observing `cancellation`, which another thread
    /// may set while this one is blocked.
    pub fn execute_cancellable<C: ResponseConsumer>(
        &self,
        spec: RequestSpec,
        mut consumer: C,
        cancellation: &CancellationFlag,
    ) -> C {
        self.executor
            .execute(spec, &mut consumer, cancellation, &DirectSink);
        consumer.on_finish();
        consumer
    }
}
