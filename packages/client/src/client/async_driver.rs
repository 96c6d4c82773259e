use std::sync::Arc;

use crate::consumer::ResponseConsumer;
use crate::executor::RequestExecutor;
use crate::http::RequestSpec;
use crate::progress::CancellationFlag;

use super::exchange::{ChannelSink, Exchange, ExchangeEvent};
use super::worker::WorkerPool;

/// Single slot for the in-flight exchange of one driver.
#[derive(Debug, Default)]
pub struct TaskHandle {
    current: Option<CancellationFlag>,
}

impl TaskHandle {
    /// Cancel and drop the previous exchange, then hold `next`.
    pub fn replace(&mut self, next: CancellationFlag) {
        if let Some(previous) = self.current.replace(next) {
            if !previous.is_cancelled() {
                tracing::debug!(target: "courier::worker", "Superseding in-flight exchange");
            }
            previous.cancel();
        }
    }

    pub fn cancel(&mut self) {
        if let Some(current) = self.current.take() {
            current.cancel();
        }
    }

    #[must_use]
    pub fn is_occupied(&self) -> bool {
        self.current.is_some()
    }
}

/// Runs exchanges on a worker pool, at most one in flight per driver.
#[derive(Debug)]
pub struct AsyncDriver {
    executor: Arc<RequestExecutor>,
    pool: Arc<WorkerPool>,
    slot: TaskHandle,
}

impl AsyncDriver {
    pub fn new() -> crate::Result<Self> {
        Ok(Self::with_pool(
            Arc::new(RequestExecutor::new()),
            Arc::new(WorkerPool::new()?),
        ))
    }

    #[must_use]
    pub fn with_pool(executor: Arc<RequestExecutor>, pool: Arc<WorkerPool>) -> Self {
        Self {
            executor,
            pool,
            slot: TaskHandle::default(),
        }
    }

    #[inline]
    pub fn executor(&self) -> &Arc<RequestExecutor> {
        &self.executor
    }

    /// Submit an exchange, cancelling the one in flight.
    pub fn execute<C>(&mut self, spec: RequestSpec, mut consumer: C) -> Exchange<C>
    where
        C: ResponseConsumer + Send + 'static,
    {
        let cancellation = CancellationFlag::new();
        self.slot.replace(cancellation.clone());

        let (events, receiver) = crossbeam_channel::unbounded::<ExchangeEvent<C>>();
        let executor = Arc::clone(&self.executor);
        let flag = cancellation.clone();
        self.pool.submit(move || {
            let sink = ChannelSink::new(events.clone());
            executor.execute(spec, &mut consumer, &flag, &sink);
            if events.send(ExchangeEvent::Finished(consumer)).is_err() {
                tracing::debug!(target: "courier::worker", "Exchange handle dropped before completion");
            }
        });

        Exchange::new(receiver, cancellation)
    }

    /// Cancel the in-flight exchange, if any.
    pub fn cancel(&mut self) {
        self.slot.cancel();
    }
}
