//! Execution drivers
//!
//! Two thin strategies over one [`RequestExecutor`](crate::executor::RequestExecutor):
//! [`SyncDriver`] runs the exchange on the calling thread, [`AsyncDriver`] submits it
//! to a [`WorkerPool`] and hands back an [`Exchange`] whose events are consumed on the
//! owning thread.

mod async_driver;
mod exchange;
mod sync_driver;
mod worker;

pub use async_driver::{AsyncDriver, TaskHandle};
pub use exchange::{ChannelSink, Exchange, ExchangeEvent};
pub use sync_driver::SyncDriver;
pub use worker::WorkerPool;
