use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::consumer::ResponseConsumer;
use crate::error;
use crate::progress::{CancellationFlag, ProgressListener, ProgressPacket, TransferSink, channel};

/// Message from a worker to the thread that owns an [`Exchange`].
#[derive(Debug)]
pub enum ExchangeEvent<C> {
    UploadProgress(ProgressPacket),
    DownloadProgress(ProgressPacket),
    /// The executor returned; carries the consumer after `before_finish`.
    Finished(C),
}

/// Forwards progress packets to the owning thread instead of calling the listener.
pub struct ChannelSink<C> {
    events: Sender<ExchangeEvent<C>>,
}

impl<C> ChannelSink<C> {
    pub fn new(events: Sender<ExchangeEvent<C>>) -> Self {
        Self { events }
    }
}

impl<C> TransferSink for ChannelSink<C> {
    fn deliver(&self, _listener: &mut dyn ProgressListener, packet: ProgressPacket) {
        let event = if packet.is_download {
            ExchangeEvent::DownloadProgress(packet)
        } else {
            ExchangeEvent::UploadProgress(packet)
        };
        if self.events.send(event).is_err() {
            tracing::trace!(target: "courier::worker", "Exchange handle dropped; progress discarded");
        }
    }
}

/// Owner-side handle of an exchange running on a worker.
///
/// `..._processed` callbacks are delivered to the listener passed to
/// [`pump`](Self::pump) or [`wait`](Self::wait), in emission order, on the calling
/// thread. `on_finish` runs on that thread too.
pub struct Exchange<C> {
    events: Receiver<ExchangeEvent<C>>,
    cancellation: CancellationFlag,
}

impl<C: ResponseConsumer> Exchange<C> {
    pub(crate) fn new(events: Receiver<ExchangeEvent<C>>, cancellation: CancellationFlag) -> Self {
        Self {
            events,
            cancellation,
        }
    }

    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Deliver the events queued so far without blocking.
    ///
    /// Returns the finished consumer once the exchange is complete.
    pub fn pump(&mut self, listener: &mut dyn ProgressListener) -> crate::Result<Option<C>> {
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    if let Some(consumer) = handle(event, listener) {
                        return Ok(Some(consumer));
                    }
                }
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Disconnected) => return Err(error::worker_lost()),
            }
        }
    }

    /// Block until the exchange finishes, delivering events as they arrive.
    pub fn wait(self, listener: &mut dyn ProgressListener) -> crate::Result<C> {
        loop {
            let event = self.events.recv().map_err(|_| error::worker_lost())?;
            if let Some(consumer) = handle(event, listener) {
                return Ok(consumer);
            }
        }
    }
}

fn handle<C: ResponseConsumer>(
    event: ExchangeEvent<C>,
    listener: &mut dyn ProgressListener,
) -> Option<C> {
    match event {
        ExchangeEvent::UploadProgress(packet) | ExchangeEvent::DownloadProgress(packet) => {
            channel::dispatch(listener, packet);
            None
        }
        ExchangeEvent::Finished(mut consumer) => {
            consumer.on_finish();
            Some(consumer)
        }
    }
}
