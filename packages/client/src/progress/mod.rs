//! Progress and cancellation channel
//!
//! Upload and download loops feed one [`TransferChannel`]; the channel consults the
//! exchange's [`CancellationFlag`] and forwards [`ProgressPacket`]s through a
//! [`TransferSink`] strategy chosen by the driver.

pub mod cancellation;
pub mod channel;
pub mod packet;

pub use cancellation::CancellationFlag;
pub use channel::{DirectSink, ProgressListener, TransferChannel, TransferSink};
pub use packet::ProgressPacket;

/// Fixed chunk size for body reads and writes.
pub const BUFFER_SIZE: usize = 8 * 1024;
