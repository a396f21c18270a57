//! Scheduling
//!
//! Contracts with the host's idle-time source and the queue that carries
//! state-update requests back to the runtime.

mod idle;
mod queue;

pub use idle::{FrameDeadline, FrameIdleSource, IdleDeadline, IdleFlag, IdleScheduler, Unbounded};
pub use queue::RenderRequest;
pub(crate) use queue::UpdateQueue;
