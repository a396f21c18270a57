//! Update Requests
//!
//! State updaters never touch the runtime directly: they are usually called
//! from host event handlers, but may also fire while the runtime is busy
//! rendering or committing. Instead they leave a request on a queue shared
//! with the runtime, which turns it into a render cycle at the start of the
//! next work-loop invocation.

use std::cell::RefCell;
use std::rc::Rc;

use crate::fiber::FiberId;

/// What a queued request wants re-rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderRequest {
    /// The subtree of a committed function fiber.
    Fiber(FiberId),
    /// The whole committed tree. Used by updaters whose hook has not been
    /// committed yet.
    Root,
}

/// Shared FIFO of render requests.
#[derive(Debug, Clone, Default)]
pub(crate) struct UpdateQueue {
    requests: Rc<RefCell<Vec<RenderRequest>>>,
}

impl UpdateQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, request: RenderRequest) {
        self.requests.borrow_mut().push(request);
    }

    pub(crate) fn take(&self) -> Vec<RenderRequest> {
        std::mem::take(&mut *self.requests.borrow_mut())
    }

    pub(crate) fn clear(&self) {
        self.requests.borrow_mut().clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.requests.borrow().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.requests.borrow().is_empty()
    }
}
