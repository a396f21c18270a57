//! State Hooks
//!
//! A state hook is a slot holding one value plus the updates queued against
//! it since the owning component last rendered. The slot object persists
//! across renders of the same position: each render of the component picks
//! up the slot at the same call index, folds the queued updates into the
//! value in enqueue order, and clears the queue.
//!
//! The [`SetState`] handle returned to the component enqueues an update and
//! asks the runtime to re-render the component's subtree.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::fiber::FiberId;
use crate::scheduler::{RenderRequest, UpdateQueue};

/// One pending state transition.
pub enum StateUpdate<T> {
    /// Replace the value.
    Replace(T),
    /// Compute the next value from the previous one.
    Apply(Box<dyn FnOnce(&T) -> T>),
}

/// Type-erased view of a state slot, as stored on a fiber.
pub(crate) trait StateSlot {
    /// Record the committed fiber that currently renders this slot.
    fn bind(&self, owner: FiberId);

    fn pending(&self) -> usize;

    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
}

/// A state hook stored on a fiber.
pub(crate) type StateHook = Rc<dyn StateSlot>;

pub(crate) struct StateCell<T> {
    state: RefCell<T>,
    pending: RefCell<Vec<StateUpdate<T>>>,
    owner: Cell<Option<FiberId>>,
}

impl<T: 'static> StateCell<T> {
    pub(crate) fn new(initial: T) -> Self {
        Self {
            state: RefCell::new(initial),
            pending: RefCell::new(Vec::new()),
            owner: Cell::new(None),
        }
    }

    /// Fold the queued updates into the value, in enqueue order.
    pub(crate) fn resolve(&self) {
        let updates = std::mem::take(&mut *self.pending.borrow_mut());
        if updates.is_empty() {
            return;
        }
        let mut state = self.state.borrow_mut();
        for update in updates {
            let next = match update {
                StateUpdate::Replace(value) => value,
                StateUpdate::Apply(transition) => transition(&*state),
            };
            *state = next;
        }
    }

    pub(crate) fn enqueue(&self, update: StateUpdate<T>) {
        self.pending.borrow_mut().push(update);
    }
}

impl<T: Clone> StateCell<T> {
    pub(crate) fn get(&self) -> T {
        self.state.borrow().clone()
    }
}

impl<T: 'static> StateSlot for StateCell<T> {
    fn bind(&self, owner: FiberId) {
        self.owner.set(Some(owner));
    }

    fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

/// Updater for one state hook.
pub struct SetState<T> {
    cell: Rc<StateCell<T>>,
    requests: UpdateQueue,
}

impl<T: 'static> SetState<T> {
    pub(crate) fn new(cell: Rc<StateCell<T>>, requests: UpdateQueue) -> Self {
        Self { cell, requests }
    }

    /// Queue a replacement value.
    pub fn set(&self, value: T) {
        self.dispatch(StateUpdate::Replace(value));
    }

    /// Queue a transition from the previous value.
    pub fn update(&self, transition: impl FnOnce(&T) -> T + 'static) {
        self.dispatch(StateUpdate::Apply(Box::new(transition)));
    }

    /// Queue an update and request a re-render of the owning component.
    pub fn dispatch(&self, update: StateUpdate<T>) {
        self.cell.enqueue(update);
        let request = match self.cell.owner.get() {
            Some(owner) => RenderRequest::Fiber(owner),
            None => RenderRequest::Root,
        };
        self.requests.push(request);
    }

    /// Number of updates queued and not yet folded by a render.
    pub fn pending(&self) -> usize {
        self.cell.pending.borrow().len()
    }
}

impl<T> Clone for SetState<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
            requests: self.requests.clone(),
        }
    }
}

impl<T> fmt::Debug for SetState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetState")
            .field("owner", &self.cell.owner.get())
            .field("pending", &self.cell.pending.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn updates_fold_in_enqueue_order() {
        let cell = StateCell::new(1);
        cell.enqueue(StateUpdate::Apply(Box::new(|n| n * 10)));
        cell.enqueue(StateUpdate::Replace(5));
        cell.enqueue(StateUpdate::Apply(Box::new(|n| n + 1)));
        assert_eq!(cell.pending(), 3);

        cell.resolve();
        assert_eq!(cell.get(), 6);
        assert_eq!(cell.pending(), 0);
    }

    #[test]
    fn unbound_updater_requests_root_render() {
        let queue = UpdateQueue::new();
        let set = SetState::new(Rc::new(StateCell::new(0)), queue.clone());
        set.update(|n| n + 1);
        assert_eq!(set.pending(), 1);
        assert_eq!(queue.take(), vec![RenderRequest::Root]);
    }

    #[test]
    fn bound_updater_targets_owner() {
        let mut ids = slotmap::SlotMap::<FiberId, ()>::with_key();
        let owner = ids.insert(());
        let queue = UpdateQueue::new();
        let cell = Rc::new(StateCell::new(0));
        cell.bind(owner);

        SetState::new(Rc::clone(&cell), queue.clone()).set(3);
        assert_eq!(queue.take(), vec![RenderRequest::Fiber(owner)]);
    }
}
