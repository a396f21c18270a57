//! Hook Context
//!
//! A [`Hooks`] value is created for every render of a function component
//! and handed to its render function. It tracks the next state slot and the
//! next effect slot explicitly, so hook identity is the call position
//! within one render and nothing else.
//!
//! Components must call the same hooks in the same order on every render.
//! When they do not, the slot at a given position may hold a value of
//! another type; the runtime then logs a warning and starts that slot over
//! from its initial value.

use std::rc::Rc;

use tracing::warn;

use super::effect::{Cleanup, EffectHook};
use super::state::{SetState, StateCell, StateHook, StateSlot};
use crate::element::PropValue;
use crate::fiber::FiberId;
use crate::scheduler::UpdateQueue;

/// Per-render hook context for one function fiber.
pub struct Hooks {
    fiber: FiberId,
    previous: Vec<StateHook>,
    state: Vec<StateHook>,
    effects: Vec<EffectHook>,
    requests: UpdateQueue,
}

impl Hooks {
    /// `previous` holds the state hooks of the alternate fiber, if any.
    pub(crate) fn new(fiber: FiberId, previous: Vec<StateHook>, requests: UpdateQueue) -> Self {
        Self {
            fiber,
            previous,
            state: Vec::new(),
            effects: Vec::new(),
            requests,
        }
    }

    /// The fiber being rendered.
    pub fn fiber(&self) -> FiberId {
        self.fiber
    }

    /// Call index the next `use_state` will occupy.
    pub fn next_state_slot(&self) -> usize {
        self.state.len()
    }

    /// Call index the next `use_effect` will occupy.
    pub fn next_effect_slot(&self) -> usize {
        self.effects.len()
    }

    /// Declare a piece of state.
    ///
    /// On first render the slot starts at `init()`. On later renders the
    /// slot at the same call index is reused and any updates queued through
    /// its [`SetState`] are folded in before the value is returned.
    pub fn use_state<T>(&mut self, init: impl FnOnce() -> T) -> (T, SetState<T>)
    where
        T: Clone + 'static,
    {
        let slot = self.state.len();
        let cell = match self.previous.get(slot).cloned() {
            Some(previous) => match previous.into_any().downcast::<StateCell<T>>() {
                Ok(cell) => cell,
                Err(_) => {
                    warn!(fiber = ?self.fiber, slot, "state hook changed type between renders");
                    Rc::new(StateCell::new(init()))
                }
            },
            None => Rc::new(StateCell::new(init())),
        };

        cell.resolve();
        let value = cell.get();
        let erased: Rc<dyn StateSlot> = cell.clone();
        self.state.push(erased);

        (value, SetState::new(cell, self.requests.clone()))
    }

    /// Register an effect to run after commit. See [`super::effect`] for the
    /// meaning of `deps`.
    pub fn use_effect<F>(&mut self, effect: F, deps: Option<&[PropValue]>)
    where
        F: FnOnce() -> Option<Cleanup> + 'static,
    {
        self.effects.push(EffectHook::new(effect, deps));
    }

    pub(crate) fn finish(self) -> (Vec<StateHook>, Vec<EffectHook>) {
        (self.state, self.effects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fiber_id() -> FiberId {
        let mut ids = slotmap::SlotMap::<FiberId, ()>::with_key();
        ids.insert(())
    }

    #[test]
    fn first_render_uses_initial_values() {
        let mut hooks = Hooks::new(fiber_id(), Vec::new(), UpdateQueue::new());
        let (count, _) = hooks.use_state(|| 3);
        let (name, _) = hooks.use_state(|| String::from("x"));
        assert_eq!(count, 3);
        assert_eq!(name, "x");
        assert_eq!(hooks.next_state_slot(), 2);
    }

    #[test]
    fn slots_carry_over_by_position() {
        let queue = UpdateQueue::new();
        let mut first = Hooks::new(fiber_id(), Vec::new(), queue.clone());
        let (_, set_count) = first.use_state(|| 0);
        let (_, set_label) = first.use_state(|| "a");
        let (state, _) = first.finish();

        set_count.update(|n| n + 1);
        set_count.update(|n| n * 5);
        set_label.set("b");

        let mut second = Hooks::new(fiber_id(), state, queue);
        let (count, _) = second.use_state(|| 100);
        let (label, _) = second.use_state(|| "z");
        assert_eq!(count, 5);
        assert_eq!(label, "b");
        assert_eq!(set_count.pending(), 0);
    }

    #[test]
    fn mismatched_slot_type_restarts_slot() {
        let mut first = Hooks::new(fiber_id(), Vec::new(), UpdateQueue::new());
        first.use_state(|| 1u8);
        let (state, _) = first.finish();

        let mut second = Hooks::new(fiber_id(), state, UpdateQueue::new());
        let (value, _) = second.use_state(|| String::from("fresh"));
        assert_eq!(value, "fresh");
    }

    #[test]
    fn effects_are_recorded_not_run() {
        let mut hooks = Hooks::new(fiber_id(), Vec::new(), UpdateQueue::new());
        hooks.use_effect(|| panic!("must not run during render"), Some(&[]));
        assert_eq!(hooks.next_effect_slot(), 1);
        let (_, effects) = hooks.finish();
        assert_eq!(effects[0].deps(), Some(&[][..]));
    }
}
