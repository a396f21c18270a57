//! Hooks
//!
//! Hooks let function components keep state and schedule side effects
//! across renders. They are positional: the n-th `use_state` call of a
//! render binds to the n-th state slot of the previous render of the same
//! fiber position, and likewise for `use_effect`.
//!
//! Hooks are only reachable through the [`Hooks`] context passed to a
//! render function, so they cannot be called outside a render.

mod context;
mod effect;
mod state;

pub use context::Hooks;
pub use effect::{Cleanup, Deps, EffectHook};
pub use state::{SetState, StateUpdate};

pub(crate) use state::{StateHook, StateSlot};
