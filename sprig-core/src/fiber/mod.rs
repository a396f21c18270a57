//! Fiber Tree
//!
//! The fiber tree is the persistent, double-buffered structure the runtime
//! works on. It mirrors the element tree position for position and carries
//! the hook state of function components between renders.
//!
//! # Two trees, one arena
//!
//! At any time there is at most one committed tree (what the host currently
//! shows) and at most one work-in-progress tree (what the next commit will
//! show). Each work-in-progress fiber that reuses a committed position links
//! to it through `alternate`; that link is how hooks find their previous
//! state and how commit finds the previous properties.
//!
//! Both trees live in one [`FiberArena`]. After a commit, everything not
//! reachable from the committed root is swept: the previous tree, deleted
//! subtrees and any abandoned work-in-progress tree alike.

mod arena;
mod node;

pub use arena::FiberArena;
pub use node::{Fiber, FiberId, FiberKind, HostTag, MutationTag};
