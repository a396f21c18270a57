//! Sprig Core
//!
//! This crate provides the reconciliation runtime behind Sprig. Given a
//! declarative description of a UI tree, it works out the mutations that
//! turn the previously rendered host tree into the new one and applies them
//! without blocking the host's frame loop. It implements:
//!
//! - An immutable element model
//! - A double-buffered fiber tree kept in a slot arena
//! - A cooperative, time-sliced work loop
//! - Positional (unkeyed) reconciliation
//! - State and effect hooks keyed by call position
//! - An uninterruptible commit phase
//!
//! The host tree itself (a DOM, a terminal, a widget toolkit) is reached
//! only through the [`HostAdapter`] trait, and idle time only through the
//! [`IdleDeadline`] and [`IdleScheduler`] traits.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `element`: Elements, properties and function components
//! - `fiber`: Fiber nodes and the arena holding both fiber trees
//! - `hooks`: The per-render hook context, state slots and effects
//! - `host`: The host adapter contract and an in-memory host
//! - `scheduler`: Idle-time sources and the update-request queue
//! - `runtime`: Render cycles, the work loop, reconciliation and commit
//!
//! # Example
//!
//! ```rust
//! use sprig_core::{Element, Hooks, MemoryHost, Props, Runtime};
//!
//! fn counter(hooks: &mut Hooks, _: &Props) -> Element {
//!     let (count, set_count) = hooks.use_state(|| 0);
//!     Element::host("button")
//!         .on("click", move || set_count.update(|n| n + 1))
//!         .child(count.to_string())
//! }
//!
//! let mut host = MemoryHost::new();
//! let mount = host.create_root("app");
//! let mut runtime = Runtime::new(host);
//!
//! runtime.render(Element::component("Counter", counter), mount);
//! runtime.flush().unwrap();
//!
//! let button = runtime.host().find(mount, "button").unwrap();
//! runtime.host().dispatch(button, "click");
//! runtime.flush().unwrap();
//!
//! assert_eq!(runtime.host().text_content(mount), "1");
//! ```

pub mod config;
pub mod element;
pub mod error;
pub mod fiber;
pub mod hooks;
pub mod host;
pub mod runtime;
pub mod scheduler;

pub use config::RuntimeConfig;
pub use element::{Component, ComponentFn, Element, ElementKind, EventHandler, PropValue, Props};
pub use error::{Error, HostError, Phase, Result};
pub use fiber::{FiberId, MutationTag};
pub use hooks::{Cleanup, Hooks, SetState, StateUpdate};
pub use host::{HostAdapter, HostOp, MemoryHost, NodeId};
pub use runtime::{CommitSummary, Runtime, RuntimeStats, WorkStatus};
pub use scheduler::{FrameDeadline, FrameIdleSource, IdleDeadline, IdleFlag, IdleScheduler, Unbounded};
