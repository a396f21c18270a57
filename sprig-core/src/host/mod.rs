//! Host Adapter
//!
//! The runtime never touches a concrete UI backend. Everything it does to
//! the host tree goes through the [`HostAdapter`] primitives: create a node,
//! set or remove an attribute, attach or detach a listener, and insert or
//! remove a child.
//!
//! # Property convention
//!
//! Element properties map to host state by name. A key starting with the
//! configured event prefix (`on` by default) names a listener: the prefix is
//! stripped and the rest lowercased, so `onClick` attaches a `click`
//! listener. Every other key is an attribute. Children are not properties
//! of the host node; they become host children through reconciliation.

mod memory;

pub use memory::{HostOp, MemoryHost, NodeId};

use std::fmt::Debug;

use tracing::{trace, warn};

use crate::element::{EventHandler, PropValue, Props};
use crate::error::HostError;

/// Mutation primitives of a host tree.
///
/// Failures are not caught or retried by the runtime. They surface from
/// [`Runtime::work_loop`](crate::Runtime::work_loop) as
/// [`Error::Host`](crate::Error::Host).
pub trait HostAdapter {
    /// Handle to a host node. Cloning a handle must not clone the node.
    type Node: Clone + Debug;

    fn create_node(&mut self, tag: &str) -> Result<Self::Node, HostError>;

    fn create_text_node(&mut self) -> Result<Self::Node, HostError>;

    fn set_attribute(
        &mut self,
        node: &Self::Node,
        name: &str,
        value: &PropValue,
    ) -> Result<(), HostError>;

    fn remove_attribute(&mut self, node: &Self::Node, name: &str) -> Result<(), HostError>;

    fn add_listener(
        &mut self,
        node: &Self::Node,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError>;

    fn remove_listener(
        &mut self,
        node: &Self::Node,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError>;

    /// Append `child` as the last child of `parent`.
    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), HostError>;

    /// Insert `child` into `parent` right before `reference`, which is
    /// already a child of `parent`.
    fn insert_before(
        &mut self,
        parent: &Self::Node,
        child: &Self::Node,
        reference: &Self::Node,
    ) -> Result<(), HostError>;

    fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), HostError>;
}

/// The listener name for a property key, or `None` for attributes.
pub fn event_name(key: &str, prefix: &str) -> Option<String> {
    key.strip_prefix(prefix)
        .filter(|rest| !rest.is_empty())
        .map(str::to_lowercase)
}

/// Bring `node` from `previous` properties to `next` properties.
///
/// Listeners that disappeared or changed are detached first, then stale
/// attributes removed, then new or changed attributes set, and finally new
/// or changed listeners attached.
pub fn update_host_props<H: HostAdapter>(
    host: &mut H,
    node: &H::Node,
    previous: &Props,
    next: &Props,
    event_prefix: &str,
) -> Result<(), HostError> {
    for (key, value) in previous.iter() {
        let Some(event) = event_name(key, event_prefix) else {
            continue;
        };
        if next.get(key) == Some(value) {
            continue;
        }
        if let Some(handler) = listener(key, value) {
            trace!(?node, %event, "remove listener");
            host.remove_listener(node, &event, handler)?;
        }
    }

    for (key, _) in previous.iter() {
        if event_name(key, event_prefix).is_none() && !next.contains(key) {
            trace!(?node, key, "remove attribute");
            host.remove_attribute(node, key)?;
        }
    }

    for (key, value) in next.iter() {
        if event_name(key, event_prefix).is_none() && previous.get(key) != Some(value) {
            trace!(?node, key, "set attribute");
            host.set_attribute(node, key, value)?;
        }
    }

    for (key, value) in next.iter() {
        let Some(event) = event_name(key, event_prefix) else {
            continue;
        };
        if previous.get(key) == Some(value) {
            continue;
        }
        if let Some(handler) = listener(key, value) {
            trace!(?node, %event, "add listener");
            host.add_listener(node, &event, handler)?;
        }
    }

    Ok(())
}

fn listener<'a>(key: &str, value: &'a PropValue) -> Option<&'a EventHandler> {
    let handler = value.as_handler();
    if handler.is_none() {
        warn!(key, "event property does not hold a handler; ignored");
    }
    handler
}
