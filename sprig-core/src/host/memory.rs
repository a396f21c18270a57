//! In-Memory Host
//!
//! A [`HostAdapter`] that keeps its node tree in a vector. It logs every
//! mutation, can fire listeners, and can be told to fail a primitive, which
//! makes it the host of choice for tests and for embedders that want to
//! inspect what the runtime would do to a real backend.

use std::fmt::{self, Write};

use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use super::HostAdapter;
use crate::element::{EventHandler, PropValue, TEXT_VALUE};
use crate::error::HostError;

/// Handle to a node of a [`MemoryHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One logged host mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOp {
    Create { node: NodeId, tag: String },
    SetAttribute { node: NodeId, name: String },
    RemoveAttribute { node: NodeId, name: String },
    AddListener { node: NodeId, event: String },
    RemoveListener { node: NodeId, event: String },
    Append { parent: NodeId, child: NodeId },
    InsertBefore { parent: NodeId, child: NodeId, reference: NodeId },
    Remove { parent: NodeId, child: NodeId },
}

const TEXT_TAG: &str = "#text";

#[derive(Debug)]
struct MemoryNode {
    tag: String,
    attributes: IndexMap<String, PropValue>,
    listeners: Vec<(String, EventHandler)>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl MemoryNode {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attributes: IndexMap::new(),
            listeners: Vec::new(),
            children: Vec::new(),
            parent: None,
        }
    }

    fn is_text(&self) -> bool {
        self.tag == TEXT_TAG
    }
}

/// Vector-backed host tree.
#[derive(Debug, Default)]
pub struct MemoryHost {
    nodes: Vec<MemoryNode>,
    ops: Vec<HostOp>,
    fail_on: Option<&'static str>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached node to mount a tree on. Not logged.
    pub fn create_root(&mut self, tag: &str) -> NodeId {
        self.push(tag)
    }

    /// Make the next call of the named primitive (e.g. `"append_child"`)
    /// fail with [`HostError::Rejected`].
    pub fn fail_next(&mut self, op: &'static str) {
        self.fail_on = Some(op);
    }

    pub fn ops(&self) -> &[HostOp] {
        &self.ops
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    /// Number of nodes ever created, mount points included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node.0).map(|n| n.tag.as_str())
    }

    pub fn is_text(&self, node: NodeId) -> bool {
        self.nodes.get(node.0).is_some_and(MemoryNode::is_text)
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&PropValue> {
        self.nodes.get(node.0)?.attributes.get(name)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0)?.parent
    }

    pub fn listener_count(&self, node: NodeId, event: &str) -> usize {
        self.nodes.get(node.0).map_or(0, |n| {
            n.listeners.iter().filter(|(name, _)| name == event).count()
        })
    }

    /// Invoke every `event` listener on `node`. Returns how many ran.
    pub fn dispatch(&self, node: NodeId, event: &str) -> usize {
        let handlers: Vec<EventHandler> = match self.nodes.get(node.0) {
            Some(n) => n
                .listeners
                .iter()
                .filter(|(name, _)| name == event)
                .map(|(_, handler)| handler.clone())
                .collect(),
            None => return 0,
        };
        for handler in &handlers {
            handler.call();
        }
        handlers.len()
    }

    /// Concatenated text of every text node under `node`.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut text = String::new();
        self.collect_text(node, &mut text);
        text
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        let Some(n) = self.nodes.get(node.0) else {
            return;
        };
        if n.is_text() {
            if let Some(value) = n.attributes.get(TEXT_VALUE) {
                out.push_str(&value.to_string());
            }
        }
        for &child in &n.children {
            self.collect_text(child, out);
        }
    }

    /// Every node below `root` with the given tag, in preorder.
    pub fn find_all(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            if self.tag(node) == Some(tag) {
                found.push(node);
            }
            stack.extend(self.children(node).iter().rev().copied());
        }
        found
    }

    pub fn find(&self, root: NodeId, tag: &str) -> Option<NodeId> {
        self.find_all(root, tag).into_iter().next()
    }

    /// Number of nodes reachable below `root`.
    pub fn descendant_count(&self, root: NodeId) -> usize {
        self.children(root)
            .iter()
            .map(|&child| 1 + self.descendant_count(child))
            .sum()
    }

    /// Indented outline of the tree below `root` (the root itself excluded).
    pub fn dump_tree(&self, root: NodeId) -> String {
        let mut output = String::new();
        for &child in self.children(root) {
            self.dump_node(&mut output, child, 0);
        }
        output
    }

    fn dump_node(&self, output: &mut String, node: NodeId, depth: usize) {
        let Some(n) = self.nodes.get(node.0) else {
            return;
        };
        let indent = "  ".repeat(depth);
        if n.is_text() {
            let text = n
                .attributes
                .get(TEXT_VALUE)
                .map(ToString::to_string)
                .unwrap_or_default();
            let _ = writeln!(output, "{indent}{text:?}");
            return;
        }
        let _ = write!(output, "{indent}{}", n.tag);
        for (name, value) in &n.attributes {
            let _ = write!(output, " {name}={:?}", value.to_string());
        }
        output.push('\n');
        for &child in &n.children {
            self.dump_node(output, child, depth + 1);
        }
    }

    /// JSON snapshot of the tree below `root`, one value per child.
    pub fn snapshot(&self, root: NodeId) -> Value {
        Value::Array(
            self.children(root)
                .iter()
                .map(|&child| self.snapshot_node(child))
                .collect(),
        )
    }

    fn snapshot_node(&self, node: NodeId) -> Value {
        let Some(n) = self.nodes.get(node.0) else {
            return Value::Null;
        };
        if n.is_text() {
            let text = n
                .attributes
                .get(TEXT_VALUE)
                .map(ToString::to_string)
                .unwrap_or_default();
            return json!({ "text": text });
        }
        let attributes: Map<String, Value> = n
            .attributes
            .iter()
            .map(|(name, value)| {
                (
                    name.clone(),
                    serde_json::to_value(value).unwrap_or(Value::Null),
                )
            })
            .collect();
        let children: Vec<Value> = n.children.iter().map(|&c| self.snapshot_node(c)).collect();
        json!({ "tag": n.tag, "attributes": attributes, "children": children })
    }

    fn push(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(MemoryNode::new(tag));
        id
    }

    fn check(&mut self, op: &'static str) -> Result<(), HostError> {
        if self.fail_on == Some(op) {
            self.fail_on = None;
            return Err(HostError::Rejected {
                op,
                reason: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    fn node_mut(&mut self, node: NodeId) -> Result<&mut MemoryNode, HostError> {
        self.nodes
            .get_mut(node.0)
            .ok_or_else(|| HostError::MissingNode(node.to_string()))
    }

    fn ensure(&self, node: NodeId) -> Result<(), HostError> {
        if node.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(HostError::MissingNode(node.to_string()))
        }
    }

    fn is_ancestor(&self, candidate: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == candidate {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Validate and detach `child` ahead of inserting it under `parent`.
    fn adopt(&mut self, op: &'static str, parent: NodeId, child: NodeId) -> Result<(), HostError> {
        self.ensure(parent)?;
        self.ensure(child)?;
        if self.is_ancestor(child, parent) {
            return Err(HostError::Rejected {
                op,
                reason: format!("{child} is an ancestor of {parent}"),
            });
        }
        if let Some(old_parent) = self.parent(child) {
            self.node_mut(old_parent)?.children.retain(|&c| c != child);
        }
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }
}

impl HostAdapter for MemoryHost {
    type Node = NodeId;

    fn create_node(&mut self, tag: &str) -> Result<NodeId, HostError> {
        self.check("create_node")?;
        let node = self.push(tag);
        self.ops.push(HostOp::Create {
            node,
            tag: tag.to_string(),
        });
        Ok(node)
    }

    fn create_text_node(&mut self) -> Result<NodeId, HostError> {
        self.check("create_text_node")?;
        let node = self.push(TEXT_TAG);
        self.ops.push(HostOp::Create {
            node,
            tag: TEXT_TAG.to_string(),
        });
        Ok(node)
    }

    fn set_attribute(&mut self, node: &NodeId, name: &str, value: &PropValue) -> Result<(), HostError> {
        self.check("set_attribute")?;
        self.node_mut(*node)?
            .attributes
            .insert(name.to_string(), value.clone());
        self.ops.push(HostOp::SetAttribute {
            node: *node,
            name: name.to_string(),
        });
        Ok(())
    }

    fn remove_attribute(&mut self, node: &NodeId, name: &str) -> Result<(), HostError> {
        self.check("remove_attribute")?;
        self.node_mut(*node)?.attributes.shift_remove(name);
        self.ops.push(HostOp::RemoveAttribute {
            node: *node,
            name: name.to_string(),
        });
        Ok(())
    }

    fn add_listener(&mut self, node: &NodeId, event: &str, handler: &EventHandler) -> Result<(), HostError> {
        self.check("add_listener")?;
        self.node_mut(*node)?
            .listeners
            .push((event.to_string(), handler.clone()));
        self.ops.push(HostOp::AddListener {
            node: *node,
            event: event.to_string(),
        });
        Ok(())
    }

    fn remove_listener(&mut self, node: &NodeId, event: &str, handler: &EventHandler) -> Result<(), HostError> {
        self.check("remove_listener")?;
        let listeners = &mut self.node_mut(*node)?.listeners;
        if let Some(index) = listeners
            .iter()
            .position(|(name, existing)| name == event && existing == handler)
        {
            listeners.remove(index);
        }
        self.ops.push(HostOp::RemoveListener {
            node: *node,
            event: event.to_string(),
        });
        Ok(())
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), HostError> {
        self.check("append_child")?;
        self.adopt("append_child", *parent, *child)?;
        self.node_mut(*parent)?.children.push(*child);
        self.ops.push(HostOp::Append {
            parent: *parent,
            child: *child,
        });
        Ok(())
    }

    fn insert_before(&mut self, parent: &NodeId, child: &NodeId, reference: &NodeId) -> Result<(), HostError> {
        self.check("insert_before")?;
        if self.parent(*reference) != Some(*parent) {
            return Err(HostError::Rejected {
                op: "insert_before",
                reason: format!("{reference} is not a child of {parent}"),
            });
        }
        self.adopt("insert_before", *parent, *child)?;
        let siblings = &mut self.node_mut(*parent)?.children;
        let index = siblings
            .iter()
            .position(|c| c == reference)
            .unwrap_or(siblings.len());
        siblings.insert(index, *child);
        self.ops.push(HostOp::InsertBefore {
            parent: *parent,
            child: *child,
            reference: *reference,
        });
        Ok(())
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), HostError> {
        self.check("remove_child")?;
        if self.parent(*child) != Some(*parent) {
            return Err(HostError::Rejected {
                op: "remove_child",
                reason: format!("{child} is not a child of {parent}"),
            });
        }
        self.node_mut(*parent)?.children.retain(|c| c != child);
        self.node_mut(*child)?.parent = None;
        self.ops.push(HostOp::Remove {
            parent: *parent,
            child: *child,
        });
        Ok(())
    }
}
