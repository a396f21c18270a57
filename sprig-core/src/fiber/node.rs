//! Fiber Nodes
//!
//! A fiber is the persistent unit of work mirroring one rendered element
//! position. Fibers link to each other in first-child/next-sibling form and
//! point at their counterpart in the other tree through `alternate`.

use std::borrow::Cow;
use std::fmt;

use crate::element::{Component, Element, ElementKind, Props, TEXT_VALUE};
use crate::hooks::{EffectHook, StateHook};

slotmap::new_key_type! {
    /// Handle to a fiber in the [`FiberArena`](super::FiberArena).
    ///
    /// Keys are generational: a handle to a freed fiber never resolves to a
    /// fiber allocated later in the same slot.
    pub struct FiberId;
}

/// The mutation a fiber asks the commit phase to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutationTag {
    /// Nothing to do for this fiber's own host node.
    #[default]
    None,
    /// Insert the fiber's host node into the host tree.
    Placement,
    /// Reconcile the host node's attributes and listeners.
    Update,
    /// Detach the fiber's host subtree.
    Deletion,
}

/// What a host-kind fiber renders to.
#[derive(Debug, Clone, PartialEq)]
pub enum HostTag {
    /// The mount point handed to `render`.
    Root,
    /// A tagged host node.
    Element(Cow<'static, str>),
    /// A text node.
    Text,
}

/// Function-kind fibers render to no node of their own; host-kind fibers
/// own one once the work-unit processor has created it.
#[derive(Debug, Clone)]
pub enum FiberKind<N> {
    Function(Component),
    Host { tag: HostTag, node: Option<N> },
}

impl<N> FiberKind<N> {
    pub(crate) fn from_element_kind(kind: &ElementKind) -> Self {
        match kind {
            ElementKind::Host(tag) => FiberKind::Host {
                tag: HostTag::Element(tag.clone()),
                node: None,
            },
            ElementKind::Text => FiberKind::Host {
                tag: HostTag::Text,
                node: None,
            },
            ElementKind::Component(component) => FiberKind::Function(*component),
        }
    }

    /// Whether an element of `kind` may reuse this fiber.
    pub(crate) fn matches(&self, kind: &ElementKind) -> bool {
        match (self, kind) {
            (FiberKind::Function(component), ElementKind::Component(other)) => component == other,
            (
                FiberKind::Host {
                    tag: HostTag::Element(tag),
                    ..
                },
                ElementKind::Host(other),
            ) => tag == other,
            (
                FiberKind::Host {
                    tag: HostTag::Text, ..
                },
                ElementKind::Text,
            ) => true,
            _ => false,
        }
    }
}

/// A node of the render tree.
pub struct Fiber<N> {
    pub(crate) kind: FiberKind<N>,
    pub(crate) props: Props,
    pub(crate) parent: Option<FiberId>,
    pub(crate) child: Option<FiberId>,
    pub(crate) sibling: Option<FiberId>,
    pub(crate) alternate: Option<FiberId>,
    pub(crate) tag: MutationTag,
    pub(crate) state_hooks: Vec<StateHook>,
    pub(crate) effect_hooks: Vec<EffectHook>,
}

impl<N> Fiber<N> {
    pub(crate) fn new(kind: FiberKind<N>, props: Props) -> Self {
        Self {
            kind,
            props,
            parent: None,
            child: None,
            sibling: None,
            alternate: None,
            tag: MutationTag::None,
            state_hooks: Vec::new(),
            effect_hooks: Vec::new(),
        }
    }

    /// A root fiber mounted on `node` whose only child is `element`.
    pub(crate) fn root(node: N, element: Element) -> Self {
        let mut props = Props::new();
        props.set_children(vec![element]);
        Self::new(
            FiberKind::Host {
                tag: HostTag::Root,
                node: Some(node),
            },
            props,
        )
    }

    /// A fresh fiber for an element with no reusable counterpart.
    pub(crate) fn placement(element: &Element, parent: FiberId) -> Self {
        let mut fiber = Self::new(
            FiberKind::from_element_kind(element.kind()),
            element.props().clone(),
        );
        fiber.parent = Some(parent);
        fiber.tag = MutationTag::Placement;
        fiber
    }

    pub fn kind(&self) -> &FiberKind<N> {
        &self.kind
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn tag(&self) -> MutationTag {
        self.tag
    }

    pub fn parent(&self) -> Option<FiberId> {
        self.parent
    }

    pub fn child(&self) -> Option<FiberId> {
        self.child
    }

    pub fn sibling(&self) -> Option<FiberId> {
        self.sibling
    }

    pub fn alternate(&self) -> Option<FiberId> {
        self.alternate
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, FiberKind::Function(_))
    }

    /// The host node owned by this fiber, if any.
    pub fn host_node(&self) -> Option<&N> {
        match &self.kind {
            FiberKind::Host { node, .. } => node.as_ref(),
            FiberKind::Function(_) => None,
        }
    }

    pub fn state_hook_count(&self) -> usize {
        self.state_hooks.len()
    }

    pub fn effect_hook_count(&self) -> usize {
        self.effect_hooks.len()
    }
}

impl<N: Clone> Fiber<N> {
    /// A new fiber reusing `self` (the old fiber) for `element`.
    ///
    /// The host node carries over. The tag is `Update` only when the named
    /// properties differ.
    pub(crate) fn reuse(&self, old_id: FiberId, element: &Element, parent: FiberId) -> Self {
        let mut fiber = Self::new(self.kind.clone(), element.props().clone());
        fiber.parent = Some(parent);
        fiber.alternate = Some(old_id);
        fiber.tag = if self.props.same_values(element.props()) {
            MutationTag::None
        } else {
            MutationTag::Update
        };
        fiber
    }

    /// A work-in-progress copy of a committed fiber that re-renders its
    /// subtree in place. The copy keeps the parent link and points back at
    /// the original through `alternate`.
    pub(crate) fn rerender_of(&self, id: FiberId) -> Self {
        let mut fiber = Self::new(self.kind.clone(), self.props.clone());
        fiber.parent = self.parent;
        fiber.alternate = Some(id);
        fiber.tag = MutationTag::Update;
        fiber
    }
}

impl<N> fmt::Display for Fiber<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FiberKind::Function(component) => write!(f, "{:?}", component)?,
            FiberKind::Host { tag, .. } => match tag {
                HostTag::Root => f.write_str("#root")?,
                HostTag::Element(tag) => f.write_str(tag)?,
                HostTag::Text => match self.props.get(TEXT_VALUE) {
                    Some(value) => write!(f, "{:?}", value.to_string())?,
                    None => f.write_str("\"\"")?,
                },
            },
        }
        if self.tag != MutationTag::None {
            write!(f, " [{:?}]", self.tag)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::Hooks;

    fn widget(_: &mut Hooks, _: &Props) -> Element {
        Element::host("div")
    }

    #[test]
    fn kinds_match_elements() {
        let div = FiberKind::<()>::from_element_kind(&ElementKind::Host("div".into()));
        assert!(div.matches(&ElementKind::Host("div".into())));
        assert!(!div.matches(&ElementKind::Host("span".into())));
        assert!(!div.matches(&ElementKind::Text));

        let text = FiberKind::<()>::from_element_kind(&ElementKind::Text);
        assert!(text.matches(&ElementKind::Text));

        let component = Element::component("Widget", widget);
        let kind = FiberKind::<()>::from_element_kind(component.kind());
        assert!(kind.matches(component.kind()));
        assert!(!kind.matches(&ElementKind::Host("div".into())));
    }

    #[test]
    fn reuse_tags_only_changed_props() {
        let mut arena = slotmap::SlotMap::<FiberId, ()>::with_key();
        let old_id = arena.insert(());
        let parent = arena.insert(());

        let old = Fiber::<u32>::placement(&Element::host("div").prop("id", "a"), parent);
        let same = old.reuse(old_id, &Element::host("div").prop("id", "a"), parent);
        assert_eq!(same.tag(), MutationTag::None);
        assert_eq!(same.alternate(), Some(old_id));

        let changed = old.reuse(old_id, &Element::host("div").prop("id", "b"), parent);
        assert_eq!(changed.tag(), MutationTag::Update);
    }

    #[test]
    fn root_fiber_owns_mount_point() {
        let root = Fiber::root(7u32, Element::host("div"));
        assert_eq!(root.host_node(), Some(&7));
        assert_eq!(root.props().children().len(), 1);
        assert_eq!(root.to_string(), "#root");
    }
}
