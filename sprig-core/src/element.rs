//! Element Model
//!
//! Elements are the immutable description of the UI a caller wants. They
//! are rebuilt on every render and carry no identity of their own: the
//! reconciler matches them against the previous render purely by position
//! and [`ElementKind`].
//!
//! # Example
//!
//! ```rust
//! use sprig_core::Element;
//!
//! let tree = Element::host("div")
//!     .prop("id", "greeting")
//!     .child(Element::host("span").child("hello"));
//!
//! assert_eq!(tree.props().children().len(), 1);
//! ```

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::Serialize;

use crate::hooks::Hooks;

/// Property key holding a text element's content.
pub const TEXT_VALUE: &str = "nodeValue";

/// Key prefix the [`Element::on`] builder uses for listener properties.
pub const DEFAULT_EVENT_PREFIX: &str = "on";

/// Signature of a function component.
///
/// The component receives the per-render hook context and its properties
/// and returns exactly one element.
pub type ComponentFn = fn(&mut Hooks, &Props) -> Element;

/// A named reference to a render function.
///
/// Two components are the same kind when they point at the same function.
#[derive(Clone, Copy)]
pub struct Component {
    name: &'static str,
    render: ComponentFn,
}

impl Component {
    /// Wrap a render function.
    pub fn new(name: &'static str, render: ComponentFn) -> Self {
        Self { name, render }
    }

    /// Display name, used in logs and tree dumps.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn render(&self, hooks: &mut Hooks, props: &Props) -> Element {
        (self.render)(hooks, props)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.render as usize == other.render as usize
    }
}

impl Eq for Component {}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.name)
    }
}

/// What an element renders to.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    /// A host node with the given tag, e.g. `div`.
    Host(Cow<'static, str>),
    /// A text node. Its content lives in the [`TEXT_VALUE`] property.
    Text,
    /// A function component.
    Component(Component),
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Host(tag) => f.write_str(tag),
            ElementKind::Text => f.write_str("TEXT"),
            ElementKind::Component(component) => write!(f, "{:?}", component),
        }
    }
}

/// A listener attached through an event-prefixed property.
///
/// Handlers compare by identity: re-creating a closure on every render
/// makes the property "changed" and the listener is swapped at commit.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn()>);

impl EventHandler {
    pub fn new(handler: impl Fn() + 'static) -> Self {
        Self(Rc::new(handler))
    }

    /// Invoke the handler.
    pub fn call(&self) {
        (self.0)()
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventHandler({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

/// A property value. Also used as an effect dependency key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    #[serde(skip)]
    Handler(EventHandler),
}

impl PropValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_handler(&self) -> Option<&EventHandler> {
        match self {
            PropValue::Handler(handler) => Some(handler),
            _ => None,
        }
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Bool(value) => write!(f, "{value}"),
            PropValue::Int(value) => write!(f, "{value}"),
            PropValue::Float(value) => write!(f, "{value}"),
            PropValue::Str(value) => f.write_str(value),
            PropValue::Handler(_) => f.write_str("[handler]"),
        }
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Int(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Int(value.into())
    }
}

impl From<usize> for PropValue {
    fn from(value: usize) -> Self {
        PropValue::Int(value as i64)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Float(value)
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(value)
    }
}

impl From<EventHandler> for PropValue {
    fn from(value: EventHandler) -> Self {
        PropValue::Handler(value)
    }
}

/// Properties of an element: an ordered name/value map plus the children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Props {
    values: IndexMap<String, PropValue>,
    children: Rc<Vec<Element>>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Props::insert`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<PropValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.values.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(PropValue::as_str)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(PropValue::as_int)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Named values in insertion order. `children` is not part of this map.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn push_child(&mut self, child: Element) {
        Rc::make_mut(&mut self.children).push(child);
    }

    pub fn set_children(&mut self, children: Vec<Element>) {
        self.children = Rc::new(children);
    }

    /// Cheap handle to the child descriptions.
    pub(crate) fn child_list(&self) -> Rc<Vec<Element>> {
        Rc::clone(&self.children)
    }

    /// Whether the named values are equal, ignoring children.
    pub fn same_values(&self, other: &Props) -> bool {
        self.values == other.values
    }
}

/// An immutable description of one position in the UI tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    kind: ElementKind,
    props: Props,
}

impl Element {
    pub fn new(kind: ElementKind, props: Props) -> Self {
        Self { kind, props }
    }

    /// A host element with the given tag.
    pub fn host(tag: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ElementKind::Host(tag.into()), Props::new())
    }

    /// A text element.
    pub fn text(value: impl Into<PropValue>) -> Self {
        Self::new(ElementKind::Text, Props::new().with(TEXT_VALUE, value))
    }

    /// A function component element.
    pub fn component(name: &'static str, render: ComponentFn) -> Self {
        Self::new(
            ElementKind::Component(Component::new(name, render)),
            Props::new(),
        )
    }

    pub fn prop(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.props.insert(name, value);
        self
    }

    /// Attach a listener for `event` using the default `on` prefix, so
    /// `.on("click", ..)` sets the `onClick` property.
    pub fn on(mut self, event: &str, handler: impl Fn() + 'static) -> Self {
        let mut chars = event.chars();
        let key = match chars.next() {
            Some(first) => format!(
                "{}{}{}",
                DEFAULT_EVENT_PREFIX,
                first.to_uppercase(),
                chars.as_str()
            ),
            None => DEFAULT_EVENT_PREFIX.to_string(),
        };
        self.props.insert(key, EventHandler::new(handler));
        self
    }

    pub fn child(mut self, child: impl Into<Element>) -> Self {
        self.props.push_child(child.into());
        self
    }

    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Element>,
    {
        let list = Rc::make_mut(&mut self.props.children);
        list.extend(children.into_iter().map(Into::into));
        self
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn into_parts(self) -> (ElementKind, Props) {
        (self.kind, self.props)
    }
}

impl From<&str> for Element {
    fn from(value: &str) -> Self {
        Element::text(value)
    }
}

impl From<String> for Element {
    fn from(value: String) -> Self {
        Element::text(value)
    }
}

impl From<i64> for Element {
    fn from(value: i64) -> Self {
        Element::text(value)
    }
}

impl From<i32> for Element {
    fn from(value: i32) -> Self {
        Element::text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first(_: &mut Hooks, _: &Props) -> Element {
        Element::host("a")
    }

    fn second(_: &mut Hooks, _: &Props) -> Element {
        Element::host("b")
    }

    #[test]
    fn strings_become_text_children() {
        let element = Element::host("p").child("hi").child(String::from("there"));
        let children = element.props().children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].kind(), &ElementKind::Text);
        assert_eq!(children[0].props().get_str(TEXT_VALUE), Some("hi"));
        assert_eq!(children[1].props().get_str(TEXT_VALUE), Some("there"));
    }

    #[test]
    fn numbers_become_text_children() {
        let element = Element::host("p").child(3i64).child(-7i32);
        let children = element.props().children();
        assert_eq!(children[0].kind(), &ElementKind::Text);
        assert_eq!(children[0].props().get_int(TEXT_VALUE), Some(3));
        assert_eq!(children[1].props().get_int(TEXT_VALUE), Some(-7));
    }

    #[test]
    fn listener_keys_use_the_prefix() {
        let element = Element::host("button").on("click", || {});
        assert!(element.props().contains("onClick"));
        assert!(element.props().get("onClick").unwrap().as_handler().is_some());
    }

    #[test]
    fn components_compare_by_function() {
        let a = Element::component("First", first);
        let a_again = Element::component("Renamed", first);
        let b = Element::component("Second", second);
        assert_eq!(a.kind(), a_again.kind());
        assert_ne!(a.kind(), b.kind());
    }

    #[test]
    fn handlers_compare_by_identity() {
        let handler = EventHandler::new(|| {});
        assert_eq!(PropValue::from(handler.clone()), PropValue::from(handler));
        assert_ne!(
            PropValue::from(EventHandler::new(|| {})),
            PropValue::from(EventHandler::new(|| {}))
        );
    }

    #[test]
    fn same_values_ignores_children() {
        let a = Element::host("div").prop("id", "x").child("one");
        let b = Element::host("div").prop("id", "x").child("two");
        assert!(a.props().same_values(b.props()));
        assert_ne!(a.props(), b.props());
    }
}
