//! Positional Reconciliation
//!
//! New child elements are compared with the previous child fibers of the
//! same parent one position at a time. Position is identity: the element at
//! index `i` is only ever matched against the old fiber at index `i`.
//!
//! | new element | old fiber      | outcome                                |
//! |-------------|----------------|----------------------------------------|
//! | kind `k`    | kind `k`       | reuse, `Update` if named props differ  |
//! | kind `k`    | other / none   | new fiber tagged `Placement`           |
//! | none        | any            | old fiber tagged `Deletion`            |
//!
//! When both a new element and a mismatched old fiber occupy a position,
//! the old fiber is deleted and the new one placed.

use tracing::trace;

use super::Runtime;
use crate::element::Element;
use crate::fiber::{Fiber, FiberId, MutationTag};
use crate::host::HostAdapter;
use crate::scheduler::IdleScheduler;

impl<H: HostAdapter, S: IdleScheduler> Runtime<H, S> {
    /// Build the child fibers of `parent` for `elements` and link them as
    /// its child chain.
    pub(super) fn reconcile_children(&mut self, parent: FiberId, elements: &[Element]) {
        let mut old = self
            .fibers
            .get(parent)
            .and_then(Fiber::alternate)
            .and_then(|alternate| self.fibers.get(alternate))
            .and_then(Fiber::child);
        let mut created = Vec::with_capacity(elements.len());
        let mut index = 0;

        while index < elements.len() || old.is_some() {
            let element = elements.get(index);
            let previous = old.and_then(|id| self.fibers.get(id).map(|fiber| (id, fiber)));
            let same_kind = match (element, previous) {
                (Some(element), Some((_, fiber))) => fiber.kind().matches(element.kind()),
                _ => false,
            };

            let fiber = match (element, previous) {
                (Some(element), Some((old_id, old_fiber))) if same_kind => {
                    Some(old_fiber.reuse(old_id, element, parent))
                }
                (Some(element), _) => Some(Fiber::placement(element, parent)),
                (None, _) => None,
            };
            let deleted = previous.filter(|_| !same_kind).map(|(id, _)| id);
            old = previous.and_then(|(_, fiber)| fiber.sibling());

            if let Some(id) = deleted {
                self.delete_fiber(id);
            }
            if let Some(fiber) = fiber {
                trace!(?parent, index, tag = ?fiber.tag(), "reconciled child");
                created.push(self.fibers.insert(fiber));
            }
            index += 1;
        }

        self.link_children(parent, &created);
    }

    fn delete_fiber(&mut self, id: FiberId) {
        if let Some(fiber) = self.fibers.get_mut(id) {
            fiber.tag = MutationTag::Deletion;
            trace!(?id, "marked for deletion");
            self.deletions.push(id);
        }
    }

    fn link_children(&mut self, parent: FiberId, children: &[FiberId]) {
        if let Some(fiber) = self.fibers.get_mut(parent) {
            fiber.child = children.first().copied();
        }
        for pair in children.windows(2) {
            if let Some(fiber) = self.fibers.get_mut(pair[0]) {
                fiber.sibling = Some(pair[1]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::element::{Element, Props};
    use crate::fiber::MutationTag;
    use crate::hooks::Hooks;
    use crate::host::MemoryHost;
    use crate::runtime::Runtime;

    fn label(_: &mut Hooks, props: &Props) -> Element {
        Element::host("label").child(props.get_str("text").unwrap_or_default().to_string())
    }

    /// Commit `first`, then render `second` and return the tags of the
    /// root's new children without committing.
    fn tags_after(first: Vec<Element>, second: Vec<Element>) -> (Vec<MutationTag>, usize) {
        let mut host = MemoryHost::new();
        let mount = host.create_root("root");
        let mut runtime = Runtime::new(host);
        runtime.render(Element::host("ul").children(first), mount);
        runtime.flush().unwrap();

        runtime.render(Element::host("ul").children(second), mount);
        let root = runtime.work_in_progress().unwrap();
        // Process the root and the `ul` only.
        runtime.next_unit = runtime.perform_unit_of_work(root).unwrap();
        let ul = runtime.next_unit.unwrap();
        runtime.perform_unit_of_work(ul).unwrap();

        let tags = runtime
            .fibers()
            .children(ul)
            .into_iter()
            .map(|id| runtime.fibers().get(id).unwrap().tag())
            .collect();
        (tags, runtime.deletions.len())
    }

    #[test]
    fn identical_children_are_untagged() {
        let items = || vec![Element::host("li").prop("n", 1), Element::text("x")];
        let (tags, deletions) = tags_after(items(), items());
        assert_eq!(tags, vec![MutationTag::None, MutationTag::None]);
        assert_eq!(deletions, 0);
    }

    #[test]
    fn changed_props_tag_update() {
        let (tags, _) = tags_after(
            vec![Element::host("li").prop("n", 1)],
            vec![Element::host("li").prop("n", 2)],
        );
        assert_eq!(tags, vec![MutationTag::Update]);
    }

    #[test]
    fn kind_change_deletes_and_places() {
        let (tags, deletions) = tags_after(
            vec![Element::host("li"), Element::host("li")],
            vec![Element::host("li"), Element::component("Label", label)],
        );
        assert_eq!(tags, vec![MutationTag::None, MutationTag::Placement]);
        assert_eq!(deletions, 1);
    }

    #[test]
    fn shorter_list_deletes_tail() {
        let (tags, deletions) = tags_after(
            vec![Element::host("a"), Element::host("b"), Element::host("c")],
            vec![Element::host("a")],
        );
        assert_eq!(tags, vec![MutationTag::None]);
        assert_eq!(deletions, 2);
    }

    #[test]
    fn longer_list_places_tail() {
        let (tags, deletions) = tags_after(
            vec![Element::host("a")],
            vec![Element::host("a"), Element::host("b")],
        );
        assert_eq!(tags, vec![MutationTag::None, MutationTag::Placement]);
        assert_eq!(deletions, 0);
    }
}
