//! Work-unit processor: renders one fiber and reconciles its children.

use tracing::trace;

use super::Runtime;
use crate::element::Props;
use crate::error::{Error, HostError, Result};
use crate::fiber::{Fiber, FiberId, FiberKind, HostTag};
use crate::host::{update_host_props, HostAdapter};
use crate::hooks::Hooks;
use crate::scheduler::IdleScheduler;

impl<H: HostAdapter, S: IdleScheduler> Runtime<H, S> {
    /// Process `id` and return the next unit of the in-flight cycle.
    pub(super) fn perform_unit_of_work(&mut self, id: FiberId) -> Result<Option<FiberId>> {
        let Some(fiber) = self.fibers.get(id) else {
            return Ok(None);
        };
        trace!(?id, fiber = %fiber, "unit of work");

        if fiber.is_function() {
            self.update_function_component(id);
        } else {
            self.update_host_component(id)?;
        }

        let root = self.wip_root.unwrap_or(id);
        Ok(self.fibers.next_in_subtree(id, root))
    }

    fn update_function_component(&mut self, id: FiberId) {
        let Some(fiber) = self.fibers.get(id) else {
            return;
        };
        let FiberKind::Function(component) = *fiber.kind() else {
            return;
        };
        let props = fiber.props().clone();
        let previous = fiber
            .alternate()
            .and_then(|alternate| self.fibers.get(alternate))
            .map(|alternate| alternate.state_hooks.clone())
            .unwrap_or_default();

        let mut hooks = Hooks::new(id, previous, self.requests.clone());
        let child = component.render(&mut hooks, &props);
        let (state_hooks, effect_hooks) = hooks.finish();

        if let Some(fiber) = self.fibers.get_mut(id) {
            fiber.state_hooks = state_hooks;
            fiber.effect_hooks = effect_hooks;
        }
        self.reconcile_children(id, &[child]);
    }

    fn update_host_component(&mut self, id: FiberId) -> Result<()> {
        let Some(fiber) = self.fibers.get(id) else {
            return Ok(());
        };
        let children = fiber.props().child_list();

        if fiber.host_node().is_none() {
            let node = create_host_node(&mut self.host, fiber, &self.config.event_prefix)
                .map_err(Error::render)?;
            if let Some(FiberKind::Host { node: slot, .. }) =
                self.fibers.get_mut(id).map(|fiber| &mut fiber.kind)
            {
                *slot = Some(node);
            }
        }

        self.reconcile_children(id, &children);
        Ok(())
    }
}

/// Create the host node for a host-kind fiber and apply its properties.
fn create_host_node<H: HostAdapter>(
    host: &mut H,
    fiber: &Fiber<H::Node>,
    event_prefix: &str,
) -> std::result::Result<H::Node, HostError> {
    let node = match fiber.kind() {
        FiberKind::Host {
            tag: HostTag::Element(tag),
            ..
        } => host.create_node(tag)?,
        FiberKind::Host {
            tag: HostTag::Text, ..
        } => host.create_text_node()?,
        FiberKind::Host {
            tag: HostTag::Root, ..
        } => return Err(HostError::MissingNode("mount point".to_string())),
        FiberKind::Function(component) => {
            return Err(HostError::Rejected {
                op: "create_node",
                reason: format!("{component:?} renders no host node"),
            })
        }
    };
    trace!(?node, "host node created");
    update_host_props(host, &node, &Props::new(), fiber.props(), event_prefix)?;
    Ok(node)
}
