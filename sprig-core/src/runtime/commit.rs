//! Commit Phase
//!
//! Applies a finished work-in-progress tree to the host in one
//! uninterruptible pass:
//!
//! 1. Deletions. Effect cleanups of every component in a deleted subtree
//!    run, then the subtree's topmost host nodes are detached.
//! 2. Mutations, in preorder. A `Placement` inserts its host node before
//!    the next mounted host sibling (or appends it); an `Update` diffs the
//!    host node's properties against the alternate's.
//! 3. Effects, in preorder. Cleanups of effects about to re-run are called
//!    first for the whole tree, then the effects themselves.
//!
//! Afterwards every fiber no longer reachable from the committed root is
//! freed.

use tracing::debug;

use super::{CommitSummary, Runtime};
use crate::element::Props;
use crate::error::{Error, HostError, Result};
use crate::fiber::{Fiber, FiberId, MutationTag};
use crate::hooks::{EffectHook, StateSlot};
use crate::host::{update_host_props, HostAdapter};
use crate::scheduler::IdleScheduler;

impl<H: HostAdapter, S: IdleScheduler> Runtime<H, S> {
    pub(super) fn commit_root(&mut self, root: FiberId) -> Result<CommitSummary> {
        let mut summary = CommitSummary {
            cycle: self.stats.cycles_begun,
            ..CommitSummary::default()
        };

        for id in std::mem::take(&mut self.deletions) {
            self.commit_deletion(id, &mut summary)?;
        }

        if let Some(parent) = self.fibers.get(root).and_then(Fiber::parent) {
            self.splice(root, parent);
        }

        for id in self.fibers.preorder(root).into_iter().skip(1) {
            self.commit_work(id, &mut summary)?;
        }

        self.commit_effects(root, &mut summary);

        if self.fibers.get(root).and_then(Fiber::parent).is_none() {
            self.current_root = Some(root);
        }
        self.wip_root = None;
        let freed = self
            .current_root
            .map_or(0, |current| self.fibers.sweep(current));

        self.stats.cycles_committed += 1;
        self.last_commit = Some(summary);
        debug!(
            cycle = summary.cycle,
            placements = summary.placements,
            updates = summary.updates,
            deletions = summary.deletions,
            effects = summary.effects_run,
            cleanups = summary.cleanups_run,
            freed,
            "commit"
        );
        Ok(summary)
    }

    fn commit_deletion(&mut self, id: FiberId, summary: &mut CommitSummary) -> Result<()> {
        for fiber_id in self.fibers.preorder(id) {
            let Some(fiber) = self.fibers.get_mut(fiber_id) else {
                continue;
            };
            for hook in &mut fiber.effect_hooks {
                if let Some(cleanup) = hook.take_cleanup() {
                    cleanup();
                    summary.cleanups_run += 1;
                }
            }
        }

        let parent = self
            .fibers
            .host_parent(id)
            .ok_or_else(|| Error::commit(HostError::MissingNode(format!("parent of {id:?}"))))?;
        for node in self.fibers.host_roots(id) {
            self.host
                .remove_child(&parent, &node)
                .map_err(Error::commit)?;
        }
        summary.deletions += 1;
        Ok(())
    }

    /// Put a re-rendered component in place of the fiber it re-rendered.
    fn splice(&mut self, wip: FiberId, parent: FiberId) {
        let Some(original) = self.fibers.get(wip).and_then(Fiber::alternate) else {
            return;
        };
        let sibling = self.fibers.get(original).and_then(Fiber::sibling);

        if self.fibers.get(parent).and_then(Fiber::child) == Some(original) {
            if let Some(fiber) = self.fibers.get_mut(parent) {
                fiber.child = Some(wip);
            }
        } else {
            let previous = self
                .fibers
                .children(parent)
                .into_iter()
                .find(|&child| self.fibers.get(child).and_then(Fiber::sibling) == Some(original));
            if let Some(fiber) = previous.and_then(|id| self.fibers.get_mut(id)) {
                fiber.sibling = Some(wip);
            }
        }

        if let Some(fiber) = self.fibers.get_mut(wip) {
            fiber.sibling = sibling;
        }
    }

    fn commit_work(&mut self, id: FiberId, summary: &mut CommitSummary) -> Result<()> {
        let Some(fiber) = self.fibers.get(id) else {
            return Ok(());
        };
        let Some(node) = fiber.host_node() else {
            return Ok(());
        };

        match fiber.tag() {
            MutationTag::Placement => {
                let parent = self.fibers.host_parent(id).ok_or_else(|| {
                    Error::commit(HostError::MissingNode(format!("parent of {id:?}")))
                })?;
                match self.fibers.host_sibling(id) {
                    Some(before) => self.host.insert_before(&parent, node, &before),
                    None => self.host.append_child(&parent, node),
                }
                .map_err(Error::commit)?;
                summary.placements += 1;
            }
            MutationTag::Update => {
                let empty = Props::new();
                let previous = fiber
                    .alternate()
                    .and_then(|alternate| self.fibers.get(alternate))
                    .map_or(&empty, Fiber::props);
                update_host_props(
                    &mut self.host,
                    node,
                    previous,
                    fiber.props(),
                    &self.config.event_prefix,
                )
                .map_err(Error::commit)?;
                summary.updates += 1;
            }
            MutationTag::None | MutationTag::Deletion => {}
        }
        Ok(())
    }

    fn commit_effects(&mut self, root: FiberId, summary: &mut CommitSummary) {
        let components: Vec<FiberId> = self
            .fibers
            .preorder(root)
            .into_iter()
            .filter(|&id| self.fibers.get(id).is_some_and(Fiber::is_function))
            .collect();

        for &id in &components {
            let alternate = self.fibers.get(id).and_then(Fiber::alternate);
            let mut previous = alternate
                .and_then(|alternate| self.fibers.get_mut(alternate))
                .map(|fiber| std::mem::take(&mut fiber.effect_hooks))
                .unwrap_or_default();
            let Some(fiber) = self.fibers.get_mut(id) else {
                continue;
            };

            for hook in &fiber.state_hooks {
                hook.bind(id);
            }
            for (index, hook) in fiber.effect_hooks.iter_mut().enumerate() {
                prepare_effect(hook, previous.get_mut(index), summary);
            }
        }

        for &id in &components {
            let Some(fiber) = self.fibers.get_mut(id) else {
                continue;
            };
            for hook in &mut fiber.effect_hooks {
                if hook.run() {
                    summary.effects_run += 1;
                }
            }
        }
    }
}

/// Schedule `hook` if its dependencies call for a run, cleaning up after the
/// previous run; otherwise carry the previous cleanup over.
fn prepare_effect(hook: &mut EffectHook, previous: Option<&mut EffectHook>, summary: &mut CommitSummary) {
    if hook.should_run(previous.as_deref()) {
        if let Some(cleanup) = previous.and_then(EffectHook::take_cleanup) {
            cleanup();
            summary.cleanups_run += 1;
        }
        hook.schedule();
    } else if let Some(previous) = previous {
        hook.adopt_cleanup(previous.take_cleanup());
    }
}
