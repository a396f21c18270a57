//! Runtime
//!
//! The [`Runtime`] owns everything a render needs: the host adapter, the
//! idle-time scheduler, the fiber arena and the four pieces of cycle state
//! (next unit of work, work-in-progress root, committed root, deletion
//! set). Several runtimes can coexist; nothing is global.
//!
//! # Render cycles
//!
//! A cycle starts from [`Runtime::render`] or from a state update, is
//! worked on in slices by [`Runtime::work_loop`], and ends with an
//! uninterruptible commit once no unit of work is left. A cycle that
//! starts while another is in flight replaces it; the abandoned fibers are
//! never committed and are freed by the next sweep.
//!
//! # State updates
//!
//! [`SetState`](crate::SetState) handles leave requests on a queue the
//! runtime drains at the start of every `work_loop` call. A request for a
//! committed component re-renders that component's subtree only. Requests
//! wait until the first commit.
//!
//! # Example
//!
//! ```rust
//! use sprig_core::{Element, MemoryHost, Runtime};
//!
//! let mut host = MemoryHost::new();
//! let mount = host.create_root("app");
//! let mut runtime = Runtime::new(host);
//!
//! runtime.render(Element::host("div").child("hello"), mount);
//! runtime.flush().unwrap();
//!
//! assert_eq!(runtime.host().text_content(mount), "hello");
//! ```

mod commit;
mod reconcile;
mod work;

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::config::RuntimeConfig;
use crate::element::Element;
use crate::error::Result;
use crate::fiber::{Fiber, FiberArena, FiberId, MutationTag};
use crate::host::HostAdapter;
use crate::scheduler::{IdleDeadline, IdleFlag, IdleScheduler, RenderRequest, Unbounded, UpdateQueue};

/// Outcome of one [`Runtime::work_loop`] invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkStatus {
    /// There was nothing to do.
    Idle,
    /// The deadline ran low with units of work left.
    Yielded,
    /// The cycle finished and was committed.
    Committed(CommitSummary),
}

/// What one commit did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CommitSummary {
    /// Number of the cycle that was committed, counting from 1.
    pub cycle: u64,
    /// Host nodes inserted into the host tree.
    pub placements: usize,
    /// Host nodes whose attributes or listeners were reconciled.
    pub updates: usize,
    /// Entries of the deletion set.
    pub deletions: usize,
    pub effects_run: usize,
    pub cleanups_run: usize,
}

/// Counters kept over the lifetime of a runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RuntimeStats {
    pub cycles_begun: u64,
    pub cycles_committed: u64,
    /// Cycles replaced by a newer cycle before they committed.
    pub cycles_superseded: u64,
    /// Cycles dropped because a host primitive failed.
    pub cycles_abandoned: u64,
    pub units_processed: u64,
    pub loop_invocations: u64,
}

/// The reconciliation engine for one host tree.
pub struct Runtime<H: HostAdapter, S: IdleScheduler = IdleFlag> {
    config: RuntimeConfig,
    host: H,
    idle: S,
    fibers: FiberArena<H::Node>,
    next_unit: Option<FiberId>,
    wip_root: Option<FiberId>,
    current_root: Option<FiberId>,
    deletions: Vec<FiberId>,
    requests: UpdateQueue,
    stats: RuntimeStats,
    last_commit: Option<CommitSummary>,
}

impl<H: HostAdapter> Runtime<H> {
    /// Create a runtime with the default configuration, driven by an
    /// [`IdleFlag`].
    pub fn new(host: H) -> Self {
        Self::with_config(host, RuntimeConfig::default())
    }

    pub fn with_config(host: H, config: RuntimeConfig) -> Self {
        Self::with_scheduler(host, IdleFlag::new(), config)
    }
}

impl<H: HostAdapter, S: IdleScheduler> Runtime<H, S> {
    /// Create a runtime on an arbitrary idle-time source. The source is
    /// armed right away.
    pub fn with_scheduler(host: H, mut idle: S, config: RuntimeConfig) -> Self {
        idle.schedule_idle_work();
        Self {
            config,
            host,
            idle,
            fibers: FiberArena::new(),
            next_unit: None,
            wip_root: None,
            current_root: None,
            deletions: Vec::new(),
            requests: UpdateQueue::new(),
            stats: RuntimeStats::default(),
            last_commit: None,
        }
    }

    /// Begin a render cycle that mounts `element` on `mount`.
    ///
    /// Nothing happens to the host tree until the cycle is worked on and
    /// committed. Pending state-update requests are dropped: this cycle
    /// re-renders every component anyway.
    pub fn render(&mut self, element: Element, mount: H::Node) {
        self.requests.clear();
        let mut root = Fiber::root(mount, element);
        root.alternate = self.current_root;
        let id = self.fibers.insert(root);
        self.begin_cycle(id, "render");
    }

    /// Run one slice of work.
    ///
    /// The idle-time source is re-armed first, whether or not there is work.
    /// Then pending state-update requests are turned into a cycle and units
    /// of work are processed until either the tree is done or the deadline
    /// has less than `yield_threshold` left. At least one unit is processed
    /// per call. A finished tree is committed before returning.
    ///
    /// A host failure abandons the current cycle and is returned.
    pub fn work_loop(&mut self, deadline: &dyn IdleDeadline) -> Result<WorkStatus> {
        self.idle.schedule_idle_work();
        self.stats.loop_invocations += 1;
        self.apply_requests();

        let mut should_yield = false;
        while let Some(unit) = self.next_unit {
            if should_yield {
                trace!(remaining = ?deadline.time_remaining(), "yielding");
                return Ok(WorkStatus::Yielded);
            }
            self.next_unit = match self.perform_unit_of_work(unit) {
                Ok(next) => next,
                Err(err) => {
                    self.abandon_cycle();
                    return Err(err);
                }
            };
            self.stats.units_processed += 1;
            should_yield = deadline.time_remaining() < self.config.yield_threshold;
        }

        let Some(root) = self.wip_root else {
            return Ok(WorkStatus::Idle);
        };
        match self.commit_root(root) {
            Ok(summary) => Ok(WorkStatus::Committed(summary)),
            Err(err) => {
                self.abandon_cycle();
                Err(err)
            }
        }
    }

    /// Work with an unbounded deadline until no cycle is in flight and no
    /// request is pending. Returns the summary of the last commit made.
    pub fn flush(&mut self) -> Result<Option<CommitSummary>> {
        let mut last = None;
        while self.has_pending_work() {
            if let WorkStatus::Committed(summary) = self.work_loop(&Unbounded)? {
                last = Some(summary);
            }
        }
        Ok(last)
    }

    /// Whether a cycle is in flight or a state update waits to start one.
    pub fn has_pending_work(&self) -> bool {
        self.next_unit.is_some()
            || self.wip_root.is_some()
            || (self.current_root.is_some() && !self.requests.is_empty())
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn idle(&self) -> &S {
        &self.idle
    }

    pub fn idle_mut(&mut self) -> &mut S {
        &mut self.idle
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn stats(&self) -> RuntimeStats {
        self.stats
    }

    pub fn last_commit(&self) -> Option<CommitSummary> {
        self.last_commit
    }

    pub fn fibers(&self) -> &FiberArena<H::Node> {
        &self.fibers
    }

    /// Root of the committed tree.
    pub fn current_root(&self) -> Option<FiberId> {
        self.current_root
    }

    /// Root of the tree being built, if a cycle is in flight.
    pub fn work_in_progress(&self) -> Option<FiberId> {
        self.wip_root
    }

    /// State-update requests not yet turned into a cycle.
    pub fn pending_requests(&self) -> usize {
        self.requests.len()
    }

    /// Outline of the committed fiber tree.
    pub fn dump_tree(&self) -> String {
        self.current_root
            .map(|root| self.fibers.dump(root))
            .unwrap_or_default()
    }

    fn begin_cycle(&mut self, root: FiberId, origin: &'static str) {
        if let Some(previous) = self.wip_root {
            self.stats.cycles_superseded += 1;
            debug!(?previous, "superseding in-flight cycle");
        }
        for id in self.deletions.drain(..) {
            if let Some(fiber) = self.fibers.get_mut(id) {
                fiber.tag = MutationTag::None;
            }
        }
        self.wip_root = Some(root);
        self.next_unit = Some(root);
        self.stats.cycles_begun += 1;
        debug!(cycle = self.stats.cycles_begun, ?root, origin, "render cycle begun");
    }

    fn abandon_cycle(&mut self) {
        self.next_unit = None;
        self.wip_root = None;
        self.deletions.clear();
        self.stats.cycles_abandoned += 1;
        if let Some(current) = self.current_root {
            self.fibers.sweep(current);
        }
        warn!(cycle = self.stats.cycles_begun, "render cycle abandoned");
    }

    /// Turn queued state-update requests into cycles, in order.
    fn apply_requests(&mut self) {
        if self.current_root.is_none() || self.requests.is_empty() {
            return;
        }
        for request in self.requests.take() {
            match request {
                RenderRequest::Fiber(target) if !self.fibers.contains(target) => {
                    warn!(?target, "update request for an unmounted component ignored");
                }
                RenderRequest::Fiber(target) => match self.in_flight_scope() {
                    None => self.rerender_fiber(target),
                    Some(Some(active)) if self.encloses(active, target) => {
                        self.rerender_fiber(active)
                    }
                    Some(Some(active)) if self.encloses(target, active) => {
                        self.rerender_fiber(target)
                    }
                    Some(_) => self.rerender_root(),
                },
                RenderRequest::Root => self.rerender_root(),
            }
        }
    }

    /// Scope of the in-flight cycle: `None` when idle, `Some(None)` for a
    /// whole-tree cycle, `Some(Some(fiber))` for a component re-render.
    fn in_flight_scope(&self) -> Option<Option<FiberId>> {
        let root = self.fibers.get(self.wip_root?)?;
        Some(root.parent().and(root.alternate()))
    }

    /// Whether committed fiber `ancestor` is `fiber` or one of its ancestors.
    fn encloses(&self, ancestor: FiberId, fiber: FiberId) -> bool {
        let mut cursor = Some(fiber);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.fibers.get(id).and_then(Fiber::parent);
        }
        false
    }

    /// Re-render the subtree of the committed function fiber `target`.
    fn rerender_fiber(&mut self, target: FiberId) {
        let Some(fiber) = self.fibers.get(target) else {
            return;
        };
        let wip = fiber.rerender_of(target);
        let id = self.fibers.insert(wip);
        self.begin_cycle(id, "update");
    }

    /// Re-render the whole tree. An in-flight whole-tree cycle is restarted
    /// with its own element so a pending `render` is not lost.
    fn rerender_root(&mut self) {
        let Some(current) = self.current_root else {
            return;
        };
        let base = match self.in_flight_scope() {
            Some(None) => self.wip_root.unwrap_or(current),
            _ => current,
        };
        let Some(fiber) = self.fibers.get(base) else {
            return;
        };
        let mut root = Fiber::new(fiber.kind().clone(), fiber.props().clone());
        root.alternate = Some(current);
        let id = self.fibers.insert(root);
        self.begin_cycle(id, "update");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use std::time::Duration;

    /// A slice with no time left: one unit of work per call.
    struct Spent;

    impl IdleDeadline for Spent {
        fn time_remaining(&self) -> Duration {
            Duration::ZERO
        }

        fn did_timeout(&self) -> bool {
            false
        }
    }

    #[test]
    fn work_loop_rearms_idle_source_without_work() {
        let mut runtime = Runtime::new(MemoryHost::new());
        assert_eq!(runtime.idle().requests(), 1);
        assert!(runtime.idle_mut().take());

        assert_eq!(runtime.work_loop(&Unbounded).unwrap(), WorkStatus::Idle);
        assert!(runtime.idle().is_armed());
        assert_eq!(runtime.idle().requests(), 2);
    }

    #[test]
    fn render_then_flush_commits_once() {
        let mut host = MemoryHost::new();
        let mount = host.create_root("root");
        let mut runtime = Runtime::new(host);

        runtime.render(Element::host("div").prop("id", "a"), mount);
        assert!(runtime.has_pending_work());
        let summary = runtime.flush().unwrap().unwrap();

        assert_eq!(summary.cycle, 1);
        assert_eq!(summary.placements, 1);
        assert!(!runtime.has_pending_work());
        assert_eq!(runtime.stats().cycles_committed, 1);
        assert_eq!(runtime.dump_tree(), "#root\n  div\n");
        assert_eq!(runtime.flush().unwrap(), None);
    }

    #[test]
    fn second_render_supersedes_first() {
        let mut host = MemoryHost::new();
        let mount = host.create_root("root");
        let mut runtime = Runtime::new(host);

        runtime.render(Element::host("old"), mount);
        runtime.render(Element::host("new"), mount);
        runtime.flush().unwrap();

        let stats = runtime.stats();
        assert_eq!(stats.cycles_begun, 2);
        assert_eq!(stats.cycles_superseded, 1);
        assert_eq!(stats.cycles_committed, 1);
        assert_eq!(runtime.host().dump_tree(mount), "new\n");
        // Only the committed tree survives the sweep.
        assert_eq!(runtime.fibers().len(), 2);
    }

    #[test]
    fn superseded_cycle_leaves_no_deletion_tags() {
        let mut host = MemoryHost::new();
        let mount = host.create_root("root");
        let mut runtime = Runtime::new(host);
        let full = || Element::host("div").children([Element::host("a"), Element::host("b")]);
        runtime.render(full(), mount);
        runtime.flush().unwrap();

        // Root and `div` are processed; `b` is now marked for deletion.
        runtime.render(Element::host("div").child(Element::host("a")), mount);
        assert_eq!(runtime.work_loop(&Spent).unwrap(), WorkStatus::Yielded);
        assert_eq!(runtime.work_loop(&Spent).unwrap(), WorkStatus::Yielded);
        assert!(runtime.dump_tree().contains("[Deletion]"));

        runtime.render(full(), mount);
        assert_eq!(runtime.dump_tree(), "#root\n  div\n    a\n    b\n");

        let summary = runtime.flush().unwrap().unwrap();
        assert_eq!(summary.deletions, 0);
        assert_eq!(runtime.host().dump_tree(mount), "div\n  a\n  b\n");
    }
}
