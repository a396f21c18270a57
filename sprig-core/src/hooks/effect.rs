//! Effect Hooks
//!
//! An effect hook records a side effect during render and defers it to the
//! commit phase. Whether the effect runs at a given commit depends on its
//! dependency list:
//!
//! - no list: after every commit of the owning fiber;
//! - an empty list: once, when the fiber is first mounted;
//! - a non-empty list: on mount, then whenever some dependency differs
//!   pairwise from the previous render (lists of different length always
//!   count as changed).
//!
//! # Cleanup
//!
//! An effect may return a cleanup closure. It runs before the effect runs
//! again and when the owning fiber is unmounted. A cleanup whose effect is
//! skipped at a commit moves to the new hook, so it is never lost.

use std::fmt;

use smallvec::SmallVec;

use crate::element::PropValue;

/// Closure returned by an effect, run before the next run or on unmount.
pub type Cleanup = Box<dyn FnOnce()>;

/// Dependency keys of an effect, compared pairwise between renders.
pub type Deps = SmallVec<[PropValue; 4]>;

type EffectFn = Box<dyn FnOnce() -> Option<Cleanup>>;

/// One registered effect on a fiber.
pub struct EffectHook {
    effect: Option<EffectFn>,
    deps: Option<Deps>,
    cleanup: Option<Cleanup>,
    scheduled: bool,
}

impl EffectHook {
    pub(crate) fn new<F>(effect: F, deps: Option<&[PropValue]>) -> Self
    where
        F: FnOnce() -> Option<Cleanup> + 'static,
    {
        Self {
            effect: Some(Box::new(effect)),
            deps: deps.map(|deps| deps.iter().cloned().collect()),
            cleanup: None,
            scheduled: false,
        }
    }

    pub fn deps(&self) -> Option<&[PropValue]> {
        self.deps.as_deref()
    }

    pub fn has_cleanup(&self) -> bool {
        self.cleanup.is_some()
    }

    /// Whether this hook runs at the commit where `previous` is the hook at
    /// the same position in the alternate fiber.
    pub(crate) fn should_run(&self, previous: Option<&EffectHook>) -> bool {
        let Some(previous) = previous else {
            return true;
        };
        match (&self.deps, &previous.deps) {
            (None, _) => true,
            (Some(next), _) if next.is_empty() => false,
            (Some(_), None) => true,
            (Some(next), Some(prev)) => deps_changed(prev, next),
        }
    }

    pub(crate) fn schedule(&mut self) {
        self.scheduled = true;
    }

    pub(crate) fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    /// Run the effect if scheduled, keeping the cleanup it returns.
    pub(crate) fn run(&mut self) -> bool {
        if !std::mem::take(&mut self.scheduled) {
            return false;
        }
        match self.effect.take() {
            Some(effect) => {
                self.cleanup = effect();
                true
            }
            None => false,
        }
    }

    pub(crate) fn take_cleanup(&mut self) -> Option<Cleanup> {
        self.cleanup.take()
    }

    pub(crate) fn adopt_cleanup(&mut self, cleanup: Option<Cleanup>) {
        self.cleanup = cleanup;
    }
}

impl fmt::Debug for EffectHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectHook")
            .field("deps", &self.deps)
            .field("has_cleanup", &self.cleanup.is_some())
            .field("scheduled", &self.scheduled)
            .finish()
    }
}

/// Pairwise comparison of two dependency lists.
pub(crate) fn deps_changed(previous: &[PropValue], next: &[PropValue]) -> bool {
    previous.len() != next.len() || previous.iter().zip(next).any(|(a, b)| a != b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn hook(deps: Option<&[PropValue]>) -> EffectHook {
        EffectHook::new(|| None, deps)
    }

    #[test]
    fn mount_always_runs() {
        assert!(hook(Some(&[])).should_run(None));
        assert!(hook(None).should_run(None));
        assert!(hook(Some(&[1.into()])).should_run(None));
    }

    #[test]
    fn empty_deps_never_rerun() {
        let previous = hook(Some(&[]));
        assert!(!hook(Some(&[])).should_run(Some(&previous)));
    }

    #[test]
    fn missing_deps_always_rerun() {
        let previous = hook(None);
        assert!(hook(None).should_run(Some(&previous)));
    }

    #[test]
    fn deps_compare_pairwise() {
        let previous = hook(Some(&[1.into(), "a".into()]));
        assert!(!hook(Some(&[1.into(), "a".into()])).should_run(Some(&previous)));
        assert!(hook(Some(&[2.into(), "a".into()])).should_run(Some(&previous)));
        assert!(hook(Some(&[1.into()])).should_run(Some(&previous)));
    }

    #[test]
    fn run_keeps_cleanup() {
        let cleaned = Rc::new(Cell::new(false));
        let flag = cleaned.clone();
        let mut hook = EffectHook::new(
            move || Some(Box::new(move || flag.set(true)) as Cleanup),
            None,
        );

        // Not scheduled yet.
        assert!(!hook.run());
        hook.schedule();
        assert!(hook.run());
        assert!(hook.has_cleanup());
        assert!(!hook.is_scheduled());

        (hook.take_cleanup().unwrap())();
        assert!(cleaned.get());
    }
}
