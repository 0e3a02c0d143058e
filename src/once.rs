//! Per-task, per-action "first caller wins" guard.
//!
//! Each task owns one [`OnceGuard`]. For every [`Action`] key the guard lets exactly one
//! caller through, no matter how many threads race for it. The decision is made under a
//! single lock; the action itself runs after the lock is released, so a long cancellation
//! handler never blocks an unrelated `finish()`.

use parking_lot::Mutex;

/// Guarded task actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Cancel,
    Finish,
    RegisterCompletion,
}

impl Action {
    const COUNT: usize = 3;

    fn index(self) -> usize {
        match self {
            Action::Cancel => 0,
            Action::Finish => 1,
            Action::RegisterCompletion => 2,
        }
    }
}

/// Consumed-flag table keyed by [`Action`], all unconsumed at creation.
#[derive(Debug, Default)]
pub struct OnceGuard {
    consumed: Mutex<[bool; Action::COUNT]>,
}

impl OnceGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` if this is the first call for `key`.
    ///
    /// Returns `Some` with the action's result for the winning caller and `None` for
    /// every other caller, including ones racing on other threads.
    pub fn perform_once<R, F>(&self, key: Action, action: F) -> Option<R>
    where
        F: FnOnce() -> R,
    {
        if self.claim(key) {
            Some(action())
        } else {
            None
        }
    }

    /// Mark `key` consumed. True only for the caller that flipped it.
    pub(crate) fn claim(&self, key: Action) -> bool {
        let mut consumed = self.consumed.lock();
        let slot = &mut consumed[key.index()];
        if *slot {
            false
        } else {
            *slot = true;
            true
        }
    }

    #[cfg(test)]
    pub(crate) fn is_consumed(&self, key: Action) -> bool {
        self.consumed.lock()[key.index()]
    }
}
