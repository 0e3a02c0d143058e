//! Identifier and lifecycle state types shared across the crate.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-unique task identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

impl TaskId {
    pub(crate) fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);
        TaskId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle state of a task.
///
/// States only move forward: `Initial` → `Executing` → `Finished`, or straight from
/// `Initial` to `Finished` when a cancelled task is started. The ordering of the variants
/// matches that progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum State {
    /// Accepting configuration; not yet started.
    Initial = 0,
    /// Body running or about to run.
    Executing = 1,
    /// Terminal; output fixed.
    Finished = 2,
}

impl State {
    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            0 => State::Initial,
            1 => State::Executing,
            _ => State::Finished,
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::Initial => "initial",
            State::Executing => "executing",
            State::Finished => "finished",
        };
        f.write_str(name)
    }
}
