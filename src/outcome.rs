//! Read-only projection of a task's output.

use crate::error::OpError;
use crate::value::{Reason, Value};

/// How a task ended, as seen by a consumer.
///
/// Computed on demand from the stored output and the task's cancelled flag. Cancellation
/// wins: a task whose cancelled flag is set always reports [`Outcome::Cancelled`], even if
/// the body stored a value or a failure afterwards.
#[derive(Debug, Clone)]
pub enum Outcome<T> {
    Succeeded(T),
    Failed(OpError),
    Cancelled,
}

impl<T> Outcome<T> {
    /// Project a stored output and a cancelled flag onto an outcome.
    ///
    /// An output that was never set becomes `Failed(OpError::NoValue)`: asking for the
    /// outcome of an unfinished task is a usage error.
    pub fn project(output: Value<T>, cancelled: bool) -> Self {
        if cancelled {
            return Outcome::Cancelled;
        }
        match output {
            Value::Present(value) => Outcome::Succeeded(value),
            Value::Absent(Reason::Cancelled) => Outcome::Cancelled,
            Value::Absent(Reason::Failed(error)) => Outcome::Failed(error),
            Value::Absent(Reason::NoValue) => Outcome::Failed(OpError::NoValue),
        }
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self, Outcome::Succeeded(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Succeeded(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&OpError> {
        match self {
            Outcome::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// Convert into a standard `Result`, mapping cancellation to [`OpError::Cancelled`].
    pub fn into_result(self) -> Result<T, OpError> {
        match self {
            Outcome::Succeeded(value) => Ok(value),
            Outcome::Failed(error) => Err(error),
            Outcome::Cancelled => Err(OpError::Cancelled),
        }
    }
}
