//! Error types for task outcomes and queue operations.
//!
//! [`OpError`] is what a consumer sees when a task did not succeed. [`QueueError`] is
//! returned by the reference [`TaskQueue`](crate::TaskQueue).

use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Why a task did not produce a value.
///
/// Errors are cheap to clone: a wrapped underlying error is shared behind an `Arc`, which
/// lets the same failure sit in a task's output and be handed to any number of readers.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum OpError {
    /// The value was queried before the task finished.
    NoValue,
    /// The task was cancelled.
    Cancelled,
    /// The body or a precondition reported a concrete error.
    Failed(Arc<dyn Error + Send + Sync>),
    /// More than one precondition failed.
    Multiple(Vec<OpError>),
    /// The task was started without a body.
    Unimplemented,
    /// The body, a precondition or the input provider panicked.
    Panicked { message: String },
}

impl OpError {
    /// Wrap an underlying error as [`OpError::Failed`].
    pub fn failed<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        OpError::Failed(Arc::new(error))
    }

    /// Build an [`OpError::Failed`] from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        let boxed: Box<dyn Error + Send + Sync> = message.into().into();
        OpError::Failed(Arc::from(boxed))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, OpError::Cancelled)
    }

    /// Flattened list of errors: the children of [`OpError::Multiple`], or `self` alone.
    pub fn errors(&self) -> Vec<&OpError> {
        match self {
            OpError::Multiple(errors) => errors.iter().collect(),
            other => vec![other],
        }
    }
}

impl fmt::Display for OpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpError::NoValue => write!(f, "task has not finished, no value is available"),
            OpError::Cancelled => write!(f, "task was cancelled"),
            OpError::Failed(error) => write!(f, "task failed: {}", error),
            OpError::Multiple(errors) => {
                write!(f, "{} preconditions failed", errors.len())?;
                for (i, error) in errors.iter().enumerate() {
                    let sep = if i == 0 { ": " } else { "; " };
                    write!(f, "{}{}", sep, error)?;
                }
                Ok(())
            }
            OpError::Unimplemented => write!(
                f,
                "task was started without a body\n\
                 \n\
                 Register one with `Task::on_start` before handing the task to a queue."
            ),
            OpError::Panicked { message } => write!(f, "task panicked: {}", message),
        }
    }
}

impl Error for OpError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            OpError::Failed(error) => {
                let source: &(dyn Error + 'static) = &**error;
                Some(source)
            }
            _ => None,
        }
    }
}

/// Errors returned by [`TaskQueue::run`](crate::TaskQueue::run).
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QueueError {
    /// `run()` was called while another `run()` on the same queue was in progress.
    ConcurrentRun,
    /// Tasks remain but none is ready and none is executing.
    Stalled { pending: usize },
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueError::ConcurrentRun => {
                write!(f, "queue is already running; concurrent runs are not supported")
            }
            QueueError::Stalled { pending } => write!(
                f,
                "queue stalled with {} pending task(s)\n\
                 \n\
                 No task is ready and none is executing. A task may be paused or may depend \
                 on a task that was never enqueued.",
                pending
            ),
        }
    }
}

impl Error for QueueError {}

/// Result type for queue operations
#[cfg(not(tarpaulin_include))]
pub type QueueResult<T> = Result<T, QueueError>;
