//! Tagged value slot used for a task's input and output.
//!
//! A [`Value<T>`] is either a value or the reason there isn't one. Keeping the reasons
//! apart is what lets a consumer tell "not finished yet" from "cancelled" from "failed".

use crate::error::OpError;

/// Why a [`Value`] holds nothing.
#[derive(Debug, Clone)]
pub enum Reason {
    /// Nothing has been stored yet.
    NoValue,
    /// The producing task was cancelled.
    Cancelled,
    /// The producing task failed.
    Failed(OpError),
}

/// Either a present value or the reason it is absent.
///
/// # Examples
///
/// ```
/// use taskline::{OpError, Reason, Value};
///
/// let ready = Value::present(7);
/// assert_eq!(ready.value().ok(), Some(&7));
///
/// let pending: Value<i32> = Value::none();
/// assert!(matches!(pending.value(), Err(OpError::NoValue)));
///
/// let failed: Value<i32> = Value::failed(OpError::msg("boom"));
/// assert!(matches!(failed.reason(), Some(Reason::Failed(_))));
/// ```
#[derive(Debug, Clone)]
pub enum Value<T> {
    Present(T),
    Absent(Reason),
}

impl<T> Value<T> {
    pub fn present(value: T) -> Self {
        Value::Present(value)
    }

    pub fn absent(reason: Reason) -> Self {
        Value::Absent(reason)
    }

    /// Absent with [`Reason::NoValue`].
    pub fn none() -> Self {
        Value::Absent(Reason::NoValue)
    }

    /// Absent with [`Reason::Cancelled`].
    pub fn cancelled() -> Self {
        Value::Absent(Reason::Cancelled)
    }

    /// Absent with [`Reason::Failed`].
    pub fn failed(error: OpError) -> Self {
        Value::Absent(Reason::Failed(error))
    }

    /// Borrow the stored value.
    ///
    /// # Errors
    ///
    /// Returns [`OpError::NoValue`] whenever the value is absent, whatever the reason.
    /// Use [`Value::reason`] or [`Outcome`](crate::Outcome) to find out why.
    pub fn value(&self) -> Result<&T, OpError> {
        match self {
            Value::Present(value) => Ok(value),
            Value::Absent(_) => Err(OpError::NoValue),
        }
    }

    /// Take the stored value. Same error behaviour as [`Value::value`].
    pub fn into_value(self) -> Result<T, OpError> {
        match self {
            Value::Present(value) => Ok(value),
            Value::Absent(_) => Err(OpError::NoValue),
        }
    }

    pub fn try_get(&self) -> Option<&T> {
        match self {
            Value::Present(value) => Some(value),
            Value::Absent(_) => None,
        }
    }

    pub fn reason(&self) -> Option<&Reason> {
        match self {
            Value::Present(_) => None,
            Value::Absent(reason) => Some(reason),
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Value::Present(_))
    }

    pub fn as_ref(&self) -> Value<&T> {
        match self {
            Value::Present(value) => Value::Present(value),
            Value::Absent(reason) => Value::Absent(reason.clone()),
        }
    }

    /// Transform the present value, keeping any absent reason.
    pub fn map<U, F>(self, f: F) -> Value<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Value::Present(value) => Value::Present(f(value)),
            Value::Absent(reason) => Value::Absent(reason),
        }
    }
}

impl<T> Default for Value<T> {
    fn default() -> Self {
        Value::none()
    }
}

impl<T> From<Result<T, OpError>> for Value<T> {
    fn from(result: Result<T, OpError>) -> Self {
        match result {
            Ok(value) => Value::Present(value),
            Err(OpError::Cancelled) => Value::cancelled(),
            Err(error) => Value::failed(error),
        }
    }
}
