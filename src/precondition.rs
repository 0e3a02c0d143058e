//! Precondition pipeline evaluated once before a task body runs.
//!
//! Evaluators run in registration order and every one of them runs; none short-circuits.
//! Their instructions are folded with fail > cancel > continue precedence, and failures
//! are aggregated into [`OpError::Multiple`] when more than one evaluator fails.

use crate::error::OpError;

/// What an evaluator wants to happen to the task.
#[derive(Debug, Clone)]
pub enum Instruction {
    Continue,
    Cancel,
    Fail(OpError),
}

impl Instruction {
    pub fn is_continue(&self) -> bool {
        matches!(self, Instruction::Continue)
    }
}

type Evaluator<C> = Box<dyn FnOnce(&C) -> Instruction + Send>;

/// Ordered, single-use list of evaluators over a context `C`.
///
/// For tasks the context is the [`Task`](crate::Task) itself, so an evaluator can inspect
/// the resolved input or the cancelled flag.
///
/// # Examples
///
/// ```
/// use taskline::{Instruction, OpError, Preconditions};
///
/// let mut checks = Preconditions::new();
/// checks.push(|n: &i32| if *n > 0 { Instruction::Continue } else { Instruction::Cancel });
/// checks.push(|n: &i32| if *n < 100 { Instruction::Continue } else {
///     Instruction::Fail(OpError::msg("too large"))
/// });
///
/// assert!(checks.evaluate(&5).is_continue());
/// assert!(checks.is_empty()); // single use
/// ```
pub struct Preconditions<C> {
    evaluators: Vec<Evaluator<C>>,
}

impl<C> Default for Preconditions<C> {
    fn default() -> Self {
        Self {
            evaluators: Vec::new(),
        }
    }
}

impl<C> Preconditions<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<F>(&mut self, evaluator: F)
    where
        F: FnOnce(&C) -> Instruction + Send + 'static,
    {
        self.evaluators.push(Box::new(evaluator));
    }

    pub fn len(&self) -> usize {
        self.evaluators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evaluators.is_empty()
    }

    /// Run every evaluator against `context` and fold the instructions.
    ///
    /// Consumes the evaluators: a second call with nothing pushed in between returns
    /// [`Instruction::Continue`].
    pub fn evaluate(&mut self, context: &C) -> Instruction {
        let mut errors = Vec::new();
        let mut cancel = false;

        for evaluator in self.evaluators.drain(..) {
            match evaluator(context) {
                Instruction::Continue => {}
                // A cancel only counts while no failure has been seen
                Instruction::Cancel => cancel |= errors.is_empty(),
                Instruction::Fail(error) => errors.push(error),
            }
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(
            failures = errors.len(),
            cancel,
            "precondition evaluation complete"
        );

        match errors.len() {
            0 if cancel => Instruction::Cancel,
            0 => Instruction::Continue,
            1 => Instruction::Fail(errors.remove(0)),
            _ => Instruction::Fail(OpError::Multiple(errors)),
        }
    }
}

impl<C> std::fmt::Debug for Preconditions<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preconditions")
            .field("pending", &self.evaluators.len())
            .finish()
    }
}
