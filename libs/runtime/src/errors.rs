//! Error types for evaluation, state transitions and actor processing
//!
//! Failures are reported through [`RuntimeError`]. The two control-flow
//! sentinels of the language (an early `return` and a user `exit`) are not
//! errors: they travel next to failures in [`Signal`], so wrapping a failure
//! with positional context can never hide a sentinel from the code that has
//! to react to it.

use crate::value::Value;
use thiserror::Error;

/// Errors raised while evaluating expressions, running commands or
/// processing actor messages
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeError {
    /// Identifier not bound in the current scope
    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),

    /// Called name not bound in the current scope
    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    /// Called name is bound to something other than a function
    #[error("'{name}' is {kind}, not a function")]
    NotCallable { name: String, kind: &'static str },

    /// Wrong number of arguments for a function
    #[error("{function} expects {expected} argument(s), got {found}")]
    Arity {
        function: String,
        expected: String,
        found: usize,
    },

    /// Argument of the wrong kind for a function
    #[error("{function} expects {expected} for argument {index}, got {found}")]
    ArgumentType {
        function: String,
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    /// Function rejected otherwise well-typed arguments
    #[error("{function}: {reason}")]
    Domain { function: String, reason: String },

    /// Value has no boolean interpretation
    #[error("{0} cannot be used as a boolean")]
    NotBoolean(&'static str),

    /// Values cannot be compared with each other
    #[error("cannot compare {left} with {right}")]
    Incomparable {
        left: &'static str,
        right: &'static str,
    },

    /// Value cannot be used as a table key
    #[error("invalid table key: {0}")]
    InvalidKey(String),

    /// Table lookup for a missing key
    #[error("key {0} not found")]
    UnknownKey(String),

    /// `start` applied to something other than an actor factory
    #[error("{0} is not an actor factory")]
    NotFactory(&'static str),

    /// Transition to, or construction at, a state the actor does not declare
    #[error("unknown state '{0}'")]
    UnknownState(String),

    /// State transition requested outside of an actor
    #[error("no actor is bound to receive state transitions")]
    NoStateHolder,

    /// Send or spawn requested from a context not attached to an actor group
    #[error("context is not attached to an actor group")]
    Detached,

    /// Inbox closed before the message could be delivered
    #[error("inbox of {0} is closed")]
    InboxClosed(String),

    /// Actor processing loop started twice
    #[error("{0} was already started")]
    AlreadyStarted(String),

    /// Failure while evaluating a call argument
    #[error("argument {index}: {source}")]
    Argument {
        index: usize,
        source: Box<RuntimeError>,
    },

    /// Failure while evaluating a conditional case guard
    #[error("case {index}: {source}")]
    Case {
        index: usize,
        source: Box<RuntimeError>,
    },

    /// Failure of one command inside a command group
    #[error("command {index}: {source}")]
    Command {
        index: usize,
        source: Box<RuntimeError>,
    },

    /// Failure of a message handler
    #[error("state '{state}', message '{message}': {source}")]
    Handler {
        state: String,
        message: String,
        source: Box<RuntimeError>,
    },
}

impl RuntimeError {
    /// Innermost error, skipping positional wrappers
    pub fn root_cause(&self) -> &RuntimeError {
        let mut current = self;
        loop {
            match current {
                RuntimeError::Argument { source, .. }
                | RuntimeError::Case { source, .. }
                | RuntimeError::Command { source, .. }
                | RuntimeError::Handler { source, .. } => current = source,
                other => return other,
            }
        }
    }
}

/// Non-local outcome of running commands or evaluating expressions
#[derive(Debug, Clone)]
pub enum Signal {
    /// `return` stopped the current command group; carries its value
    Return(Value),
    /// `exit` stops the whole program
    Exit,
    /// A genuine failure
    Error(RuntimeError),
}

impl Signal {
    /// Wrap the failure with positional context; sentinels pass through untouched
    pub fn within(self, wrap: impl FnOnce(Box<RuntimeError>) -> RuntimeError) -> Self {
        match self {
            Signal::Error(error) => Signal::Error(wrap(Box::new(error))),
            sentinel => sentinel,
        }
    }

    pub fn is_exit(&self) -> bool {
        matches!(self, Signal::Exit)
    }
}

impl From<RuntimeError> for Signal {
    fn from(error: RuntimeError) -> Self {
        Signal::Error(error)
    }
}

/// Result of code that may stop early through a [`Signal`]
pub type Flow<T> = std::result::Result<T, Signal>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_within_wraps_errors_only() {
        let wrapped = Signal::from(RuntimeError::UnknownIdentifier("x".into()))
            .within(|source| RuntimeError::Argument { index: 2, source });
        match wrapped {
            Signal::Error(RuntimeError::Argument { index, source }) => {
                assert_eq!(index, 2);
                assert_eq!(*source, RuntimeError::UnknownIdentifier("x".into()));
            }
            other => panic!("unexpected signal: {:?}", other),
        }

        let exit = Signal::Exit.within(|source| RuntimeError::Command { index: 0, source });
        assert!(exit.is_exit());

        let early = Signal::Return(Value::Number(1.0))
            .within(|source| RuntimeError::Case { index: 0, source });
        assert!(matches!(early, Signal::Return(Value::Number(n)) if n == 1.0));
    }

    #[test]
    fn test_root_cause_and_message() {
        let error = RuntimeError::Handler {
            state: "Idle".into(),
            message: "go".into(),
            source: Box::new(RuntimeError::Command {
                index: 1,
                source: Box::new(RuntimeError::UnknownState("Gone".into())),
            }),
        };
        assert_eq!(error.root_cause(), &RuntimeError::UnknownState("Gone".into()));
        assert_eq!(
            error.to_string(),
            "state 'Idle', message 'go': command 1: unknown state 'Gone'"
        );
    }
}
