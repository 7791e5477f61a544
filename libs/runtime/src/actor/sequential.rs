//! Sequential Actor
//!
//! Finite-state machine over a shared [`StateGroup`]. The actor processes
//! one message at a time:
//!
//! 1. look up the current state
//! 2. bind the current state arguments to the state's parameters
//! 3. look up the handler for the message (no handler means nothing to do)
//! 4. bind the message arguments and run the handler on a forked context
//!    whose state holder is this actor
//! 5. report `exit` as [`Signal::Exit`] and wrap failures with the state and
//!    message names
//!
//! Unknown messages are not errors: an actor simply ignores messages its
//! current state does not handle.

use super::state::StateGroup;
use crate::context::{Context, Message, StateHolder};
use crate::errors::{Flow, RuntimeError, Signal};
use crate::value::Value;
use crate::Result;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::trace;

#[derive(Debug)]
struct CurrentState {
    name: String,
    args: Vec<Value>,
}

#[derive(Debug)]
pub struct SequentialActor {
    states: Arc<StateGroup>,
    current: Mutex<CurrentState>,
}

impl SequentialActor {
    /// Actor positioned at `initial`, which must exist in `states`
    pub fn new(states: Arc<StateGroup>, initial: &str) -> Result<Self> {
        if !states.contains(initial) {
            return Err(RuntimeError::UnknownState(initial.to_string()));
        }
        Ok(Self {
            states,
            current: Mutex::new(CurrentState {
                name: initial.to_string(),
                args: Vec::new(),
            }),
        })
    }

    pub fn state(&self) -> String {
        self.current.lock().name.clone()
    }

    pub fn state_args(&self) -> Vec<Value> {
        self.current.lock().args.clone()
    }

    /// Replace the arguments of the current state without transitioning
    pub(crate) fn bind_state_args(&self, args: Vec<Value>) {
        self.current.lock().args = args;
    }

    pub fn process_message(self: &Arc<Self>, context: &Context, message: &Message) -> Flow<()> {
        let (state_name, state_args) = {
            let current = self.current.lock();
            (current.name.clone(), current.args.clone())
        };
        let state = self
            .states
            .get(&state_name)
            .ok_or_else(|| RuntimeError::UnknownState(state_name.clone()))?;

        let Some(handler) = state.handler(&message.name) else {
            trace!(state = %state_name, message = %message.name, "No handler, message ignored");
            return Ok(());
        };

        let holder: Arc<dyn StateHolder> = self.clone();
        let mut scope = context.fork().with_state_holder(holder);
        scope.bind_parameters(state.parameters(), state_args);

        match handler.invoke(&mut scope, message.arguments.clone()) {
            Ok(_) | Err(Signal::Return(_)) => Ok(()),
            Err(signal) => Err(signal.within(|source| RuntimeError::Handler {
                state: state_name,
                message: message.name.clone(),
                source,
            })),
        }
    }
}

impl StateHolder for SequentialActor {
    fn set_state(&self, name: &str, args: Vec<Value>) -> Result<()> {
        if !self.states.contains(name) {
            return Err(RuntimeError::UnknownState(name.to_string()));
        }
        let mut current = self.current.lock();
        current.name = name.to_string();
        current.args = args;
        Ok(())
    }
}
