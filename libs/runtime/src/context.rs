//! Execution Context
//!
//! The capability object threaded through every evaluation. Code running
//! inside an actor reaches the outside world only through it:
//!
//! - variable lookup and binding (copy-on-write [`Scope`])
//! - state transitions, delegated to the bound [`StateHolder`]
//! - message sending, delegated to a [`MessageSender`]
//! - actor registration, delegated to an [`ActorRegister`]
//!
//! A context is cheap to clone. [`Context::fork`] yields an isolated copy:
//! bindings made in the fork are invisible to the original, while the
//! sender, register and state holder stay shared. Until a context is
//! attached to an actor group, sends and registrations fail with
//! [`RuntimeError::Detached`], so evaluator code can run and be tested
//! without any live actors.

use crate::actor::{ActorFactory, ConcurrentActor};
use crate::builtins::Builtins;
use crate::errors::RuntimeError;
use crate::value::Value;
use crate::Result;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Message addressed to actors: a name plus argument values
#[derive(Debug, Clone)]
pub struct Message {
    pub name: String,
    pub arguments: Vec<Value>,
}

impl Message {
    pub fn new(name: impl Into<String>, arguments: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// Delivers messages on behalf of evaluated code
pub trait MessageSender: Send + Sync {
    fn send_message(&self, message: Message) -> Result<()>;
}

/// Accepts actors spawned by evaluated code
pub trait ActorRegister: Send + Sync {
    fn register_actor(&self, actor: Arc<ConcurrentActor>, args: Vec<Value>) -> Result<()>;
}

/// Actor whose current state `set` commands change
pub trait StateHolder: Send + Sync {
    /// Switch to `name`, binding `args` to its parameters
    ///
    /// Fails with [`RuntimeError::UnknownState`] and leaves the current state
    /// untouched when no such state exists.
    fn set_state(&self, name: &str, args: Vec<Value>) -> Result<()>;
}

struct Detached;

impl MessageSender for Detached {
    fn send_message(&self, _message: Message) -> Result<()> {
        Err(RuntimeError::Detached)
    }
}

impl ActorRegister for Detached {
    fn register_actor(&self, _actor: Arc<ConcurrentActor>, _args: Vec<Value>) -> Result<()> {
        Err(RuntimeError::Detached)
    }
}

/// Copy-on-write variable bindings
#[derive(Clone, Default)]
pub struct Scope {
    values: Arc<HashMap<String, Value>>,
}

impl Scope {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        Arc::make_mut(&mut self.values).insert(name.into(), value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Capability-scoped evaluation context
#[derive(Clone)]
pub struct Context {
    scope: Scope,
    state_holder: Option<Arc<dyn StateHolder>>,
    sender: Arc<dyn MessageSender>,
    register: Arc<dyn ActorRegister>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Empty, detached context
    pub fn new() -> Self {
        let detached = Arc::new(Detached);
        Self {
            scope: Scope::default(),
            state_holder: None,
            sender: detached.clone(),
            register: detached,
        }
    }

    /// Detached context whose scope holds every builtin under its name
    pub fn with_builtins(builtins: &Builtins) -> Self {
        let mut context = Self::new();
        for (name, function) in builtins.iter() {
            context.set_value(name, Value::Function(function.clone()));
        }
        context
    }

    /// Same bindings, routing sends and registrations to the given targets
    pub fn with_dispatch(
        mut self,
        sender: Arc<dyn MessageSender>,
        register: Arc<dyn ActorRegister>,
    ) -> Self {
        self.sender = sender;
        self.register = register;
        self
    }

    /// Same bindings, routing `set` to `holder`
    pub fn with_state_holder(mut self, holder: Arc<dyn StateHolder>) -> Self {
        self.state_holder = Some(holder);
        self
    }

    /// Isolated copy: independent scope, shared sender, register and holder
    pub fn fork(&self) -> Context {
        self.clone()
    }

    pub fn value(&self, name: &str) -> Option<Value> {
        self.scope.get(name).cloned()
    }

    pub fn set_value(&mut self, name: impl Into<String>, value: Value) {
        self.scope.set(name, value);
    }

    /// Bind `args` to `parameters` in order
    ///
    /// Missing arguments bind nil; extra arguments are ignored.
    pub fn bind_parameters(&mut self, parameters: &[String], args: Vec<Value>) {
        let mut args = args.into_iter();
        for parameter in parameters {
            let value = args.next().unwrap_or_default();
            self.scope.set(parameter.as_str(), value);
        }
    }

    pub fn send_message(&self, name: &str, args: Vec<Value>) -> Result<()> {
        self.sender.send_message(Message::new(name, args))
    }

    /// Instantiate `factory` and hand the new actor to the register
    pub fn register_actor(&self, factory: &ActorFactory, args: Vec<Value>) -> Result<()> {
        let actor = factory.instantiate()?;
        self.register.register_actor(actor, args)
    }

    pub fn set_state(&self, name: &str, args: Vec<Value>) -> Result<()> {
        match &self.state_holder {
            Some(holder) => holder.set_state(name, args),
            None => Err(RuntimeError::NoStateHolder),
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.scope.values.keys().collect();
        names.sort();
        f.debug_struct("Context")
            .field("bindings", &names)
            .field("state_holder", &self.state_holder.is_some())
            .finish()
    }
}
