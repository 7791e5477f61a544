//! Program driver
//!
//! Turns a set of actor definitions into a running actor group:
//!
//! 1. one [`ActorFactory`] per definition, positioned at the configured
//!    initial state and bound by actor name in the root scope
//! 2. one root instance of every definition registered in the group
//! 3. the group is started and receives the initial message
//! 4. the run ends at quiescence, on a user `exit`, or on the first handler
//!    failure (unless a custom [`ErrorHandler`] takes failures over)
//!
//! The group is shut down before [`Program::run`] returns.

use crate::actor::{
    ActorFactory, ActorGroup, ActorId, Dependencies, ErrorHandler, PendingCounter, StateGroup,
};
use crate::builtins::Builtins;
use crate::context::{Context, Message};
use crate::errors::RuntimeError;
use crate::value::Value;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Notify;
use tracing::{error, info};
use troupe_config::RuntimeConfig;

/// Errors that stop a program from being built or from completing
#[derive(Debug, Error)]
pub enum ProgramError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("actor '{0}' is defined more than once")]
    DuplicateActor(String),

    #[error("actor '{actor}': {source}")]
    Definition { actor: String, source: RuntimeError },

    #[error("{actor} failed: {source}")]
    Actor { actor: ActorId, source: RuntimeError },

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// How a successful run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// No message left in flight
    Idle,
    /// An actor ran `exit`
    Exited,
}

/// Named actor with its state table
#[derive(Debug, Clone)]
pub struct ActorDefinition {
    pub name: String,
    pub states: StateGroup,
}

impl ActorDefinition {
    pub fn new(name: impl Into<String>, states: StateGroup) -> Self {
        Self {
            name: name.into(),
            states,
        }
    }
}

#[derive(Debug, Clone)]
enum Stop {
    Exited(ActorId),
    Failed(ActorId, RuntimeError),
}

enum Policy {
    HaltOnError,
    Delegate(Arc<dyn ErrorHandler>),
}

/// Error handler every actor of the program reports to
///
/// Exits always stop the run. Failures stop it under [`Policy::HaltOnError`]
/// and are forwarded otherwise.
struct Supervisor {
    policy: Mutex<Policy>,
    stop: Mutex<Option<Stop>>,
    stopped: Notify,
}

impl Supervisor {
    fn new() -> Self {
        Self {
            policy: Mutex::new(Policy::HaltOnError),
            stop: Mutex::new(None),
            stopped: Notify::new(),
        }
    }

    fn halt(&self, stop: Stop) {
        let mut current = self.stop.lock();
        if current.is_none() {
            *current = Some(stop);
            self.stopped.notify_waiters();
        }
    }

    async fn stopped(&self) -> Stop {
        loop {
            let notified = self.stopped.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let stop = self.stop.lock().clone();
            if let Some(stop) = stop {
                return stop;
            }
            notified.await;
        }
    }
}

impl ErrorHandler for Supervisor {
    fn handle_error(&self, actor: &ActorId, error: RuntimeError) {
        let delegate = match &*self.policy.lock() {
            Policy::HaltOnError => None,
            Policy::Delegate(handler) => Some(handler.clone()),
        };
        match delegate {
            Some(handler) => handler.handle_error(actor, error),
            None => {
                error!(actor_id = %actor, error = %error, "Actor failed, halting program");
                self.halt(Stop::Failed(actor.clone(), error));
            }
        }
    }

    fn handle_exit(&self, actor: &ActorId) {
        let delegate = match &*self.policy.lock() {
            Policy::HaltOnError => None,
            Policy::Delegate(handler) => Some(handler.clone()),
        };
        if let Some(handler) = delegate {
            handler.handle_exit(actor);
        }
        info!(actor_id = %actor, "Exit requested");
        self.halt(Stop::Exited(actor.clone()));
    }
}

pub struct Program {
    group: Arc<ActorGroup>,
    root: Context,
    factories: Vec<ActorFactory>,
    pending: Arc<PendingCounter>,
    supervisor: Arc<Supervisor>,
    initial_message: String,
}

impl Program {
    pub fn new(
        definitions: Vec<ActorDefinition>,
        builtins: &Builtins,
        config: &RuntimeConfig,
    ) -> Result<Self, ProgramError> {
        config
            .validate()
            .map_err(|error| ProgramError::Config(format!("{:#}", error)))?;

        let pending = Arc::new(PendingCounter::new());
        let supervisor = Arc::new(Supervisor::new());
        let dependencies = Dependencies::new(pending.clone(), supervisor.clone());

        let mut root = Context::with_builtins(builtins);
        let mut seen = HashSet::new();
        let mut factories = Vec::with_capacity(definitions.len());
        for definition in definitions {
            if !seen.insert(definition.name.clone()) {
                return Err(ProgramError::DuplicateActor(definition.name));
            }
            let factory = ActorFactory::new(
                definition.name.clone(),
                Arc::new(definition.states),
                config.initial_state.clone(),
                dependencies.clone(),
                config.inbox_capacity,
            )
            .map_err(|source| ProgramError::Definition {
                actor: definition.name.clone(),
                source,
            })?;
            root.set_value(definition.name, Value::Factory(factory.clone()));
            factories.push(factory);
        }

        let group = ActorGroup::new();
        for factory in &factories {
            group.register_actor(factory.instantiate()?, Vec::new())?;
        }

        Ok(Self {
            group,
            root,
            factories,
            pending,
            supervisor,
            initial_message: config.initial_message.clone(),
        })
    }

    /// Forward handler failures to `handler` instead of halting the run
    pub fn with_error_handler(self, handler: Arc<dyn ErrorHandler>) -> Self {
        *self.supervisor.policy.lock() = Policy::Delegate(handler);
        self
    }

    pub fn group(&self) -> &Arc<ActorGroup> {
        &self.group
    }

    pub fn factory(&self, name: &str) -> Option<&ActorFactory> {
        self.factories.iter().find(|factory| factory.name() == name)
    }

    pub async fn run(self) -> Result<Completion, ProgramError> {
        self.group.start(&self.root)?;
        info!(
            actors = self.group.len(),
            message = %self.initial_message,
            "Program started"
        );
        self.group
            .send_message(Message::new(self.initial_message.as_str(), Vec::new()))?;

        let outcome = tokio::select! {
            biased;
            stop = self.supervisor.stopped() => match stop {
                Stop::Exited(_) => Ok(Completion::Exited),
                Stop::Failed(actor, source) => Err(ProgramError::Actor { actor, source }),
            },
            _ = self.pending.wait_idle() => Ok(Completion::Idle),
        };

        if !matches!(outcome, Ok(Completion::Idle)) {
            self.group.abort();
        }
        self.group.shutdown().await;
        info!(outcome = ?outcome, "Program finished");
        outcome
    }
}
