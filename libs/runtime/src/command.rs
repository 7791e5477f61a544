//! Command Engine
//!
//! Commands run in order against a mutable [`Context`]. Each command
//! produces a value (the bound value for `let`, the expression value for an
//! expression statement, nil otherwise); a [`CommandGroup`] yields the value
//! of the last command it ran.
//!
//! `return` and `exit` are not failures. `return` stops the innermost
//! command group, which then reports success with the returned value;
//! `exit` unwinds everything up to the actor loop.

use crate::context::Context;
use crate::errors::{Flow, RuntimeError, Signal};
use crate::expression::{evaluate_arguments, Expression};
use crate::value::Value;
use tracing::trace;

#[derive(Debug, Clone)]
pub enum Command {
    /// Bind a value in the current scope
    Let { name: String, value: Expression },
    /// Broadcast a message
    Send {
        message: String,
        arguments: Vec<Expression>,
    },
    /// Transition the current actor
    Set {
        state: String,
        arguments: Vec<Expression>,
    },
    /// Spawn an actor from a factory value
    Start {
        factory: Expression,
        arguments: Vec<Expression>,
    },
    /// Stop the current command group
    Return(Option<Expression>),
    /// Stop the program
    Exit,
    /// Expression statement
    Evaluate(Expression),
}

impl Command {
    pub fn execute(&self, context: &mut Context) -> Flow<Value> {
        match self {
            Command::Let { name, value } => {
                let value = value.evaluate(context)?;
                context.set_value(name.as_str(), value.clone());
                Ok(value)
            }
            Command::Send { message, arguments } => {
                let args = evaluate_arguments(arguments, context)?;
                trace!(message = %message, arguments = args.len(), "send");
                context.send_message(message, args)?;
                Ok(Value::Nil)
            }
            Command::Set { state, arguments } => {
                let args = evaluate_arguments(arguments, context)?;
                trace!(state = %state, "set");
                context.set_state(state, args)?;
                Ok(Value::Nil)
            }
            Command::Start { factory, arguments } => {
                let factory = match factory.evaluate(context)? {
                    Value::Factory(factory) => factory,
                    other => return Err(RuntimeError::NotFactory(other.kind()).into()),
                };
                let args = evaluate_arguments(arguments, context)?;
                trace!(actor = %factory.name(), "start");
                context.register_actor(&factory, args)?;
                Ok(Value::Nil)
            }
            Command::Return(value) => {
                let value = match value {
                    Some(expression) => expression.evaluate(context)?,
                    None => Value::Nil,
                };
                Err(Signal::Return(value))
            }
            Command::Exit => Err(Signal::Exit),
            Command::Evaluate(expression) => expression.evaluate(context),
        }
    }
}

/// Ordered command sequence
#[derive(Debug, Clone, Default)]
pub struct CommandGroup {
    commands: Vec<Command>,
}

impl CommandGroup {
    pub fn new(commands: Vec<Command>) -> Self {
        Self { commands }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Run every command in order
    ///
    /// A failure aborts the remaining commands and is wrapped with the index
    /// of the failing command. `return` aborts the remaining commands and
    /// counts as success. `exit` propagates unchanged.
    pub fn run(&self, context: &mut Context) -> Flow<Value> {
        let mut last = Value::Nil;
        for (index, command) in self.commands.iter().enumerate() {
            match command.execute(context) {
                Ok(value) => last = value,
                Err(Signal::Return(value)) => return Ok(value),
                Err(signal) => {
                    return Err(signal.within(|source| RuntimeError::Command { index, source }))
                }
            }
        }
        Ok(last)
    }
}

impl FromIterator<Command> for CommandGroup {
    fn from_iter<T: IntoIterator<Item = Command>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Command group with named parameters, the body of a message handler
#[derive(Debug, Clone, Default)]
pub struct ParameterizedCommandGroup {
    parameters: Vec<String>,
    commands: CommandGroup,
}

impl ParameterizedCommandGroup {
    pub fn new(parameters: Vec<String>, commands: CommandGroup) -> Self {
        Self {
            parameters,
            commands,
        }
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn commands(&self) -> &CommandGroup {
        &self.commands
    }

    /// Bind `args` to the parameters (padded with nil, truncated), then run
    pub fn invoke(&self, context: &mut Context, args: Vec<Value>) -> Flow<Value> {
        context.bind_parameters(&self.parameters, args);
        self.commands.run(context)
    }
}
