//! Shared builders for runtime integration tests

#![allow(dead_code)]

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use troupe_config::RuntimeConfig;
use troupe_runtime::{
    ArgKind, Builtins, Command, Expression, Function, PendingCounter, Signature, Value,
};

/// Values passed to the `record` builtin, in call order
pub type Recorded = Arc<Mutex<Vec<Value>>>;

/// Standard builtins plus `record`, which stores its single argument
pub fn recording_builtins() -> (Builtins, Recorded) {
    let seen: Recorded = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let record = Function::new("record", Signature::Exact(vec![ArgKind::Any]), move |args| {
        sink.lock().push(args[0].clone());
        Ok(Value::Nil)
    });
    (Builtins::standard().with_function(record), seen)
}

pub fn config(initial_state: &str, initial_message: &str, inbox_capacity: usize) -> RuntimeConfig {
    RuntimeConfig {
        initial_state: initial_state.to_string(),
        initial_message: initial_message.to_string(),
        inbox_capacity,
        ..RuntimeConfig::default()
    }
}

pub fn n(value: f64) -> Expression {
    Expression::literal(value)
}

pub fn text(value: &str) -> Expression {
    Expression::Literal(Value::text(value))
}

pub fn var(name: &str) -> Expression {
    Expression::identifier(name)
}

pub fn call(function: &str, arguments: Vec<Expression>) -> Expression {
    Expression::call(function, arguments)
}

pub fn record(value: Expression) -> Command {
    Command::Evaluate(call("record", vec![value]))
}

pub fn send(message: &str, arguments: Vec<Expression>) -> Command {
    Command::Send {
        message: message.to_string(),
        arguments,
    }
}

pub fn set(state: &str, arguments: Vec<Expression>) -> Command {
    Command::Set {
        state: state.to_string(),
        arguments,
    }
}

pub fn start(factory: &str, arguments: Vec<Expression>) -> Command {
    Command::Start {
        factory: var(factory),
        arguments,
    }
}

pub async fn settle(pending: &PendingCounter) {
    tokio::time::timeout(Duration::from_secs(5), pending.wait_idle())
        .await
        .expect("actors did not go idle");
}
