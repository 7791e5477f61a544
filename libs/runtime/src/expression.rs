//! Expression Evaluator
//!
//! Expressions form a closed tree evaluated recursively by
//! [`Expression::evaluate`]. Evaluation never mutates the caller's scope:
//! the only expression that runs commands (a conditional case) runs them on
//! a forked context.
//!
//! # Short-circuiting
//!
//! `and`, `or` and `??` evaluate their right operand only when the left one
//! does not already decide the result, and they return the left operand's
//! raw value when it does:
//!
//! ```text
//! nil and f()   => nil      (f not called)
//! 3 or f()      => 3        (f not called)
//! 0 ?? f()      => 0        (f not called, 0 is not nil)
//! ```

use crate::command::CommandGroup;
use crate::context::Context;
use crate::errors::{Flow, RuntimeError, Signal};
use crate::value::Value;

/// `and` / `or`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOperator {
    And,
    Or,
}

impl BooleanOperator {
    /// Boolean value of the left operand that decides the result on its own
    pub fn early_exit(self) -> bool {
        match self {
            BooleanOperator::And => false,
            BooleanOperator::Or => true,
        }
    }
}

/// One guarded branch of a conditional expression
#[derive(Debug, Clone)]
pub struct Case {
    pub guard: Expression,
    pub commands: CommandGroup,
}

impl Case {
    pub fn new(guard: Expression, commands: CommandGroup) -> Self {
        Self { guard, commands }
    }
}

#[derive(Debug, Clone)]
pub enum Expression {
    /// Constant value
    Literal(Value),
    /// Variable lookup
    Identifier(String),
    /// Application of the function bound to `function`
    Call {
        function: String,
        arguments: Vec<Expression>,
    },
    /// First case whose guard holds runs its commands
    Conditional(Vec<Case>),
    Boolean {
        operator: BooleanOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// `left ?? right`
    Coalesce {
        left: Box<Expression>,
        right: Box<Expression>,
    },
}

impl Expression {
    pub fn literal(value: impl Into<Value>) -> Self {
        Expression::Literal(value.into())
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        Expression::Identifier(name.into())
    }

    pub fn call(function: impl Into<String>, arguments: Vec<Expression>) -> Self {
        Expression::Call {
            function: function.into(),
            arguments,
        }
    }

    pub fn and(left: Expression, right: Expression) -> Self {
        Expression::Boolean {
            operator: BooleanOperator::And,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn or(left: Expression, right: Expression) -> Self {
        Expression::Boolean {
            operator: BooleanOperator::Or,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn coalesce(left: Expression, right: Expression) -> Self {
        Expression::Coalesce {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn evaluate(&self, context: &Context) -> Flow<Value> {
        match self {
            Expression::Literal(value) => Ok(value.clone()),
            Expression::Identifier(name) => context
                .value(name)
                .ok_or_else(|| RuntimeError::UnknownIdentifier(name.clone()).into()),
            Expression::Call {
                function,
                arguments,
            } => apply(function, arguments, context),
            Expression::Conditional(cases) => choose(cases, context),
            Expression::Boolean {
                operator,
                left,
                right,
            } => {
                let left = left.evaluate(context)?;
                if left.to_boolean()? == operator.early_exit() {
                    return Ok(left);
                }
                right.evaluate(context)
            }
            Expression::Coalesce { left, right } => match left.evaluate(context)? {
                Value::Nil => right.evaluate(context),
                value => Ok(value),
            },
        }
    }
}

/// Evaluate arguments left to right; the first failure names its index
pub(crate) fn evaluate_arguments(arguments: &[Expression], context: &Context) -> Flow<Vec<Value>> {
    arguments
        .iter()
        .enumerate()
        .map(|(index, argument)| {
            argument
                .evaluate(context)
                .map_err(|signal| signal.within(|source| RuntimeError::Argument { index, source }))
        })
        .collect()
}

fn apply(function: &str, arguments: &[Expression], context: &Context) -> Flow<Value> {
    let args = evaluate_arguments(arguments, context)?;
    match context.value(function) {
        Some(Value::Function(callable)) => Ok(callable.call(&args)?),
        Some(other) => Err(RuntimeError::NotCallable {
            name: function.to_string(),
            kind: other.kind(),
        }
        .into()),
        None => Err(RuntimeError::UnknownFunction(function.to_string()).into()),
    }
}

fn choose(cases: &[Case], context: &Context) -> Flow<Value> {
    for (index, case) in cases.iter().enumerate() {
        let at_case = |signal: Signal| signal.within(|source| RuntimeError::Case { index, source });

        let guard = case.guard.evaluate(context).map_err(at_case)?;
        if !guard.to_boolean().map_err(|error| at_case(error.into()))? {
            continue;
        }
        let mut scope = context.fork();
        return case.commands.run(&mut scope).map_err(at_case);
    }
    Ok(Value::Nil)
}
