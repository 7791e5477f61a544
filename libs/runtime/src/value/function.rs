//! First-class native functions
//!
//! A [`Function`] carries its [`Signature`]: the dispatcher validates arity
//! and the kind of every argument before the body runs, so bodies can match
//! on the expected variants without re-checking counts.

use super::Value;
use crate::errors::RuntimeError;
use crate::Result;
use std::fmt;
use std::sync::Arc;

/// Kind of value accepted in an argument position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    Any,
    Number,
    List,
    Table,
    Factory,
    Function,
}

impl ArgKind {
    pub fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (ArgKind::Any, _)
                | (ArgKind::Number, Value::Number(_))
                | (ArgKind::List, Value::Pair(_))
                | (ArgKind::Table, Value::Table(_))
                | (ArgKind::Factory, Value::Factory(_))
                | (ArgKind::Function, Value::Function(_))
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            ArgKind::Any => "any value",
            ArgKind::Number => "a number",
            ArgKind::List => "a list",
            ArgKind::Table => "a table",
            ArgKind::Factory => "an actor",
            ArgKind::Function => "a function",
        }
    }
}

/// Argument contract of a function
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signature {
    /// Exactly these arguments
    Exact(Vec<ArgKind>),
    /// The fixed arguments followed by any number of `rest` arguments
    Variadic { fixed: Vec<ArgKind>, rest: ArgKind },
}

impl Signature {
    fn describe_arity(&self) -> String {
        match self {
            Signature::Exact(kinds) => kinds.len().to_string(),
            Signature::Variadic { fixed, .. } => format!("at least {}", fixed.len()),
        }
    }

    fn kind_at(&self, index: usize) -> Option<ArgKind> {
        match self {
            Signature::Exact(kinds) => kinds.get(index).copied(),
            Signature::Variadic { fixed, rest } => Some(fixed.get(index).copied().unwrap_or(*rest)),
        }
    }

    fn accepts_count(&self, count: usize) -> bool {
        match self {
            Signature::Exact(kinds) => kinds.len() == count,
            Signature::Variadic { fixed, .. } => count >= fixed.len(),
        }
    }
}

type NativeFn = dyn Fn(&[Value]) -> Result<Value> + Send + Sync;

struct FunctionInner {
    name: String,
    signature: Signature,
    body: Box<NativeFn>,
}

/// Callable value with an explicit signature
#[derive(Clone)]
pub struct Function {
    inner: Arc<FunctionInner>,
}

impl Function {
    pub fn new<F>(name: impl Into<String>, signature: Signature, body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(FunctionInner {
                name: name.into(),
                signature,
                body: Box::new(body),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn signature(&self) -> &Signature {
        &self.inner.signature
    }

    /// Check the arguments against the signature, then run the body
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        self.check(args)?;
        (self.inner.body)(args)
    }

    fn check(&self, args: &[Value]) -> Result<()> {
        let signature = &self.inner.signature;
        if !signature.accepts_count(args.len()) {
            return Err(RuntimeError::Arity {
                function: self.inner.name.clone(),
                expected: signature.describe_arity(),
                found: args.len(),
            });
        }
        for (index, arg) in args.iter().enumerate() {
            let Some(kind) = signature.kind_at(index) else {
                continue;
            };
            if !kind.accepts(arg) {
                return Err(RuntimeError::ArgumentType {
                    function: self.inner.name.clone(),
                    index,
                    expected: kind.name(),
                    found: arg.kind(),
                });
            }
        }
        Ok(())
    }

    pub fn ptr_eq(&self, other: &Function) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<function {}>", self.inner.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn double() -> Function {
        Function::new("double", Signature::Exact(vec![ArgKind::Number]), |args| match args {
            [Value::Number(n)] => Ok(Value::Number(n * 2.0)),
            _ => unreachable!("signature checked"),
        })
    }

    #[test]
    fn test_call_checks_arity() {
        let err = double().call(&[]).unwrap_err();
        assert_eq!(
            err,
            RuntimeError::Arity {
                function: "double".into(),
                expected: "1".into(),
                found: 0,
            }
        );
    }

    #[test]
    fn test_call_checks_kinds() {
        let err = double().call(&[Value::Nil]).unwrap_err();
        assert_eq!(
            err,
            RuntimeError::ArgumentType {
                function: "double".into(),
                index: 0,
                expected: "a number",
                found: "nil",
            }
        );
        assert_eq!(double().call(&[Value::Number(4.0)]).unwrap(), Value::Number(8.0));
    }

    #[test]
    fn test_variadic_rest_kind() {
        let sum = Function::new(
            "sum",
            Signature::Variadic {
                fixed: vec![],
                rest: ArgKind::Number,
            },
            |args| Ok(Value::Number(args.iter().filter_map(Value::as_number).sum())),
        );
        assert_eq!(sum.call(&[]).unwrap(), Value::Number(0.0));
        assert!(matches!(
            sum.call(&[Value::Number(1.0), Value::Nil]),
            Err(RuntimeError::ArgumentType { index: 1, .. })
        ));
    }
}
