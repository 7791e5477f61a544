//! Value Model
//!
//! The dynamic values the language computes with:
//!
//! - **Nil**: the absent value
//! - **Number**: one `f64`; also the language's boolean (0 is false)
//! - **Pair**: an immutable cons [`List`]; text is a list of code points
//! - **Table**: a copy-on-write [`HashTable`]
//! - **Factory**: an [`ActorFactory`] that `start` instantiates
//! - **Function**: a native [`Function`] with an explicit signature
//!
//! Values never change once produced. Equality, ordering and boolean
//! coercion are fallible: comparing kinds that have no ordering is a type
//! error rather than a silent `false`.

pub mod function;
pub mod list;
pub mod table;

pub use function::{ArgKind, Function, Signature};
pub use list::List;
pub use table::{HashTable, Key};

use crate::actor::ActorFactory;
use crate::errors::RuntimeError;
use crate::Result;
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Nil,
    Number(f64),
    Pair(List),
    Table(HashTable),
    Factory(ActorFactory),
    Function(Function),
}

impl Value {
    /// Text value (a list of code points)
    pub fn text(text: &str) -> Value {
        Value::Pair(List::from_text(text))
    }

    pub fn list<I: IntoIterator<Item = Value>>(values: I) -> Value {
        Value::Pair(List::from_values(values))
    }

    pub fn boolean(flag: bool) -> Value {
        Value::Number(if flag { 1.0 } else { 0.0 })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Number(_) => "number",
            Value::Pair(_) => "list",
            Value::Table(_) => "table",
            Value::Factory(_) => "actor",
            Value::Function(_) => "function",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Boolean coercion
    pub fn to_boolean(&self) -> Result<bool> {
        match self {
            Value::Nil => Ok(false),
            Value::Number(n) => Ok(*n != 0.0),
            Value::Pair(list) => Ok(!list.is_empty()),
            Value::Table(table) => Ok(!table.is_empty()),
            Value::Factory(_) => Ok(true),
            Value::Function(_) => Err(RuntimeError::NotBoolean("function")),
        }
    }

    /// Language-level equality
    ///
    /// Values of different kinds are never equal. Functions and actor
    /// factories cannot be compared with their own kind; the failure
    /// propagates out of enclosing lists and tables.
    pub fn equals(&self, other: &Value) -> Result<bool> {
        match (self, other) {
            (Value::Nil, Value::Nil) => Ok(true),
            (Value::Number(a), Value::Number(b)) => Ok(a == b),
            (Value::Pair(a), Value::Pair(b)) => {
                if a.ptr_eq(b) {
                    return Ok(true);
                }
                let mut left = a.iter();
                let mut right = b.iter();
                loop {
                    match (left.next(), right.next()) {
                        (None, None) => return Ok(true),
                        (Some(x), Some(y)) => {
                            if !x.equals(y)? {
                                return Ok(false);
                            }
                        }
                        _ => return Ok(false),
                    }
                }
            }
            (Value::Table(a), Value::Table(b)) => {
                if a.len() != b.len() {
                    return Ok(false);
                }
                for ((key_a, value_a), (key_b, value_b)) in a.iter().zip(b.iter()) {
                    if key_a != key_b || !value_a.equals(value_b)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (Value::Factory(_), Value::Factory(_)) | (Value::Function(_), Value::Function(_)) => {
                Err(RuntimeError::Incomparable {
                    left: self.kind(),
                    right: other.kind(),
                })
            }
            _ => Ok(false),
        }
    }

    /// Language-level ordering
    ///
    /// Defined for nil against nil, numbers against numbers and lists
    /// against lists. Lists order lexicographically; a proper prefix orders
    /// before the longer list.
    pub fn compare(&self, other: &Value) -> Result<Ordering> {
        let incomparable = || RuntimeError::Incomparable {
            left: self.kind(),
            right: other.kind(),
        };
        match (self, other) {
            (Value::Nil, Value::Nil) => Ok(Ordering::Equal),
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b).ok_or_else(incomparable),
            (Value::Pair(a), Value::Pair(b)) => {
                let mut left = a.iter();
                let mut right = b.iter();
                loop {
                    match (left.next(), right.next()) {
                        (None, None) => return Ok(Ordering::Equal),
                        (None, Some(_)) => return Ok(Ordering::Less),
                        (Some(_), None) => return Ok(Ordering::Greater),
                        (Some(x), Some(y)) => match x.compare(y)? {
                            Ordering::Equal => continue,
                            decided => return Ok(decided),
                        },
                    }
                }
            }
            _ => Err(incomparable()),
        }
    }
}

/// Structural identity, for assertions and caches
///
/// Unlike [`Value::equals`] this never fails: functions and factories are
/// equal only to themselves.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Factory(a), Value::Factory(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Table(a), Value::Table(b)) => {
                a.ptr_eq(b)
                    || (a.len() == b.len()
                        && a.iter().zip(b.iter()).all(|(x, y)| x.0 == y.0 && x.1 == y.1))
            }
            (Value::Pair(a), Value::Pair(b)) => {
                a.ptr_eq(b) || (a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y))
            }
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Nil, Value::Nil) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Number(n) => write_number(f, *n),
            Value::Pair(list) => {
                if !list.is_empty() {
                    if let Some(text) = list.to_text() {
                        return write!(f, "{}", text);
                    }
                }
                write!(f, "[")?;
                for (index, item) in list.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write_nested(f, item)?;
                }
                write!(f, "]")
            }
            Value::Table(table) => {
                write!(f, "{{")?;
                for (index, (key, item)) in table.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: ", key)?;
                    write_nested(f, item)?;
                }
                write!(f, "}}")
            }
            Value::Factory(factory) => write!(f, "<actor {}>", factory.name()),
            Value::Function(function) => write!(f, "<function {}>", function.name()),
        }
    }
}

fn write_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        write!(f, "{}", n as i64)
    } else {
        write!(f, "{}", n)
    }
}

// text inside containers is quoted so it stays distinguishable from numbers
fn write_nested(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Pair(list) if !list.is_empty() => match list.to_text() {
            Some(text) => write!(f, "{:?}", text),
            None => write!(f, "{}", value),
        },
        other => write!(f, "{}", other),
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Value::boolean(flag)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::text(text)
    }
}

impl From<List> for Value {
    fn from(list: List) -> Self {
        Value::Pair(list)
    }
}

impl From<HashTable> for Value {
    fn from(table: HashTable) -> Self {
        Value::Table(table)
    }
}

impl From<Function> for Value {
    fn from(function: Function) -> Self {
        Value::Function(function)
    }
}

impl From<ActorFactory> for Value {
    fn from(factory: ActorFactory) -> Self {
        Value::Factory(factory)
    }
}
