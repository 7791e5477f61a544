//! Builtin function registry
//!
//! The registry is built explicitly and injected into the root context, where
//! builtins live in the same scope as user bindings: they can be shadowed by
//! `let` and passed around like any other value.
//!
//! ## Standard builtins
//!
//! | Group      | Names                                              |
//! |------------|----------------------------------------------------|
//! | arithmetic | `+` `-` `*` `/` `%`                                |
//! | comparison | `=` `!=` `<` `<=` `>` `>=` `not`                   |
//! | lists      | `list` `cons` `head` `tail` `size` `append` `reverse` `nth` `slice` |
//! | text       | `text` `print`                                     |
//! | tables     | `table` `with` `item` `has` `without` `keys`        |
//!
//! Every builtin declares a [`Signature`]; argument counts and kinds are
//! checked before the body runs.

use crate::errors::RuntimeError;
use crate::value::{ArgKind, Function, HashTable, List, Signature, Value};
use crate::Result;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Immutable set of named functions for the root scope
#[derive(Debug, Clone, Default)]
pub struct Builtins {
    functions: BTreeMap<String, Function>,
}

impl Builtins {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the standard library
    pub fn standard() -> Self {
        let mut builtins = Self::new();
        builtins.register_arithmetic();
        builtins.register_comparison();
        builtins.register_lists();
        builtins.register_text();
        builtins.register_tables();
        builtins
    }

    /// Add a function under its own name, replacing any previous one
    pub fn with_function(mut self, function: Function) -> Self {
        self.insert(function);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Function)> {
        self.functions.iter().map(|(name, f)| (name.as_str(), f))
    }

    fn insert(&mut self, function: Function) {
        self.functions.insert(function.name().to_string(), function);
    }

    fn define<F>(&mut self, name: &str, signature: Signature, body: F)
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.insert(Function::new(name, signature, body));
    }

    fn register_arithmetic(&mut self) {
        let numbers = || Signature::Variadic {
            fixed: vec![],
            rest: ArgKind::Number,
        };
        let binary = || Signature::Exact(vec![ArgKind::Number, ArgKind::Number]);

        self.define("+", numbers(), |args| Ok(Value::Number(numbers_of(args).sum())));
        self.define("*", numbers(), |args| {
            Ok(Value::Number(numbers_of(args).product()))
        });
        self.define(
            "-",
            Signature::Variadic {
                fixed: vec![ArgKind::Number],
                rest: ArgKind::Number,
            },
            |args| {
                let mut values = numbers_of(args);
                let first = values.next().unwrap_or(0.0);
                if args.len() == 1 {
                    return Ok(Value::Number(-first));
                }
                Ok(Value::Number(values.fold(first, |acc, n| acc - n)))
            },
        );
        self.define("/", binary(), |args| {
            let (a, b) = number_pair(args);
            if b == 0.0 {
                return Err(domain("/", "division by zero"));
            }
            Ok(Value::Number(a / b))
        });
        self.define("%", binary(), |args| {
            let (a, b) = number_pair(args);
            if b == 0.0 {
                return Err(domain("%", "division by zero"));
            }
            Ok(Value::Number(a % b))
        });
    }

    fn register_comparison(&mut self) {
        let any_pair = || Signature::Exact(vec![ArgKind::Any, ArgKind::Any]);

        self.define("=", any_pair(), |args| Ok(Value::boolean(args[0].equals(&args[1])?)));
        self.define("!=", any_pair(), |args| {
            Ok(Value::boolean(!args[0].equals(&args[1])?))
        });
        for (name, accept) in [
            ("<", ordering_is(&[Ordering::Less])),
            ("<=", ordering_is(&[Ordering::Less, Ordering::Equal])),
            (">", ordering_is(&[Ordering::Greater])),
            (">=", ordering_is(&[Ordering::Greater, Ordering::Equal])),
        ] {
            self.define(name, any_pair(), move |args| {
                Ok(Value::boolean(accept(args[0].compare(&args[1])?)))
            });
        }
        self.define("not", Signature::Exact(vec![ArgKind::Any]), |args| {
            Ok(Value::boolean(!args[0].to_boolean()?))
        });
    }

    fn register_lists(&mut self) {
        let one_list = || Signature::Exact(vec![ArgKind::List]);

        self.define(
            "list",
            Signature::Variadic {
                fixed: vec![],
                rest: ArgKind::Any,
            },
            |args| Ok(Value::list(args.iter().cloned())),
        );
        self.define(
            "cons",
            Signature::Exact(vec![ArgKind::Any, ArgKind::List]),
            |args| Ok(Value::Pair(List::cons(args[0].clone(), list_at(args, 1).clone()))),
        );
        // head and tail of the empty list are nil and the empty list
        self.define("head", one_list(), |args| {
            Ok(list_at(args, 0).head().cloned().unwrap_or_default())
        });
        self.define("tail", one_list(), |args| {
            Ok(Value::Pair(list_at(args, 0).tail().unwrap_or_default()))
        });
        self.define("reverse", one_list(), |args| Ok(Value::Pair(list_at(args, 0).reverse())));
        self.define(
            "append",
            Signature::Variadic {
                fixed: vec![],
                rest: ArgKind::List,
            },
            |args| {
                let joined = args.iter().rev().fold(List::empty(), |tail, arg| match arg {
                    Value::Pair(front) => front.append(&tail),
                    _ => tail,
                });
                Ok(Value::Pair(joined))
            },
        );
        self.define("size", Signature::Exact(vec![ArgKind::Any]), |args| match &args[0] {
            Value::Pair(list) => Ok(Value::Number(list.len() as f64)),
            Value::Table(table) => Ok(Value::Number(table.len() as f64)),
            other => Err(RuntimeError::ArgumentType {
                function: "size".into(),
                index: 0,
                expected: "a list or a table",
                found: other.kind(),
            }),
        });
        self.define(
            "nth",
            Signature::Exact(vec![ArgKind::List, ArgKind::Number]),
            |args| {
                let index = args[1].as_number().unwrap_or(-1.0);
                if index < 0.0 || index.fract() != 0.0 {
                    return Err(domain("nth", format!("invalid index {}", args[1])));
                }
                Ok(list_at(args, 0).nth(index as usize).cloned().unwrap_or_default())
            },
        );
        self.define(
            "slice",
            Signature::Exact(vec![ArgKind::List, ArgKind::Number, ArgKind::Number]),
            |args| {
                let (start, end) = number_pair(&args[1..]);
                if start < 0.0 || end < 0.0 || start.fract() != 0.0 || end.fract() != 0.0 {
                    return Err(domain("slice", format!("invalid range {}..{}", args[1], args[2])));
                }
                Ok(Value::Pair(list_at(args, 0).slice(start as usize, end as usize)))
            },
        );
    }

    fn register_text(&mut self) {
        self.define("text", Signature::Exact(vec![ArgKind::Any]), |args| {
            Ok(Value::text(&args[0].to_string()))
        });
        self.define(
            "print",
            Signature::Variadic {
                fixed: vec![],
                rest: ArgKind::Any,
            },
            |args| {
                let line: Vec<String> = args.iter().map(Value::to_string).collect();
                println!("{}", line.join(" "));
                Ok(Value::Nil)
            },
        );
    }

    fn register_tables(&mut self) {
        self.define(
            "table",
            Signature::Variadic {
                fixed: vec![],
                rest: ArgKind::Any,
            },
            |args| {
                if args.len() % 2 != 0 {
                    return Err(domain("table", "expects key/value pairs"));
                }
                let mut table = HashTable::new();
                for pair in args.chunks(2) {
                    table = table.with(&pair[0], pair[1].clone())?;
                }
                Ok(Value::Table(table))
            },
        );
        self.define(
            "with",
            Signature::Exact(vec![ArgKind::Table, ArgKind::Any, ArgKind::Any]),
            |args| Ok(Value::Table(table_at(args).with(&args[1], args[2].clone())?)),
        );
        self.define(
            "without",
            Signature::Exact(vec![ArgKind::Table, ArgKind::Any]),
            |args| Ok(Value::Table(table_at(args).without(&args[1])?)),
        );
        self.define(
            "item",
            Signature::Exact(vec![ArgKind::Table, ArgKind::Any]),
            |args| {
                table_at(args)
                    .item(&args[1])?
                    .ok_or_else(|| RuntimeError::UnknownKey(args[1].to_string()))
            },
        );
        self.define(
            "has",
            Signature::Exact(vec![ArgKind::Table, ArgKind::Any]),
            |args| Ok(Value::boolean(table_at(args).item(&args[1])?.is_some())),
        );
        self.define("keys", Signature::Exact(vec![ArgKind::Table]), |args| {
            Ok(Value::Pair(table_at(args).keys()))
        });
    }
}

// The accessors below run after the signature check, so the fallbacks
// are never taken.

fn numbers_of(args: &[Value]) -> impl Iterator<Item = f64> + '_ {
    args.iter().filter_map(Value::as_number)
}

fn number_pair(args: &[Value]) -> (f64, f64) {
    let mut values = numbers_of(args);
    (values.next().unwrap_or(0.0), values.next().unwrap_or(0.0))
}

fn list_at(args: &[Value], index: usize) -> &List {
    static EMPTY: std::sync::OnceLock<List> = std::sync::OnceLock::new();
    match args.get(index) {
        Some(Value::Pair(list)) => list,
        _ => EMPTY.get_or_init(List::empty),
    }
}

fn table_at(args: &[Value]) -> HashTable {
    match args.first() {
        Some(Value::Table(table)) => table.clone(),
        _ => HashTable::new(),
    }
}

fn ordering_is(accepted: &'static [Ordering]) -> impl Fn(Ordering) -> bool + Send + Sync {
    move |ordering| accepted.contains(&ordering)
}

fn domain(function: &str, reason: impl Into<String>) -> RuntimeError {
    RuntimeError::Domain {
        function: function.to_string(),
        reason: reason.into(),
    }
}
