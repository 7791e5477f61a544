//! Troupe Actor Language Runtime
//!
//! Execution engine for a small actor-oriented scripting language. Programs
//! declare named actors, each a finite-state machine whose states handle
//! messages by running command sequences. Commands transition state, send
//! messages, spawn actors and evaluate expressions over a small dynamic value
//! model.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  definitions   ┌───────────────────────────────┐
//! │   Program    │───────────────▶│          ActorGroup           │
//! │   driver     │  initial msg   │  RwLock<[ConcurrentActor]>    │
//! └──────────────┘                │     │ broadcast / register    │
//!                                 │     ▼                         │
//!                                 │  inbox ─▶ SequentialActor     │
//!                                 │           │ StateGroup        │
//!                                 │           ▼                   │
//!                                 │  CommandGroup ─▶ Expression   │
//!                                 │           │ Context           │
//!                                 │           ▼                   │
//!                                 │         Value                 │
//!                                 └───────────────────────────────┘
//! ```
//!
//! Evaluated code reaches the outside world only through its [`Context`]:
//! the evaluator never touches tasks or channels.
//!
//! # Example
//!
//! ```rust,no_run
//! use troupe_runtime::{ActorDefinition, Builtins, Command, CommandGroup, Program, State, StateGroup};
//! use troupe_config::RuntimeConfig;
//!
//! # async fn demo() -> Result<(), troupe_runtime::ProgramError> {
//! let states = StateGroup::new().with_state(
//!     "Main",
//!     State::default().with_handler("start", vec![], CommandGroup::new(vec![Command::Exit])),
//! );
//! let program = Program::new(
//!     vec![ActorDefinition::new("Hello", states)],
//!     &Builtins::standard(),
//!     &RuntimeConfig::default(),
//! )?;
//! program.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod actor;
pub mod builtins;
pub mod command;
pub mod context;
pub mod errors;
pub mod expression;
pub mod program;
pub mod value;

pub use actor::{
    ActorFactory, ActorGroup, ActorId, ConcurrentActor, Dependencies, ErrorHandler, LogErrors,
    PendingCounter, SequentialActor, State, StateGroup,
};
pub use builtins::Builtins;
pub use command::{Command, CommandGroup, ParameterizedCommandGroup};
pub use context::{ActorRegister, Context, Message, MessageSender, StateHolder};
pub use errors::{Flow, RuntimeError, Signal};
pub use expression::{BooleanOperator, Case, Expression};
pub use program::{ActorDefinition, Completion, Program, ProgramError};
pub use value::{ArgKind, Function, HashTable, Key, List, Signature, Value};

pub type Result<T> = std::result::Result<T, RuntimeError>;
