//! Actor runtime
//!
//! - [`SequentialActor`]: state machine processing one message at a time
//! - [`ConcurrentActor`]: inbox plus processing loop on its own task
//! - [`ActorGroup`]: broadcast fan-out, runtime registration, shutdown
//! - [`ActorFactory`]: first-class handle creating new concurrent actors

pub mod concurrent;
pub mod factory;
pub mod group;
pub mod id;
pub mod pending;
pub mod sequential;
pub mod state;

pub use concurrent::{ConcurrentActor, Dependencies, ErrorHandler, LogErrors};
pub use factory::ActorFactory;
pub use group::ActorGroup;
pub use id::ActorId;
pub use pending::PendingCounter;
pub use sequential::SequentialActor;
pub use state::{MessageGroup, State, StateGroup};
