//! Actor Group
//!
//! Owns every running actor of a program. The group is the message sender
//! and actor register of the context its actors run with: a `send` from any
//! handler is broadcast to all actors registered at that moment, and a
//! `start` registers (and, once the group runs, immediately starts) a new
//! actor.
//!
//! # Locking
//!
//! The member list sits behind one `parking_lot::RwLock`. Broadcasts take
//! the read lock, registration and start take the write lock. Task handles
//! live behind a separate mutex that is only taken while the member lock is
//! held or on its own, never the other way around.

use super::concurrent::ConcurrentActor;
use super::id::ActorId;
use crate::context::{ActorRegister, Context, Message, MessageSender};
use crate::errors::RuntimeError;
use crate::value::Value;
use crate::Result;
use futures::future::join_all;
use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Default)]
struct Members {
    actors: Vec<Arc<ConcurrentActor>>,
    /// Registered before start, with their initial state arguments
    waiting: Vec<(Arc<ConcurrentActor>, Vec<Value>)>,
    /// Set once the group runs
    context: Option<Context>,
}

#[derive(Default)]
pub struct ActorGroup {
    members: RwLock<Members>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

/// Dispatch target installed in the group context
///
/// Holds the group weakly: the group owns the context, so a strong handle
/// would keep the group alive forever.
struct GroupHandle {
    group: Weak<ActorGroup>,
}

impl GroupHandle {
    fn group(&self) -> Result<Arc<ActorGroup>> {
        self.group.upgrade().ok_or(RuntimeError::Detached)
    }
}

impl MessageSender for GroupHandle {
    fn send_message(&self, message: Message) -> Result<()> {
        self.group()?.send_message(message)
    }
}

impl ActorRegister for GroupHandle {
    fn register_actor(&self, actor: Arc<ConcurrentActor>, args: Vec<Value>) -> Result<()> {
        self.group()?.register_actor(actor, args)
    }
}

impl ActorGroup {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Add an actor; started right away when the group already runs
    pub fn register_actor(&self, actor: Arc<ConcurrentActor>, args: Vec<Value>) -> Result<()> {
        let mut members = self.members.write();
        members.actors.push(actor.clone());
        debug!(actor_id = %actor.id(), actor = %actor.name(), "Actor registered");

        match members.context.clone() {
            Some(context) => {
                let task = actor.start(context, args)?;
                self.tasks.lock().push(task);
            }
            None => members.waiting.push((actor, args)),
        }
        Ok(())
    }

    /// Broadcast to every actor registered right now
    ///
    /// Every actor is attempted; the first delivery failure is returned.
    pub fn send_message(&self, message: Message) -> Result<()> {
        let members = self.members.read();
        let mut outcome = Ok(());
        for actor in &members.actors {
            if let Err(error) = actor.send_message(message.clone()) {
                warn!(actor_id = %actor.id(), message = %message.name, error = %error, "Broadcast delivery failed");
                if outcome.is_ok() {
                    outcome = Err(error);
                }
            }
        }
        outcome
    }

    /// Attach the group to a fork of `root` and start every registered actor
    pub fn start(self: &Arc<Self>, root: &Context) -> Result<()> {
        let handle = Arc::new(GroupHandle {
            group: Arc::downgrade(self),
        });
        let context = root.fork().with_dispatch(handle.clone(), handle);

        let mut members = self.members.write();
        if members.context.is_some() {
            return Err(RuntimeError::AlreadyStarted("actor group".into()));
        }
        members.context = Some(context.clone());

        let waiting = std::mem::take(&mut members.waiting);
        let mut tasks = self.tasks.lock();
        for (actor, args) in waiting {
            tasks.push(actor.start(context.clone(), args)?);
        }
        info!(actors = members.actors.len(), "Actor group started");
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.members.read().context.is_some()
    }

    pub fn len(&self) -> usize {
        self.members.read().actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.read().actors.is_empty()
    }

    pub fn actor_ids(&self) -> Vec<ActorId> {
        self.members
            .read()
            .actors
            .iter()
            .map(|actor| actor.id().clone())
            .collect()
    }

    /// Abort every actor task without draining inboxes
    pub fn abort(&self) {
        let tasks = self.tasks.lock();
        if !tasks.is_empty() {
            warn!(tasks = tasks.len(), "Aborting actor tasks");
        }
        for task in tasks.iter() {
            task.abort();
        }
    }

    /// Close every inbox and wait for the actor tasks to finish
    ///
    /// Actors registered by handlers that were still draining are closed in
    /// a later round.
    pub async fn shutdown(&self) {
        info!(actors = self.len(), "Shutting down actor group");
        loop {
            let actors = self.members.read().actors.clone();
            for actor in &actors {
                actor.close();
            }

            let tasks = std::mem::take(&mut *self.tasks.lock());
            if tasks.is_empty() {
                break;
            }
            for result in join_all(tasks).await {
                match result {
                    Err(error) if error.is_cancelled() => debug!("Actor task cancelled"),
                    Err(error) => warn!(error = %error, "Actor task finished with error"),
                    Ok(()) => {}
                }
            }
        }
        info!("Actor group shutdown complete");
    }
}
