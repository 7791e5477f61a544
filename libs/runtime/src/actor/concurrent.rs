//! Concurrent Actor
//!
//! Wraps a [`SequentialActor`] with an inbox and a processing loop running on
//! its own tokio task.
//!
//! # Delivery
//!
//! Senders never block. [`ConcurrentActor::send_message`] increments the
//! shared [`PendingCounter`] before the message can reach the inbox, then
//! tries a non-blocking send. When the inbox is full the message goes to a
//! per-actor backlog drained by a short-lived task that performs the
//! awaiting sends in order, so per-actor FIFO holds even under backpressure.
//!
//! # Failures
//!
//! Handler failures go to the shared [`ErrorHandler`] and never stop the
//! loop. The pending counter is decremented exactly once per processed
//! message, whatever its outcome.

use super::id::ActorId;
use super::pending::PendingCounter;
use super::sequential::SequentialActor;
use crate::context::{Context, Message, StateHolder};
use crate::errors::{RuntimeError, Signal};
use crate::value::Value;
use crate::Result;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

/// Receives handler failures and user exits from running actors
pub trait ErrorHandler: Send + Sync {
    fn handle_error(&self, actor: &ActorId, error: RuntimeError);
    fn handle_exit(&self, actor: &ActorId);
}

/// Logs failures and exits, never stops anything
#[derive(Debug, Default)]
pub struct LogErrors;

impl ErrorHandler for LogErrors {
    fn handle_error(&self, actor: &ActorId, error: RuntimeError) {
        error!(actor_id = %actor, error = %error, "Actor message processing failed");
    }

    fn handle_exit(&self, actor: &ActorId) {
        info!(actor_id = %actor, "Actor requested exit");
    }
}

/// Shared by every actor of a program
#[derive(Clone)]
pub struct Dependencies {
    pub pending: Arc<PendingCounter>,
    pub error_handler: Arc<dyn ErrorHandler>,
}

impl Dependencies {
    pub fn new(pending: Arc<PendingCounter>, error_handler: Arc<dyn ErrorHandler>) -> Self {
        Self {
            pending,
            error_handler,
        }
    }
}

#[derive(Default)]
struct Backlog {
    messages: VecDeque<Message>,
    draining: bool,
}

pub struct ConcurrentActor {
    id: ActorId,
    name: String,
    actor: Arc<SequentialActor>,
    sender: Mutex<Option<mpsc::Sender<Message>>>,
    receiver: Mutex<Option<mpsc::Receiver<Message>>>,
    backlog: Arc<Mutex<Backlog>>,
    dependencies: Dependencies,
}

impl ConcurrentActor {
    /// Capacity 0 asks for a hand-off inbox; tokio channels need at least one
    /// slot, and senders never wait on it either way
    pub fn new(
        name: impl Into<String>,
        actor: SequentialActor,
        dependencies: Dependencies,
        inbox_capacity: usize,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(inbox_capacity.max(1));
        Self {
            id: ActorId::new(),
            name: name.into(),
            actor: Arc::new(actor),
            sender: Mutex::new(Some(sender)),
            receiver: Mutex::new(Some(receiver)),
            backlog: Arc::new(Mutex::new(Backlog::default())),
            dependencies,
        }
    }

    pub fn id(&self) -> &ActorId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> String {
        self.actor.state()
    }

    /// Spawn the processing loop
    ///
    /// `args` become the arguments of the initial state. Fails with
    /// [`RuntimeError::AlreadyStarted`] on a second call.
    pub fn start(self: &Arc<Self>, root: Context, args: Vec<Value>) -> Result<JoinHandle<()>> {
        let inbox = self
            .receiver
            .lock()
            .take()
            .ok_or_else(|| RuntimeError::AlreadyStarted(self.id.to_string()))?;
        self.actor.bind_state_args(args);

        let holder: Arc<dyn StateHolder> = self.actor.clone();
        let context = root.fork().with_state_holder(holder);
        Ok(tokio::spawn(Arc::clone(self).run(context, inbox)))
    }

    async fn run(self: Arc<Self>, context: Context, mut inbox: mpsc::Receiver<Message>) {
        let started = Instant::now();
        info!(actor_id = %self.id, actor = %self.name, state = %self.actor.state(), "Actor started");

        while let Some(message) = inbox.recv().await {
            trace!(actor_id = %self.id, message = %message.name, "Processing message");
            let scope = context.fork();

            match self.actor.process_message(&scope, &message) {
                Ok(()) | Err(Signal::Return(_)) => {}
                Err(Signal::Exit) => self.dependencies.error_handler.handle_exit(&self.id),
                Err(Signal::Error(error)) => {
                    warn!(
                        actor_id = %self.id,
                        actor = %self.name,
                        message = %message.name,
                        error = %error,
                        "Message handler failed"
                    );
                    self.dependencies.error_handler.handle_error(&self.id, error);
                }
            }
            self.dependencies.pending.done();
        }

        debug!(
            actor_id = %self.id,
            runtime_ms = started.elapsed().as_millis(),
            "Actor inbox closed and drained"
        );
    }

    /// Enqueue without blocking the caller
    pub fn send_message(&self, message: Message) -> Result<()> {
        let sender = self
            .sender
            .lock()
            .clone()
            .ok_or_else(|| RuntimeError::InboxClosed(self.id.to_string()))?;
        self.dependencies.pending.increment();

        let mut backlog = self.backlog.lock();
        if backlog.draining {
            backlog.messages.push_back(message);
            return Ok(());
        }

        match sender.try_send(message) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(message)) => {
                trace!(actor_id = %self.id, "Inbox full, deferring send");
                backlog.messages.push_back(message);
                backlog.draining = true;
                tokio::spawn(drain(
                    self.id.clone(),
                    sender,
                    self.backlog.clone(),
                    self.dependencies.pending.clone(),
                ));
                Ok(())
            }
            Err(TrySendError::Closed(_)) => {
                self.dependencies.pending.done();
                Err(RuntimeError::InboxClosed(self.id.to_string()))
            }
        }
    }

    /// Close the inbox; queued messages are still processed
    pub fn close(&self) {
        self.sender.lock().take();
    }
}

async fn drain(
    id: ActorId,
    sender: mpsc::Sender<Message>,
    backlog: Arc<Mutex<Backlog>>,
    pending: Arc<PendingCounter>,
) {
    loop {
        let next = {
            let mut backlog = backlog.lock();
            match backlog.messages.pop_front() {
                Some(message) => message,
                None => {
                    backlog.draining = false;
                    return;
                }
            }
        };

        if sender.send(next).await.is_err() {
            let mut backlog = backlog.lock();
            let dropped = backlog.messages.len() + 1;
            warn!(actor_id = %id, dropped, "Inbox closed with deferred messages");
            for _ in 0..dropped {
                pending.done();
            }
            backlog.messages.clear();
            backlog.draining = false;
            return;
        }
    }
}

impl std::fmt::Debug for ConcurrentActor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrentActor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("state", &self.actor.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::state::{State, StateGroup};
    use crate::builtins::Builtins;
    use crate::command::{Command, CommandGroup};
    use crate::expression::Expression;
    use crate::value::{ArgKind, Function, Signature};
    use std::time::Duration;

    #[derive(Default)]
    struct Collect {
        errors: Mutex<Vec<RuntimeError>>,
        exits: Mutex<usize>,
    }

    impl ErrorHandler for Collect {
        fn handle_error(&self, _actor: &ActorId, error: RuntimeError) {
            self.errors.lock().push(error);
        }

        fn handle_exit(&self, _actor: &ActorId) {
            *self.exits.lock() += 1;
        }
    }

    struct Harness {
        actor: Arc<ConcurrentActor>,
        pending: Arc<PendingCounter>,
        handler: Arc<Collect>,
        seen: Arc<Mutex<Vec<Value>>>,
        context: Context,
    }

    /// Actor that records the argument of every `note`, fails on `fail` and
    /// exits on `quit`
    fn harness(capacity: usize) -> Harness {
        let states = StateGroup::new().with_state(
            "Main",
            State::new(vec!["label".into()])
                .with_handler(
                    "note",
                    vec!["value".into()],
                    CommandGroup::new(vec![Command::Evaluate(Expression::call(
                        "record",
                        vec![Expression::coalesce(
                            Expression::identifier("value"),
                            Expression::identifier("label"),
                        )],
                    ))]),
                )
                .with_handler(
                    "fail",
                    vec![],
                    CommandGroup::new(vec![Command::Evaluate(Expression::identifier("missing"))]),
                )
                .with_handler("quit", vec![], CommandGroup::new(vec![Command::Exit])),
        );

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let record = Function::new("record", Signature::Exact(vec![ArgKind::Any]), move |args| {
            sink.lock().push(args[0].clone());
            Ok(Value::Nil)
        });

        let pending = Arc::new(PendingCounter::new());
        let handler = Arc::new(Collect::default());
        let dependencies = Dependencies::new(pending.clone(), handler.clone());
        let actor = Arc::new(ConcurrentActor::new(
            "Recorder",
            SequentialActor::new(Arc::new(states), "Main").unwrap(),
            dependencies,
            capacity,
        ));

        Harness {
            actor,
            pending,
            handler,
            seen,
            context: Context::with_builtins(&Builtins::standard().with_function(record)),
        }
    }

    async fn settle(pending: &PendingCounter) {
        tokio::time::timeout(Duration::from_secs(5), pending.wait_idle())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_counter_visible_before_processing() {
        let h = harness(4);
        h.actor.send_message(Message::new("note", vec![Value::Number(1.0)])).unwrap();
        assert_eq!(h.pending.count(), 1);

        h.actor.start(h.context.clone(), vec![]).unwrap();
        settle(&h.pending).await;
        assert_eq!(*h.seen.lock(), vec![Value::Number(1.0)]);
    }

    #[tokio::test]
    async fn test_full_inbox_keeps_fifo_and_never_blocks() {
        let h = harness(0);
        // not started yet: only one slot, everything else is deferred
        for i in 0..20 {
            h.actor.send_message(Message::new("note", vec![Value::Number(i as f64)])).unwrap();
        }
        assert_eq!(h.pending.count(), 20);

        h.actor.start(h.context.clone(), vec![]).unwrap();
        settle(&h.pending).await;

        let expected: Vec<Value> = (0..20).map(|i| Value::Number(i as f64)).collect();
        assert_eq!(*h.seen.lock(), expected);
    }

    #[tokio::test]
    async fn test_initial_args_bind_state_parameters() {
        let h = harness(4);
        h.actor.start(h.context.clone(), vec![Value::text("init")]).unwrap();
        h.actor.send_message(Message::new("note", vec![])).unwrap();
        settle(&h.pending).await;

        assert_eq!(*h.seen.lock(), vec![Value::text("init")]);
    }

    #[tokio::test]
    async fn test_failures_and_exits_reach_handler() {
        let h = harness(4);
        h.actor.start(h.context.clone(), vec![]).unwrap();
        h.actor.send_message(Message::new("fail", vec![])).unwrap();
        h.actor.send_message(Message::new("quit", vec![])).unwrap();
        h.actor.send_message(Message::new("note", vec![Value::Number(2.0)])).unwrap();
        settle(&h.pending).await;

        let errors = h.handler.errors.lock();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].root_cause(),
            &RuntimeError::UnknownIdentifier("missing".into())
        );
        assert_eq!(*h.handler.exits.lock(), 1);
        // the loop keeps going after a failure
        assert_eq!(*h.seen.lock(), vec![Value::Number(2.0)]);
        assert_eq!(h.pending.count(), 0);
    }

    #[tokio::test]
    async fn test_close_drains_then_rejects() {
        let h = harness(4);
        let task = h.actor.start(h.context.clone(), vec![]).unwrap();
        h.actor.send_message(Message::new("note", vec![Value::Number(1.0)])).unwrap();
        h.actor.close();

        tokio::time::timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
        assert_eq!(*h.seen.lock(), vec![Value::Number(1.0)]);

        let error = h.actor.send_message(Message::new("note", vec![])).unwrap_err();
        assert!(matches!(error, RuntimeError::InboxClosed(_)));
        assert_eq!(h.pending.count(), 0);
    }

    #[tokio::test]
    async fn test_start_twice_fails() {
        let h = harness(1);
        h.actor.start(h.context.clone(), vec![]).unwrap();
        assert!(matches!(
            h.actor.start(h.context.clone(), vec![]),
            Err(RuntimeError::AlreadyStarted(_))
        ));
    }
}
