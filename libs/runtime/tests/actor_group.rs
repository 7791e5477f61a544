//! Actor group behaviour with live actors
//!
//! - state transitions are all-or-nothing
//! - unknown messages are ignored
//! - broadcasts reach every registered actor and the pending counter
//!   returns to zero whatever the handlers do

mod common;

use common::*;
use parking_lot::Mutex;
use std::sync::Arc;
use troupe_runtime::{
    ActorFactory, ActorGroup, ActorId, CommandGroup, Context, Dependencies, ErrorHandler,
    Message, PendingCounter, RuntimeError, State, StateGroup,
};

#[derive(Default)]
struct Collect {
    errors: Mutex<Vec<RuntimeError>>,
}

impl ErrorHandler for Collect {
    fn handle_error(&self, _actor: &ActorId, error: RuntimeError) {
        self.errors.lock().push(error);
    }

    fn handle_exit(&self, _actor: &ActorId) {}
}

struct Fixture {
    pending: Arc<PendingCounter>,
    handler: Arc<Collect>,
    group: Arc<ActorGroup>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            pending: Arc::new(PendingCounter::new()),
            handler: Arc::new(Collect::default()),
            group: ActorGroup::new(),
        }
    }

    fn factory(&self, name: &str, states: StateGroup, initial: &str) -> ActorFactory {
        let dependencies = Dependencies::new(self.pending.clone(), self.handler.clone());
        ActorFactory::new(name, Arc::new(states), initial, dependencies, 0).unwrap()
    }
}

#[tokio::test]
async fn test_go_moves_to_b_then_is_ignored() {
    let fixture = Fixture::new();
    let states = StateGroup::new()
        .with_state(
            "A",
            State::default().with_handler("go", vec![], CommandGroup::new(vec![set("B", vec![])])),
        )
        .with_state("B", State::default());
    let actor = fixture.factory("Walker", states, "A").instantiate().unwrap();
    fixture.group.register_actor(actor.clone(), vec![]).unwrap();
    fixture.group.start(&Context::new()).unwrap();

    fixture.group.send_message(Message::new("go", vec![])).unwrap();
    settle(&fixture.pending).await;
    assert_eq!(actor.state(), "B");

    fixture.group.send_message(Message::new("go", vec![])).unwrap();
    settle(&fixture.pending).await;
    assert_eq!(actor.state(), "B");
    assert!(fixture.handler.errors.lock().is_empty());

    fixture.group.shutdown().await;
}

#[tokio::test]
async fn test_set_to_unknown_state_keeps_current_state() {
    let fixture = Fixture::new();
    let (builtins, seen) = recording_builtins();
    let states = StateGroup::new().with_state(
        "Idle",
        State::default()
            .with_handler(
                "move",
                vec![],
                CommandGroup::new(vec![set("Nowhere", vec![]), record(text("moved"))]),
            )
            .with_handler("ping", vec![], CommandGroup::new(vec![record(text("pong"))])),
    );
    let actor = fixture.factory("Stuck", states, "Idle").instantiate().unwrap();
    fixture.group.register_actor(actor.clone(), vec![]).unwrap();
    fixture.group.start(&Context::with_builtins(&builtins)).unwrap();

    fixture.group.send_message(Message::new("move", vec![])).unwrap();
    fixture.group.send_message(Message::new("ping", vec![])).unwrap();
    settle(&fixture.pending).await;

    assert_eq!(actor.state(), "Idle");
    // the failing set aborted the rest of its handler only
    assert_eq!(*seen.lock(), vec![troupe_runtime::Value::text("pong")]);

    let errors = fixture.handler.errors.lock();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].root_cause(),
        &RuntimeError::UnknownState("Nowhere".into())
    );
    drop(errors);

    fixture.group.shutdown().await;
}

#[tokio::test]
async fn test_broadcast_to_three_with_one_failure() {
    let fixture = Fixture::new();
    let (builtins, seen) = recording_builtins();

    let fine = StateGroup::new().with_state(
        "Main",
        State::default().with_handler("hello", vec![], CommandGroup::new(vec![record(n(1.0))])),
    );
    let broken = StateGroup::new().with_state(
        "Main",
        State::default().with_handler(
            "hello",
            vec![],
            CommandGroup::new(vec![record(call("/", vec![n(1.0), n(0.0)]))]),
        ),
    );
    let fine = fixture.factory("Fine", fine, "Main");
    let broken = fixture.factory("Broken", broken, "Main");
    for factory in [&fine, &broken, &fine] {
        fixture
            .group
            .register_actor(factory.instantiate().unwrap(), vec![])
            .unwrap();
    }
    assert_eq!(fixture.group.len(), 3);

    // delivered before the loops run: the counter already sees all three
    fixture.group.send_message(Message::new("hello", vec![])).unwrap();
    assert_eq!(fixture.pending.count(), 3);

    fixture.group.start(&Context::with_builtins(&builtins)).unwrap();
    settle(&fixture.pending).await;

    assert_eq!(fixture.pending.count(), 0);
    assert_eq!(seen.lock().len(), 2);
    let errors = fixture.handler.errors.lock();
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0].root_cause(), RuntimeError::Domain { .. }));
    drop(errors);

    fixture.group.shutdown().await;
}

#[tokio::test]
async fn test_handlers_see_only_their_own_bindings() {
    let fixture = Fixture::new();
    let (builtins, seen) = recording_builtins();
    let states = StateGroup::new().with_state(
        "Main",
        State::default()
            .with_handler(
                "first",
                vec![],
                CommandGroup::new(vec![troupe_runtime::Command::Let {
                    name: "secret".into(),
                    value: n(42.0),
                }]),
            )
            .with_handler(
                "second",
                vec![],
                CommandGroup::new(vec![record(var("secret"))]),
            ),
    );
    fixture
        .group
        .register_actor(fixture.factory("Forgetful", states, "Main").instantiate().unwrap(), vec![])
        .unwrap();
    fixture.group.start(&Context::with_builtins(&builtins)).unwrap();

    fixture.group.send_message(Message::new("first", vec![])).unwrap();
    fixture.group.send_message(Message::new("second", vec![])).unwrap();
    settle(&fixture.pending).await;

    assert!(seen.lock().is_empty());
    let errors = fixture.handler.errors.lock();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].root_cause(),
        &RuntimeError::UnknownIdentifier("secret".into())
    );
    drop(errors);

    fixture.group.shutdown().await;
}
