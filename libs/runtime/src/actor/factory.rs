use super::concurrent::{ConcurrentActor, Dependencies};
use super::sequential::SequentialActor;
use super::state::StateGroup;
use crate::errors::RuntimeError;
use crate::Result;
use std::fmt;
use std::sync::Arc;

/// Instantiates new concurrent actors of one definition
///
/// Factories are first-class values: the front end binds one under each
/// actor name and `start` turns it into a running actor.
#[derive(Clone)]
pub struct ActorFactory {
    inner: Arc<FactoryInner>,
}

struct FactoryInner {
    name: String,
    states: Arc<StateGroup>,
    initial_state: String,
    dependencies: Dependencies,
    inbox_capacity: usize,
}

impl ActorFactory {
    /// Fails with [`RuntimeError::UnknownState`] when `initial_state` is not
    /// declared in `states`
    pub fn new(
        name: impl Into<String>,
        states: Arc<StateGroup>,
        initial_state: impl Into<String>,
        dependencies: Dependencies,
        inbox_capacity: usize,
    ) -> Result<Self> {
        let initial_state = initial_state.into();
        if !states.contains(&initial_state) {
            return Err(RuntimeError::UnknownState(initial_state));
        }
        Ok(Self {
            inner: Arc::new(FactoryInner {
                name: name.into(),
                states,
                initial_state,
                dependencies,
                inbox_capacity,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn initial_state(&self) -> &str {
        &self.inner.initial_state
    }

    /// Fresh, not yet started actor at the initial state
    pub fn instantiate(&self) -> Result<Arc<ConcurrentActor>> {
        let actor = SequentialActor::new(self.inner.states.clone(), &self.inner.initial_state)?;
        Ok(Arc::new(ConcurrentActor::new(
            self.inner.name.clone(),
            actor,
            self.inner.dependencies.clone(),
            self.inner.inbox_capacity,
        )))
    }

    pub fn ptr_eq(&self, other: &ActorFactory) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ActorFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorFactory")
            .field("name", &self.inner.name)
            .field("initial_state", &self.inner.initial_state)
            .field("inbox_capacity", &self.inner.inbox_capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::concurrent::LogErrors;
    use crate::actor::pending::PendingCounter;
    use crate::actor::state::State;

    fn dependencies() -> Dependencies {
        Dependencies::new(Arc::new(PendingCounter::new()), Arc::new(LogErrors))
    }

    #[test]
    fn test_factory_validates_initial_state() {
        let states = Arc::new(StateGroup::new().with_state("Main", State::default()));

        let error = ActorFactory::new("A", states.clone(), "Other", dependencies(), 0).unwrap_err();
        assert_eq!(error, RuntimeError::UnknownState("Other".into()));

        let factory = ActorFactory::new("A", states, "Main", dependencies(), 0).unwrap();
        assert_eq!(factory.name(), "A");
        assert!(factory.ptr_eq(&factory.clone()));

        let first = factory.instantiate().unwrap();
        let second = factory.instantiate().unwrap();
        assert_ne!(first.id(), second.id());
        assert_eq!(first.state(), "Main");
    }
}
