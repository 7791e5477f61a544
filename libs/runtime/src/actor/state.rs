//! State tables
//!
//! A [`StateGroup`] maps state names to [`State`]s; a state maps message
//! names to handlers. Tables are built once by the front end and shared
//! read-only by every instance of an actor.

use crate::command::{CommandGroup, ParameterizedCommandGroup};
use std::collections::HashMap;

/// Message name to handler
pub type MessageGroup = HashMap<String, ParameterizedCommandGroup>;

#[derive(Debug, Clone, Default)]
pub struct State {
    parameters: Vec<String>,
    messages: MessageGroup,
}

impl State {
    pub fn new(parameters: Vec<String>) -> Self {
        Self {
            parameters,
            messages: MessageGroup::new(),
        }
    }

    /// Add a handler for `message`, replacing any previous one
    pub fn with_handler(
        mut self,
        message: impl Into<String>,
        parameters: Vec<String>,
        commands: CommandGroup,
    ) -> Self {
        self.messages.insert(
            message.into(),
            ParameterizedCommandGroup::new(parameters, commands),
        );
        self
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn handler(&self, message: &str) -> Option<&ParameterizedCommandGroup> {
        self.messages.get(message)
    }

    pub fn messages(&self) -> &MessageGroup {
        &self.messages
    }
}

#[derive(Debug, Clone, Default)]
pub struct StateGroup {
    states: HashMap<String, State>,
}

impl StateGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(mut self, name: impl Into<String>, state: State) -> Self {
        self.states.insert(name.into(), state);
        self
    }

    pub fn get(&self, name: &str) -> Option<&State> {
        self.states.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.states.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// State names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.states.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
