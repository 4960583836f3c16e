//! Builder for declaring state aliases.

use crate::core::State;

/// Fluent declaration of an alias.
///
/// `is` lists the states the alias holds for; `is_not` turns it into
/// "none of these". `opposite` asks for a second alias answering the
/// logical opposite question, generated when the machine is evaluated.
#[derive(Clone, Debug)]
pub struct AliasBuilder<S: State> {
    pub(crate) name: String,
    pub(crate) members: Vec<S>,
    pub(crate) negated: bool,
    pub(crate) opposite: Option<String>,
}

impl<S: State> AliasBuilder<S> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            negated: false,
            opposite: None,
        }
    }

    pub fn is(mut self, states: impl IntoIterator<Item = S>) -> Self {
        for state in states {
            if !self.members.contains(&state) {
                self.members.push(state);
            }
        }
        self
    }

    pub fn is_not(mut self, states: impl IntoIterator<Item = S>) -> Self {
        self.negated = true;
        self.is(states)
    }

    pub fn opposite(mut self, name: impl Into<String>) -> Self {
        self.opposite = Some(name.into());
        self
    }
}
