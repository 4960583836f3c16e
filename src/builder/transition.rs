//! Builder for declaring transition rules.

use crate::builder::error::DefinitionError;
use crate::core::{Endpoint, Namespace, State};
use crate::machine::TransitionRule;

/// Fluent declaration of one transition rule.
///
/// ```rust
/// use statebound::builder::TransitionBuilder;
/// use statebound::state_enum;
///
/// state_enum! {
///     enum Light {
///         Red => "red",
///         Green => "green",
///     }
/// }
///
/// let go = TransitionBuilder::<Light>::named("go").from(Light::Red).to(Light::Green);
/// ```
#[derive(Clone, Debug)]
pub struct TransitionBuilder<S: State> {
    name: Option<String>,
    from: Vec<Endpoint<S>>,
    to: Option<Endpoint<S>>,
}

impl<S: State> TransitionBuilder<S> {
    /// Start an anonymous rule.
    pub fn new() -> Self {
        Self {
            name: None,
            from: Vec::new(),
            to: None,
        }
    }

    /// Start a named rule. Names are unique within a machine.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new()
        }
    }

    /// Add a source. Accepts a state, `None` for an empty field, or an endpoint.
    pub fn from(mut self, from: impl Into<Endpoint<S>>) -> Self {
        let from = from.into();
        if !self.from.contains(&from) {
            self.from.push(from);
        }
        self
    }

    /// Add several sources at once.
    pub fn from_states(self, states: impl IntoIterator<Item = S>) -> Self {
        states.into_iter().fold(self, |builder, state| builder.from(state))
    }

    /// Allow the rule from every value, including an empty field.
    pub fn from_any(self) -> Self {
        self.from(Endpoint::<S>::Any)
    }

    /// Set the target (required).
    pub fn to(mut self, to: impl Into<Endpoint<S>>) -> Self {
        self.to = Some(to.into());
        self
    }

    /// Target every state. Such rules legalise moves but cannot be attempted.
    pub fn to_any(self) -> Self {
        self.to(Endpoint::<S>::Any)
    }

    pub(crate) fn build(self, namespace: &Namespace) -> Result<TransitionRule<S>, DefinitionError> {
        let label = self
            .name
            .clone()
            .unwrap_or_else(|| "anonymous".to_string());

        if self.from.is_empty() {
            return Err(DefinitionError::MissingSource { name: label });
        }
        let to = self.to.ok_or_else(|| DefinitionError::MissingTarget {
            name: label.clone(),
        })?;
        if to == Endpoint::Unset {
            return Err(DefinitionError::UnsetTarget { name: label });
        }

        Ok(TransitionRule {
            qualified_name: self.name.as_deref().map(|name| namespace.qualify(name)),
            name: self.name,
            from: self.from,
            to,
        })
    }
}

impl<S: State> Default for TransitionBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    enum TestState {
        Unborn,
        Born,
    }

    impl State for TestState {
        fn name(&self) -> &str {
            match self {
                Self::Unborn => "unborn",
                Self::Born => "born",
            }
        }
    }

    #[test]
    fn builder_requires_source() {
        let result = TransitionBuilder::<TestState>::named("birth")
            .to(TestState::Born)
            .build(&Namespace::default());

        assert!(matches!(result, Err(DefinitionError::MissingSource { .. })));
    }

    #[test]
    fn builder_requires_target() {
        let result = TransitionBuilder::<TestState>::named("birth")
            .from(TestState::Unborn)
            .build(&Namespace::default());

        assert!(matches!(result, Err(DefinitionError::MissingTarget { .. })));
    }

    #[test]
    fn builder_rejects_empty_target() {
        let result = TransitionBuilder::<TestState>::new()
            .from(TestState::Born)
            .to(None::<TestState>)
            .build(&Namespace::default());

        assert!(matches!(result, Err(DefinitionError::UnsetTarget { .. })));
    }

    #[test]
    fn sources_are_deduplicated() {
        let rule = TransitionBuilder::<TestState>::named("birth")
            .from(TestState::Unborn)
            .from_states([TestState::Unborn])
            .from(None::<TestState>)
            .to(TestState::Born)
            .build(&Namespace::default())
            .unwrap();

        assert_eq!(
            rule.from_states(),
            &[Endpoint::State(TestState::Unborn), Endpoint::Unset]
        );
    }

    #[test]
    fn names_are_qualified_by_namespace() {
        let rule = TransitionBuilder::<TestState>::named("fire")
            .from_any()
            .to(TestState::Unborn)
            .build(&Namespace::new("employment"))
            .unwrap();

        assert_eq!(rule.name(), Some("fire"));
        assert_eq!(rule.qualified_name(), Some("employment_fire"));
    }
}
