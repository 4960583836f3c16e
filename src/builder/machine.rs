//! Builder for the definition phase of a machine.

use crate::builder::alias::AliasBuilder;
use crate::builder::error::DefinitionError;
use crate::builder::options::MachineOptions;
use crate::builder::transition::TransitionBuilder;
use crate::core::{Endpoint, Namespace, State};
use crate::machine::transition::first_match;
use crate::machine::{
    AliasHandle, AliasRule, MachineDefinition, TransitionHandle, TransitionRule,
};
use tracing::debug;

/// Collects transitions and aliases, rejecting conflicting declarations as
/// they arrive, then freezes everything with `evaluate`.
///
/// When the options name an initial state, the builder starts with an
/// anonymous rule moving an empty field into it, so new records may start
/// there.
///
/// # Example
///
/// ```rust
/// use statebound::builder::{MachineBuilder, MachineOptions, TransitionBuilder};
/// use statebound::state_enum;
///
/// state_enum! {
///     enum Zoo {
///         Closed => "closed",
///         Opened => "opened",
///     }
/// }
///
/// let mut builder = MachineBuilder::new(MachineOptions::new().initial(Zoo::Closed));
/// builder.register_transition(
///     TransitionBuilder::named("open").from(Zoo::Closed).to(Zoo::Opened),
/// )?;
/// builder.register_transition(
///     TransitionBuilder::named("close").from(Zoo::Opened).to(Zoo::Closed),
/// )?;
///
/// let machine = builder.evaluate()?;
/// assert_eq!(machine.states(), &[Zoo::Closed, Zoo::Opened]);
/// # Ok::<(), statebound::builder::DefinitionError>(())
/// ```
pub struct MachineBuilder<S: State> {
    options: MachineOptions<S>,
    states: Vec<S>,
    transitions: Vec<TransitionRule<S>>,
    aliases: Vec<AliasBuilder<S>>,
}

impl<S: State> MachineBuilder<S> {
    pub fn new(options: MachineOptions<S>) -> Self {
        let mut builder = Self {
            states: options.initial.iter().cloned().collect(),
            transitions: Vec::new(),
            aliases: Vec::new(),
            options,
        };

        if let Some(initial) = builder.options.initial.clone() {
            builder.transitions.push(TransitionRule {
                name: None,
                qualified_name: None,
                from: vec![Endpoint::Unset],
                to: Endpoint::State(initial),
            });
        }

        builder
    }

    pub fn namespace(&self) -> &Namespace {
        &self.options.namespace
    }

    /// States seen so far, in order of first appearance.
    pub fn states(&self) -> &[S] {
        &self.states
    }

    /// Register a transition rule.
    ///
    /// Fails if any of the rule's sources can already reach its target
    /// through an earlier rule, or if its name is taken.
    pub fn register_transition(
        &mut self,
        transition: TransitionBuilder<S>,
    ) -> Result<TransitionHandle, DefinitionError> {
        let rule = transition.build(&self.options.namespace)?;

        self.verify_state_singularity(&rule)?;
        self.verify_name_singularity(&rule)?;

        if let Some(state) = rule.to_state().state() {
            if !self.states.contains(state) {
                self.states.push(state.clone());
            }
        }

        debug!(
            namespace = %self.options.namespace,
            transition = %rule.label(),
            "registered transition"
        );

        let handle = TransitionHandle(self.transitions.len());
        self.transitions.push(rule);
        Ok(handle)
    }

    /// Declare a state reachable from anywhere, via an anonymous rule.
    pub fn state(&mut self, state: S) -> Result<TransitionHandle, DefinitionError> {
        self.register_transition(TransitionBuilder::new().from_any().to(state))
    }

    pub fn register_alias(
        &mut self,
        alias: AliasBuilder<S>,
    ) -> Result<AliasHandle, DefinitionError> {
        let names = std::iter::once(&alias.name).chain(alias.opposite.as_ref());
        for name in names {
            let taken = self
                .aliases
                .iter()
                .any(|other| other.name == *name || other.opposite.as_ref() == Some(name));
            if taken {
                return Err(self.duplicate_alias(name));
            }
        }

        let handle = AliasHandle(self.aliases.len());
        self.aliases.push(alias);
        Ok(handle)
    }

    /// First rule registered so far that legalises `from` -> `to`.
    pub fn matching_transition(
        &self,
        from: &Endpoint<S>,
        to: &Endpoint<S>,
    ) -> Option<TransitionHandle> {
        first_match(&self.transitions, from, to)
    }

    /// Finish the definition phase.
    ///
    /// Resolves every alias against the final list of states and generates
    /// the requested opposite aliases.
    pub fn evaluate(self) -> Result<MachineDefinition<S>, DefinitionError> {
        let namespace = self.options.namespace.clone();
        let mut resolved: Vec<AliasRule<S>> = self
            .aliases
            .iter()
            .map(|alias| {
                AliasRule::resolve(
                    alias.name.clone(),
                    namespace.qualify(&alias.name),
                    alias.members.clone(),
                    alias.negated,
                    &self.states,
                )
            })
            .collect();

        for (index, alias) in self.aliases.iter().enumerate() {
            let Some(opposite_name) = &alias.opposite else {
                continue;
            };
            if resolved.iter().any(|other| other.name() == opposite_name) {
                return Err(self.duplicate_alias(opposite_name));
            }

            let mut opposite = AliasRule::resolve(
                opposite_name.clone(),
                namespace.qualify(opposite_name),
                alias.members.clone(),
                !alias.negated,
                &self.states,
            );
            opposite.opposite = Some(AliasHandle(index));
            resolved[index].opposite = Some(AliasHandle(resolved.len()));
            resolved.push(opposite);
        }

        debug!(
            namespace = %namespace,
            states = self.states.len(),
            transitions = self.transitions.len(),
            aliases = resolved.len(),
            "evaluated state machine"
        );

        Ok(MachineDefinition {
            namespace,
            field: self.options.field,
            initial: self.options.initial,
            states: self.states,
            transitions: self.transitions,
            aliases: resolved,
            tracking: self.options.track,
        })
    }

    fn verify_state_singularity(&self, rule: &TransitionRule<S>) -> Result<(), DefinitionError> {
        for from in rule.from_states() {
            if let Some(existing) = self.matching_transition(from, rule.to_state()) {
                return Err(DefinitionError::AmbiguousTransition {
                    namespace: self.options.namespace.to_string(),
                    from: from.to_string(),
                    to: rule.to_state().to_string(),
                    existing: self.transitions[existing.0].label(),
                });
            }
        }
        Ok(())
    }

    fn verify_name_singularity(&self, rule: &TransitionRule<S>) -> Result<(), DefinitionError> {
        let Some(name) = rule.name() else {
            return Ok(());
        };
        if self.transitions.iter().any(|other| other.name() == Some(name)) {
            return Err(DefinitionError::DuplicateTransitionName {
                namespace: self.options.namespace.to_string(),
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn duplicate_alias(&self, name: &str) -> DefinitionError {
        DefinitionError::DuplicateAliasName {
            namespace: self.options.namespace.to_string(),
            name: name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    enum TestState {
        Pending,
        Activated,
        Deactivated,
        Semiactivated,
    }

    impl State for TestState {
        fn name(&self) -> &str {
            match self {
                Self::Pending => "pending",
                Self::Activated => "activated",
                Self::Deactivated => "deactivated",
                Self::Semiactivated => "semiactivated",
            }
        }
    }

    fn builder() -> MachineBuilder<TestState> {
        MachineBuilder::new(MachineOptions::new().initial(TestState::Pending))
    }

    fn activate() -> TransitionBuilder<TestState> {
        TransitionBuilder::named("activate")
            .from(TestState::Pending)
            .to(TestState::Activated)
    }

    #[test]
    fn initial_state_is_first_and_reachable_from_empty() {
        let builder = builder();

        assert_eq!(builder.states(), &[TestState::Pending]);
        assert!(builder
            .matching_transition(&Endpoint::Unset, &TestState::Pending.into())
            .is_some());
        assert!(builder
            .matching_transition(&Endpoint::Any, &TestState::Pending.into())
            .is_some());
    }

    #[test]
    fn builder_without_initial_state_starts_empty() {
        let builder = MachineBuilder::<TestState>::new(MachineOptions::new());
        assert!(builder.states().is_empty());
        assert!(builder
            .matching_transition(&Endpoint::Any, &Endpoint::Any)
            .is_none());
    }

    #[test]
    fn registration_collects_target_states() {
        let mut builder = builder();
        builder.register_transition(activate()).unwrap();
        builder
            .register_transition(
                TransitionBuilder::named("deactivate")
                    .from_any()
                    .to(TestState::Deactivated),
            )
            .unwrap();

        assert_eq!(
            builder.states(),
            &[
                TestState::Pending,
                TestState::Activated,
                TestState::Deactivated
            ]
        );
    }

    #[test]
    fn overlapping_transition_is_ambiguous() {
        let mut builder = builder();
        builder.register_transition(activate()).unwrap();

        let result = builder.register_transition(
            TransitionBuilder::named("reactivate")
                .from(TestState::Semiactivated)
                .from(TestState::Pending)
                .to(TestState::Activated),
        );

        match result {
            Err(DefinitionError::AmbiguousTransition {
                from, to, existing, ..
            }) => {
                assert_eq!(from, "pending");
                assert_eq!(to, "activated");
                assert_eq!(existing, "activate");
            }
            other => panic!("Expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn wildcard_rule_conflicts_with_specific_rule() {
        let mut builder = builder();
        builder.register_transition(activate()).unwrap();

        let result = builder.register_transition(
            TransitionBuilder::named("force")
                .from_any()
                .to(TestState::Activated),
        );

        assert!(matches!(
            result,
            Err(DefinitionError::AmbiguousTransition { .. })
        ));
    }

    #[test]
    fn declaring_the_initial_state_again_is_ambiguous() {
        let mut builder = builder();
        assert!(matches!(
            builder.state(TestState::Pending),
            Err(DefinitionError::AmbiguousTransition { .. })
        ));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut builder = builder();
        builder.register_transition(activate()).unwrap();

        let result = builder.register_transition(
            TransitionBuilder::named("activate")
                .from(TestState::Activated)
                .to(TestState::Semiactivated),
        );

        assert_eq!(
            result,
            Err(DefinitionError::DuplicateTransitionName {
                namespace: builder.namespace().to_string(),
                name: "activate".to_string(),
            })
        );
    }

    #[test]
    fn anonymous_rules_never_collide_by_name() {
        let mut builder = builder();
        builder.state(TestState::Activated).unwrap();
        builder.state(TestState::Deactivated).unwrap();
    }

    #[test]
    fn duplicate_alias_names_are_rejected() {
        let mut builder = builder();
        builder
            .register_alias(
                AliasBuilder::new("active")
                    .is([TestState::Activated])
                    .opposite("inactive"),
            )
            .unwrap();

        assert!(matches!(
            builder.register_alias(AliasBuilder::new("inactive").is([TestState::Pending])),
            Err(DefinitionError::DuplicateAliasName { .. })
        ));
    }

    #[test]
    fn opposite_colliding_with_alias_is_rejected() {
        let mut builder = builder();
        builder
            .register_alias(AliasBuilder::new("waiting").is([TestState::Pending]))
            .unwrap();

        assert!(matches!(
            builder.register_alias(
                AliasBuilder::new("moving")
                    .is([TestState::Activated])
                    .opposite("waiting")
            ),
            Err(DefinitionError::DuplicateAliasName { .. })
        ));
    }

    #[test]
    fn self_opposite_fails_evaluation() {
        let mut builder = builder();
        builder
            .register_alias(AliasBuilder::new("loop").is([TestState::Pending]).opposite("loop"))
            .unwrap();

        assert!(matches!(
            builder.evaluate(),
            Err(DefinitionError::DuplicateAliasName { .. })
        ));
    }

    #[test]
    fn evaluate_links_opposites_both_ways() {
        let mut builder = builder();
        builder.register_transition(activate()).unwrap();
        let handle = builder
            .register_alias(
                AliasBuilder::new("fresh")
                    .is_not([TestState::Activated])
                    .opposite("used"),
            )
            .unwrap();

        let machine = builder.evaluate().unwrap();
        let fresh = machine.alias(handle).unwrap();
        let used_handle = fresh.opposite().unwrap();
        let used = machine.alias(used_handle).unwrap();

        assert_eq!(fresh.derived_members(), &[TestState::Pending]);
        assert!(!used.is_negated());
        assert_eq!(used.members(), &[TestState::Activated]);
        assert_eq!(used.derived_members(), &[TestState::Activated]);
        assert_eq!(used.opposite(), Some(handle));
    }

    #[test]
    fn evaluate_carries_options() {
        let machine = MachineBuilder::<TestState>::new(
            MachineOptions::new()
                .field("status")
                .namespace("employment")
                .track(true),
        )
        .evaluate()
        .unwrap();

        assert_eq!(machine.field(), "status");
        assert_eq!(machine.namespace().as_str(), "employment");
        assert!(machine.tracking_enabled());
        assert!(machine.initial_state().is_none());
    }
}
