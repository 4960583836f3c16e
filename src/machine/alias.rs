//! Aliases: named boolean predicates over sets of states.

use crate::core::State;

/// Typed reference to an alias of one machine.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct AliasHandle(pub(crate) usize);

impl AliasHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A named predicate: "the current state is (not) one of `members`".
///
/// The set of states the predicate is true for is resolved once, when the
/// machine is evaluated, against the machine's full list of states.
#[derive(Clone, Debug, PartialEq)]
pub struct AliasRule<S: State> {
    pub(crate) name: String,
    pub(crate) qualified_name: String,
    pub(crate) members: Vec<S>,
    pub(crate) negated: bool,
    pub(crate) opposite: Option<AliasHandle>,
    pub(crate) derived: Vec<S>,
}

impl<S: State> AliasRule<S> {
    pub(crate) fn resolve(
        name: String,
        qualified_name: String,
        members: Vec<S>,
        negated: bool,
        states: &[S],
    ) -> Self {
        let derived = if negated {
            states
                .iter()
                .filter(|state| !members.contains(state))
                .cloned()
                .collect()
        } else {
            members.clone()
        };

        Self {
            name,
            qualified_name,
            members,
            negated,
            opposite: None,
            derived,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// States named when the alias was declared.
    pub fn members(&self) -> &[S] {
        &self.members
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// The automatically generated logical opposite, if one was requested.
    pub fn opposite(&self) -> Option<AliasHandle> {
        self.opposite
    }

    /// States for which the alias holds.
    pub fn derived_members(&self) -> &[S] {
        &self.derived
    }

    /// Whether the alias holds for a field currently holding `current`.
    pub fn holds(&self, current: Option<&S>) -> bool {
        current.is_some_and(|state| self.derived.contains(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    enum House {
        Dirty,
        Disgusting,
        Clean,
    }

    impl State for House {
        fn name(&self) -> &str {
            match self {
                Self::Dirty => "dirty",
                Self::Disgusting => "disgusting",
                Self::Clean => "clean",
            }
        }
    }

    const STATES: [House; 3] = [House::Dirty, House::Disgusting, House::Clean];

    #[test]
    fn plain_alias_holds_for_members() {
        let alias = AliasRule::resolve(
            "messy".into(),
            "messy".into(),
            vec![House::Dirty, House::Disgusting],
            false,
            &STATES,
        );

        assert_eq!(alias.derived_members(), &[House::Dirty, House::Disgusting]);
        assert!(alias.holds(Some(&House::Dirty)));
        assert!(!alias.holds(Some(&House::Clean)));
        assert!(!alias.holds(None));
    }

    #[test]
    fn negated_alias_holds_for_remaining_states() {
        let alias = AliasRule::resolve(
            "cleaned".into(),
            "house_cleaned".into(),
            vec![House::Dirty, House::Disgusting],
            true,
            &STATES,
        );

        assert!(alias.is_negated());
        assert_eq!(alias.derived_members(), &[House::Clean]);
        assert!(alias.holds(Some(&House::Clean)));
        assert!(!alias.holds(Some(&House::Disgusting)));
        assert_eq!(alias.qualified_name(), "house_cleaned");
    }
}
