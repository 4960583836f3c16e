//! Property-based tests for rule matching, aliases and history.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated machines and timelines.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use statebound::builder::{AliasBuilder, MachineBuilder, MachineOptions, TransitionBuilder};
use statebound::core::{Endpoint, EntryTimeline};
use statebound::machine::MachineDefinition;
use statebound::state_enum;
use std::collections::HashMap;

state_enum! {
    enum Phase {
        Pending => "pending",
        Activated => "activated",
        Deactivated => "deactivated",
        Semiactivated => "semiactivated",
        Hyperactivated => "hyperactivated",
    }
}

const PHASES: [Phase; 5] = [
    Phase::Pending,
    Phase::Activated,
    Phase::Deactivated,
    Phase::Semiactivated,
    Phase::Hyperactivated,
];

fn endpoint(index: usize) -> Endpoint<Phase> {
    match index {
        5 => Endpoint::Unset,
        6 => Endpoint::Any,
        i => Endpoint::State(PHASES[i].clone()),
    }
}

fn all_endpoints() -> Vec<Endpoint<Phase>> {
    (0..7).map(endpoint).collect()
}

prop_compose! {
    /// A rule as a source bitmask over the seven endpoints and a target index.
    fn arbitrary_rule()(sources in 1..128u8, target in 0..7usize) -> (u8, usize) {
        (sources, target)
    }
}

fn build(rules: &[(u8, usize)]) -> MachineDefinition<Phase> {
    let mut builder = MachineBuilder::new(MachineOptions::new());
    for (sources, target) in rules {
        let mut transition = TransitionBuilder::<Phase>::new();
        for bit in 0..7 {
            if (sources >> bit) & 1 == 1 {
                transition = transition.from(endpoint(bit));
            }
        }
        // Conflicting rules are rejected; the machine keeps the rest.
        let _ = builder.register_transition(transition.to(endpoint(*target)));
    }
    builder.evaluate().unwrap()
}

fn reference_match(
    machine: &MachineDefinition<Phase>,
    from: &Endpoint<Phase>,
    to: &Endpoint<Phase>,
) -> Option<usize> {
    machine.transitions().iter().position(|rule| {
        let accepts = *from == Endpoint::Any
            || rule.from_states().contains(&Endpoint::Any)
            || rule.from_states().contains(from);
        let reaches =
            *to == Endpoint::Any || *rule.to_state() == Endpoint::Any || rule.to_state() == to;
        accepts && reaches
    })
}

fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
}

proptest! {
    #[test]
    fn matching_transition_is_first_match(rules in prop::collection::vec(arbitrary_rule(), 0..12)) {
        let machine = build(&rules);

        for from in all_endpoints() {
            for to in all_endpoints() {
                let found = machine.matching_transition(&from, &to).map(|h| h.index());
                prop_assert_eq!(found, reference_match(&machine, &from, &to));
            }
        }
    }

    #[test]
    fn concrete_pairs_resolve_to_at_most_one_rule(rules in prop::collection::vec(arbitrary_rule(), 0..12)) {
        let machine = build(&rules);
        let concrete: Vec<Endpoint<Phase>> = (0..6).map(endpoint).collect();

        for from in &concrete {
            for to in &concrete[..5] {
                let resolving = machine
                    .transitions()
                    .iter()
                    .filter(|rule| rule.matches(from, to))
                    .count();
                prop_assert!(
                    resolving <= 1,
                    "{} -> {} resolved by {} rules",
                    from,
                    to,
                    resolving
                );
            }
        }
    }

    #[test]
    fn negated_alias_is_complement(mask in 0..32u8, current in 0..5usize) {
        let members: Vec<Phase> = (0..5)
            .filter(|i| (mask >> i) & 1 == 1)
            .map(|i| PHASES[i].clone())
            .collect();

        let mut builder = MachineBuilder::new(MachineOptions::new());
        for phase in PHASES {
            builder.state(phase).unwrap();
        }
        let handle = builder
            .register_alias(AliasBuilder::new("outside").is_not(members.clone()).opposite("inside"))
            .unwrap();
        let machine = builder.evaluate().unwrap();

        let outside = machine.alias(handle).unwrap();
        let inside = machine.alias(outside.opposite().unwrap()).unwrap();
        let state = &PHASES[current];

        prop_assert_eq!(outside.holds(Some(state)), !members.contains(state));
        prop_assert_eq!(inside.holds(Some(state)), members.contains(state));
        prop_assert!(!outside.holds(None));
    }

    #[test]
    fn entered_states_hold_until_superseded(
        order in Just(PHASES.to_vec()).prop_shuffle(),
        visited in 1..=5usize,
        gaps in prop::collection::vec(1..60i64, 5),
        query in 0..400i64,
    ) {
        let mut entered = HashMap::new();
        let mut clock = 0;
        for (phase, gap) in order.iter().take(visited).zip(&gaps) {
            clock += gap;
            entered.insert(phase.clone(), at(clock));
        }
        let timeline = EntryTimeline::new(&PHASES[..], |s: &Phase| entered.get(s).copied());
        let query = at(query);

        let expected = order
            .iter()
            .take(visited)
            .filter(|phase| entered[*phase] <= query)
            .last();

        for phase in &PHASES {
            prop_assert_eq!(timeline.in_state_at(phase, query), Some(phase) == expected);
        }
        prop_assert_eq!(timeline.likely_state_at(query), expected);
    }
}
