//! Registry of the machines declared on one record type.

use super::definition::MachineDefinition;
use crate::builder::DefinitionError;
use crate::core::{Namespace, State};
use crate::integration::{
    persist_or_undo, Clock, HostRecord, IntegrationContext, Peers, PersistError, Record, Stamp,
    SystemClock, TransitionError, Violation,
};
use std::any::Any;
use std::sync::Arc;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use tracing::{debug, warn};

/// One registered machine, seen through the host record type `R` only.
trait Governor<R>: Send + Sync {
    fn namespace(&self) -> &Namespace;

    fn field(&self) -> &str;

    fn as_any(&self) -> &dyn Any;

    fn validate(
        &self,
        record: &mut R,
        clock: &Arc<dyn Clock>,
    ) -> Validation<(), NonEmptyVec<Violation>>;

    fn track(&self, record: &mut R, clock: &Arc<dyn Clock>) -> Vec<Stamp>;

    fn ensure_initial_state(&self, record: &mut R) -> bool;
}

struct Governed<S: State>(Arc<MachineDefinition<S>>);

impl<S: State> Governed<S> {
    fn bind<'r, R: Record<S>>(
        &self,
        record: &'r mut R,
        clock: &Arc<dyn Clock>,
    ) -> IntegrationContext<S, &'r mut R> {
        IntegrationContext::new(Arc::clone(&self.0), record).with_clock(Arc::clone(clock))
    }
}

impl<S: State, R: Record<S>> Governor<R> for Governed<S> {
    fn namespace(&self) -> &Namespace {
        self.0.namespace()
    }

    fn field(&self) -> &str {
        self.0.field()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn validate(
        &self,
        record: &mut R,
        clock: &Arc<dyn Clock>,
    ) -> Validation<(), NonEmptyVec<Violation>> {
        self.bind(record, clock).validate_transition()
    }

    fn track(&self, record: &mut R, clock: &Arc<dyn Clock>) -> Vec<Stamp> {
        self.bind(record, clock).track_stamps()
    }

    fn ensure_initial_state(&self, record: &mut R) -> bool {
        IntegrationContext::new(Arc::clone(&self.0), record).ensure_initial_state()
    }
}

/// The registry's machines as seen from a context bound to one of them.
struct RegistryPeers<R> {
    machines: Vec<Arc<dyn Governor<R>>>,
    clock: Arc<dyn Clock>,
}

impl<'r, R: HostRecord + 'static> Peers<&'r mut R> for RegistryPeers<R> {
    fn validate(
        &self,
        own: &Namespace,
        record: &mut &'r mut R,
    ) -> Vec<Validation<(), NonEmptyVec<Violation>>> {
        self.machines
            .iter()
            .filter(|machine| machine.namespace() != own)
            .map(|machine| machine.validate(&mut **record, &self.clock))
            .collect()
    }

    fn track(&self, own: &Namespace, record: &mut &'r mut R) -> Vec<Stamp> {
        let mut stamps = Vec::new();
        for machine in self.machines.iter().filter(|m| m.namespace() != own) {
            stamps.extend(machine.track(&mut **record, &self.clock));
        }
        stamps
    }
}

/// Every machine of one host record type, one per namespace.
///
/// Machines may govern fields of different state types. Built once by the
/// host and shared by reference with everything that touches its records.
/// Registration order is kept: record-wide operations visit machines in
/// the order they were registered.
pub struct MachineRegistry<R> {
    machines: Vec<Arc<dyn Governor<R>>>,
    clock: Arc<dyn Clock>,
}

impl<R: HostRecord + 'static> MachineRegistry<R> {
    pub fn new() -> Self {
        Self {
            machines: Vec::new(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Clock handed to every context this registry creates.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Add an evaluated machine. Each namespace may be registered once.
    pub fn register<S: State>(
        &mut self,
        machine: MachineDefinition<S>,
    ) -> Result<Arc<MachineDefinition<S>>, DefinitionError>
    where
        R: Record<S>,
    {
        if self.contains(machine.namespace()) {
            return Err(DefinitionError::DuplicateNamespace {
                namespace: machine.namespace().to_string(),
            });
        }

        debug!(
            namespace = %machine.namespace(),
            field = machine.field(),
            "registered state machine"
        );
        let machine = Arc::new(machine);
        self.machines
            .push(Arc::new(Governed(Arc::clone(&machine))));
        Ok(machine)
    }

    /// The machine of `namespace`, if it governs states of type `S`.
    pub fn get<S: State>(&self, namespace: &Namespace) -> Option<&Arc<MachineDefinition<S>>> {
        self.find(namespace)?
            .as_any()
            .downcast_ref::<Governed<S>>()
            .map(|governed| &governed.0)
    }

    /// The machine registered under the default namespace.
    pub fn default_machine<S: State>(&self) -> Option<&Arc<MachineDefinition<S>>> {
        self.get(&Namespace::default())
    }

    pub fn contains(&self, namespace: &Namespace) -> bool {
        self.find(namespace).is_some()
    }

    /// Field governed by the machine of `namespace`.
    pub fn field(&self, namespace: &Namespace) -> Option<&str> {
        self.find(namespace).map(|machine| machine.field())
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &Namespace> {
        self.machines.iter().map(|machine| machine.namespace())
    }

    pub fn len(&self) -> usize {
        self.machines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }

    /// Bind the machine of `namespace` to a record.
    ///
    /// The context's save cycle validates and tracks every machine of the
    /// registry, so a save through one namespace never persists an illegal
    /// change made through another.
    pub fn integration<'r, S: State>(
        &self,
        namespace: &Namespace,
        record: &'r mut R,
    ) -> Option<IntegrationContext<S, &'r mut R>>
    where
        R: Record<S>,
    {
        let machine = self.get::<S>(namespace)?;
        let peers: Arc<dyn Peers<&'r mut R>> = Arc::new(RegistryPeers {
            machines: self.machines.clone(),
            clock: Arc::clone(&self.clock),
        });
        Some(
            IntegrationContext::new(Arc::clone(machine), record)
                .with_clock(Arc::clone(&self.clock))
                .with_peers(peers),
        )
    }

    /// Validate the pending change of every machine, collecting all violations.
    pub fn validate_all(&self, record: &mut R) -> Validation<(), NonEmptyVec<Violation>> {
        let checks: Vec<Validation<(), NonEmptyVec<Violation>>> = self
            .machines
            .iter()
            .map(|machine| machine.validate(record, &self.clock))
            .collect();

        Validation::all_vec(checks).map(|_| ())
    }

    /// Record entry timestamps for every tracking machine.
    pub fn track_all(&self, record: &mut R) {
        for machine in &self.machines {
            machine.track(record, &self.clock);
        }
    }

    /// Give a new record the initial state of every machine whose field is empty.
    pub fn ensure_initial_states(&self, record: &mut R) {
        for machine in &self.machines {
            machine.ensure_initial_state(record);
        }
    }

    /// Run the save cycle for every machine: validate all, track all if
    /// valid, then persist.
    ///
    /// Returns `Ok(false)` when the record was refused as invalid.
    pub fn save(&self, record: &mut R) -> Result<bool, TransitionError> {
        record.clear_errors();

        if self.validate_all(record).is_failure() {
            return Ok(false);
        }

        let mut stamps = Vec::new();
        for machine in &self.machines {
            stamps.extend(machine.track(record, &self.clock));
        }

        match persist_or_undo(record, &stamps) {
            Ok(()) => Ok(true),
            Err(PersistError::Invalid(_)) => Ok(false),
            Err(error) => {
                warn!(error = %error, "failed to persist record");
                Err(error.into())
            }
        }
    }

    fn find(&self, namespace: &Namespace) -> Option<&Arc<dyn Governor<R>>> {
        self.machines
            .iter()
            .find(|machine| machine.namespace() == namespace)
    }
}

impl<R: HostRecord + 'static> Default for MachineRegistry<R> {
    fn default() -> Self {
        Self::new()
    }
}
