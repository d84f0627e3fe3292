//! The compilation unit: one circuit bound to its target predicates.

use quire_ir::{Circuit, QubitId};

use crate::predicate::PredicatePtr;

/// A circuit under compilation together with what it must satisfy.
///
/// The unit owns its own copy of the circuit, so the caller's value is
/// never mutated. Only passes get mutable access.
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    circuit: Circuit,
    target_predicates: Vec<PredicatePtr>,
    /// `initial_map[logical]` is the physical qubit chosen by placement.
    initial_map: Vec<QubitId>,
    /// `final_map[logical]` is where the logical qubit ends after routing.
    final_map: Vec<QubitId>,
}

impl CompilationUnit {
    /// Wrap a copy of `circuit` with no target predicates.
    pub fn new(circuit: &Circuit) -> Self {
        Self::with_predicates(circuit, Vec::new())
    }

    /// Wrap a copy of `circuit` with target predicates.
    #[allow(clippy::cast_possible_truncation)]
    pub fn with_predicates(circuit: &Circuit, target_predicates: Vec<PredicatePtr>) -> Self {
        let identity: Vec<_> = (0..circuit.num_qubits() as u32).map(QubitId).collect();
        Self {
            circuit: circuit.clone(),
            target_predicates,
            initial_map: identity.clone(),
            final_map: identity,
        }
    }

    /// The current circuit.
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    pub(crate) fn circuit_mut(&mut self) -> &mut Circuit {
        &mut self.circuit
    }

    /// A copy of the current circuit.
    pub fn extract_circuit(&self) -> Circuit {
        self.circuit.clone()
    }

    /// Consume the unit, returning its circuit.
    pub fn into_circuit(self) -> Circuit {
        self.circuit
    }

    /// The target predicates.
    pub fn target_predicates(&self) -> &[PredicatePtr] {
        &self.target_predicates
    }

    /// Whether every target predicate holds.
    pub fn check_all_predicates(&self) -> bool {
        self.target_predicates
            .iter()
            .all(|p| p.verify(&self.circuit))
    }

    /// The target predicates the circuit currently fails.
    pub fn failing_predicates(&self) -> Vec<PredicatePtr> {
        self.target_predicates
            .iter()
            .filter(|p| !p.verify(&self.circuit))
            .cloned()
            .collect()
    }

    /// Logical to physical map chosen by placement. Identity until placed.
    pub fn initial_map(&self) -> &[QubitId] {
        &self.initial_map
    }

    /// Logical to physical map at the end of the circuit. Identity until routed.
    pub fn final_map(&self) -> &[QubitId] {
        &self.final_map
    }

    /// Extend both maps with identity entries for wires added by padding.
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn pad_maps(&mut self, num_qubits: usize) {
        for i in self.initial_map.len()..num_qubits {
            self.initial_map.push(QubitId(i as u32));
        }
        for i in self.final_map.len()..num_qubits {
            self.final_map.push(QubitId(i as u32));
        }
    }

    /// Compose a relabelling of the circuit's qubits onto both maps.
    pub(crate) fn relabel_maps(&mut self, relabel: impl Fn(QubitId) -> QubitId) {
        for q in self.initial_map.iter_mut().chain(self.final_map.iter_mut()) {
            *q = relabel(*q);
        }
    }

    /// Compose wire movement at the end of the circuit onto the final map.
    pub(crate) fn move_final_map(&mut self, movement: impl Fn(QubitId) -> QubitId) {
        for q in &mut self.final_map {
            *q = movement(*q);
        }
    }
}
