//! Circuit predicates: checkable properties passes require and establish.
//!
//! Every predicate has a [`PredicateKind`] giving it a stable identity, so
//! pass contracts can talk about "the gate-set property" independently of
//! the particular gate set. Predicates are immutable and shared as
//! [`PredicatePtr`].

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use quire_ir::{Circuit, Instruction, InstructionKind, StandardGate};
use rustc_hash::FxHashSet;

use crate::architecture::Architecture;

/// Stable identity of a predicate family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PredicateKind {
    /// Every gate belongs to an allowed set.
    GateSet,
    /// Every multi-qubit operation acts on an architecture edge.
    Connectivity,
    /// No gate is classically controlled.
    NoClassicalControl,
    /// No operation follows a measurement on the same wire.
    NoMidMeasure,
    /// The implicit wire permutation is the identity.
    NoWireSwaps,
    /// No unbound symbolic parameters.
    NoSymbols,
    /// No gate acts on more than two qubits.
    MaxTwoQubitGates,
    /// No gate acts on two or more qubits.
    NoMultiQubitGates,
}

impl fmt::Display for PredicateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A boolean property of a circuit.
pub trait Predicate: fmt::Debug + Send + Sync {
    /// The family this predicate belongs to.
    fn kind(&self) -> PredicateKind;

    /// Short name used in errors and logs.
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> String;

    /// Check the property. Must not mutate and must be deterministic.
    fn verify(&self, circuit: &Circuit) -> bool;

    /// Whether every circuit satisfying `self` also satisfies `other`.
    fn implies(&self, other: &dyn Predicate) -> bool;

    /// The allowed gate names, for gate-set predicates.
    fn gate_set(&self) -> Option<&BTreeSet<String>> {
        None
    }

    /// The target architecture, for connectivity predicates.
    fn architecture(&self) -> Option<&Architecture> {
        None
    }
}

/// Shared, immutable predicate handle.
pub type PredicatePtr = Arc<dyn Predicate>;

/// Every gate's name is in the allowed set.
///
/// Measure, reset, barrier and delay are not gates and always pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateSetPredicate {
    allowed: BTreeSet<String>,
}

impl GateSetPredicate {
    /// Create a gate-set predicate.
    pub fn new(allowed: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    /// Every single-qubit standard gate plus `cx`.
    pub fn one_qubit_and_cx() -> Self {
        Self::new(StandardGate::SINGLE_QUBIT_NAMES.iter().copied().chain(["cx"]))
    }

    /// Check if a gate name is allowed.
    pub fn contains(&self, name: &str) -> bool {
        self.allowed.contains(name)
    }
}

impl Predicate for GateSetPredicate {
    fn kind(&self) -> PredicateKind {
        PredicateKind::GateSet
    }

    fn name(&self) -> &str {
        "GateSet"
    }

    fn description(&self) -> String {
        let names: Vec<_> = self.allowed.iter().map(String::as_str).collect();
        format!("every gate is one of {{{}}}", names.join(", "))
    }

    fn verify(&self, circuit: &Circuit) -> bool {
        circuit
            .instructions()
            .iter()
            .filter_map(|inst| inst.as_gate())
            .all(|gate| self.allowed.contains(gate.name()))
    }

    fn implies(&self, other: &dyn Predicate) -> bool {
        other.kind() == PredicateKind::GateSet
            && other
                .gate_set()
                .is_some_and(|theirs| self.allowed.is_subset(theirs))
    }

    fn gate_set(&self) -> Option<&BTreeSet<String>> {
        Some(&self.allowed)
    }
}

/// Every multi-qubit operation acts on an edge of the architecture.
///
/// Operations on more than two qubits fail, except barriers and bridges
/// whose two hops are both edges. Every qubit must name a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectivityPredicate {
    architecture: Architecture,
}

impl ConnectivityPredicate {
    /// Create a connectivity predicate.
    pub fn new(architecture: Architecture) -> Self {
        Self { architecture }
    }
}

impl Predicate for ConnectivityPredicate {
    fn kind(&self) -> PredicateKind {
        PredicateKind::Connectivity
    }

    fn name(&self) -> &str {
        "Connectivity"
    }

    fn description(&self) -> String {
        format!(
            "every two-qubit operation acts on one of {} edges over {} nodes",
            self.architecture.num_edges(),
            self.architecture.num_nodes()
        )
    }

    fn verify(&self, circuit: &Circuit) -> bool {
        let nodes = self.architecture.num_nodes();
        circuit.instructions().iter().all(|inst| {
            if inst.qubits.iter().any(|q| q.index() >= nodes) {
                return false;
            }
            match (inst.qubits.as_slice(), &inst.kind) {
                (_, InstructionKind::Barrier) | ([] | [_], _) => true,
                ([a, b], _) => self.architecture.are_adjacent(a.0, b.0),
                ([a, m, b], _) if is_bridge(inst) => {
                    self.architecture.are_adjacent(a.0, m.0)
                        && self.architecture.are_adjacent(m.0, b.0)
                }
                _ => false,
            }
        })
    }

    fn implies(&self, other: &dyn Predicate) -> bool {
        other.kind() == PredicateKind::Connectivity
            && other
                .architecture()
                .is_some_and(|theirs| *theirs == self.architecture)
    }

    fn architecture(&self) -> Option<&Architecture> {
        Some(&self.architecture)
    }
}

fn is_bridge(inst: &Instruction) -> bool {
    matches!(
        inst.as_gate().and_then(|g| g.as_standard()),
        Some(StandardGate::Bridge)
    )
}

/// No gate carries a classical condition.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClassicalControlPredicate;

impl Predicate for NoClassicalControlPredicate {
    fn kind(&self) -> PredicateKind {
        PredicateKind::NoClassicalControl
    }

    fn name(&self) -> &str {
        "NoClassicalControl"
    }

    fn description(&self) -> String {
        "no gate is classically controlled".into()
    }

    fn verify(&self, circuit: &Circuit) -> bool {
        circuit
            .instructions()
            .iter()
            .filter_map(|inst| inst.as_gate())
            .all(|gate| !gate.is_conditional())
    }

    fn implies(&self, other: &dyn Predicate) -> bool {
        other.kind() == self.kind()
    }
}

/// Measurements are terminal on their qubit and bit.
///
/// After a measurement no operation other than a barrier touches the
/// measured qubit, and the written bit is neither overwritten nor read by a
/// later condition.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMidMeasurePredicate;

impl Predicate for NoMidMeasurePredicate {
    fn kind(&self) -> PredicateKind {
        PredicateKind::NoMidMeasure
    }

    fn name(&self) -> &str {
        "NoMidMeasure"
    }

    fn description(&self) -> String {
        "all measurements are at the end of the circuit".into()
    }

    fn verify(&self, circuit: &Circuit) -> bool {
        let mut measured_qubits = FxHashSet::default();
        let mut measured_bits = FxHashSet::default();

        for inst in circuit.instructions() {
            let touches_bit = inst
                .clbits
                .iter()
                .chain(inst.condition_bits())
                .any(|c| measured_bits.contains(c));
            if touches_bit {
                return false;
            }
            if !inst.is_barrier() && inst.qubits.iter().any(|q| measured_qubits.contains(q)) {
                return false;
            }
            if inst.is_measure() {
                measured_qubits.extend(inst.qubits.iter().copied());
                measured_bits.extend(inst.clbits.iter().copied());
            }
        }
        true
    }

    fn implies(&self, other: &dyn Predicate) -> bool {
        other.kind() == self.kind()
    }
}

/// The implicit wire permutation is the identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWireSwapsPredicate;

impl Predicate for NoWireSwapsPredicate {
    fn kind(&self) -> PredicateKind {
        PredicateKind::NoWireSwaps
    }

    fn name(&self) -> &str {
        "NoWireSwaps"
    }

    fn description(&self) -> String {
        "output wires carry their own input qubits".into()
    }

    fn verify(&self, circuit: &Circuit) -> bool {
        !circuit.is_permuted()
    }

    fn implies(&self, other: &dyn Predicate) -> bool {
        other.kind() == self.kind()
    }
}

/// No unbound symbolic parameter remains.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSymbolsPredicate;

impl Predicate for NoSymbolsPredicate {
    fn kind(&self) -> PredicateKind {
        PredicateKind::NoSymbols
    }

    fn name(&self) -> &str {
        "NoSymbols"
    }

    fn description(&self) -> String {
        "every parameter is numeric".into()
    }

    fn verify(&self, circuit: &Circuit) -> bool {
        circuit.symbols().is_empty()
    }

    fn implies(&self, other: &dyn Predicate) -> bool {
        other.kind() == self.kind()
    }
}

/// No gate acts on more than two qubits.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxTwoQubitGatesPredicate;

impl Predicate for MaxTwoQubitGatesPredicate {
    fn kind(&self) -> PredicateKind {
        PredicateKind::MaxTwoQubitGates
    }

    fn name(&self) -> &str {
        "MaxTwoQubitGates"
    }

    fn description(&self) -> String {
        "no gate acts on more than two qubits".into()
    }

    fn verify(&self, circuit: &Circuit) -> bool {
        circuit
            .instructions()
            .iter()
            .all(|inst| inst.is_barrier() || inst.qubits.len() <= 2)
    }

    fn implies(&self, other: &dyn Predicate) -> bool {
        other.kind() == self.kind()
    }
}

/// No gate acts on two or more qubits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMultiQubitGatesPredicate;

impl Predicate for NoMultiQubitGatesPredicate {
    fn kind(&self) -> PredicateKind {
        PredicateKind::NoMultiQubitGates
    }

    fn name(&self) -> &str {
        "NoMultiQubitGates"
    }

    fn description(&self) -> String {
        "every gate acts on a single qubit".into()
    }

    fn verify(&self, circuit: &Circuit) -> bool {
        circuit.count_multi_qubit_gates() == 0
    }

    fn implies(&self, other: &dyn Predicate) -> bool {
        other.kind() == self.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_ir::{ClassicalCondition, ClbitId, Gate, ParameterExpression, QubitId};

    fn q(i: u32) -> QubitId {
        QubitId(i)
    }

    #[test]
    fn test_gate_set_ignores_non_gates() {
        let mut circuit = Circuit::with_size("test", 2, 2);
        circuit.rz(0.3, q(0)).unwrap();
        circuit.cx(q(0), q(1)).unwrap();
        circuit.barrier([q(0), q(1)]).unwrap();
        circuit.measure_all().unwrap();

        assert!(GateSetPredicate::new(["rz", "cx"]).verify(&circuit));
        assert!(!GateSetPredicate::new(["rz"]).verify(&circuit));
    }

    #[test]
    fn test_gate_set_implication_is_subset() {
        let small = GateSetPredicate::new(["rz", "cx"]);
        let large = GateSetPredicate::new(["rz", "rx", "cx"]);
        assert!(small.implies(&large));
        assert!(!large.implies(&small));
        assert!(!small.implies(&NoSymbolsPredicate));
    }

    #[test]
    fn test_connectivity() {
        let pred = ConnectivityPredicate::new(Architecture::line(3));

        let mut ok = Circuit::with_size("ok", 3, 0);
        ok.cx(q(0), q(1)).unwrap().cx(q(2), q(1)).unwrap();
        ok.barrier([q(0), q(1), q(2)]).unwrap();
        assert!(pred.verify(&ok));

        let mut far = Circuit::with_size("far", 3, 0);
        far.cx(q(0), q(2)).unwrap();
        assert!(!pred.verify(&far));

        let mut wide = Circuit::with_size("wide", 3, 0);
        wide.ccx(q(0), q(1), q(2)).unwrap();
        assert!(!pred.verify(&wide));

        let mut bridged = Circuit::with_size("bridged", 3, 0);
        bridged.bridge(q(0), q(1), q(2)).unwrap();
        assert!(pred.verify(&bridged));
        let mut bad_bridge = Circuit::with_size("bad", 3, 0);
        bad_bridge.bridge(q(1), q(0), q(2)).unwrap();
        assert!(!pred.verify(&bad_bridge));

        let mut too_many = Circuit::with_size("big", 4, 0);
        too_many.h(q(3)).unwrap();
        assert!(!pred.verify(&too_many));
    }

    #[test]
    fn test_connectivity_implication() {
        let a = ConnectivityPredicate::new(Architecture::line(4));
        let b = ConnectivityPredicate::new(Architecture::line(4));
        let c = ConnectivityPredicate::new(Architecture::ring(4));
        assert!(a.implies(&b));
        assert!(!a.implies(&c));
    }

    #[test]
    fn test_no_classical_control() {
        let mut circuit = Circuit::with_size("test", 1, 1);
        circuit.x(q(0)).unwrap();
        assert!(NoClassicalControlPredicate.verify(&circuit));

        let gate = Gate::from(quire_ir::StandardGate::X)
            .with_condition(ClassicalCondition::new([ClbitId(0)], 1));
        circuit.gate(gate, [q(0)]).unwrap();
        assert!(!NoClassicalControlPredicate.verify(&circuit));
    }

    #[test]
    fn test_no_mid_measure() {
        let mut end = Circuit::with_size("end", 2, 2);
        end.h(q(0)).unwrap().cx(q(0), q(1)).unwrap();
        end.measure(q(0), ClbitId(0)).unwrap();
        end.barrier([q(0), q(1)]).unwrap();
        end.measure(q(1), ClbitId(1)).unwrap();
        assert!(NoMidMeasurePredicate.verify(&end));

        let mut mid = Circuit::with_size("mid", 1, 1);
        mid.measure(q(0), ClbitId(0)).unwrap().x(q(0)).unwrap();
        assert!(!NoMidMeasurePredicate.verify(&mid));

        let mut feed_forward = Circuit::with_size("ff", 2, 1);
        feed_forward.measure(q(0), ClbitId(0)).unwrap();
        let gate = Gate::from(quire_ir::StandardGate::X)
            .with_condition(ClassicalCondition::new([ClbitId(0)], 1));
        feed_forward.gate(gate, [q(1)]).unwrap();
        assert!(!NoMidMeasurePredicate.verify(&feed_forward));
    }

    #[test]
    fn test_no_symbols() {
        let mut circuit = Circuit::with_size("test", 1, 0);
        circuit.rz(ParameterExpression::symbol("a"), q(0)).unwrap();
        assert!(!NoSymbolsPredicate.verify(&circuit));
        circuit.bind("a", 1.0);
        assert!(NoSymbolsPredicate.verify(&circuit));
    }

    #[test]
    fn test_gate_width_predicates() {
        let mut circuit = Circuit::with_size("test", 3, 0);
        circuit.h(q(0)).unwrap();
        assert!(NoMultiQubitGatesPredicate.verify(&circuit));
        circuit.cx(q(0), q(1)).unwrap();
        assert!(!NoMultiQubitGatesPredicate.verify(&circuit));
        assert!(MaxTwoQubitGatesPredicate.verify(&circuit));
        circuit.ccx(q(0), q(1), q(2)).unwrap();
        assert!(!MaxTwoQubitGatesPredicate.verify(&circuit));
    }

    #[test]
    fn test_wire_swaps() {
        let mut circuit = Circuit::with_size("test", 2, 0);
        assert!(NoWireSwapsPredicate.verify(&circuit));
        circuit.set_implicit_permutation(vec![q(1), q(0)]).unwrap();
        assert!(!NoWireSwapsPredicate.verify(&circuit));
    }

    #[test]
    fn test_unit_predicates_imply_own_kind() {
        assert!(NoSymbolsPredicate.implies(&NoSymbolsPredicate));
        assert!(!NoSymbolsPredicate.implies(&NoMidMeasurePredicate));
        assert_eq!(NoSymbolsPredicate.kind().to_string(), "NoSymbols");
    }
}
