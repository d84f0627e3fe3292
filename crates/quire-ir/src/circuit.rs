//! The circuit value passes operate on.

use std::collections::BTreeSet;

use rustc_hash::FxHashSet;

use crate::error::{IrError, IrResult};
use crate::gate::{Gate, StandardGate};
use crate::instruction::{Instruction, InstructionKind};
use crate::parameter::ParameterExpression;
use crate::qubit::{Clbit, ClbitId, Qubit, QubitId};

/// A quantum circuit: an ordered list of instructions over qubits and bits.
///
/// Equality is structural: two circuits are equal when they have the same
/// wires, the same instruction sequence, and the same implicit permutation.
/// The name is a label and does not take part.
#[derive(Debug, Clone)]
pub struct Circuit {
    /// Name of the circuit.
    name: String,
    /// Qubits in the circuit, indexed by `QubitId`.
    qubits: Vec<Qubit>,
    /// Classical bits in the circuit, indexed by `ClbitId`.
    clbits: Vec<Clbit>,
    /// Instructions in program order.
    instructions: Vec<Instruction>,
    /// Logical output `i` is read from wire `permutation[i]`.
    permutation: Vec<QubitId>,
}

impl PartialEq for Circuit {
    fn eq(&self, other: &Self) -> bool {
        self.qubits == other.qubits
            && self.clbits == other.clbits
            && self.instructions == other.instructions
            && self.permutation == other.permutation
    }
}

impl Circuit {
    /// Create a new empty circuit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qubits: vec![],
            clbits: vec![],
            instructions: vec![],
            permutation: vec![],
        }
    }

    /// Create a circuit with a given number of qubits and classical bits.
    pub fn with_size(name: impl Into<String>, num_qubits: u32, num_clbits: u32) -> Self {
        let mut circuit = Self::new(name);
        for _ in 0..num_qubits {
            circuit.add_qubit();
        }
        for _ in 0..num_clbits {
            circuit.add_clbit();
        }
        circuit
    }

    /// Create an empty circuit with the same name and wires as `self`.
    pub fn empty_like(&self) -> Self {
        Self {
            name: self.name.clone(),
            qubits: self.qubits.clone(),
            clbits: self.clbits.clone(),
            instructions: vec![],
            permutation: self.permutation.clone(),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn next_qubit_id(&self) -> QubitId {
        QubitId(self.qubits.len() as u32)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn next_clbit_id(&self) -> ClbitId {
        ClbitId(self.clbits.len() as u32)
    }

    /// Add a single qubit to the circuit.
    pub fn add_qubit(&mut self) -> QubitId {
        let id = self.next_qubit_id();
        self.qubits.push(Qubit::new(id));
        self.permutation.push(id);
        id
    }

    /// Add a quantum register with multiple qubits.
    pub fn add_qreg(&mut self, name: impl Into<String>, size: u32) -> Vec<QubitId> {
        let name = name.into();
        (0..size)
            .map(|i| {
                let id = self.next_qubit_id();
                self.qubits.push(Qubit::with_register(id, &name, i));
                self.permutation.push(id);
                id
            })
            .collect()
    }

    /// Add a single classical bit to the circuit.
    pub fn add_clbit(&mut self) -> ClbitId {
        let id = self.next_clbit_id();
        self.clbits.push(Clbit::new(id));
        id
    }

    /// Add a classical register with multiple bits.
    pub fn add_creg(&mut self, name: impl Into<String>, size: u32) -> Vec<ClbitId> {
        let name = name.into();
        (0..size)
            .map(|i| {
                let id = self.next_clbit_id();
                self.clbits.push(Clbit::with_register(id, &name, i));
                id
            })
            .collect()
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Validate an instruction against this circuit's wires.
    fn validate(&self, inst: &Instruction) -> IrResult<()> {
        let gate_name = || Some(inst.name().to_string());

        let mut seen = FxHashSet::default();
        for &qubit in &inst.qubits {
            if qubit.index() >= self.qubits.len() {
                return Err(IrError::QubitNotFound {
                    qubit,
                    gate_name: gate_name(),
                });
            }
            if !seen.insert(qubit) {
                return Err(IrError::DuplicateQubit {
                    qubit,
                    gate_name: gate_name(),
                });
            }
        }

        for &clbit in inst.clbits.iter().chain(inst.condition_bits()) {
            if clbit.0 as usize >= self.clbits.len() {
                return Err(IrError::ClbitNotFound {
                    clbit,
                    gate_name: gate_name(),
                });
            }
        }

        match &inst.kind {
            InstructionKind::Gate(gate) => {
                let got = u32::try_from(inst.qubits.len()).unwrap_or(u32::MAX);
                if gate.num_qubits() != got {
                    return Err(IrError::QubitCountMismatch {
                        gate_name: gate.name().to_string(),
                        expected: gate.num_qubits(),
                        got,
                    });
                }
            }
            InstructionKind::Measure => {
                if inst.qubits.len() != inst.clbits.len() {
                    return Err(IrError::MeasureArityMismatch {
                        qubits: inst.qubits.len(),
                        clbits: inst.clbits.len(),
                    });
                }
            }
            InstructionKind::Reset | InstructionKind::Delay { .. } => {
                if inst.qubits.len() != 1 {
                    return Err(IrError::QubitCountMismatch {
                        gate_name: inst.name().to_string(),
                        expected: 1,
                        got: u32::try_from(inst.qubits.len()).unwrap_or(u32::MAX),
                    });
                }
            }
            InstructionKind::Barrier => {}
        }

        Ok(())
    }

    /// Append an instruction after validating its operands.
    pub fn apply(&mut self, inst: Instruction) -> IrResult<&mut Self> {
        self.validate(&inst)?;
        self.instructions.push(inst);
        Ok(self)
    }

    /// Replace the whole instruction list.
    ///
    /// Every instruction is validated first; on error the circuit is left
    /// untouched.
    pub fn replace_instructions(&mut self, instructions: Vec<Instruction>) -> IrResult<()> {
        for inst in &instructions {
            self.validate(inst)?;
        }
        self.instructions = instructions;
        Ok(())
    }

    /// Set the implicit wire permutation.
    pub fn set_implicit_permutation(&mut self, permutation: Vec<QubitId>) -> IrResult<()> {
        if permutation.len() != self.qubits.len() {
            return Err(IrError::InvalidPermutation(format!(
                "expected {} entries, got {}",
                self.qubits.len(),
                permutation.len()
            )));
        }
        let distinct: FxHashSet<_> = permutation.iter().collect();
        if distinct.len() != permutation.len()
            || permutation.iter().any(|q| q.index() >= self.qubits.len())
        {
            return Err(IrError::InvalidPermutation(
                "not a bijection over the circuit's qubits".into(),
            ));
        }
        self.permutation = permutation;
        Ok(())
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    fn apply_standard(
        &mut self,
        gate: StandardGate,
        qubits: impl IntoIterator<Item = QubitId>,
    ) -> IrResult<&mut Self> {
        self.apply(Instruction::gate(gate, qubits))
    }

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply_standard(StandardGate::H, [qubit])
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply_standard(StandardGate::X, [qubit])
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply_standard(StandardGate::Y, [qubit])
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply_standard(StandardGate::Z, [qubit])
    }

    /// Apply S gate.
    pub fn s(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply_standard(StandardGate::S, [qubit])
    }

    /// Apply S-dagger gate.
    pub fn sdg(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply_standard(StandardGate::Sdg, [qubit])
    }

    /// Apply T gate.
    pub fn t(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply_standard(StandardGate::T, [qubit])
    }

    /// Apply T-dagger gate.
    pub fn tdg(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply_standard(StandardGate::Tdg, [qubit])
    }

    /// Apply Rx rotation gate.
    pub fn rx(
        &mut self,
        theta: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.apply_standard(StandardGate::Rx(theta.into()), [qubit])
    }

    /// Apply Ry rotation gate.
    pub fn ry(
        &mut self,
        theta: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.apply_standard(StandardGate::Ry(theta.into()), [qubit])
    }

    /// Apply Rz rotation gate.
    pub fn rz(
        &mut self,
        theta: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.apply_standard(StandardGate::Rz(theta.into()), [qubit])
    }

    // =========================================================================
    // Multi-qubit gates
    // =========================================================================

    /// Apply CNOT (CX) gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.apply_standard(StandardGate::CX, [control, target])
    }

    /// Apply CY gate.
    pub fn cy(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.apply_standard(StandardGate::CY, [control, target])
    }

    /// Apply CZ gate.
    pub fn cz(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.apply_standard(StandardGate::CZ, [control, target])
    }

    /// Apply controlled-Hadamard gate.
    pub fn ch(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.apply_standard(StandardGate::CH, [control, target])
    }

    /// Apply SWAP gate.
    pub fn swap(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.apply_standard(StandardGate::Swap, [q1, q2])
    }

    /// Apply controlled-Rx gate.
    pub fn crx(
        &mut self,
        theta: impl Into<ParameterExpression>,
        control: QubitId,
        target: QubitId,
    ) -> IrResult<&mut Self> {
        self.apply_standard(StandardGate::CRx(theta.into()), [control, target])
    }

    /// Apply controlled-Ry gate.
    pub fn cry(
        &mut self,
        theta: impl Into<ParameterExpression>,
        control: QubitId,
        target: QubitId,
    ) -> IrResult<&mut Self> {
        self.apply_standard(StandardGate::CRy(theta.into()), [control, target])
    }

    /// Apply controlled-Rz gate.
    pub fn crz(
        &mut self,
        theta: impl Into<ParameterExpression>,
        control: QubitId,
        target: QubitId,
    ) -> IrResult<&mut Self> {
        self.apply_standard(StandardGate::CRz(theta.into()), [control, target])
    }

    /// Apply controlled-phase gate.
    pub fn cp(
        &mut self,
        theta: impl Into<ParameterExpression>,
        control: QubitId,
        target: QubitId,
    ) -> IrResult<&mut Self> {
        self.apply_standard(StandardGate::CP(theta.into()), [control, target])
    }

    /// Apply RZZ (ZZ rotation) gate.
    pub fn rzz(
        &mut self,
        theta: impl Into<ParameterExpression>,
        q1: QubitId,
        q2: QubitId,
    ) -> IrResult<&mut Self> {
        self.apply_standard(StandardGate::RZZ(theta.into()), [q1, q2])
    }

    /// Apply Toffoli (CCX) gate.
    pub fn ccx(&mut self, c1: QubitId, c2: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.apply_standard(StandardGate::CCX, [c1, c2, target])
    }

    /// Apply Fredkin (CSWAP) gate.
    pub fn cswap(&mut self, control: QubitId, t1: QubitId, t2: QubitId) -> IrResult<&mut Self> {
        self.apply_standard(StandardGate::CSwap, [control, t1, t2])
    }

    /// Apply a BRIDGE: CX from `control` to `target` through `middle`.
    pub fn bridge(
        &mut self,
        control: QubitId,
        middle: QubitId,
        target: QubitId,
    ) -> IrResult<&mut Self> {
        self.apply_standard(StandardGate::Bridge, [control, middle, target])
    }

    // =========================================================================
    // Other operations
    // =========================================================================

    /// Apply an arbitrary gate, possibly classically controlled.
    pub fn gate(
        &mut self,
        gate: impl Into<Gate>,
        qubits: impl IntoIterator<Item = QubitId>,
    ) -> IrResult<&mut Self> {
        self.apply(Instruction::gate(gate, qubits))
    }

    /// Measure a qubit to a classical bit.
    pub fn measure(&mut self, qubit: QubitId, clbit: ClbitId) -> IrResult<&mut Self> {
        self.apply(Instruction::measure(qubit, clbit))
    }

    /// Measure every qubit into the classical bit of the same index,
    /// adding bits as needed.
    pub fn measure_all(&mut self) -> IrResult<&mut Self> {
        while self.clbits.len() < self.qubits.len() {
            self.add_clbit();
        }
        let pairs: Vec<_> = self
            .qubits
            .iter()
            .zip(&self.clbits)
            .map(|(q, c)| (q.id, c.id))
            .collect();
        for (qubit, clbit) in pairs {
            self.measure(qubit, clbit)?;
        }
        Ok(self)
    }

    /// Reset a qubit to |0⟩.
    pub fn reset(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::reset(qubit))
    }

    /// Apply a barrier to specified qubits.
    pub fn barrier(&mut self, qubits: impl IntoIterator<Item = QubitId>) -> IrResult<&mut Self> {
        self.apply(Instruction::barrier(qubits))
    }

    /// Apply a delay to a qubit.
    pub fn delay(&mut self, qubit: QubitId, duration: u64) -> IrResult<&mut Self> {
        self.apply(Instruction::delay(qubit, duration))
    }

    // =========================================================================
    // Accessors and queries
    // =========================================================================

    /// Get the circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.qubits.len()
    }

    /// Get the number of classical bits.
    pub fn num_clbits(&self) -> usize {
        self.clbits.len()
    }

    /// Get the qubits in the circuit.
    pub fn qubits(&self) -> &[Qubit] {
        &self.qubits
    }

    /// Get the classical bits in the circuit.
    pub fn clbits(&self) -> &[Clbit] {
        &self.clbits
    }

    /// Instructions in program order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Number of instructions.
    pub fn num_ops(&self) -> usize {
        self.instructions.len()
    }

    /// Count instructions named `name` (e.g. `"cx"`, `"measure"`).
    pub fn count_ops(&self, name: &str) -> usize {
        self.count_ops_where(|inst| inst.name() == name)
    }

    /// Count instructions matching `pred`.
    pub fn count_ops_where(&self, pred: impl Fn(&Instruction) -> bool) -> usize {
        self.instructions.iter().filter(|inst| pred(inst)).count()
    }

    /// Count gates acting on two or more qubits.
    pub fn count_multi_qubit_gates(&self) -> usize {
        self.count_ops_where(Instruction::is_multi_qubit_gate)
    }

    /// Circuit depth: the longest chain of instructions sharing a wire.
    ///
    /// Barriers synchronise their qubits but add no depth.
    pub fn depth(&self) -> usize {
        let mut qubit_level = vec![0usize; self.qubits.len()];
        let mut clbit_level = vec![0usize; self.clbits.len()];
        let mut depth = 0;

        for inst in &self.instructions {
            let clbits: Vec<usize> = inst
                .clbits
                .iter()
                .chain(inst.condition_bits())
                .map(|c| c.0 as usize)
                .collect();
            let start = inst
                .qubits
                .iter()
                .map(|q| qubit_level[q.index()])
                .chain(clbits.iter().map(|&c| clbit_level[c]))
                .max()
                .unwrap_or(0);
            let level = if inst.is_barrier() { start } else { start + 1 };
            for q in &inst.qubits {
                qubit_level[q.index()] = level;
            }
            for c in clbits {
                clbit_level[c] = level;
            }
            depth = depth.max(level);
        }

        depth
    }

    /// Names of all unbound symbols in gate parameters.
    pub fn symbols(&self) -> BTreeSet<String> {
        let mut set = BTreeSet::new();
        for gate in self.instructions.iter().filter_map(Instruction::as_gate) {
            for param in gate.kind.parameters() {
                param.collect_symbols(&mut set);
            }
        }
        set
    }

    /// Bind `name` to `value` in every gate parameter.
    pub fn bind(&mut self, name: &str, value: f64) {
        for inst in &mut self.instructions {
            if let InstructionKind::Gate(gate) = &mut inst.kind {
                gate.bind_parameter(name, value);
            }
        }
    }

    /// The implicit wire permutation.
    pub fn implicit_permutation(&self) -> &[QubitId] {
        &self.permutation
    }

    /// Whether the implicit permutation differs from the identity.
    pub fn is_permuted(&self) -> bool {
        self.permutation
            .iter()
            .enumerate()
            .any(|(i, q)| q.index() != i)
    }

    // =========================================================================
    // Pre-built circuits
    // =========================================================================

    /// Create a Bell state circuit.
    pub fn bell() -> IrResult<Self> {
        let mut circuit = Self::with_size("bell", 2, 2);
        let (q0, q1) = (QubitId(0), QubitId(1));
        circuit
            .h(q0)?
            .cx(q0, q1)?
            .measure(q0, ClbitId(0))?
            .measure(q1, ClbitId(1))?;
        Ok(circuit)
    }

    /// Create a GHZ state circuit (without measurements).
    pub fn ghz(n: u32) -> IrResult<Self> {
        let mut circuit = Self::with_size("ghz", n, 0);
        if n == 0 {
            return Ok(circuit);
        }
        circuit.h(QubitId(0))?;
        for i in 0..n - 1 {
            circuit.cx(QubitId(i), QubitId(i + 1))?;
        }
        Ok(circuit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::ClassicalCondition;
    use std::f64::consts::PI;

    #[test]
    fn test_new_circuit() {
        let circuit = Circuit::new("test");
        assert_eq!(circuit.name(), "test");
        assert_eq!(circuit.num_qubits(), 0);
        assert_eq!(circuit.num_clbits(), 0);
        assert_eq!(circuit.depth(), 0);
    }

    #[test]
    fn test_add_registers() {
        let mut circuit = Circuit::new("test");
        let qreg = circuit.add_qreg("q", 4);
        let creg = circuit.add_creg("c", 4);

        assert_eq!(qreg, vec![QubitId(0), QubitId(1), QubitId(2), QubitId(3)]);
        assert_eq!(creg.len(), 4);
        assert_eq!(circuit.num_qubits(), 4);
        assert_eq!(circuit.qubits()[2].to_string(), "q[2]");
    }

    #[test]
    fn test_bell_state() {
        let circuit = Circuit::bell().unwrap();
        assert_eq!(circuit.num_ops(), 4);
        assert_eq!(circuit.count_ops("measure"), 2);
        assert_eq!(circuit.depth(), 3);
    }

    #[test]
    fn test_count_ops_by_kind() {
        let circuit = Circuit::ghz(4).unwrap();
        assert_eq!(circuit.count_ops("h"), 1);
        assert_eq!(circuit.count_ops("cx"), 3);
        assert_eq!(circuit.count_multi_qubit_gates(), 3);
    }

    #[test]
    fn test_apply_rejects_unknown_qubit() {
        let mut circuit = Circuit::with_size("test", 2, 0);
        let err = circuit.cx(QubitId(0), QubitId(5)).unwrap_err();
        assert!(matches!(err, IrError::QubitNotFound { .. }));
        assert_eq!(circuit.num_ops(), 0);
    }

    #[test]
    fn test_apply_rejects_duplicate_qubit() {
        let mut circuit = Circuit::with_size("test", 2, 0);
        let err = circuit.cx(QubitId(1), QubitId(1)).unwrap_err();
        assert!(matches!(err, IrError::DuplicateQubit { .. }));
    }

    #[test]
    fn test_apply_rejects_arity_mismatch() {
        let mut circuit = Circuit::with_size("test", 3, 0);
        let err = circuit
            .apply(Instruction::gate(StandardGate::CX, [QubitId(0)]))
            .unwrap_err();
        assert!(matches!(err, IrError::QubitCountMismatch { .. }));
    }

    #[test]
    fn test_condition_bits_validated() {
        let mut circuit = Circuit::with_size("test", 1, 1);
        let bad = Gate::standard(StandardGate::X)
            .with_condition(ClassicalCondition::new([ClbitId(3)], 1));
        assert!(matches!(
            circuit.gate(bad, [QubitId(0)]),
            Err(IrError::ClbitNotFound { .. })
        ));
    }

    #[test]
    fn test_structural_equality_ignores_name() {
        let mut a = Circuit::with_size("a", 2, 0);
        let mut b = Circuit::with_size("b", 2, 0);
        a.h(QubitId(0)).unwrap();
        b.h(QubitId(0)).unwrap();
        assert_eq!(a, b);

        b.rz(PI, QubitId(1)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_clone_is_independent() {
        let original = Circuit::ghz(3).unwrap();
        let mut copy = original.clone();
        copy.x(QubitId(2)).unwrap();
        assert_eq!(original.num_ops(), 3);
        assert_eq!(copy.num_ops(), 4);
    }

    #[test]
    fn test_replace_instructions_is_atomic() {
        let mut circuit = Circuit::ghz(2).unwrap();
        let before = circuit.clone();
        let result = circuit.replace_instructions(vec![
            Instruction::single_qubit_gate(StandardGate::X, QubitId(0)),
            Instruction::single_qubit_gate(StandardGate::X, QubitId(9)),
        ]);
        assert!(result.is_err());
        assert_eq!(circuit, before);
    }

    #[test]
    fn test_implicit_permutation() {
        let mut circuit = Circuit::with_size("test", 3, 0);
        assert!(!circuit.is_permuted());

        circuit
            .set_implicit_permutation(vec![QubitId(1), QubitId(0), QubitId(2)])
            .unwrap();
        assert!(circuit.is_permuted());

        assert!(
            circuit
                .set_implicit_permutation(vec![QubitId(1), QubitId(1), QubitId(2)])
                .is_err()
        );
    }

    #[test]
    fn test_symbols_and_bind() {
        let mut circuit = Circuit::with_size("test", 2, 0);
        circuit
            .rx(ParameterExpression::symbol("theta"), QubitId(0))
            .unwrap()
            .crz(ParameterExpression::symbol("phi"), QubitId(0), QubitId(1))
            .unwrap();
        assert_eq!(circuit.symbols().len(), 2);

        circuit.bind("theta", 0.5);
        circuit.bind("phi", 0.25);
        assert!(circuit.symbols().is_empty());
    }

    #[test]
    fn test_depth_with_barrier() {
        let mut circuit = Circuit::with_size("test", 2, 0);
        circuit.h(QubitId(0)).unwrap();
        circuit.barrier([QubitId(0), QubitId(1)]).unwrap();
        circuit.h(QubitId(1)).unwrap();
        assert_eq!(circuit.depth(), 2);
    }
}
