//! Gate decomposition passes.
//!
//! Multi-qubit gates are expanded into CX plus single-qubit rotations,
//! and single-qubit gates into `rz`/`ry`/`rx`. Expansions are exact up to
//! a global phase.

use std::f64::consts::PI;

use quire_ir::{
    ClassicalCondition, Gate, GateKind, Instruction, InstructionKind, ParameterExpression,
    QubitId, StandardGate,
};

use crate::error::{CompileError, CompileResult};
use crate::pass::{Contract, Pass};
use crate::predicate::{GateSetPredicate, MaxTwoQubitGatesPredicate, PredicateKind};
use crate::unit::CompilationUnit;

/// Collects replacement gates, carrying the source gate's condition.
pub(crate) struct Emitter {
    out: Vec<Instruction>,
    condition: Option<ClassicalCondition>,
}

impl Emitter {
    pub(crate) fn new(condition: Option<ClassicalCondition>) -> Self {
        Self {
            out: Vec::new(),
            condition,
        }
    }

    pub(crate) fn finish(self) -> Vec<Instruction> {
        self.out
    }

    fn gate(&mut self, gate: StandardGate, qubits: &[QubitId]) {
        let mut gate = Gate::standard(gate);
        if let Some(condition) = &self.condition {
            gate = gate.with_condition(condition.clone());
        }
        self.out.push(Instruction::gate(gate, qubits.iter().copied()));
    }

    pub(crate) fn cx(&mut self, control: QubitId, target: QubitId) {
        self.gate(StandardGate::CX, &[control, target]);
    }

    fn rz(&mut self, angle: impl Into<ParameterExpression>, q: QubitId) {
        self.gate(StandardGate::Rz(angle.into()), &[q]);
    }

    fn ry(&mut self, angle: impl Into<ParameterExpression>, q: QubitId) {
        self.gate(StandardGate::Ry(angle.into()), &[q]);
    }

    /// `Rz(π) · Ry(π/2)` in circuit order, i.e. `-i·H`.
    fn h(&mut self, q: QubitId) {
        self.rz(PI, q);
        self.ry(PI / 2.0, q);
    }

    /// SWAP as three CX.
    pub(crate) fn swap(&mut self, a: QubitId, b: QubitId) {
        self.cx(a, b);
        self.cx(b, a);
        self.cx(a, b);
    }

    /// BRIDGE as four CX through the middle qubit.
    pub(crate) fn bridge(&mut self, control: QubitId, middle: QubitId, target: QubitId) {
        self.cx(control, middle);
        self.cx(middle, target);
        self.cx(control, middle);
        self.cx(middle, target);
    }

    /// Toffoli with six CX.
    fn ccx(&mut self, a: QubitId, b: QubitId, c: QubitId) {
        let t = PI / 4.0;
        self.h(c);
        self.cx(b, c);
        self.rz(-t, c);
        self.cx(a, c);
        self.rz(t, c);
        self.cx(b, c);
        self.rz(-t, c);
        self.cx(a, c);
        self.rz(t, b);
        self.rz(t, c);
        self.h(c);
        self.cx(a, b);
        self.rz(t, a);
        self.rz(-t, b);
        self.cx(a, b);
    }

    /// Controlled rotation about Y via two CX.
    fn cry(&mut self, theta: &ParameterExpression, control: QubitId, target: QubitId) {
        self.ry(half(theta), target);
        self.cx(control, target);
        self.ry(-half(theta), target);
        self.cx(control, target);
    }

    /// Controlled rotation about Z via two CX.
    fn crz(&mut self, theta: &ParameterExpression, control: QubitId, target: QubitId) {
        self.rz(half(theta), target);
        self.cx(control, target);
        self.rz(-half(theta), target);
        self.cx(control, target);
    }

    /// Expand a standard gate of two or more qubits.
    fn multi_qubit(&mut self, gate: &StandardGate, qubits: &[QubitId]) {
        match (gate, qubits) {
            (StandardGate::CX, &[a, b]) => self.cx(a, b),
            (StandardGate::CY, &[a, b]) => {
                self.rz(-PI / 2.0, b);
                self.cx(a, b);
                self.rz(PI / 2.0, b);
            }
            (StandardGate::CZ, &[a, b]) => {
                self.h(b);
                self.cx(a, b);
                self.h(b);
            }
            (StandardGate::CH, &[a, b]) => {
                self.ry(-PI / 4.0, b);
                self.h(b);
                self.cx(a, b);
                self.h(b);
                self.ry(PI / 4.0, b);
            }
            (StandardGate::Swap, &[a, b]) => self.swap(a, b),
            (StandardGate::CRx(theta), &[a, b]) => {
                self.rz(PI / 2.0, b);
                self.cry(theta, a, b);
                self.rz(-PI / 2.0, b);
            }
            (StandardGate::CRy(theta), &[a, b]) => self.cry(theta, a, b),
            (StandardGate::CRz(theta), &[a, b]) => self.crz(theta, a, b),
            (StandardGate::CP(theta), &[a, b]) => {
                self.rz(half(theta), a);
                self.crz(theta, a, b);
            }
            (StandardGate::RZZ(theta), &[a, b]) => {
                self.cx(a, b);
                self.rz(theta.clone(), b);
                self.cx(a, b);
            }
            (StandardGate::CCX, &[a, b, c]) => self.ccx(a, b, c),
            (StandardGate::CSwap, &[a, b, c]) => {
                self.cx(c, b);
                self.ccx(a, b, c);
                self.cx(c, b);
            }
            (StandardGate::Bridge, &[a, m, b]) => self.bridge(a, m, b),
            // Single-qubit gates and mismatched arity never reach here: the
            // circuit validates arity on insertion.
            (other, qs) => self.gate(other.clone(), qs),
        }
    }

    /// Rewrite a single-qubit standard gate into rotations.
    fn rotations(&mut self, gate: &StandardGate, q: QubitId) {
        match gate {
            StandardGate::I => {}
            StandardGate::X => self.gate(StandardGate::Rx(PI.into()), &[q]),
            StandardGate::Y => self.ry(PI, q),
            StandardGate::Z => self.rz(PI, q),
            StandardGate::H => self.h(q),
            StandardGate::S => self.rz(PI / 2.0, q),
            StandardGate::Sdg => self.rz(-PI / 2.0, q),
            StandardGate::T => self.rz(PI / 4.0, q),
            StandardGate::Tdg => self.rz(-PI / 4.0, q),
            other => self.gate(other.clone(), &[q]),
        }
    }
}

fn half(theta: &ParameterExpression) -> ParameterExpression {
    (theta.clone() * ParameterExpression::constant(0.5)).simplify()
}

/// Decomposes every multi-qubit gate into CX and single-qubit rotations.
///
/// Single-qubit gates and non-gate operations pass through untouched.
/// Classically controlled gates keep their condition on every emitted gate.
/// Custom gates have no known expansion and fail with
/// [`CompileError::NoDecomposition`].
pub struct DecomposeMultiQubitsCx;

impl Pass for DecomposeMultiQubitsCx {
    fn name(&self) -> &'static str {
        "DecomposeMultiQubitsCx"
    }

    fn contract(&self) -> Contract {
        Contract::new()
            .sets(GateSetPredicate::one_qubit_and_cx())
            .sets(MaxTwoQubitGatesPredicate)
            .clears(PredicateKind::Connectivity)
    }

    fn run(&self, unit: &mut CompilationUnit) -> CompileResult<()> {
        let circuit = unit.circuit_mut();
        let mut out = Vec::with_capacity(circuit.num_ops());

        for inst in circuit.instructions() {
            let InstructionKind::Gate(gate) = &inst.kind else {
                out.push(inst.clone());
                continue;
            };
            match &gate.kind {
                GateKind::Custom(custom) => {
                    return Err(CompileError::NoDecomposition(custom.name.clone()));
                }
                GateKind::Standard(std_gate) if inst.qubits.len() >= 2 => {
                    let mut emitter = Emitter::new(gate.condition.clone());
                    emitter.multi_qubit(std_gate, &inst.qubits);
                    out.extend(emitter.finish());
                }
                GateKind::Standard(_) => out.push(inst.clone()),
            }
        }

        circuit.replace_instructions(out)?;
        Ok(())
    }
}

/// Rewrites every single-qubit gate into `rz`, `ry` and `rx` rotations.
pub struct DecomposeSingleQubitsRotations;

impl Pass for DecomposeSingleQubitsRotations {
    fn name(&self) -> &'static str {
        "DecomposeSingleQubitsRotations"
    }

    fn contract(&self) -> Contract {
        Contract::new().clears(PredicateKind::GateSet)
    }

    fn run(&self, unit: &mut CompilationUnit) -> CompileResult<()> {
        let circuit = unit.circuit_mut();
        let mut out = Vec::with_capacity(circuit.num_ops());

        for inst in circuit.instructions() {
            let gate = match &inst.kind {
                InstructionKind::Gate(gate) if inst.qubits.len() == 1 => gate,
                _ => {
                    out.push(inst.clone());
                    continue;
                }
            };
            let GateKind::Standard(std_gate) = &gate.kind else {
                return Err(CompileError::NoDecomposition(gate.name().to_string()));
            };
            let mut emitter = Emitter::new(gate.condition.clone());
            emitter.rotations(std_gate, inst.qubits[0]);
            out.extend(emitter.finish());
        }

        circuit.replace_instructions(out)?;
        Ok(())
    }
}
