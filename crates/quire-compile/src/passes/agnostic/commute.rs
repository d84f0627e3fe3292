//! Commuting single-qubit gates backwards through multi-qubit gates.

use quire_ir::{Instruction, QubitId, RotationAxis, StandardGate};

use crate::error::CompileResult;
use crate::pass::{Contract, Pass};
use crate::unit::CompilationUnit;

/// Moves single-qubit gates earlier through multi-qubit gates they commute
/// with.
///
/// A Z-diagonal gate passes through the control of a CX, an X rotation
/// through its target, and so on. Moved gates end up next to earlier
/// single-qubit gates, where [`RemoveRedundancies`] can merge or cancel
/// them.
///
/// [`RemoveRedundancies`]: super::RemoveRedundancies
pub struct CommuteThroughMultis;

/// The Pauli axis a single-qubit gate is diagonal in, if any.
fn diagonal_axis(gate: &StandardGate) -> Option<RotationAxis> {
    match gate {
        StandardGate::Z
        | StandardGate::S
        | StandardGate::Sdg
        | StandardGate::T
        | StandardGate::Tdg
        | StandardGate::Rz(_) => Some(RotationAxis::Z),
        StandardGate::X | StandardGate::Rx(_) => Some(RotationAxis::X),
        StandardGate::Y | StandardGate::Ry(_) => Some(RotationAxis::Y),
        _ => None,
    }
}

/// Whether a single-qubit gate diagonal in `axis` commutes with `multi`
/// acting on its operand at `position`.
fn commutes(axis: RotationAxis, multi: &StandardGate, position: usize) -> bool {
    use RotationAxis::{X, Y, Z};

    match (multi, position) {
        // The middle of a bridge is left untouched.
        (StandardGate::Bridge, 1) => true,
        (StandardGate::CZ | StandardGate::CP(_) | StandardGate::CRz(_) | StandardGate::RZZ(_), _) => {
            axis == Z
        }
        (
            StandardGate::CX
            | StandardGate::CY
            | StandardGate::CH
            | StandardGate::CRx(_)
            | StandardGate::CRy(_)
            | StandardGate::CSwap
            | StandardGate::Bridge,
            0,
        )
        | (StandardGate::CCX, 0 | 1) => axis == Z,
        (StandardGate::CX | StandardGate::CRx(_), 1) | (StandardGate::CCX | StandardGate::Bridge, 2) => {
            axis == X
        }
        (StandardGate::CY | StandardGate::CRy(_), 1) => axis == Y,
        _ => false,
    }
}

/// Index in `out` before which a gate diagonal in `axis` on `qubit` can be
/// placed.
fn insertion_point(out: &[Instruction], qubit: QubitId, axis: RotationAxis) -> usize {
    let mut pos = out.len();
    while let Some(j) = out[..pos].iter().rposition(|inst| inst.qubits.contains(&qubit)) {
        let prev = &out[j];
        let passes = prev.qubits.len() >= 2
            && prev.as_plain_standard().is_some_and(|multi| {
                prev.qubits
                    .iter()
                    .position(|&q| q == qubit)
                    .is_some_and(|position| commutes(axis, multi, position))
            });
        if !passes {
            break;
        }
        pos = j;
    }
    pos
}

impl Pass for CommuteThroughMultis {
    fn name(&self) -> &'static str {
        "CommuteThroughMultis"
    }

    fn contract(&self) -> Contract {
        Contract::new()
    }

    fn run(&self, unit: &mut CompilationUnit) -> CompileResult<()> {
        let circuit = unit.circuit_mut();
        let mut out: Vec<Instruction> = Vec::with_capacity(circuit.num_ops());

        for inst in circuit.instructions() {
            let axis = match (inst.as_plain_standard(), inst.qubits.as_slice()) {
                (Some(gate), [_]) => diagonal_axis(gate),
                _ => None,
            };
            match axis {
                Some(axis) => {
                    let pos = insertion_point(&out, inst.qubits[0], axis);
                    out.insert(pos, inst.clone());
                }
                None => out.push(inst.clone()),
            }
        }

        circuit.replace_instructions(out)?;
        Ok(())
    }
}
