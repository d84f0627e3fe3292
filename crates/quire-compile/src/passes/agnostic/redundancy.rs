//! Redundant gate removal.

use std::mem;

use quire_ir::parameter::ANGLE_EPSILON;
use quire_ir::{Instruction, StandardGate};

use crate::error::CompileResult;
use crate::pass::{Contract, Pass};
use crate::unit::CompilationUnit;

/// Removes gates that do nothing.
///
/// In one sweep over the circuit this pass:
/// - drops identities and rotations by a multiple of 2π,
/// - cancels a gate against its inverse when nothing acts on its qubits in
///   between,
/// - merges consecutive rotations about the same axis.
///
/// Removals cascade: after `X H H X` loses its Hadamards the two X gates
/// meet and cancel too. Classically controlled gates are left alone and
/// block rewrites across them.
pub struct RemoveRedundancies;

/// What to do with an incoming gate given the previous op on its qubits.
enum Rewrite {
    Cancel,
    Merge(StandardGate),
}

impl RemoveRedundancies {
    fn rewrite(prev: &Instruction, next: &Instruction) -> Option<Rewrite> {
        let a = prev.as_plain_standard()?;
        let b = next.as_plain_standard()?;
        if prev.qubits.len() != next.qubits.len() {
            return None;
        }

        let same_order = prev.qubits == next.qubits;
        let same_set = prev.qubits.iter().all(|q| next.qubits.contains(q));
        if !(same_order || (a.is_symmetric() && same_set)) {
            return None;
        }

        if let (Some((axis_a, theta_a)), Some((axis_b, theta_b))) =
            (a.as_rotation(), b.as_rotation())
        {
            if axis_a != axis_b {
                return None;
            }
            let sum = (theta_a.clone() + theta_b.clone()).simplify();
            return Some(if sum.is_trivial_rotation() {
                Rewrite::Cancel
            } else {
                Rewrite::Merge(StandardGate::rotation(axis_a, sum))
            });
        }

        is_inverse_pair(a, b).then_some(Rewrite::Cancel)
    }
}

fn is_inverse_pair(a: &StandardGate, b: &StandardGate) -> bool {
    match (a.parameters().as_slice(), b.parameters().as_slice()) {
        ([], []) => a.inverse() == *b,
        ([pa], [pb]) => {
            mem::discriminant(a) == mem::discriminant(b)
                && ((*pa).clone() + (*pb).clone())
                    .simplify()
                    .as_f64()
                    .is_some_and(|v| v.abs() < ANGLE_EPSILON)
        }
        _ => false,
    }
}

fn is_trivial(inst: &Instruction) -> bool {
    match inst.as_plain_standard() {
        Some(StandardGate::I) => true,
        Some(gate) if inst.qubits.len() == 1 => gate
            .as_rotation()
            .is_some_and(|(_, theta)| theta.is_trivial_rotation()),
        _ => false,
    }
}

impl Pass for RemoveRedundancies {
    fn name(&self) -> &'static str {
        "RemoveRedundancies"
    }

    fn contract(&self) -> Contract {
        Contract::new()
    }

    fn run(&self, unit: &mut CompilationUnit) -> CompileResult<()> {
        let circuit = unit.circuit_mut();

        let mut out: Vec<Option<Instruction>> = Vec::with_capacity(circuit.num_ops());
        // Per qubit, indices into `out` of the live ops acting on it.
        let mut wires: Vec<Vec<usize>> = vec![Vec::new(); circuit.num_qubits()];

        for inst in circuit.instructions() {
            if is_trivial(inst) {
                continue;
            }

            let top = inst
                .qubits
                .first()
                .and_then(|q| wires[q.index()].last().copied());
            let shared_top = top.filter(|&idx| {
                inst.qubits
                    .iter()
                    .all(|q| wires[q.index()].last() == Some(&idx))
            });

            let rewrite = shared_top.and_then(|idx| {
                out[idx]
                    .as_ref()
                    .and_then(|prev| Self::rewrite(prev, inst))
                    .map(|r| (idx, r))
            });

            match rewrite {
                Some((idx, Rewrite::Cancel)) => {
                    out[idx] = None;
                    for q in &inst.qubits {
                        wires[q.index()].pop();
                    }
                }
                Some((idx, Rewrite::Merge(gate))) => {
                    out[idx] = Some(Instruction::gate(gate, inst.qubits.iter().copied()));
                }
                None => {
                    let idx = out.len();
                    for q in &inst.qubits {
                        wires[q.index()].push(idx);
                    }
                    out.push(Some(inst.clone()));
                }
            }
        }

        circuit.replace_instructions(out.into_iter().flatten().collect())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pass::SafetyMode;
    use quire_ir::{Circuit, ClassicalCondition, ClbitId, Gate, ParameterExpression, QubitId};
    use std::f64::consts::PI;

    fn q(i: u32) -> QubitId {
        QubitId(i)
    }

    fn run(circuit: &Circuit) -> (bool, Circuit) {
        let mut unit = CompilationUnit::new(circuit);
        let changed = RemoveRedundancies
            .apply(&mut unit, SafetyMode::Default)
            .unwrap();
        (changed, unit.into_circuit())
    }

    #[test]
    fn test_cx_pair_cancels() {
        let mut circuit = Circuit::with_size("t", 2, 0);
        circuit.cx(q(0), q(1)).unwrap().cx(q(0), q(1)).unwrap();

        let (changed, out) = run(&circuit);
        assert!(changed);
        assert_eq!(out.num_ops(), 0);
    }

    #[test]
    fn test_reversed_cx_kept() {
        let mut circuit = Circuit::with_size("t", 2, 0);
        circuit.cx(q(0), q(1)).unwrap().cx(q(1), q(0)).unwrap();

        let (changed, out) = run(&circuit);
        assert!(!changed);
        assert_eq!(out.count_ops("cx"), 2);
    }

    #[test]
    fn test_symmetric_gate_cancels_across_order() {
        let mut circuit = Circuit::with_size("t", 2, 0);
        circuit.cz(q(0), q(1)).unwrap().cz(q(1), q(0)).unwrap();
        assert_eq!(run(&circuit).1.num_ops(), 0);
    }

    #[test]
    fn test_cascade() {
        let mut circuit = Circuit::with_size("t", 1, 0);
        circuit
            .x(q(0))
            .unwrap()
            .h(q(0))
            .unwrap()
            .h(q(0))
            .unwrap()
            .x(q(0))
            .unwrap();
        assert_eq!(run(&circuit).1.num_ops(), 0);
    }

    #[test]
    fn test_s_sdg_and_t_tdg() {
        let mut circuit = Circuit::with_size("t", 2, 0);
        circuit.s(q(0)).unwrap().sdg(q(0)).unwrap();
        circuit.tdg(q(1)).unwrap().t(q(1)).unwrap();
        assert_eq!(run(&circuit).1.num_ops(), 0);
    }

    #[test]
    fn test_intervening_gate_blocks() {
        let mut circuit = Circuit::with_size("t", 2, 0);
        circuit
            .cx(q(0), q(1))
            .unwrap()
            .h(q(1))
            .unwrap()
            .cx(q(0), q(1))
            .unwrap();

        let (changed, _) = run(&circuit);
        assert!(!changed);
    }

    #[test]
    fn test_rotations_merge() {
        let mut circuit = Circuit::with_size("t", 1, 0);
        circuit.rz(0.25, q(0)).unwrap().rz(0.5, q(0)).unwrap();

        let (_, out) = run(&circuit);
        assert_eq!(out.num_ops(), 1);
        let merged = out.instructions()[0].as_plain_standard().unwrap();
        let (_, theta) = merged.as_rotation().unwrap();
        assert!((theta.as_f64().unwrap() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_rotations_sum_to_full_turn() {
        let mut circuit = Circuit::with_size("t", 1, 0);
        circuit.rx(1.5 * PI, q(0)).unwrap().rx(PI / 2.0, q(0)).unwrap();
        assert_eq!(run(&circuit).1.num_ops(), 0);
    }

    #[test]
    fn test_different_axes_kept() {
        let mut circuit = Circuit::with_size("t", 1, 0);
        circuit.rx(0.3, q(0)).unwrap().rz(-0.3, q(0)).unwrap();
        assert!(!run(&circuit).0);
    }

    #[test]
    fn test_trivial_gates_dropped() {
        let mut circuit = Circuit::with_size("t", 2, 0);
        circuit
            .gate(StandardGate::I, [q(0)])
            .unwrap()
            .rz(2.0 * PI, q(1))
            .unwrap()
            .ry(ParameterExpression::symbol("theta"), q(1))
            .unwrap();

        let (_, out) = run(&circuit);
        assert_eq!(out.num_ops(), 1);
        assert_eq!(out.count_ops("ry"), 1);
    }

    #[test]
    fn test_controlled_rotations_cancel() {
        let mut circuit = Circuit::with_size("t", 2, 0);
        circuit.crz(0.7, q(0), q(1)).unwrap().crz(-0.7, q(0), q(1)).unwrap();
        assert_eq!(run(&circuit).1.num_ops(), 0);
    }

    #[test]
    fn test_conditioned_gates_untouched() {
        let mut circuit = Circuit::with_size("t", 1, 1);
        let cond = ClassicalCondition::new([ClbitId(0)], 1);
        circuit
            .gate(Gate::standard(StandardGate::X).with_condition(cond), [q(0)])
            .unwrap()
            .x(q(0))
            .unwrap();
        assert!(!run(&circuit).0);
    }

    #[test]
    fn test_barrier_blocks() {
        let mut circuit = Circuit::with_size("t", 1, 0);
        circuit.h(q(0)).unwrap().barrier([q(0)]).unwrap().h(q(0)).unwrap();
        assert!(!run(&circuit).0);
    }
}
