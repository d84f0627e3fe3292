//! Expansion of routing operations into CX.

use quire_ir::{Instruction, InstructionKind, StandardGate};

use crate::error::CompileResult;
use crate::pass::{Contract, Pass};
use crate::passes::agnostic::Emitter;
use crate::predicate::PredicateKind;
use crate::unit::CompilationUnit;

/// Replace every `target` gate using `expand`, then drop cancelling CX pairs.
fn expand_and_clean(
    unit: &mut CompilationUnit,
    target: &StandardGate,
    expand: impl Fn(&mut Emitter, &Instruction),
) -> CompileResult<()> {
    let circuit = unit.circuit_mut();
    let mut out = Vec::with_capacity(circuit.num_ops());

    for inst in circuit.instructions() {
        match &inst.kind {
            InstructionKind::Gate(gate) if gate.as_standard() == Some(target) => {
                let mut emitter = Emitter::new(gate.condition.clone());
                expand(&mut emitter, inst);
                out.extend(emitter.finish());
            }
            _ => out.push(inst.clone()),
        }
    }

    circuit.replace_instructions(cancel_adjacent_cx(out))?;
    Ok(())
}

/// Remove pairs of identical unconditioned CX with nothing between them on
/// either qubit.
fn cancel_adjacent_cx(instructions: Vec<Instruction>) -> Vec<Instruction> {
    let width = instructions
        .iter()
        .flat_map(|inst| inst.qubits.iter().map(|q| q.index() + 1))
        .max()
        .unwrap_or(0);
    let mut last: Vec<Option<usize>> = vec![None; width];
    let mut out: Vec<Option<Instruction>> = Vec::with_capacity(instructions.len());

    for inst in instructions {
        let is_cx = matches!(inst.as_plain_standard(), Some(StandardGate::CX));
        if is_cx {
            let (c, t) = (inst.qubits[0].index(), inst.qubits[1].index());
            if let (Some(i), Some(j)) = (last[c], last[t]) {
                if i == j && out[i].as_ref().is_some_and(|prev| *prev == inst) {
                    out[i] = None;
                    last[c] = None;
                    last[t] = None;
                    continue;
                }
            }
        }
        let idx = out.len();
        for q in &inst.qubits {
            last[q.index()] = Some(idx);
        }
        out.push(Some(inst));
    }

    out.into_iter().flatten().collect()
}

/// Expands SWAP gates into three CX each.
pub struct DecomposeSwapsToCx;

impl Pass for DecomposeSwapsToCx {
    fn name(&self) -> &'static str {
        "DecomposeSwapsToCx"
    }

    fn contract(&self) -> Contract {
        Contract::new().clears(PredicateKind::GateSet)
    }

    fn run(&self, unit: &mut CompilationUnit) -> CompileResult<()> {
        expand_and_clean(unit, &StandardGate::Swap, |emitter, inst| {
            emitter.swap(inst.qubits[0], inst.qubits[1]);
        })
    }
}

/// Expands BRIDGE gates into four CX each.
pub struct DecomposeBridges;

impl Pass for DecomposeBridges {
    fn name(&self) -> &'static str {
        "DecomposeBridges"
    }

    fn contract(&self) -> Contract {
        Contract::new().clears(PredicateKind::GateSet)
    }

    fn run(&self, unit: &mut CompilationUnit) -> CompileResult<()> {
        expand_and_clean(unit, &StandardGate::Bridge, |emitter, inst| {
            emitter.bridge(inst.qubits[0], inst.qubits[1], inst.qubits[2]);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::architecture::Architecture;
    use crate::pass::SafetyMode;
    use crate::predicate::{ConnectivityPredicate, Predicate};
    use quire_ir::{Circuit, QubitId};

    fn q(i: u32) -> QubitId {
        QubitId(i)
    }

    #[test]
    fn test_swap_expands_to_three_cx() {
        let mut circuit = Circuit::with_size("t", 2, 0);
        circuit.swap(q(0), q(1)).unwrap();

        let mut unit = CompilationUnit::new(&circuit);
        assert!(
            DecomposeSwapsToCx
                .apply(&mut unit, SafetyMode::Default)
                .unwrap()
        );
        assert_eq!(unit.circuit().count_ops("cx"), 3);
        assert_eq!(unit.circuit().count_ops("swap"), 0);
    }

    #[test]
    fn test_peephole_after_swap() {
        // The trailing CX(0, 1) cancels the last CX of the expansion.
        let mut circuit = Circuit::with_size("t", 2, 0);
        circuit.swap(q(0), q(1)).unwrap().cx(q(0), q(1)).unwrap();

        let mut unit = CompilationUnit::new(&circuit);
        DecomposeSwapsToCx
            .apply(&mut unit, SafetyMode::Default)
            .unwrap();
        assert_eq!(unit.circuit().count_ops("cx"), 2);
    }

    #[test]
    fn test_bridge_keeps_connectivity() {
        let mut circuit = Circuit::with_size("t", 3, 0);
        circuit.bridge(q(0), q(1), q(2)).unwrap();

        let mut unit = CompilationUnit::new(&circuit);
        DecomposeBridges
            .apply(&mut unit, SafetyMode::Default)
            .unwrap();

        let out = unit.circuit();
        assert_eq!(out.count_ops("cx"), 4);
        assert!(ConnectivityPredicate::new(Architecture::line(3)).verify(out));
    }

    #[test]
    fn test_peephole_needs_no_intervening_op() {
        let mut circuit = Circuit::with_size("t", 2, 0);
        circuit
            .cx(q(0), q(1))
            .unwrap()
            .h(q(1))
            .unwrap()
            .cx(q(0), q(1))
            .unwrap();
        assert_eq!(cancel_adjacent_cx(circuit.instructions().to_vec()).len(), 3);

        let mut circuit = Circuit::with_size("t", 2, 0);
        circuit.cx(q(0), q(1)).unwrap().cx(q(0), q(1)).unwrap();
        assert!(cancel_adjacent_cx(circuit.instructions().to_vec()).is_empty());
    }
}
