//! Moving SWAP gates between the instruction list and the implicit
//! permutation.

use quire_ir::{Instruction, QubitId, StandardGate};

use crate::error::CompileResult;
use crate::pass::{Contract, Pass};
use crate::predicate::{NoWireSwapsPredicate, PredicateKind};
use crate::unit::CompilationUnit;

/// Removes unconditioned SWAP gates, relabelling the wires after them.
///
/// The removed exchanges are folded into the circuit's implicit
/// permutation, so outputs are still read from the right wires.
pub struct ElideSwaps;

impl Pass for ElideSwaps {
    fn name(&self) -> &'static str {
        "ElideSwaps"
    }

    fn contract(&self) -> Contract {
        Contract::new()
            .clears(PredicateKind::NoWireSwaps)
            .clears(PredicateKind::Connectivity)
    }

    fn run(&self, unit: &mut CompilationUnit) -> CompileResult<()> {
        let circuit = unit.circuit_mut();
        let n = circuit.num_qubits();

        // Wire of the rewritten circuit that holds what the original keeps
        // on wire `w`.
        let mut relabel: Vec<QubitId> = (0..n as u32).map(QubitId).collect();
        let mut out = Vec::with_capacity(circuit.num_ops());

        for inst in circuit.instructions() {
            if let (Some(StandardGate::Swap), &[a, b]) =
                (inst.as_plain_standard(), inst.qubits.as_slice())
            {
                relabel.swap(a.index(), b.index());
                continue;
            }
            out.push(inst.map_qubits(|q| relabel[q.index()]));
        }

        let permutation = circuit
            .implicit_permutation()
            .iter()
            .map(|q| relabel[q.index()])
            .collect();

        circuit.replace_instructions(out)?;
        circuit.set_implicit_permutation(permutation)?;
        Ok(())
    }
}

/// Appends SWAP gates realising the implicit permutation, then resets it
/// to the identity.
pub struct ReplaceImplicitSwaps;

impl Pass for ReplaceImplicitSwaps {
    fn name(&self) -> &'static str {
        "ReplaceImplicitSwaps"
    }

    fn contract(&self) -> Contract {
        Contract::new()
            .sets(NoWireSwapsPredicate)
            .clears(PredicateKind::Connectivity)
            .clears(PredicateKind::GateSet)
    }

    fn run(&self, unit: &mut CompilationUnit) -> CompileResult<()> {
        let circuit = unit.circuit_mut();
        if !circuit.is_permuted() {
            return Ok(());
        }
        let n = circuit.num_qubits();

        // location[i]: wire currently carrying output i; holder[w]: output on wire w.
        let mut location: Vec<usize> = circuit
            .implicit_permutation()
            .iter()
            .map(|q| q.index())
            .collect();
        let mut holder = vec![0; n];
        for (i, &w) in location.iter().enumerate() {
            holder[w] = i;
        }

        let mut swaps = Vec::new();
        for i in 0..n {
            let at = location[i];
            if at == i {
                continue;
            }
            let displaced = holder[i];
            swaps.push(Instruction::two_qubit_gate(
                StandardGate::Swap,
                QubitId(at as u32),
                QubitId(i as u32),
            ));
            location[displaced] = at;
            holder[at] = displaced;
            location[i] = i;
            holder[i] = i;
        }

        for swap in swaps {
            circuit.apply(swap)?;
        }
        circuit.set_implicit_permutation((0..n as u32).map(QubitId).collect())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pass::SafetyMode;
    use crate::predicate::Predicate;
    use quire_ir::Circuit;

    fn q(i: u32) -> QubitId {
        QubitId(i)
    }

    #[test]
    fn test_elide_single_swap() {
        let mut circuit = Circuit::with_size("t", 2, 0);
        circuit
            .h(q(0))
            .unwrap()
            .swap(q(0), q(1))
            .unwrap()
            .x(q(1))
            .unwrap();

        let mut unit = CompilationUnit::new(&circuit);
        assert!(ElideSwaps.apply(&mut unit, SafetyMode::Default).unwrap());

        let out = unit.circuit();
        assert_eq!(out.count_ops("swap"), 0);
        // The X followed the state of qubit 0.
        assert_eq!(out.instructions()[1].qubits, vec![q(0)]);
        assert_eq!(out.implicit_permutation(), &[q(1), q(0)]);
        assert!(!NoWireSwapsPredicate.verify(out));
    }

    #[test]
    fn test_swap_pair_elides_to_identity() {
        let mut circuit = Circuit::with_size("t", 2, 0);
        circuit.swap(q(0), q(1)).unwrap().swap(q(1), q(0)).unwrap();

        let mut unit = CompilationUnit::new(&circuit);
        ElideSwaps.apply(&mut unit, SafetyMode::Default).unwrap();
        assert_eq!(unit.circuit().num_ops(), 0);
        assert!(!unit.circuit().is_permuted());
    }

    #[test]
    fn test_replace_restores_identity() {
        let mut circuit = Circuit::with_size("t", 3, 0);
        circuit
            .swap(q(0), q(1))
            .unwrap()
            .swap(q(1), q(2))
            .unwrap()
            .cx(q(2), q(0))
            .unwrap();

        let mut unit = CompilationUnit::new(&circuit);
        ElideSwaps.apply(&mut unit, SafetyMode::Default).unwrap();
        assert!(unit.circuit().is_permuted());

        assert!(
            ReplaceImplicitSwaps
                .apply(&mut unit, SafetyMode::Default)
                .unwrap()
        );
        let out = unit.circuit();
        assert!(NoWireSwapsPredicate.verify(out));
        assert_eq!(out.count_ops("swap"), 2);
        assert_eq!(out.count_ops("cx"), 1);
    }

    #[test]
    fn test_replace_on_identity_is_noop() {
        let circuit = Circuit::ghz(3).unwrap();
        let mut unit = CompilationUnit::new(&circuit);
        assert!(
            !ReplaceImplicitSwaps
                .apply(&mut unit, SafetyMode::Default)
                .unwrap()
        );
    }
}
