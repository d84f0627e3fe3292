//! Initial placement of logical qubits onto architecture nodes.

use quire_ir::{Circuit, QubitId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::architecture::Architecture;
use crate::error::{CompileError, CompileResult};
use crate::pass::{Contract, Pass};
use crate::predicate::{MaxTwoQubitGatesPredicate, PredicateKind};
use crate::unit::CompilationUnit;

/// Placement strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    /// Logical qubit `i` goes to node `i`.
    Trivial,
    /// Qubits that interact early are laid along a walk of the graph.
    #[default]
    Line,
}

/// Chooses the initial map and relabels the circuit onto physical nodes.
///
/// Circuits with fewer qubits than the architecture has nodes are padded
/// with idle qubits, so after this pass qubit `p` of the circuit is node
/// `p` of the architecture.
pub struct PlacementPass {
    architecture: Architecture,
    placement: Placement,
}

impl PlacementPass {
    /// Create a placement pass.
    pub fn new(architecture: Architecture, placement: Placement) -> Self {
        Self {
            architecture,
            placement,
        }
    }

    /// `map[logical]` for a circuit already padded to the node count.
    fn choose(&self, circuit: &Circuit) -> Vec<usize> {
        let n = circuit.num_qubits();
        match self.placement {
            Placement::Trivial => (0..n).collect(),
            Placement::Line => {
                let walk = line_walk(&self.architecture);
                let mut map = vec![0; n];
                for (logical, node) in interaction_order(circuit).into_iter().zip(walk) {
                    map[logical] = node as usize;
                }
                map
            }
        }
    }
}

/// Nodes in depth-first order, lowest neighbour first.
///
/// Each component's walk starts from its lowest node of minimum positive
/// degree, so lines and rings are walked end to end.
fn line_walk(arch: &Architecture) -> Vec<u32> {
    let n = arch.num_nodes();
    let mut visited = vec![false; n];
    let mut walk = Vec::with_capacity(n);

    while walk.len() < n {
        let unvisited = (0..n as u32).filter(|&p| !visited[p as usize]);
        let Some(start) = unvisited
            .clone()
            .filter(|&p| arch.degree(p) > 0)
            .min_by_key(|&p| (arch.degree(p), p))
            .or_else(|| unvisited.min())
        else {
            break;
        };

        let mut stack = vec![start];
        while let Some(p) = stack.pop() {
            if visited[p as usize] {
                continue;
            }
            visited[p as usize] = true;
            walk.push(p);
            // Reversed so the lowest neighbour is popped first.
            stack.extend(
                arch.neighbours(p)
                    .into_iter()
                    .rev()
                    .filter(|&nb| !visited[nb as usize]),
            );
        }
    }
    walk
}

/// Logical qubits in order of first multi-qubit interaction, then the rest.
fn interaction_order(circuit: &Circuit) -> Vec<usize> {
    let n = circuit.num_qubits();
    let mut seen = vec![false; n];
    let mut order = Vec::with_capacity(n);

    let interacting = circuit
        .instructions()
        .iter()
        .filter(|inst| inst.is_multi_qubit_gate())
        .flat_map(|inst| inst.qubits.iter().map(|q| q.index()));
    for q in interacting.chain(0..n) {
        if !seen[q] {
            seen[q] = true;
            order.push(q);
        }
    }
    order
}

impl Pass for PlacementPass {
    fn name(&self) -> &'static str {
        "PlacementPass"
    }

    fn contract(&self) -> Contract {
        Contract::new()
            .requires(MaxTwoQubitGatesPredicate)
            .clears(PredicateKind::Connectivity)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn run(&self, unit: &mut CompilationUnit) -> CompileResult<()> {
        let nodes = self.architecture.num_nodes();
        if unit.circuit().num_qubits() > nodes {
            return Err(CompileError::CircuitTooLarge {
                required: unit.circuit().num_qubits(),
                available: nodes,
            });
        }
        unit.pad_maps(nodes);
        let circuit = unit.circuit_mut();
        while circuit.num_qubits() < nodes {
            circuit.add_qubit();
        }

        let map = self.choose(circuit);
        debug!("Placement {:?} chose {:?}", self.placement, map);

        let relabel = |q: QubitId| QubitId(map[q.index()] as u32);
        let instructions = circuit
            .instructions()
            .iter()
            .map(|inst| inst.map_qubits(relabel))
            .collect();

        // Conjugate the permutation: output `map[i]` reads wire `map[perm[i]]`.
        let mut permutation = vec![QubitId(0); nodes];
        for (i, q) in circuit.implicit_permutation().iter().enumerate() {
            permutation[map[i]] = relabel(*q);
        }

        circuit.replace_instructions(instructions)?;
        circuit.set_implicit_permutation(permutation)?;
        unit.relabel_maps(relabel);
        Ok(())
    }
}
