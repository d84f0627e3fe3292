//! Routing passes for inserting SWAP and BRIDGE operations.

use quire_ir::{Instruction, QubitId, StandardGate};
use tracing::debug;

use crate::architecture::Architecture;
use crate::error::{CompileError, CompileResult};
use crate::pass::{Contract, Pass};
use crate::predicate::{ConnectivityPredicate, MaxTwoQubitGatesPredicate, PredicateKind};
use crate::unit::CompilationUnit;

/// Greedy shortest-path routing.
///
/// Walks the operations in order. Whenever a two-qubit operation acts on
/// nodes that are not adjacent, the first operand is swapped along the
/// shortest path until it neighbours the second. A CX at distance two is
/// instead replaced by a BRIDGE when bridges are enabled.
///
/// The circuit's qubits are taken to be architecture nodes, as left by
/// [`PlacementPass`](super::PlacementPass). Where each logical qubit ends
/// up is recorded in the unit's [`final_map`](CompilationUnit::final_map).
pub struct RoutingPass {
    architecture: Architecture,
    bridges: bool,
}

impl RoutingPass {
    /// Create a routing pass with bridges enabled.
    pub fn new(architecture: Architecture) -> Self {
        Self {
            architecture,
            bridges: true,
        }
    }

    /// Enable or disable BRIDGE insertion.
    #[must_use]
    pub fn with_bridges(mut self, bridges: bool) -> Self {
        self.bridges = bridges;
        self
    }

    /// The architecture routed onto.
    pub fn architecture(&self) -> &Architecture {
        &self.architecture
    }
}

/// The live assignment of circuit wires to nodes while routing.
struct Layout {
    /// `location[wire]` is the node currently holding that wire's state.
    location: Vec<u32>,
    /// `occupant[node]` is the wire whose state the node holds.
    occupant: Vec<u32>,
}

impl Layout {
    #[allow(clippy::cast_possible_truncation)]
    fn identity(n: usize) -> Self {
        let ids: Vec<u32> = (0..n as u32).collect();
        Self {
            location: ids.clone(),
            occupant: ids,
        }
    }

    fn node_of(&self, q: QubitId) -> QubitId {
        QubitId(self.location[q.index()])
    }

    fn swap_nodes(&mut self, a: u32, b: u32) {
        let (wa, wb) = (self.occupant[a as usize], self.occupant[b as usize]);
        self.occupant.swap(a as usize, b as usize);
        self.location[wa as usize] = b;
        self.location[wb as usize] = a;
    }
}

impl Pass for RoutingPass {
    fn name(&self) -> &'static str {
        "RoutingPass"
    }

    fn contract(&self) -> Contract {
        let contract = Contract::new()
            .requires(MaxTwoQubitGatesPredicate)
            .sets(ConnectivityPredicate::new(self.architecture.clone()))
            .clears(PredicateKind::GateSet);
        if self.bridges {
            contract.clears(PredicateKind::MaxTwoQubitGates)
        } else {
            contract
        }
    }

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

        let mut layout = Layout::identity(nodes);
        let mut out = Vec::with_capacity(circuit.num_ops());
        let mut inserted = 0usize;

        for inst in circuit.instructions() {
            let placed = inst.map_qubits(|q| layout.node_of(q));
            if placed.is_barrier() || placed.qubits.len() < 2 {
                out.push(placed);
                continue;
            }
            let &[a, b] = placed.qubits.as_slice() else {
                return Err(CompileError::RoutingFailed {
                    gate: inst.name().to_string(),
                    qubits: inst.qubits.len(),
                });
            };
            if self.architecture.are_adjacent(a.0, b.0) {
                out.push(placed);
                continue;
            }

            let path = self.architecture.shortest_path(a.0, b.0).ok_or_else(|| {
                CompileError::MalformedArchitecture(format!(
                    "no path between nodes {} and {}",
                    a.0, b.0
                ))
            })?;

            if self.bridges
                && path.len() == 3
                && matches!(inst.as_plain_standard(), Some(StandardGate::CX))
            {
                debug!("Inserting bridge {} -> {} -> {}", a.0, path[1], b.0);
                out.push(Instruction::gate(
                    StandardGate::Bridge,
                    [a, QubitId(path[1]), b],
                ));
                inserted += 1;
                continue;
            }

            for hop in path[..path.len() - 1].windows(2) {
                let (from, to) = (hop[0], hop[1]);
                debug!("Inserting swap {} <-> {}", from, to);
                out.push(Instruction::two_qubit_gate(
                    StandardGate::Swap,
                    QubitId(from),
                    QubitId(to),
                ));
                layout.swap_nodes(from, to);
                inserted += 1;
            }
            out.push(inst.map_qubits(|q| layout.node_of(q)));
        }

        debug!("Routing inserted {} operations", inserted);
        circuit.replace_instructions(out)?;

        unit.move_final_map(|p| layout.node_of(p));
        Ok(())
    }
}
