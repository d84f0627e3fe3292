//! Quire Contract-Checked Compilation Framework
//!
//! This crate compiles quantum circuits for constrained devices. Every pass
//! carries a *contract*: the predicates it assumes of its input and what it
//! does to each predicate kind. Passes compose through combinators whose
//! contracts are derived from their members, so a whole pipeline can be
//! reasoned about before it runs.
//!
//! # Overview
//!
//! A compilation works on a [`CompilationUnit`]: a copy of the circuit plus
//! the predicates the target requires. Passes transform the unit in place:
//! 1. **Decomposition**: Expand multi-qubit gates into CX and rotations
//! 2. **Placement**: Map logical qubits onto architecture nodes
//! 3. **Routing**: Insert SWAP/BRIDGE operations to satisfy connectivity
//! 4. **Optimisation**: Cancel, merge and commute gates
//!
//! # Architecture
//!
//! ```text
//! Input Circuit
//!       |
//!       v
//! +-----------------+
//! | CompilationUnit | <-- target predicates (gate set, connectivity, ...)
//! +-----------------+
//!       |
//!       +-- SequencePass / RepeatPass / RepeatUntilSatisfiedPass / RepeatWithMetricPass
//!       |       +-- DecomposeMultiQubitsCx / DecomposeSingleQubitsRotations
//!       |       +-- PlacementPass / RoutingPass / DecomposeBridges / DecomposeSwapsToCx
//!       |       +-- RemoveRedundancies / CommuteThroughMultis
//!       |
//!       v
//! Output Circuit (check_all_predicates)
//! ```
//!
//! # Example: Basic Compilation
//!
//! ```rust
//! use quire_compile::{Architecture, Backend, DeviceBackend};
//! use quire_ir::Circuit;
//!
//! let backend = DeviceBackend::new("line5", Architecture::line(5), ["rz", "ry", "rx", "cx"]);
//!
//! let circuit = Circuit::ghz(5).unwrap();
//! let unit = backend.compile(&circuit).unwrap();
//!
//! assert!(unit.check_all_predicates());
//! assert!(backend.valid_circuit(unit.circuit()));
//! ```
//!
//! # Example: Composing Passes
//!
//! ```rust
//! use quire_compile::{
//!     CompilationUnit, DecomposeMultiQubitsCx, GateSetPredicate, Pass, PredicateKind,
//!     RemoveRedundancies, SafetyMode, SequencePass,
//! };
//! use quire_ir::{Circuit, QubitId};
//!
//! let pass = SequencePass::new(vec![
//!     Box::new(DecomposeMultiQubitsCx),
//!     Box::new(RemoveRedundancies),
//! ]);
//! assert!(pass.contract().sets_predicate(PredicateKind::GateSet).is_some());
//!
//! let mut circuit = Circuit::with_size("c", 2, 0);
//! circuit.cz(QubitId(0), QubitId(1)).unwrap();
//!
//! let mut unit = CompilationUnit::new(&circuit);
//! assert!(pass.apply(&mut unit, SafetyMode::Audit).unwrap());
//! assert_eq!(unit.circuit().count_ops("cx"), 1);
//! ```
//!
//! # Optimisation Levels
//!
//! | Level | Passes Included |
//! |-------|-----------------|
//! | 0 | Decomposition + placement + routing |
//! | 1 | + Redundancy removal |
//! | 2 | + Repeated commutation and redundancy removal before placement |
//!
//! # Safety Modes
//!
//! In [`SafetyMode::Default`] preconditions are trusted. In
//! [`SafetyMode::Audit`] each pass verifies them before touching the
//! circuit and fails with [`CompileError::PreconditionViolation`].

pub mod architecture;
pub mod backend;
pub mod combinator;
pub mod config;
pub mod error;
pub mod pass;
pub mod predicate;
pub mod unit;

// Built-in passes
pub mod passes;

pub use architecture::{Architecture, ArchitectureDesc, Device, DeviceDesc, Node};
pub use backend::{Backend, DeviceBackend};
pub use combinator::{
    RepeatPass, RepeatUntilSatisfiedPass, RepeatWithMetricPass, Satisfaction, SequencePass,
};
pub use config::{CompileConfig, MAX_OPTIMISATION_LEVEL, RoutingConfig};
pub use error::{CompileError, CompileResult};
pub use pass::{BoxedPass, Contract, CustomPass, Pass, Postcondition, SafetyMode};
pub use passes::{
    CommuteThroughMultis, DecomposeBridges, DecomposeMultiQubitsCx,
    DecomposeSingleQubitsRotations, DecomposeSwapsToCx, DefaultMappingPass, ElideSwaps,
    Placement, PlacementPass, RemoveRedundancies, ReplaceImplicitSwaps, RoutingPass,
};
pub use predicate::{
    ConnectivityPredicate, GateSetPredicate, MaxTwoQubitGatesPredicate,
    NoClassicalControlPredicate, NoMidMeasurePredicate, NoMultiQubitGatesPredicate,
    NoSymbolsPredicate, NoWireSwapsPredicate, Predicate, PredicateKind, PredicatePtr,
};
pub use unit::CompilationUnit;
