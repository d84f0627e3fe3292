//! Quire Circuit Intermediate Representation
//!
//! This crate provides the circuit value that every Quire compilation pass
//! reads and rewrites. It is deliberately small: the compiler core only
//! relies on a handful of capabilities, listed below.
//!
//! # Capabilities used by the compiler
//!
//! | Capability | API |
//! |------------|-----|
//! | Construction from qubit/bit counts | [`Circuit::with_size`] |
//! | Named gate application | [`Circuit::h`], [`Circuit::cx`], [`Circuit::crz`], ... |
//! | Command enumeration | [`Circuit::instructions`] |
//! | Gate count by type | [`Circuit::count_ops`] |
//! | Structural equality | `PartialEq for Circuit` |
//! | Deep copy | `Clone for Circuit` |
//! | Classical control | [`Gate::with_condition`] |
//!
//! # Example: Building a Bell State
//!
//! ```rust
//! use quire_ir::{Circuit, QubitId};
//!
//! let mut circuit = Circuit::with_size("bell_state", 2, 2);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//! circuit.measure_all().unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 2);
//! assert_eq!(circuit.count_ops("cx"), 1);
//! ```
//!
//! # Example: Parameterized Circuit
//!
//! ```rust
//! use quire_ir::{Circuit, QubitId, ParameterExpression};
//!
//! let mut circuit = Circuit::with_size("variational", 1, 0);
//! circuit.rx(ParameterExpression::symbol("theta"), QubitId(0)).unwrap();
//!
//! assert!(circuit.symbols().contains("theta"));
//! ```
//!
//! # Supported Gates
//!
//! | Gate | Qubits | Description |
//! |------|--------|-------------|
//! | `H` | 1 | Hadamard gate |
//! | `X`, `Y`, `Z` | 1 | Pauli gates |
//! | `S`, `Sdg`, `T`, `Tdg` | 1 | Phase gates |
//! | `Rx`, `Ry`, `Rz` | 1 | Rotation gates |
//! | `CX`, `CY`, `CZ`, `CH` | 2 | Controlled Paulis and Hadamard |
//! | `CRx`, `CRy`, `CRz`, `CP` | 2 | Controlled rotations |
//! | `Swap` | 2 | SWAP gate |
//! | `CCX`, `CSwap` | 3 | Toffoli and Fredkin gates |
//! | `Bridge` | 3 | CX between the outer qubits through the middle one |

pub mod circuit;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod parameter;
pub mod qubit;

pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use gate::{ClassicalCondition, CustomGate, Gate, GateKind, RotationAxis, StandardGate};
pub use instruction::{Instruction, InstructionKind};
pub use parameter::ParameterExpression;
pub use qubit::{Clbit, ClbitId, Qubit, QubitId};
