//! Target-agnostic compilation passes.
//!
//! These passes rewrite the circuit without consulting an architecture.
//! They are safe to run on any circuit regardless of the target device.

mod commute;
mod decompose;
mod permutation;
mod redundancy;

pub use commute::CommuteThroughMultis;
pub use decompose::{DecomposeMultiQubitsCx, DecomposeSingleQubitsRotations};
pub(crate) use decompose::Emitter;
pub use permutation::{ElideSwaps, ReplaceImplicitSwaps};
pub use redundancy::RemoveRedundancies;
