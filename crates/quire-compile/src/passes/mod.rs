//! Built-in compilation passes.
//!
//! Passes are organized into two categories:
//! - [`agnostic`]: rewrites that never look at the target device
//! - [`target`]: placement and routing onto an architecture

pub mod agnostic;
pub mod target;

pub use agnostic::{
    CommuteThroughMultis, DecomposeMultiQubitsCx, DecomposeSingleQubitsRotations, ElideSwaps,
    RemoveRedundancies, ReplaceImplicitSwaps,
};
pub use target::{
    DecomposeBridges, DecomposeSwapsToCx, DefaultMappingPass, Placement, PlacementPass,
    RoutingPass,
};
