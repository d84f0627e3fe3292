//! Architecture-aware compilation passes.
//!
//! These passes take an [`Architecture`](crate::Architecture) and produce
//! circuits whose two-qubit operations act on its edges.

mod mapping;
mod placement;
mod routing;
mod swaps;

pub use mapping::DefaultMappingPass;
pub use placement::{Placement, PlacementPass};
pub use routing::RoutingPass;
pub use swaps::{DecomposeBridges, DecomposeSwapsToCx};
