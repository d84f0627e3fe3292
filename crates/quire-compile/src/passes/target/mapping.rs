//! The default placement-and-routing pipeline.

use crate::architecture::Architecture;
use crate::combinator::SequencePass;
use crate::error::CompileResult;
use crate::pass::{BoxedPass, Contract, Pass, SafetyMode};
use crate::predicate::MaxTwoQubitGatesPredicate;
use crate::unit::CompilationUnit;

use super::{DecomposeBridges, Placement, PlacementPass, RoutingPass};

/// Placement, routing and bridge expansion for one architecture.
///
/// Equivalent to a [`SequencePass`] of [`PlacementPass`], [`RoutingPass`]
/// and [`DecomposeBridges`]. After it runs every two-qubit operation acts
/// on an edge of the architecture; SWAP gates are left in place for the
/// caller to keep or expand.
#[derive(Debug, Clone)]
pub struct DefaultMappingPass {
    architecture: Architecture,
    placement: Placement,
    bridges: bool,
}

impl DefaultMappingPass {
    /// Line placement with bridges enabled.
    pub fn new(architecture: Architecture) -> Self {
        Self {
            architecture,
            placement: Placement::Line,
            bridges: true,
        }
    }

    /// Use a different placement strategy.
    #[must_use]
    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    /// Enable or disable BRIDGE insertion during routing.
    #[must_use]
    pub fn with_bridges(mut self, bridges: bool) -> Self {
        self.bridges = bridges;
        self
    }

    fn sequence(&self) -> SequencePass {
        let passes: Vec<BoxedPass> = vec![
            Box::new(PlacementPass::new(
                self.architecture.clone(),
                self.placement,
            )),
            Box::new(RoutingPass::new(self.architecture.clone()).with_bridges(self.bridges)),
            Box::new(DecomposeBridges),
        ];
        SequencePass::named("DefaultMappingPass", passes)
    }
}

impl Pass for DefaultMappingPass {
    fn name(&self) -> &'static str {
        "DefaultMappingPass"
    }

    /// The sequence's contract, with `MaxTwoQubitGates` set: it is required
    /// on entry and the only wider operations routing adds are BRIDGEs,
    /// which are expanded before the pass returns.
    fn contract(&self) -> Contract {
        self.sequence().contract().sets(MaxTwoQubitGatesPredicate)
    }

    fn run(&self, unit: &mut CompilationUnit) -> CompileResult<()> {
        self.apply(unit, SafetyMode::Default).map(drop)
    }

    fn apply(&self, unit: &mut CompilationUnit, mode: SafetyMode) -> CompileResult<bool> {
        self.sequence().apply(unit, mode)
    }
}
