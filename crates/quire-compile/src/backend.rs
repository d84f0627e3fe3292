//! Backends and their default compilation pipelines.

use std::sync::Arc;

use quire_ir::Circuit;
use tracing::{info, instrument, warn};

use crate::architecture::Device;
use crate::combinator::{RepeatPass, SequencePass};
use crate::config::CompileConfig;
use crate::error::CompileResult;
use crate::pass::{BoxedPass, Pass};
use crate::passes::{
    CommuteThroughMultis, DecomposeBridges, DecomposeMultiQubitsCx,
    DecomposeSingleQubitsRotations, DecomposeSwapsToCx, PlacementPass, RemoveRedundancies,
    RoutingPass,
};
use crate::predicate::{
    ConnectivityPredicate, GateSetPredicate, MaxTwoQubitGatesPredicate, NoSymbolsPredicate,
    PredicatePtr,
};
use crate::unit::CompilationUnit;

/// A compilation target.
pub trait Backend: Send + Sync {
    /// Get the name of this backend.
    fn name(&self) -> &str;

    /// Predicates a circuit must satisfy to run on this backend.
    fn required_predicates(&self) -> Vec<PredicatePtr>;

    /// A pass that takes an arbitrary circuit to one satisfying
    /// [`required_predicates`](Self::required_predicates).
    ///
    /// Levels above the highest supported one behave like it.
    fn default_compilation_pass(&self, optimisation_level: u8) -> BoxedPass;

    /// Whether `circuit` satisfies every required predicate.
    fn valid_circuit(&self, circuit: &Circuit) -> bool {
        self.required_predicates()
            .iter()
            .all(|p| p.verify(circuit))
    }
}

/// A backend for a device with a fixed native gate set.
///
/// The default pipeline produces `rz`, `ry`, `rx` and `cx` gates plus
/// non-gate operations, so `gate_set` should contain at least those.
/// Classically controlled gates are accepted.
#[derive(Debug, Clone)]
pub struct DeviceBackend {
    name: String,
    device: Device,
    gate_set: GateSetPredicate,
    config: CompileConfig,
}

impl DeviceBackend {
    /// Create a backend with the default configuration.
    pub fn new(
        name: impl Into<String>,
        device: impl Into<Device>,
        gate_set: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            device: device.into(),
            gate_set: GateSetPredicate::new(gate_set),
            config: CompileConfig::default(),
        }
    }

    /// Replace the compilation settings.
    #[must_use]
    pub fn with_config(mut self, config: CompileConfig) -> Self {
        self.config = config;
        self
    }

    /// The target device.
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// The compilation settings.
    pub fn config(&self) -> &CompileConfig {
        &self.config
    }

    /// Compile `circuit` with the configured level and safety mode.
    ///
    /// The returned unit carries the backend's required predicates; check
    /// [`CompilationUnit::check_all_predicates`] to see whether they hold.
    #[instrument(skip(self, circuit), fields(backend = %self.name))]
    pub fn compile(&self, circuit: &Circuit) -> CompileResult<CompilationUnit> {
        let level = self.config.optimisation_level();
        info!(
            "Compiling {} ({} qubits, {} ops) at level {}",
            circuit.name(),
            circuit.num_qubits(),
            circuit.num_ops(),
            level
        );

        let mut unit = CompilationUnit::with_predicates(circuit, self.required_predicates());
        self.default_compilation_pass(level)
            .apply(&mut unit, self.config.safety_mode)?;

        let failing = unit.failing_predicates();
        if failing.is_empty() {
            info!(
                "Compiled to {} ops, depth {}",
                unit.circuit().num_ops(),
                unit.circuit().depth()
            );
        } else {
            for predicate in &failing {
                warn!("Compiled circuit fails {}", predicate.description());
            }
        }
        Ok(unit)
    }

    fn optimise(&self) -> BoxedPass {
        let sweep = SequencePass::named(
            "Optimise",
            vec![Box::new(CommuteThroughMultis), Box::new(RemoveRedundancies)],
        );
        Box::new(RepeatPass::new(Box::new(sweep)).with_iteration_cap(self.config.max_iterations))
    }
}

impl Backend for DeviceBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn required_predicates(&self) -> Vec<PredicatePtr> {
        vec![
            Arc::new(self.gate_set.clone()),
            Arc::new(ConnectivityPredicate::new(
                self.device.architecture().clone(),
            )),
            Arc::new(NoSymbolsPredicate),
            Arc::new(MaxTwoQubitGatesPredicate),
        ]
    }

    /// | Level | Pipeline |
    /// |-------|----------|
    /// | 0 | decompose to CX, place, route, expand bridges and swaps, rewrite to rotations |
    /// | 1 | level 0, then remove redundancies |
    /// | 2 | level 1, with commutation and redundancy removal repeated before placement |
    fn default_compilation_pass(&self, optimisation_level: u8) -> BoxedPass {
        let architecture = self.device.architecture().clone();
        let routing = &self.config.routing;

        let mut passes: Vec<BoxedPass> = vec![Box::new(DecomposeMultiQubitsCx)];
        if optimisation_level >= 2 {
            passes.push(self.optimise());
        }
        passes.push(Box::new(PlacementPass::new(
            architecture.clone(),
            routing.placement,
        )));
        passes.push(Box::new(
            RoutingPass::new(architecture).with_bridges(routing.bridges),
        ));
        passes.push(Box::new(DecomposeBridges));
        passes.push(Box::new(DecomposeSwapsToCx));
        passes.push(Box::new(DecomposeSingleQubitsRotations));
        if optimisation_level >= 1 {
            passes.push(Box::new(RemoveRedundancies));
        }

        Box::new(SequencePass::named(
            format!("{}-level{}", self.name, optimisation_level.min(2)),
            passes,
        ))
    }
}
