//! Pass combinators: sequencing and repetition.
//!
//! Combinators are passes themselves, so they nest freely. They forward
//! the caller's [`SafetyMode`] to every member they apply.

use quire_ir::Circuit;
use rustc_hash::FxHashMap;
use tracing::{debug, info, instrument, warn};

use crate::error::{CompileError, CompileResult};
use crate::pass::{BoxedPass, Contract, Pass, Postcondition, SafetyMode};
use crate::predicate::PredicatePtr;
use crate::unit::CompilationUnit;

/// Applies member passes in order.
pub struct SequencePass {
    name: String,
    passes: Vec<BoxedPass>,
}

impl SequencePass {
    /// Create a sequence of passes.
    pub fn new(passes: Vec<BoxedPass>) -> Self {
        Self::named("Sequence", passes)
    }

    /// Create a sequence with a custom name for logs and errors.
    pub fn named(name: impl Into<String>, passes: Vec<BoxedPass>) -> Self {
        Self {
            name: name.into(),
            passes,
        }
    }

    /// Get the number of member passes.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Check if the sequence has no members.
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

impl Pass for SequencePass {
    fn name(&self) -> &str {
        &self.name
    }

    /// Union of member preconditions minus those guaranteed by an earlier
    /// member; postconditions fold left, the last non-preserving effect
    /// per kind winning.
    fn contract(&self) -> Contract {
        let mut preconditions: Vec<PredicatePtr> = Vec::new();
        let mut postconditions = FxHashMap::default();

        for pass in &self.passes {
            let contract = pass.contract();

            for pre in contract.preconditions {
                let established = matches!(
                    postconditions.get(&pre.kind()),
                    Some(Postcondition::Sets(set)) if set.implies(pre.as_ref())
                );
                let duplicate = preconditions.iter().any(|p| p.implies(pre.as_ref()));
                if !established && !duplicate {
                    preconditions.push(pre);
                }
            }

            for (kind, effect) in contract.postconditions {
                if !effect.is_preserves() {
                    postconditions.insert(kind, effect);
                }
            }
        }

        Contract {
            preconditions,
            postconditions,
        }
    }

    fn run(&self, unit: &mut CompilationUnit) -> CompileResult<()> {
        self.apply(unit, SafetyMode::Default).map(drop)
    }

    #[instrument(skip(self, unit), fields(pass = %self.name))]
    fn apply(&self, unit: &mut CompilationUnit, mode: SafetyMode) -> CompileResult<bool> {
        info!(
            "Running {} passes on circuit with {} qubits",
            self.passes.len(),
            unit.circuit().num_qubits()
        );

        let mut changed = false;
        for pass in &self.passes {
            debug!("Running pass: {}", pass.name());
            changed |= pass.apply(unit, mode)?;
        }

        info!(
            "Sequence completed, final depth: {}, ops: {}",
            unit.circuit().depth(),
            unit.circuit().num_ops()
        );
        Ok(changed)
    }
}

/// Applies a pass until it stops changing the circuit.
///
/// Unbounded by default; a pass that never converges loops forever unless
/// capped with [`with_max_iterations`](Self::with_max_iterations).
pub struct RepeatPass {
    pass: BoxedPass,
    max_iterations: Option<usize>,
}

impl RepeatPass {
    /// Repeat `pass` to a fixed point.
    pub fn new(pass: BoxedPass) -> Self {
        Self {
            pass,
            max_iterations: None,
        }
    }

    /// Stop after `max` changing applications.
    #[must_use]
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = Some(max);
        self
    }

    /// Set or clear the iteration cap.
    #[must_use]
    pub fn with_iteration_cap(mut self, max: Option<usize>) -> Self {
        self.max_iterations = max;
        self
    }
}

impl Pass for RepeatPass {
    fn name(&self) -> &str {
        "Repeat"
    }

    fn contract(&self) -> Contract {
        self.pass.contract()
    }

    fn run(&self, unit: &mut CompilationUnit) -> CompileResult<()> {
        self.apply(unit, SafetyMode::Default).map(drop)
    }

    #[instrument(skip(self, unit), fields(inner = %self.pass.name()))]
    fn apply(&self, unit: &mut CompilationUnit, mode: SafetyMode) -> CompileResult<bool> {
        let mut iterations = 0;
        while self.pass.apply(unit, mode)? {
            iterations += 1;
            if self.max_iterations.is_some_and(|max| iterations >= max) {
                warn!(
                    "Repeat of {} hit its cap of {} iterations",
                    self.pass.name(),
                    iterations
                );
                break;
            }
        }
        debug!("Repeat of {} changed the circuit {} times", self.pass.name(), iterations);
        Ok(iterations > 0)
    }
}

/// Outcome of [`RepeatUntilSatisfiedPass::apply_until`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Satisfaction {
    /// The target holds.
    Satisfied {
        /// Whether any application changed the circuit.
        changed: bool,
    },
    /// The wrapped pass stopped changing the circuit (or hit its cap)
    /// before the target held.
    Stalled {
        /// Whether any application changed the circuit.
        changed: bool,
    },
}

impl Satisfaction {
    /// Whether any application changed the circuit.
    pub fn changed(self) -> bool {
        match self {
            Satisfaction::Satisfied { changed } | Satisfaction::Stalled { changed } => changed,
        }
    }

    /// Whether the target holds.
    pub fn is_satisfied(self) -> bool {
        matches!(self, Satisfaction::Satisfied { .. })
    }

    /// Turn a stall into [`CompileError::UnsatisfiableTarget`].
    pub fn into_result(self, pass: &str) -> CompileResult<bool> {
        match self {
            Satisfaction::Satisfied { changed } => Ok(changed),
            Satisfaction::Stalled { .. } => Err(CompileError::UnsatisfiableTarget {
                pass: pass.to_string(),
            }),
        }
    }
}

type CircuitCheck = dyn Fn(&Circuit) -> bool + Send + Sync;

/// Applies a pass until a circuit predicate holds or the pass stalls.
pub struct RepeatUntilSatisfiedPass {
    pass: BoxedPass,
    satisfied: Box<CircuitCheck>,
    max_iterations: Option<usize>,
}

impl RepeatUntilSatisfiedPass {
    /// Repeat `pass` until `satisfied(circuit)` returns true.
    pub fn new(
        pass: BoxedPass,
        satisfied: impl Fn(&Circuit) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            pass,
            satisfied: Box::new(satisfied),
            max_iterations: None,
        }
    }

    /// Repeat `pass` until `predicate` verifies.
    pub fn until_predicate(pass: BoxedPass, predicate: PredicatePtr) -> Self {
        Self::new(pass, move |circuit| predicate.verify(circuit))
    }

    /// Stop after `max` applications.
    #[must_use]
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = Some(max);
        self
    }

    /// Apply and report whether the target was reached.
    ///
    /// The target is checked first; if it already holds nothing is applied.
    #[instrument(skip(self, unit), fields(inner = %self.pass.name()))]
    pub fn apply_until(
        &self,
        unit: &mut CompilationUnit,
        mode: SafetyMode,
    ) -> CompileResult<Satisfaction> {
        let mut changed = false;
        let mut iterations = 0;

        loop {
            if (self.satisfied)(unit.circuit()) {
                debug!("Target satisfied after {} applications", iterations);
                return Ok(Satisfaction::Satisfied { changed });
            }
            if self.max_iterations.is_some_and(|max| iterations >= max) {
                warn!(
                    "Repeat-until of {} hit its cap of {} iterations",
                    self.pass.name(),
                    iterations
                );
                return Ok(Satisfaction::Stalled { changed });
            }
            if !self.pass.apply(unit, mode)? {
                debug!("{} stalled before the target held", self.pass.name());
                return Ok(Satisfaction::Stalled { changed });
            }
            changed = true;
            iterations += 1;
        }
    }
}

impl Pass for RepeatUntilSatisfiedPass {
    fn name(&self) -> &str {
        "RepeatUntilSatisfied"
    }

    fn contract(&self) -> Contract {
        self.pass.contract()
    }

    fn run(&self, unit: &mut CompilationUnit) -> CompileResult<()> {
        self.apply(unit, SafetyMode::Default).map(drop)
    }

    fn apply(&self, unit: &mut CompilationUnit, mode: SafetyMode) -> CompileResult<bool> {
        self.apply_until(unit, mode).map(Satisfaction::changed)
    }
}

type CostFn = dyn Fn(&Circuit) -> f64 + Send + Sync;

/// Applies a pass while each application strictly lowers a cost.
///
/// The first application that does not strictly improve the cost is rolled
/// back, so every accepted state is cheaper than the one before it. A NaN
/// cost never counts as an improvement.
pub struct RepeatWithMetricPass {
    pass: BoxedPass,
    cost: Box<CostFn>,
    max_iterations: Option<usize>,
}

impl RepeatWithMetricPass {
    /// Repeat `pass` while `cost` strictly decreases.
    pub fn new(pass: BoxedPass, cost: impl Fn(&Circuit) -> f64 + Send + Sync + 'static) -> Self {
        Self {
            pass,
            cost: Box::new(cost),
            max_iterations: None,
        }
    }

    /// Use the total number of instructions as the cost.
    #[allow(clippy::cast_precision_loss)]
    pub fn gate_count(pass: BoxedPass) -> Self {
        Self::new(pass, |circuit| circuit.num_ops() as f64)
    }

    /// Use the number of multi-qubit gates as the cost.
    #[allow(clippy::cast_precision_loss)]
    pub fn multi_qubit_count(pass: BoxedPass) -> Self {
        Self::new(pass, |circuit| circuit.count_multi_qubit_gates() as f64)
    }

    /// Stop after `max` accepted applications.
    #[must_use]
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = Some(max);
        self
    }
}

impl Pass for RepeatWithMetricPass {
    fn name(&self) -> &str {
        "RepeatWithMetric"
    }

    /// The wrapped contract with every `Sets` demoted to `Clears`, since a
    /// rollback to the input can undo what the pass established.
    fn contract(&self) -> Contract {
        let mut contract = self.pass.contract();
        for effect in contract.postconditions.values_mut() {
            if matches!(effect, Postcondition::Sets(_)) {
                *effect = Postcondition::Clears;
            }
        }
        contract
    }

    fn run(&self, unit: &mut CompilationUnit) -> CompileResult<()> {
        self.apply(unit, SafetyMode::Default).map(drop)
    }

    #[instrument(skip(self, unit), fields(inner = %self.pass.name()))]
    fn apply(&self, unit: &mut CompilationUnit, mode: SafetyMode) -> CompileResult<bool> {
        let input = unit.circuit().clone();
        let mut best = (self.cost)(unit.circuit());
        let mut accepted = 0;

        loop {
            if self.max_iterations.is_some_and(|max| accepted >= max) {
                warn!(
                    "Repeat-with-metric of {} hit its cap of {} iterations",
                    self.pass.name(),
                    accepted
                );
                break;
            }

            let snapshot = unit.clone();
            let changed = match self.pass.apply(unit, mode) {
                Ok(changed) => changed,
                Err(err) => {
                    *unit = snapshot;
                    return Err(err);
                }
            };
            let cost = (self.cost)(unit.circuit());
            if !(changed && cost < best) {
                debug!("Rejected application with cost {} (best {})", cost, best);
                *unit = snapshot;
                break;
            }
            debug!("Accepted application, cost {} -> {}", best, cost);
            best = cost;
            accepted += 1;
        }

        Ok(*unit.circuit() != input)
    }
}
