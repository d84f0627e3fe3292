//! Pass trait, contracts, and safety modes.

use std::fmt;
use std::sync::Arc;

use quire_ir::Circuit;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CompileError, CompileResult};
use crate::predicate::{Predicate, PredicateKind, PredicatePtr};
use crate::unit::CompilationUnit;

/// What a pass does to one predicate kind.
#[derive(Debug, Clone)]
pub enum Postcondition {
    /// The predicate may no longer hold afterwards.
    Clears,
    /// If the predicate held before, it still holds.
    Preserves,
    /// The given predicate holds afterwards.
    Sets(PredicatePtr),
}

impl Postcondition {
    /// Whether this is [`Postcondition::Preserves`].
    pub fn is_preserves(&self) -> bool {
        matches!(self, Postcondition::Preserves)
    }
}

/// Preconditions a pass assumes and the effect it has on each predicate kind.
///
/// Kinds not mentioned in `postconditions` are preserved.
#[derive(Debug, Clone, Default)]
pub struct Contract {
    /// Predicates the pass assumes hold on its input.
    pub preconditions: Vec<PredicatePtr>,
    /// Effect per predicate kind.
    pub postconditions: FxHashMap<PredicateKind, Postcondition>,
}

impl Contract {
    /// An empty contract: no preconditions, everything preserved.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a precondition.
    #[must_use]
    pub fn requires(self, predicate: impl Predicate + 'static) -> Self {
        self.requires_ptr(Arc::new(predicate))
    }

    /// Add a shared precondition.
    #[must_use]
    pub fn requires_ptr(mut self, predicate: PredicatePtr) -> Self {
        self.preconditions.push(predicate);
        self
    }

    /// Declare that the pass establishes `predicate`.
    #[must_use]
    pub fn sets(self, predicate: impl Predicate + 'static) -> Self {
        self.sets_ptr(Arc::new(predicate))
    }

    /// Declare that the pass establishes a shared predicate.
    #[must_use]
    pub fn sets_ptr(mut self, predicate: PredicatePtr) -> Self {
        self.postconditions
            .insert(predicate.kind(), Postcondition::Sets(predicate));
        self
    }

    /// Declare that the pass may break predicates of `kind`.
    #[must_use]
    pub fn clears(mut self, kind: PredicateKind) -> Self {
        self.postconditions.insert(kind, Postcondition::Clears);
        self
    }

    /// Declare explicitly that the pass preserves `kind`.
    #[must_use]
    pub fn preserves(mut self, kind: PredicateKind) -> Self {
        self.postconditions.insert(kind, Postcondition::Preserves);
        self
    }

    /// The effect on `kind`, defaulting to [`Postcondition::Preserves`].
    pub fn effect(&self, kind: PredicateKind) -> Postcondition {
        self.postconditions
            .get(&kind)
            .cloned()
            .unwrap_or(Postcondition::Preserves)
    }

    /// The predicate established for `kind`, if any.
    pub fn sets_predicate(&self, kind: PredicateKind) -> Option<&PredicatePtr> {
        match self.postconditions.get(&kind) {
            Some(Postcondition::Sets(p)) => Some(p),
            _ => None,
        }
    }
}

/// Whether declared preconditions are checked before a pass runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyMode {
    /// Preconditions are trusted. Violating one gives unspecified results.
    #[default]
    Default,
    /// Every precondition is verified before the pass mutates anything.
    Audit,
}

/// Verify `preconditions` on `circuit`, failing on the first unmet one.
pub fn audit_preconditions(
    pass: &str,
    preconditions: &[PredicatePtr],
    circuit: &Circuit,
) -> CompileResult<()> {
    match preconditions.iter().find(|p| !p.verify(circuit)) {
        Some(unmet) => Err(CompileError::PreconditionViolation {
            pass: pass.to_string(),
            predicate: unmet.name().to_string(),
        }),
        None => Ok(()),
    }
}

/// A compilation pass over a [`CompilationUnit`].
///
/// Implementors provide [`run`](Pass::run); callers use
/// [`apply`](Pass::apply), which audits preconditions when asked and
/// reports whether the circuit changed. Combinators override `apply` to
/// forward the safety mode to their members.
pub trait Pass: Send + Sync {
    /// Get the name of this pass.
    fn name(&self) -> &str;

    /// The pass's contract.
    fn contract(&self) -> Contract;

    /// Transform the unit in place.
    fn run(&self, unit: &mut CompilationUnit) -> CompileResult<()>;

    /// Apply the pass, returning whether the circuit changed.
    ///
    /// In [`SafetyMode::Audit`] an unmet precondition aborts with
    /// [`CompileError::PreconditionViolation`] before any mutation.
    fn apply(&self, unit: &mut CompilationUnit, mode: SafetyMode) -> CompileResult<bool> {
        if mode == SafetyMode::Audit {
            audit_preconditions(self.name(), &self.contract().preconditions, unit.circuit())?;
        }

        let before = unit.circuit().clone();
        self.run(unit)?;
        let changed = *unit.circuit() != before;

        debug!(
            "Pass {} completed, changed: {}, ops: {}",
            self.name(),
            changed,
            unit.circuit().num_ops()
        );
        Ok(changed)
    }
}

/// An owned, type-erased pass.
pub type BoxedPass = Box<dyn Pass>;

impl<P: Pass + ?Sized> Pass for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn contract(&self) -> Contract {
        (**self).contract()
    }

    fn run(&self, unit: &mut CompilationUnit) -> CompileResult<()> {
        (**self).run(unit)
    }

    fn apply(&self, unit: &mut CompilationUnit, mode: SafetyMode) -> CompileResult<bool> {
        (**self).apply(unit, mode)
    }
}

type Transform = dyn Fn(&mut Circuit) -> CompileResult<()> + Send + Sync;

/// A pass built from a closure and a user-declared contract.
///
/// The contract is trusted like any elementary pass's.
///
/// ```
/// use quire_compile::{CompilationUnit, CustomPass, Pass, SafetyMode};
/// use quire_ir::{Circuit, QubitId};
///
/// let pass = CustomPass::new("append_x", |circuit| {
///     circuit.x(QubitId(0))?;
///     Ok(())
/// });
///
/// let mut unit = CompilationUnit::new(&Circuit::with_size("c", 1, 0));
/// assert!(pass.apply(&mut unit, SafetyMode::Default).unwrap());
/// assert_eq!(unit.circuit().count_ops("x"), 1);
/// ```
pub struct CustomPass {
    name: String,
    contract: Contract,
    transform: Box<Transform>,
}

impl CustomPass {
    /// Create a custom pass that preserves every predicate.
    pub fn new(
        name: impl Into<String>,
        transform: impl Fn(&mut Circuit) -> CompileResult<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            contract: Contract::new(),
            transform: Box::new(transform),
        }
    }

    /// Replace the declared contract.
    #[must_use]
    pub fn with_contract(mut self, contract: Contract) -> Self {
        self.contract = contract;
        self
    }
}

impl fmt::Debug for CustomPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomPass")
            .field("name", &self.name)
            .field("contract", &self.contract)
            .finish_non_exhaustive()
    }
}

impl Pass for CustomPass {
    fn name(&self) -> &str {
        &self.name
    }

    fn contract(&self) -> Contract {
        self.contract.clone()
    }

    fn run(&self, unit: &mut CompilationUnit) -> CompileResult<()> {
        (self.transform)(unit.circuit_mut())
    }
}
