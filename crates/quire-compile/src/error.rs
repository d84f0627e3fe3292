//! Error types for the compilation crate.

use quire_ir::IrError;
use thiserror::Error;

/// Errors raised while compiling a circuit.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// Audit mode found an unmet precondition. The circuit is untouched.
    #[error("Pass '{pass}' requires predicate '{predicate}', which the circuit does not satisfy")]
    PreconditionViolation {
        /// Name of the pass whose contract was violated.
        pass: String,
        /// Name of the unmet predicate.
        predicate: String,
    },

    /// The architecture is malformed, or routing met disconnected operands.
    #[error("Malformed architecture: {0}")]
    MalformedArchitecture(String),

    /// The circuit has more qubits than the target has nodes.
    #[error("Circuit requires {required} qubits but target has only {available}")]
    CircuitTooLarge {
        /// Qubits in the circuit.
        required: usize,
        /// Nodes in the architecture.
        available: usize,
    },

    /// Routing met an operation it cannot handle.
    #[error("Cannot route gate '{gate}' on {qubits} qubits")]
    RoutingFailed {
        /// Name of the offending gate.
        gate: String,
        /// Number of qubits it acts on.
        qubits: usize,
    },

    /// A gate has no known decomposition into the target set.
    #[error("No decomposition known for gate '{0}'")]
    NoDecomposition(String),

    /// A repeat-until-satisfied pass stalled before its target held.
    #[error("Pass '{pass}' stalled before its target predicate was satisfied")]
    UnsatisfiableTarget {
        /// Name of the stalled pass.
        pass: String,
    },

    /// Configuration could not be parsed.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Circuit mutation error.
    #[error("IR error: {0}")]
    Ir(#[from] IrError),
}

/// Result type for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;
