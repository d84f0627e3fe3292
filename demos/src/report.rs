//! Plain-text reporting for the demo driver.

use std::fmt;

use quire_compile::CompilationUnit;
use quire_ir::Circuit;

/// Print a demo header.
pub fn print_header(title: &str) {
    println!();
    println!("{}", "=".repeat(60));
    println!("  {title}");
    println!("{}", "=".repeat(60));
    println!();
}

/// Print a demo section.
pub fn print_section(title: &str) {
    println!();
    println!("> {title}");
    println!("{}", "-".repeat(40));
}

/// Print a result line.
pub fn print_result(label: &str, value: impl fmt::Display) {
    println!("  {label:<22} {value}");
}

/// Size summary of a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub qubits: usize,
    pub ops: usize,
    pub two_qubit: usize,
    pub depth: usize,
}

impl Stats {
    pub fn of(circuit: &Circuit) -> Self {
        Self {
            qubits: circuit.num_qubits(),
            ops: circuit.num_ops(),
            two_qubit: circuit.count_multi_qubit_gates(),
            depth: circuit.depth(),
        }
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} qubits, {} ops, {} two-qubit, depth {}",
            self.qubits, self.ops, self.two_qubit, self.depth
        )
    }
}

/// Print where each logical qubit starts and ends.
pub fn print_maps(unit: &CompilationUnit) {
    for (logical, (start, end)) in unit
        .initial_map()
        .iter()
        .zip(unit.final_map())
        .enumerate()
    {
        println!("    q{logical}: node {} -> node {}", start.0, end.0);
    }
}
