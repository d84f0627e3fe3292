//! Demo circuit generators.

use std::f64::consts::PI;

use quire_ir::{Circuit, ClassicalCondition, ClbitId, Gate, IrResult, QubitId, StandardGate};

/// Names accepted by [`by_name`].
pub const NAMES: &[&str] = &["qft", "adder", "teleport", "ising"];

/// Build a demo circuit by name.
pub fn by_name(name: &str, n: u32) -> Option<IrResult<Circuit>> {
    match name {
        "qft" => Some(qft(n)),
        "adder" => Some(ripple_adder(n.max(1))),
        "teleport" => Some(teleport()),
        "ising" => Some(ising_layer(n, 0.3, 0.7)),
        _ => None,
    }
}

/// Quantum Fourier transform on `n` qubits, with the final bit reversal.
pub fn qft(n: u32) -> IrResult<Circuit> {
    let mut circuit = Circuit::with_size("qft", n, n);
    for i in 0..n {
        circuit.h(QubitId(i))?;
        for j in i + 1..n {
            let angle = PI / f64::from(1_u32 << (j - i).min(30));
            circuit.cp(angle, QubitId(j), QubitId(i))?;
        }
    }
    for i in 0..n / 2 {
        circuit.swap(QubitId(i), QubitId(n - 1 - i))?;
    }
    circuit.measure_all()?;
    Ok(circuit)
}

/// Cuccaro ripple-carry adder of two `bits`-bit registers.
///
/// Layout: carry-in at qubit 0, then `a_i`, `b_i` interleaved, carry-out
/// last.
pub fn ripple_adder(bits: u32) -> IrResult<Circuit> {
    let n = 2 * bits + 2;
    let mut circuit = Circuit::with_size("adder", n, bits + 1);
    let a = |i: u32| QubitId(2 * i + 1);
    let b = |i: u32| QubitId(2 * i + 2);
    let carry = |i: u32| if i == 0 { QubitId(0) } else { a(i - 1) };

    for i in 0..bits {
        circuit.x(a(i))?;
    }
    for i in 0..bits {
        circuit.cx(a(i), b(i))?;
        circuit.cx(a(i), carry(i))?;
        circuit.ccx(carry(i), b(i), a(i))?;
    }
    circuit.cx(a(bits - 1), QubitId(n - 1))?;
    for i in (0..bits).rev() {
        circuit.ccx(carry(i), b(i), a(i))?;
        circuit.cx(a(i), carry(i))?;
        circuit.cx(carry(i), b(i))?;
    }
    for i in 0..bits {
        circuit.measure(b(i), ClbitId(i))?;
    }
    circuit.measure(QubitId(n - 1), ClbitId(bits))?;
    Ok(circuit)
}

/// One-qubit teleportation with classically controlled corrections.
pub fn teleport() -> IrResult<Circuit> {
    let mut circuit = Circuit::with_size("teleport", 3, 3);
    let (msg, alice, bob) = (QubitId(0), QubitId(1), QubitId(2));

    circuit.ry(0.8, msg)?;
    circuit.h(alice)?.cx(alice, bob)?;
    circuit.cx(msg, alice)?.h(msg)?;
    circuit.measure(msg, ClbitId(0))?.measure(alice, ClbitId(1))?;

    let fix_x =
        Gate::standard(StandardGate::X).with_condition(ClassicalCondition::new([ClbitId(1)], 1));
    let fix_z =
        Gate::standard(StandardGate::Z).with_condition(ClassicalCondition::new([ClbitId(0)], 1));
    circuit.gate(fix_x, [bob])?.gate(fix_z, [bob])?;
    circuit.measure(bob, ClbitId(2))?;
    Ok(circuit)
}

/// One Trotter layer of a transverse-field Ising model on a ring.
pub fn ising_layer(n: u32, coupling: f64, field: f64) -> IrResult<Circuit> {
    let mut circuit = Circuit::with_size("ising", n, 0);
    for i in 0..n {
        circuit.h(QubitId(i))?;
    }
    if n >= 2 {
        for i in 0..n {
            let j = (i + 1) % n;
            if j != i && !(n == 2 && i == 1) {
                circuit.rzz(2.0 * coupling, QubitId(i), QubitId(j))?;
            }
        }
    }
    for i in 0..n {
        circuit.rx(2.0 * field, QubitId(i))?;
    }
    Ok(circuit)
}
