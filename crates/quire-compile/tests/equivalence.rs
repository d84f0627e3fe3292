//! Integration tests checking that rewriting passes preserve the circuit's
//! unitary up to a global phase.
//!
//! Circuits are simulated densely, so only small gate-only circuits are used.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

use num_complex::Complex64;
use proptest::prelude::*;
use quire_compile::{
    CommuteThroughMultis, CompilationUnit, DecomposeBridges, DecomposeMultiQubitsCx,
    DecomposeSingleQubitsRotations, DecomposeSwapsToCx, Pass, RemoveRedundancies, SafetyMode,
    SequencePass,
};
use quire_ir::{Circuit, ParameterExpression, QubitId, StandardGate};

type Matrix = Vec<Vec<Complex64>>;

const TOLERANCE: f64 = 1e-9;

fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

fn angle(p: &ParameterExpression) -> f64 {
    p.as_f64().expect("bound angle")
}

/// A `2^k x 2^k` matrix sending basis state `l` to `f(l)`.
fn permutation(k: usize, f: impl Fn(usize) -> usize) -> Matrix {
    let dim = 1 << k;
    let mut m = vec![vec![c(0.0, 0.0); dim]; dim];
    for l in 0..dim {
        m[f(l)][l] = c(1.0, 0.0);
    }
    m
}

fn controlled(u: &Matrix) -> Matrix {
    let mut m = permutation(2, |l| l);
    for r in 0..2 {
        for col in 0..2 {
            m[2 + r][2 + col] = u[r][col];
        }
    }
    m
}

fn diagonal(entries: &[Complex64]) -> Matrix {
    let mut m = vec![vec![c(0.0, 0.0); entries.len()]; entries.len()];
    for (i, &e) in entries.iter().enumerate() {
        m[i][i] = e;
    }
    m
}

fn rx(t: f64) -> Matrix {
    let (s, co) = (t / 2.0).sin_cos();
    vec![vec![c(co, 0.0), c(0.0, -s)], vec![c(0.0, -s), c(co, 0.0)]]
}

fn ry(t: f64) -> Matrix {
    let (s, co) = (t / 2.0).sin_cos();
    vec![vec![c(co, 0.0), c(-s, 0.0)], vec![c(s, 0.0), c(co, 0.0)]]
}

fn rz(t: f64) -> Matrix {
    diagonal(&[Complex64::from_polar(1.0, -t / 2.0), Complex64::from_polar(1.0, t / 2.0)])
}

fn phase(t: f64) -> Matrix {
    diagonal(&[c(1.0, 0.0), Complex64::from_polar(1.0, t)])
}

/// The matrix of a standard gate; the first operand is the most significant bit.
fn gate_matrix(gate: &StandardGate) -> Matrix {
    let x = vec![vec![c(0.0, 0.0), c(1.0, 0.0)], vec![c(1.0, 0.0), c(0.0, 0.0)]];
    let y = vec![vec![c(0.0, 0.0), c(0.0, -1.0)], vec![c(0.0, 1.0), c(0.0, 0.0)]];
    let z = diagonal(&[c(1.0, 0.0), c(-1.0, 0.0)]);
    let h = vec![
        vec![c(FRAC_1_SQRT_2, 0.0), c(FRAC_1_SQRT_2, 0.0)],
        vec![c(FRAC_1_SQRT_2, 0.0), c(-FRAC_1_SQRT_2, 0.0)],
    ];
    match gate {
        StandardGate::I => permutation(1, |l| l),
        StandardGate::X => x,
        StandardGate::Y => y,
        StandardGate::Z => z,
        StandardGate::H => h,
        StandardGate::S => phase(PI / 2.0),
        StandardGate::Sdg => phase(-PI / 2.0),
        StandardGate::T => phase(PI / 4.0),
        StandardGate::Tdg => phase(-PI / 4.0),
        StandardGate::Rx(p) => rx(angle(p)),
        StandardGate::Ry(p) => ry(angle(p)),
        StandardGate::Rz(p) => rz(angle(p)),
        StandardGate::CX => controlled(&x),
        StandardGate::CY => controlled(&y),
        StandardGate::CZ => controlled(&z),
        StandardGate::CH => controlled(&h),
        StandardGate::CRx(p) => controlled(&rx(angle(p))),
        StandardGate::CRy(p) => controlled(&ry(angle(p))),
        StandardGate::CRz(p) => controlled(&rz(angle(p))),
        StandardGate::CP(p) => controlled(&phase(angle(p))),
        StandardGate::RZZ(p) => {
            let (even, odd) = (
                Complex64::from_polar(1.0, -angle(p) / 2.0),
                Complex64::from_polar(1.0, angle(p) / 2.0),
            );
            diagonal(&[even, odd, odd, even])
        }
        StandardGate::Swap => permutation(2, |l| ((l & 1) << 1) | (l >> 1)),
        StandardGate::CCX => permutation(3, |l| if (l & 0b110) == 0b110 { l ^ 1 } else { l }),
        StandardGate::CSwap => permutation(3, |l| match l {
            0b101 => 0b110,
            0b110 => 0b101,
            other => other,
        }),
        // CX from the first operand to the third; the middle is untouched.
        StandardGate::Bridge => permutation(3, |l| if (l & 0b100) != 0 { l ^ 1 } else { l }),
    }
}

/// Apply `u` to `qubits` of a state vector; qubit `q` is bit `q` of the index.
fn apply(state: &[Complex64], u: &Matrix, qubits: &[usize]) -> Vec<Complex64> {
    let k = qubits.len();
    let mut out = vec![c(0.0, 0.0); state.len()];
    for (idx, &amp) in state.iter().enumerate() {
        if amp == c(0.0, 0.0) {
            continue;
        }
        let local = qubits.iter().fold(0, |acc, &q| (acc << 1) | ((idx >> q) & 1));
        for (row, entries) in u.iter().enumerate() {
            let coeff = entries[local];
            if coeff == c(0.0, 0.0) {
                continue;
            }
            let mut target = idx;
            for (i, &q) in qubits.iter().enumerate() {
                let bit = (row >> (k - 1 - i)) & 1;
                target = (target & !(1 << q)) | (bit << q);
            }
            out[target] += coeff * amp;
        }
    }
    out
}

/// Column `j` of the result is the circuit applied to basis state `j`.
fn unitary(circuit: &Circuit) -> Matrix {
    let dim = 1 << circuit.num_qubits();
    (0..dim)
        .map(|col| {
            let mut state = vec![c(0.0, 0.0); dim];
            state[col] = c(1.0, 0.0);
            for inst in circuit.instructions() {
                let gate = inst
                    .as_gate()
                    .and_then(|g| g.as_standard())
                    .expect("standard gates only");
                let qubits: Vec<usize> = inst.qubits.iter().map(|q| q.index()).collect();
                state = apply(&state, &gate_matrix(gate), &qubits);
            }
            state
        })
        .collect()
}

fn equal_up_to_phase(a: &Matrix, b: &Matrix) -> bool {
    let (mut best, mut at) = (0.0, (0, 0));
    for (i, row) in b.iter().enumerate() {
        for (j, v) in row.iter().enumerate() {
            if v.norm() > best {
                best = v.norm();
                at = (i, j);
            }
        }
    }
    let ratio = a[at.0][at.1] / b[at.0][at.1];
    if (ratio.norm() - 1.0).abs() > TOLERANCE {
        return false;
    }
    a.iter().zip(b).all(|(ra, rb)| {
        ra.iter()
            .zip(rb)
            .all(|(&x, &y)| (x - ratio * y).norm() < TOLERANCE)
    })
}

fn assert_equivalent(pass: &dyn Pass, circuit: &Circuit) -> Circuit {
    let mut unit = CompilationUnit::new(circuit);
    pass.apply(&mut unit, SafetyMode::Default).unwrap();
    assert!(
        equal_up_to_phase(&unitary(unit.circuit()), &unitary(circuit)),
        "{} changed the unitary of {:?}",
        pass.name(),
        circuit.instructions()
    );
    unit.into_circuit()
}

fn q(i: u32) -> QubitId {
    QubitId(i)
}

fn single(gate: StandardGate, qubits: &[u32], num_qubits: u32) -> Circuit {
    let mut circuit = Circuit::with_size("t", num_qubits, 0);
    circuit
        .gate(gate, qubits.iter().map(|&i| q(i)))
        .unwrap();
    circuit
}

// ============================================================================
// Decomposition
// ============================================================================

#[test]
fn test_model_matches_known_identities() {
    // H Z H = X, and CX is told apart from CZ.
    let mut hzh = Circuit::with_size("t", 1, 0);
    hzh.h(q(0)).unwrap().z(q(0)).unwrap().h(q(0)).unwrap();
    assert!(equal_up_to_phase(&unitary(&hzh), &unitary(&single(StandardGate::X, &[0], 1))));

    let cx = single(StandardGate::CX, &[0, 1], 2);
    let cz = single(StandardGate::CZ, &[0, 1], 2);
    assert!(!equal_up_to_phase(&unitary(&cx), &unitary(&cz)));
}

#[test]
fn test_multi_qubit_expansions_are_exact() {
    let two_qubit = [
        StandardGate::CX,
        StandardGate::CY,
        StandardGate::CZ,
        StandardGate::CH,
        StandardGate::Swap,
    ];
    let parametrised: [fn(ParameterExpression) -> StandardGate; 5] = [
        StandardGate::CRx,
        StandardGate::CRy,
        StandardGate::CRz,
        StandardGate::CP,
        StandardGate::RZZ,
    ];
    let mut gates: Vec<StandardGate> = two_qubit.to_vec();
    for make in parametrised {
        for theta in [0.7, -1.3, PI] {
            gates.push(make(theta.into()));
        }
    }

    for gate in gates {
        // Reversed operands on a wider register exercise the qubit order.
        for qubits in [[0, 1], [2, 0]] {
            let circuit = single(gate.clone(), &qubits, 3);
            let out = assert_equivalent(&DecomposeMultiQubitsCx, &circuit);
            assert_eq!(out.count_multi_qubit_gates(), out.count_ops("cx"));
        }
    }

    for gate in [StandardGate::CCX, StandardGate::CSwap, StandardGate::Bridge] {
        for qubits in [[0, 1, 2], [2, 0, 1], [1, 2, 0]] {
            assert_equivalent(&DecomposeMultiQubitsCx, &single(gate.clone(), &qubits, 3));
        }
    }
}

#[test]
fn test_single_qubit_rotations_are_exact() {
    let gates = [
        StandardGate::I,
        StandardGate::X,
        StandardGate::Y,
        StandardGate::Z,
        StandardGate::H,
        StandardGate::S,
        StandardGate::Sdg,
        StandardGate::T,
        StandardGate::Tdg,
        StandardGate::Rx(0.4.into()),
    ];
    for gate in gates {
        assert_equivalent(&DecomposeSingleQubitsRotations, &single(gate, &[0], 1));
    }
}

// ============================================================================
// Commutation
// ============================================================================

#[test]
fn test_every_commutation_is_sound() {
    let multis = [
        (StandardGate::CX, 2),
        (StandardGate::CY, 2),
        (StandardGate::CZ, 2),
        (StandardGate::CH, 2),
        (StandardGate::Swap, 2),
        (StandardGate::CRx(0.7.into()), 2),
        (StandardGate::CRy(0.7.into()), 2),
        (StandardGate::CRz(0.7.into()), 2),
        (StandardGate::CP(0.7.into()), 2),
        (StandardGate::RZZ(0.7.into()), 2),
        (StandardGate::CCX, 3),
        (StandardGate::CSwap, 3),
        (StandardGate::Bridge, 3),
    ];
    let singles = [
        StandardGate::Z,
        StandardGate::S,
        StandardGate::T,
        StandardGate::Rz(0.3.into()),
        StandardGate::X,
        StandardGate::Rx(0.3.into()),
        StandardGate::Y,
        StandardGate::Ry(0.3.into()),
        StandardGate::H,
    ];

    let mut moved = 0;
    for (multi, width) in &multis {
        for position in 0..*width {
            for one in &singles {
                let mut circuit = Circuit::with_size("t", 3, 0);
                circuit
                    .gate(multi.clone(), (0..*width).map(q))
                    .unwrap()
                    .gate(one.clone(), [q(position)])
                    .unwrap();
                let out = assert_equivalent(&CommuteThroughMultis, &circuit);
                if out != circuit {
                    moved += 1;
                }
            }
        }
    }
    // Diagonal gates on controls alone give well over this many moves.
    assert!(moved >= 30, "only {moved} moves");
}

// ============================================================================
// SWAP and BRIDGE expansion
// ============================================================================

#[test]
fn test_swap_expansion_with_peephole() {
    let mut circuit = Circuit::with_size("t", 3, 0);
    circuit
        .cx(q(0), q(1))
        .unwrap()
        .swap(q(0), q(1))
        .unwrap()
        .cx(q(0), q(1))
        .unwrap()
        .swap(q(2), q(1))
        .unwrap();

    let out = assert_equivalent(&DecomposeSwapsToCx, &circuit);
    assert_eq!(out.count_ops("swap"), 0);
    assert!(out.count_ops("cx") < 8);
}

#[test]
fn test_bridge_expansion_with_peephole() {
    let mut circuit = Circuit::with_size("t", 3, 0);
    circuit
        .cx(q(0), q(1))
        .unwrap()
        .bridge(q(0), q(1), q(2))
        .unwrap()
        .cx(q(1), q(2))
        .unwrap()
        .bridge(q(2), q(1), q(0))
        .unwrap();

    let out = assert_equivalent(&DecomposeBridges, &circuit);
    assert_eq!(out.count_ops("bridge"), 0);
}

// ============================================================================
// Optimisation on random circuits
// ============================================================================

#[derive(Debug, Clone)]
enum GateOp {
    One(StandardGate, u32),
    Two(StandardGate, u32, u32),
}

fn arb_gate_op() -> impl Strategy<Value = GateOp> {
    let one = prop_oneof![
        Just(StandardGate::H),
        Just(StandardGate::X),
        Just(StandardGate::Y),
        Just(StandardGate::S),
        Just(StandardGate::Tdg),
        (-4_i32..=4).prop_map(|k| StandardGate::Rz((f64::from(k) * PI / 4.0).into())),
        (-4_i32..=4).prop_map(|k| StandardGate::Rx((f64::from(k) * PI / 4.0).into())),
    ];
    let two = prop_oneof![
        Just(StandardGate::CX),
        Just(StandardGate::CZ),
        Just(StandardGate::Swap),
        Just(StandardGate::CRz(0.5.into())),
    ];
    prop_oneof![
        3 => (one, 0_u32..3).prop_map(|(g, a)| GateOp::One(g, a)),
        2 => (two, 0_u32..3, 0_u32..3)
            .prop_filter("Operands must differ", |(_, a, b)| a != b)
            .prop_map(|(g, a, b)| GateOp::Two(g, a, b)),
    ]
}

fn arb_small_circuit() -> impl Strategy<Value = Circuit> {
    prop::collection::vec(arb_gate_op(), 0..=12).prop_map(|ops| {
        let mut circuit = Circuit::with_size("prop", 3, 0);
        for op in ops {
            match op {
                GateOp::One(g, a) => circuit.gate(g, [q(a)]).unwrap(),
                GateOp::Two(g, a, b) => circuit.gate(g, [q(a), q(b)]).unwrap(),
            };
        }
        circuit
    })
}

proptest! {
    /// Commutation followed by redundancy removal keeps the unitary.
    #[test]
    fn test_optimisation_keeps_unitary(circuit in arb_small_circuit()) {
        let optimise = SequencePass::new(vec![
            Box::new(CommuteThroughMultis),
            Box::new(RemoveRedundancies),
        ]);
        let mut unit = CompilationUnit::new(&circuit);
        optimise.apply(&mut unit, SafetyMode::Default).unwrap();
        prop_assert!(equal_up_to_phase(&unitary(unit.circuit()), &unitary(&circuit)));
    }

    /// Full decomposition keeps the unitary.
    #[test]
    fn test_decomposition_keeps_unitary(circuit in arb_small_circuit()) {
        let decompose = SequencePass::new(vec![
            Box::new(DecomposeMultiQubitsCx),
            Box::new(DecomposeSingleQubitsRotations),
        ]);
        let mut unit = CompilationUnit::new(&circuit);
        decompose.apply(&mut unit, SafetyMode::Default).unwrap();
        prop_assert!(equal_up_to_phase(&unitary(unit.circuit()), &unitary(&circuit)));
    }
}
