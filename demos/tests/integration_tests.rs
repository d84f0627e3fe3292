//! Integration tests for the demo suite.
//!
//! Every demo circuit must compile to a valid circuit on every preset and
//! on the bundled device description.

use std::path::Path;

use quire_compile::{Backend, CompileConfig, Device, DeviceBackend, SafetyMode};
use quire_demos::circuits::{self, NAMES};
use quire_demos::{PRESETS, load_device, preset};

fn backend(device: Device, level: u8) -> DeviceBackend {
    DeviceBackend::new("demo", device, ["rz", "ry", "rx", "cx"]).with_config(
        CompileConfig::default()
            .with_optimisation_level(level)
            .with_safety_mode(SafetyMode::Audit),
    )
}

/// Test that all demo circuits compile on all presets at all levels.
#[test]
fn test_all_circuits_all_presets() {
    for name in NAMES {
        let circuit = circuits::by_name(name, 4).unwrap().unwrap();
        let width = u32::try_from(circuit.num_qubits()).unwrap();
        for arch in PRESETS {
            let device = Device::new(preset(arch, width).unwrap());
            for level in 0..=2 {
                let backend = backend(device.clone(), level);
                let unit = backend.compile(&circuit).unwrap();
                assert!(
                    backend.valid_circuit(unit.circuit()),
                    "{name} on {arch} at level {level}"
                );
                assert_eq!(
                    unit.circuit().count_ops("measure"),
                    circuit.count_ops("measure")
                );
            }
        }
    }
}

/// Test the bundled device and config files load and compile.
#[test]
fn test_bundled_configs() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("configs");
    let device = load_device(&root.join("t_shape.yaml")).unwrap();
    assert_eq!(device.architecture().num_nodes(), 5);
    assert_eq!(device.edge_error(1, 4), Some(0.021));

    let config = CompileConfig::from_file(root.join("audit.yaml")).unwrap();
    assert_eq!(config.optimisation_level(), 2);
    assert_eq!(config.safety_mode, SafetyMode::Audit);

    let backend = DeviceBackend::new("t", device, ["rz", "ry", "rx", "cx"]).with_config(config);
    let unit = backend.compile(&circuits::qft(5).unwrap()).unwrap();
    assert!(unit.check_all_predicates());
}

/// Test that higher levels do not produce more two-qubit gates on the adder.
#[test]
fn test_levels_shrink_adder() {
    let circuit = circuits::ripple_adder(2).unwrap();
    let device = Device::new(preset("line", 6).unwrap());
    let two_qubit = |level| {
        backend(device.clone(), level)
            .compile(&circuit)
            .unwrap()
            .circuit()
            .count_multi_qubit_gates()
    };
    assert!(two_qubit(1) <= two_qubit(0));
}
