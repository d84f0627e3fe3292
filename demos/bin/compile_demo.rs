//! Quire Compilation Demo
//!
//! Compiles the demo circuits for a device and reports what each
//! optimisation level produces.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use quire_compile::{Backend, CompileConfig, Device, DeviceBackend, MAX_OPTIMISATION_LEVEL};
use quire_demos::report::{Stats, print_header, print_maps, print_result, print_section};
use quire_demos::{PRESETS, circuits, load_device, preset};

#[derive(Parser, Debug)]
#[command(name = "quire-demo")]
#[command(about = "Compile demo circuits onto a constrained device")]
struct Args {
    /// Circuits to compile (qft, adder, teleport, ising)
    #[arg(short, long, value_delimiter = ',', default_value = "qft,adder,teleport,ising")]
    circuits: Vec<String>,

    /// Circuit width for the scalable circuits
    #[arg(short = 'n', long, default_value = "5")]
    qubits: u32,

    /// Architecture preset (line, ring, grid, star, full)
    #[arg(short, long, default_value = "line")]
    arch: String,

    /// Device description file (YAML or JSON); overrides --arch
    #[arg(short, long)]
    device: Option<PathBuf>,

    /// Compilation settings file (YAML or JSON)
    #[arg(long, env = "QUIRE_CONFIG")]
    config: Option<PathBuf>,

    /// Compile at this level only instead of comparing all levels
    #[arg(short = 'O', long)]
    level: Option<u8>,

    /// Print the initial and final qubit maps
    #[arg(long)]
    maps: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let config = match &args.config {
        Some(path) => CompileConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => CompileConfig::default(),
    };
    debug!("Using config {:?}", config);

    let device = match &args.device {
        Some(path) => load_device(path)?,
        None => {
            let width = widest(&args.circuits, args.qubits)?;
            Device::new(preset(&args.arch, width)?)
        }
    };
    let arch = device.architecture();
    info!(
        "Target has {} nodes and {} edges",
        arch.num_nodes(),
        arch.num_edges()
    );

    print_header("Quire Compilation Demo");
    print_result(
        "Device",
        args.device
            .as_ref()
            .map_or_else(|| args.arch.clone(), |p| p.display().to_string()),
    );
    print_result("Nodes / edges", format!("{} / {}", arch.num_nodes(), arch.num_edges()));
    print_result("Safety mode", format!("{:?}", config.safety_mode));
    print_result("Bridges", config.routing.bridges);
    print_result("Placement", format!("{:?}", config.routing.placement));

    let levels: Vec<u8> = match args.level {
        Some(level) => vec![level],
        None => (0..=MAX_OPTIMISATION_LEVEL).collect(),
    };

    for name in &args.circuits {
        let circuit = match circuits::by_name(name, args.qubits) {
            Some(built) => built?,
            None => bail!("unknown circuit '{name}' (expected one of {:?})", circuits::NAMES),
        };

        print_section(&format!("{name}: {}", Stats::of(&circuit)));
        for &level in &levels {
            let backend = DeviceBackend::new("demo", device.clone(), ["rz", "ry", "rx", "cx"])
                .with_config(config.clone().with_optimisation_level(level));

            let start = Instant::now();
            let unit = backend
                .compile(&circuit)
                .with_context(|| format!("Failed to compile {name} at level {level}"))?;
            let elapsed = start.elapsed();

            let verdict = if backend.valid_circuit(unit.circuit()) {
                "valid"
            } else {
                "INVALID"
            };
            print_result(
                &format!("level {level}"),
                format!("{} [{verdict}, {elapsed:.2?}]", Stats::of(unit.circuit())),
            );
            if args.maps {
                print_maps(&unit);
            }
        }
    }

    println!();
    Ok(())
}

/// Widest requested circuit, so presets get enough nodes.
fn widest(names: &[String], n: u32) -> Result<u32> {
    names.iter().try_fold(0, |widest, name| {
        let circuit = circuits::by_name(name, n)
            .with_context(|| format!("unknown circuit '{name}'"))??;
        Ok(widest.max(u32::try_from(circuit.num_qubits())?))
    })
}
