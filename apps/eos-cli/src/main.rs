use clap::{Parser, Subcommand, ValueEnum};
use eos_core::timing::{conversion_timing, enable_timing};
use eos_core::{
    Axis, BlockShape, BlockState, CellIndex, FaceField, IndexRange, Real, IDN, IEN, IPR, IVX, IVZ,
    NVAR_MAX,
};
use eos_physics::{CellMetric, ConversionReport, Eos, EosError, EquationOfState, Minkowski};
use eos_project::{compile_eos, load, ProjectError};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error(transparent)]
    Eos(#[from] EosError),

    #[error("Invalid argument {what}: {reason}")]
    Argument { what: &'static str, reason: String },
}

type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "eos-cli")]
#[command(about = "Conserved/primitive conversion toolkit for grid fluid solvers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file
    Validate {
        /// Path to the YAML or JSON configuration
        config_path: PathBuf,
    },
    /// Print the compiled equation of state
    Describe {
        /// Path to the YAML or JSON configuration
        config_path: PathBuf,
    },
    /// Convert one conserved state and print primitives and wave speeds
    Probe {
        /// Path to the YAML or JSON configuration
        config_path: PathBuf,
        /// Conserved variables, comma separated
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        cons: Vec<Real>,
        /// Cell-centered magnetic field, comma separated
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        bcc: Option<Vec<Real>>,
        /// Direction for the wave-speed query
        #[arg(long, value_enum, default_value_t = AxisArg::X1)]
        axis: AxisArg,
    },
    /// Round-trip a synthetic block with perturbed energies and report interventions
    Stress {
        /// Path to the YAML or JSON configuration
        config_path: PathBuf,
        /// Cells per side
        #[arg(long, default_value_t = 32)]
        cells: usize,
        /// Peak velocity (4-velocity for relativistic variants)
        #[arg(long, default_value_t = 0.5)]
        velocity: Real,
        /// Factor applied to every conserved energy before inversion
        #[arg(long, default_value_t = 1.0)]
        energy_scale: Real,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AxisArg {
    X1,
    X2,
    X3,
}

impl From<AxisArg> for Axis {
    fn from(axis: AxisArg) -> Self {
        match axis {
            AxisArg::X1 => Axis::X1,
            AxisArg::X2 => Axis::X2,
            AxisArg::X3 => Axis::X3,
        }
    }
}

fn main() -> CliResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { config_path } => cmd_validate(&config_path),
        Commands::Describe { config_path } => cmd_describe(&config_path),
        Commands::Probe {
            config_path,
            cons,
            bcc,
            axis,
        } => cmd_probe(&config_path, &cons, bcc.as_deref(), axis.into()),
        Commands::Stress {
            config_path,
            cells,
            velocity,
            energy_scale,
            json,
        } => cmd_stress(&config_path, cells, velocity, energy_scale, json),
    }
}

fn compile(config_path: &Path) -> CliResult<Eos> {
    let project = load(config_path)?;
    info!(name = %project.name, kind = project.eos.kind(), "loaded configuration");
    Ok(compile_eos(&project)?)
}

fn cmd_validate(config_path: &Path) -> CliResult<()> {
    println!("Validating configuration: {}", config_path.display());
    compile(config_path)?;
    println!("✓ Configuration is valid");
    Ok(())
}

fn cmd_describe(config_path: &Path) -> CliResult<()> {
    let eos = compile(config_path)?;
    println!("Variant:       {}", eos.name());
    println!("Variables:     {}", eos.nvar());
    println!("Magnetic:      {}", eos.is_magnetic());
    println!("Relativistic:  {}", eos.is_relativistic());
    println!("Gamma:         {}", eos.gamma());
    println!("Density floor:  {:e}", eos.density_floor());
    println!("Pressure floor: {:e}", eos.pressure_floor());
    if let Eos::Heterogeneous(mixture) = &eos {
        println!("Components:");
        let m = mixture.mixture();
        for (n, name) in m.names().iter().enumerate() {
            println!(
                "  {name}: mu = {}, cv = {}, latent = {}{}",
                mixture.mu()[n],
                mixture.cv()[n],
                mixture.latent()[n],
                if mixture.condensed()[n] { " (condensed)" } else { "" }
            );
        }
    }
    Ok(())
}

fn cmd_probe(config_path: &Path, cons: &[Real], bcc: Option<&[Real]>, axis: Axis) -> CliResult<()> {
    let eos = compile(config_path)?;
    let nvar = eos.nvar();
    if cons.len() != nvar {
        return Err(CliError::Argument {
            what: "--cons",
            reason: format!("expected {nvar} values for {}, got {}", eos.name(), cons.len()),
        });
    }
    let field = match bcc {
        None => [0.0; 3],
        Some([b1, b2, b3]) => [*b1, *b2, *b3],
        Some(other) => {
            return Err(CliError::Argument {
                what: "--bcc",
                reason: format!("expected 3 values, got {}", other.len()),
            });
        }
    };

    let shape = BlockShape::new(1, 1, 1);
    let mut block = BlockState::new(nvar, shape);
    block.field = FaceField::uniform(shape, field);
    for (n, value) in cons.iter().enumerate() {
        block.cons[[n, 0, 0, 0]] = *value;
    }
    let report = eos.conserved_to_primitive(&mut block, &Minkowski, IndexRange::whole(shape))?;

    let index = CellIndex { k: 0, j: 0, i: 0 };
    let prim = BlockState::gather(&block.prim, nvar, index);
    println!("Primitive: {:?}", &prim[..nvar]);
    if report.is_clean() {
        println!("Status:    converged");
    } else {
        println!(
            "Status:    floored={} limited={} fallbacks={}",
            report.floored, report.limited, report.fallbacks
        );
        for (_, reason) in &report.fallback_cells {
            println!("  fallback: {reason}");
        }
        let adjusted = BlockState::gather(&block.cons, nvar, index);
        println!("Conserved: {:?}", &adjusted[..nvar]);
    }
    println!("Sound speed: {}", eos.sound_speed(&prim));
    let speeds = eos.wave_speeds(&prim, field, axis, &CellMetric::minkowski());
    println!(
        "Wave speeds along {axis:?}: ({}, {})",
        speeds.lambda_minus, speeds.lambda_plus
    );
    Ok(())
}

/// Smooth synthetic primitive state: density and pressure bumps with a
/// shear flow, valid for every variant.
fn synthetic_primitive(eos: &Eos, index: CellIndex, cells: usize, velocity: Real) -> [Real; NVAR_MAX] {
    let tau = std::f64::consts::TAU;
    let x = (index.i as Real + 0.5) / cells as Real;
    let y = (index.j as Real + 0.5) / cells as Real;
    let z = (index.k as Real + 0.5) / cells as Real;
    let mut prim = [0.0; NVAR_MAX];
    prim[IDN] = 1.0 + 0.5 * (tau * x).sin() * (tau * y).cos();
    prim[IVX] = velocity * (tau * y).sin();
    prim[IVX + 1] = velocity * (tau * z).cos();
    prim[IVZ] = 0.5 * velocity * (tau * x).cos();
    if eos.nvar() > IPR {
        prim[IPR] = 0.6 + 0.4 * (tau * z).sin();
    }
    for slot in (IPR + 1)..eos.nvar() {
        prim[slot] = 0.05;
    }
    prim
}

fn cmd_stress(
    config_path: &Path,
    cells: usize,
    velocity: Real,
    energy_scale: Real,
    json: bool,
) -> CliResult<()> {
    if cells == 0 {
        return Err(CliError::Argument {
            what: "--cells",
            reason: "must be positive".to_string(),
        });
    }
    let eos = compile(config_path)?;
    enable_timing();
    conversion_timing::reset_all();

    let nvar = eos.nvar();
    let shape = BlockShape::new(cells, cells, cells);
    let range = IndexRange::whole(shape);
    let mut block = BlockState::new(nvar, shape);
    if eos.is_magnetic() {
        block.field = FaceField::uniform(shape, [0.5, 0.3, 0.0]);
    }
    for index in range.cells() {
        let prim = synthetic_primitive(&eos, index, cells, velocity);
        BlockState::scatter(&mut block.prim, nvar, index, &prim);
        for (n, b) in block.field.cell_centered(index).into_iter().enumerate() {
            block.bcc[[n, index.k, index.j, index.i]] = b;
        }
    }
    block.snapshot_primitives();
    eos.primitive_to_conserved(&mut block, &Minkowski, range)?;

    if nvar > IEN {
        for index in range.cells() {
            block.cons[[IEN, index.k, index.j, index.i]] *= energy_scale;
        }
    }

    // One conversion per k-plane, the way a mesh hands out sub-ranges.
    let mut report = ConversionReport::default();
    for k in 0..cells {
        let plane = IndexRange::new(0, cells - 1, 0, cells - 1, k, k);
        report.merge(eos.conserved_to_primitive(&mut block, &Minkowski, plane)?);
    }
    if json {
        let value = serde_json::json!({
            "variant": eos.name(),
            "cells": report.cells,
            "floored": report.floored,
            "limited": report.limited,
            "fallbacks": report.fallbacks,
            "fixed": report.fixed_cells,
        });
        println!("{value}");
    } else {
        println!("Variant:   {}", eos.name());
        println!("Cells:     {}", report.cells);
        println!("Floored:   {}", report.floored);
        println!("Limited:   {}", report.limited);
        println!("Fallbacks: {}", report.fallbacks);
        println!("Fixed:     {}", report.fixed_cells);
        for line in conversion_timing::summary() {
            println!("{line}");
        }
    }
    Ok(())
}
