// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

use labwired_config::HarnessConfig;
use labwired_core::catalog::AddressMap;
use labwired_core::scenario::{self, Profile, Step};
use labwired_core::sequencer::{BenchSettings, RunReport, Sequencer};
use labwired_core::sim::{Faults, ReferenceDut};

mod vcd_trace;

use vcd_trace::VcdSurface;

const EXIT_PASS: u8 = 0;
const EXIT_SCENARIO_FAIL: u8 = 1;
const EXIT_CONFIG_ERROR: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "LabWired Wishbone integration harness",
    long_about = None
)]
struct Cli {
    /// Path to the harness description (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Built-in scenario, used when the config carries no script
    #[arg(long, value_enum, default_value_t = ProfileArg::Reference)]
    profile: ProfileArg,

    /// Write a VCD trace of every harness line
    #[arg(long)]
    vcd: Option<PathBuf>,

    /// Clock edges the reference model takes to acknowledge
    #[arg(long, default_value = "1")]
    ack_latency: u32,

    /// Enable per-transaction tracing
    #[arg(short, long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print every register of the address map with its resolved address.
    Catalog,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ProfileArg {
    Reference,
    Smoke,
}

impl From<ProfileArg> for Profile {
    fn from(arg: ProfileArg) -> Self {
        match arg {
            ProfileArg::Reference => Profile::Reference,
            ProfileArg::Smoke => Profile::Smoke,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing with appropriate level based on --trace flag
    if cli.trace {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .init();
    }

    match cli.command {
        Some(Commands::Catalog) => run_catalog(cli.config.as_deref()),
        None => run_scenario(&cli),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<HarnessConfig> {
    match path {
        Some(path) => {
            info!("Loading harness config: {:?}", path);
            HarnessConfig::from_file(path)
        }
        None => Ok(HarnessConfig::default()),
    }
}

fn build(cli: &Cli) -> anyhow::Result<(HarnessConfig, AddressMap, Vec<Step>)> {
    let config = load_config(cli.config.as_deref())?;
    let map = AddressMap::from_config(&config.address_map)?;
    let steps = match &config.scenario {
        Some(script) => scenario::from_config(script, &map)?,
        None => Profile::from(cli.profile).steps(&map),
    };
    Ok((config, map, steps))
}

fn run_scenario(cli: &Cli) -> ExitCode {
    let (config, map, steps) = match build(cli) {
        Ok(built) => built,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    info!("Starting harness '{}' ({} steps)", config.name, steps.len());
    let dut = ReferenceDut::with_map(&map, config.timing.clock_period_ns).with_faults(Faults {
        ack_latency: cli.ack_latency,
        ..Default::default()
    });
    let sequencer = Sequencer::new(&config.name, BenchSettings::from(&config.timing), steps);

    let report = match &cli.vcd {
        Some(path) => {
            let mut surface = match VcdSurface::create(dut, path) {
                Ok(surface) => surface,
                Err(e) => {
                    error!("Failed to create VCD trace {:?}: {:#}", path, e);
                    return ExitCode::from(EXIT_CONFIG_ERROR);
                }
            };
            let report = sequencer.run(&mut surface);
            info!("VCD trace written to {:?}", path);
            report
        }
        None => {
            let mut dut = dut;
            sequencer.run(&mut dut)
        }
    };

    print_report(&report);
    if report.passed() {
        ExitCode::from(EXIT_PASS)
    } else {
        ExitCode::from(EXIT_SCENARIO_FAIL)
    }
}

fn print_report(report: &RunReport) {
    println!("== {} ==", report.name);
    for result in &report.results {
        println!("  [{}] {}", result.status, result.name);
        for obs in &result.observed {
            println!("        {:<16} = {:#x}", obs.label, obs.value);
        }
    }
    match &report.failure {
        Some(e) => println!("{}: {}", report.state, e),
        None => println!("{}", report.state),
    }
}

fn run_catalog(config: Option<&Path>) -> ExitCode {
    let map = match load_config(config).and_then(|c| AddressMap::from_config(&c.address_map)) {
        Ok(map) => map,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    for range in map.ranges() {
        println!(
            "{:<6} {:#010x}..{:#010x}",
            range.peripheral.to_string(),
            range.base,
            range.base as u64 + range.size as u64
        );
    }
    for entry in map.entries() {
        println!("  {:<14} {:#010x}", entry.register.to_string(), entry.address);
    }
    ExitCode::from(EXIT_PASS)
}
