use anyhow::{bail, Context};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use silinit::common::{AccessRecord, SimRegisterFile};
use silinit::{
    BootConfig, BootPass, BootReport, IndirectFabricAccess, RevisionRegistry, SilContext,
    SiliconGeneration, XferDieDevices,
};

#[derive(Parser, Debug)]
#[command(name = "silinit-sim")]
#[command(about = "Run one AMD silicon initialization pass against a simulated register file")]
struct Args {
    #[arg(short, long, help = "Boot configuration (JSON)")]
    config: Option<std::path::PathBuf>,

    #[arg(long, help = "Number of simulated sockets (overrides the configuration)")]
    sockets: Option<u32>,

    #[arg(
        long,
        value_parser = parse_hex,
        help = "CPUID Fn0000_0001 EAX to detect the silicon generation from, e.g. 0x00A10F11"
    )]
    cpuid_eax: Option<u32>,

    #[arg(
        short,
        long,
        help = "Enable verbose logging (shows all MSR/PCI read/write operations)"
    )]
    verbose: bool,
}

fn parse_hex(s: &str) -> Result<u32, String> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u32::from_str_radix(digits, 16).map_err(|e| format!("invalid hex value '{s}': {e}"))
}

#[derive(Serialize)]
struct Output<'a> {
    report: &'a BootReport,
    writes: Vec<AccessRecord>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => BootConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => BootConfig::default(),
    };
    if let Some(sockets) = args.sockets {
        config.topology.sockets = sockets;
    }

    config.generation = match args.cpuid_eax {
        Some(eax) => match SiliconGeneration::from_cpuid_signature(eax) {
            Some(generation) => generation,
            None => bail!("CPUID signature 0x{eax:08X} is not a supported AMD generation"),
        },
        None if args.config.is_some() => config.generation,
        None => SiliconGeneration::detect().unwrap_or_default(),
    };
    config.validate()?;

    tracing::info!(
        "Simulating {} with {} socket(s)",
        config.generation,
        config.topology.sockets
    );

    let regs = SimRegisterFile::from_topology(&config.topology);
    let registry = RevisionRegistry::global();
    if !registry.is_registered(config.generation) {
        tracing::warn!(
            "No operation tables for {}, the pass will only report",
            config.generation
        );
    }
    registry.install(config.generation);

    let fabric = IndirectFabricAccess::new(&regs, XferDieDevices::new(registry));
    let ctx = SilContext::new(registry, &fabric, &regs);

    let report = BootPass::new(config).run(&ctx)?;

    let output = Output {
        report: &report,
        writes: regs.writes(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
