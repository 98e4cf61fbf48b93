//! hpfa - HPFA image fusion parameter resolver
//!
//! Prints high-pass filters, modulation factors and blend weights for the
//! High-Pass Filter Additive fusion technique.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "hpfa")]
#[command(author, version, about = "HPFA image fusion kernel and weight resolver")]
#[command(long_about = "
Resolves the parameters of High-Pass Filter Additive (HPFA) image fusion:
kernel size, center cell value, modulation factor and blend weight, all
driven by the resolution ratio between panchromatic and multispectral data.

Examples:
  hpfa kernel --ratio 4                      # Filter for ratio 4 (9x9)
  hpfa kernel --size 5 --center 33           # Custom center value
  hpfa plan --high-res 0.6 --low-res 2.4     # Derive ratio from pixel sizes
  hpfa plan --ratio 8 --two-pass --level2 high
  hpfa plan --config fusion.yaml --json
  hpfa weight --reference-std 12.5 --filtered-std 40.2 --modulation-factor 0.65
  hpfa tables
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (repeat for more detail)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the high-pass filter for a ratio or kernel size
    #[command(visible_alias = "k")]
    Kernel(KernelArgs),

    /// Resolve a one- or two-pass fusion plan
    #[command(visible_alias = "p")]
    Plan(PlanArgs),

    /// Compute a blend weight from standard deviations
    #[command(visible_alias = "w")]
    Weight(WeightArgs),

    /// Print the active parameter tables
    Tables(TablesArgs),
}

#[derive(Args)]
struct KernelArgs {
    /// Resolution ratio (selects the kernel size)
    #[arg(short, long, conflicts_with = "size", required_unless_present = "size")]
    ratio: Option<f64>,

    /// Explicit kernel size: 5, 7, 9, 11, 13, 15
    #[arg(short, long)]
    size: Option<usize>,

    /// Center cell level: low, mid, high
    #[arg(short, long, default_value = "low", conflicts_with = "center")]
    level: String,

    /// Explicit center cell value
    #[arg(short, long)]
    center: Option<i32>,

    /// Divisor
    #[arg(short, long, default_value = "1")]
    divisor: f64,

    /// Filter type: P (parallel), S (sequential)
    #[arg(short = 't', long = "type", default_value = "P")]
    filter_type: String,

    /// Config file with pinned tables
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct PlanArgs {
    /// Resolution ratio (overrides --high-res/--low-res)
    #[arg(short, long)]
    ratio: Option<f64>,

    /// Pixel size of the high-resolution (panchromatic) image
    #[arg(long, requires = "low_res")]
    high_res: Option<f64>,

    /// Pixel size of the low-resolution (multispectral) image
    #[arg(long, requires = "high_res")]
    low_res: Option<f64>,

    /// First-pass center cell level: low, mid, high
    #[arg(short, long)]
    level: Option<String>,

    /// Second-pass center cell level: low, mid, high
    #[arg(long)]
    level2: Option<String>,

    /// First-pass modulation: min, mid, max
    #[arg(short, long)]
    modulation: Option<String>,

    /// Second-pass modulation: min, mid, max
    #[arg(long)]
    modulation2: Option<String>,

    /// Request a second pass (applied only for ratio > 5.5)
    #[arg(long)]
    two_pass: bool,

    /// Request histogram matching of the fused result
    #[arg(long)]
    histogram_match: bool,

    /// Config file (options and optional pinned tables)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Machine-readable output (JSON)
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct WeightArgs {
    /// Standard deviation of the low-resolution band
    #[arg(short, long)]
    reference_std: f64,

    /// Standard deviation of the high-pass filtered image
    #[arg(short, long)]
    filtered_std: f64,

    /// Modulation factor
    #[arg(short, long)]
    modulation_factor: f64,
}

#[derive(Args)]
struct TablesArgs {
    /// Config file with pinned tables
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Machine-readable output (JSON)
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init(cli.verbose, cli.log.as_deref())?;

    match cli.command {
        Commands::Kernel(args) => commands::kernel::run(args, cli.verbose),
        Commands::Plan(args) => commands::plan::run(args, cli.verbose),
        Commands::Weight(args) => commands::weight::run(args, cli.verbose),
        Commands::Tables(args) => commands::tables::run(args, cli.verbose),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_kernel_requires_ratio_or_size() {
        assert!(Cli::try_parse_from(["hpfa", "kernel"]).is_err());
        assert!(Cli::try_parse_from(["hpfa", "kernel", "--ratio", "3", "--size", "5"]).is_err());
        assert!(Cli::try_parse_from(["hpfa", "kernel", "--size", "5", "--center", "9"]).is_ok());
    }

    #[test]
    fn test_plan_flags() {
        let cli = Cli::try_parse_from(["hpfa", "-vv", "plan", "-r", "7", "--two-pass", "--level2", "HIGH"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Plan(args) => {
                assert_eq!(args.ratio, Some(7.0));
                assert!(args.two_pass);
                assert_eq!(args.level2.as_deref(), Some("HIGH"));
            }
            _ => panic!("expected plan"),
        }
        assert!(Cli::try_parse_from(["hpfa", "plan", "--high-res", "0.5"]).is_err());
    }
}
