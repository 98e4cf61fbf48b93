//! Kernel command
//!
//! Prints the high-pass filter for a resolution ratio, or for an explicit
//! kernel size and center value.

use crate::KernelArgs;
use anyhow::Result;
use hpfa_core::{FilterSpec, FilterType, Kernel, Level};
#[allow(unused_imports)]
use tracing::{debug, info, trace};

pub fn run(args: KernelArgs, verbose: u8) -> Result<()> {
    let spec = build(&args)?;

    if verbose > 0 {
        eprintln!(
            "Kernel {}x{} (center={}, divisor={}, type={})",
            spec.size(),
            spec.size(),
            spec.kernel.center(),
            spec.divisor,
            spec.filter_type
        );
    }

    println!("{}", spec);
    Ok(())
}

/// Resolves the filter described by `args`.
pub fn build(args: &KernelArgs) -> Result<FilterSpec> {
    trace!(ratio = ?args.ratio, size = ?args.size, level = %args.level, "kernel::build");

    let config = super::load_config(args.config.as_deref())?;
    let tables = config.tables();

    let size = match (args.size, args.ratio) {
        (Some(size), _) => size,
        (None, Some(ratio)) => tables.kernel_size(ratio)?,
        (None, None) => anyhow::bail!("Specify --ratio or --size"),
    };

    let center = match args.center {
        Some(center) => center,
        None => tables.center_cell(Level::parse(&args.level)?, size)?,
    };

    info!(size, center, "Building high-pass filter");

    let spec = FilterSpec::new(Kernel::build(size, center)?)
        .with_divisor(args.divisor)
        .with_type(FilterType::parse(&args.filter_type)?);
    Ok(spec)
}
