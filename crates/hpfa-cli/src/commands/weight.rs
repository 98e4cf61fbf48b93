//! Weight command

use crate::WeightArgs;
use anyhow::{Context, Result};
use hpfa_core::weight::weight;

pub fn run(args: WeightArgs, verbose: u8) -> Result<()> {
    let w = weight(args.reference_std, args.filtered_std, args.modulation_factor)
        .context("Cannot compute weight")?;

    if verbose > 0 {
        eprintln!(
            "weight = {} / {} * {}",
            args.reference_std, args.filtered_std, args.modulation_factor
        );
    }

    println!("{}", w);
    Ok(())
}
