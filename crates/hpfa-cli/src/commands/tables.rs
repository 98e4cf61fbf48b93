//! Tables command

use crate::TablesArgs;
use anyhow::Result;
use hpfa_core::{FusionTables, Level, Modulation};

pub fn run(args: TablesArgs, verbose: u8) -> Result<()> {
    let config = super::load_config(args.config.as_deref())?;
    let tables = config.tables();

    if args.json {
        println!("{}", serde_json::to_string_pretty(tables)?);
        return Ok(());
    }

    if verbose > 0 {
        match &args.config {
            Some(path) if config.tables.is_some() => eprintln!("Tables pinned by {}", path.display()),
            _ => eprintln!("Canonical tables"),
        }
    }

    print!("{}", render(tables));
    Ok(())
}

/// Fixed-width table, one row per ratio range.
pub fn render(tables: &FusionTables) -> String {
    let mut out = format!(
        "{:<14} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6}\n",
        "ratio", "kernel", "low", "mid", "high", "min", "mid", "max"
    );
    for (i, (range, size)) in tables.ratio_ranges.iter().zip(&tables.kernel_sizes).enumerate() {
        let span = if range.high.is_finite() {
            format!("[{}, {})", range.low, range.high)
        } else {
            format!("[{}, inf)", range.low)
        };
        out.push_str(&format!("{:<14} {:>6}", span, size));
        for level in Level::ALL {
            out.push_str(&format!(" {:>6}", tables.center_cells.get(level)[i]));
        }
        for modulation in Modulation::ALL {
            out.push_str(&format!(" {:>6.2}", tables.modulators.get(modulation)[i]));
        }
        out.push('\n');
    }
    out.push_str(&format!(
        "second pass: kernel {}, modulators min {:.2} / mid {:.2} / max {:.2}\n",
        tables.second_pass_kernel_size,
        tables.second_pass_modulators.min,
        tables.second_pass_modulators.mid,
        tables.second_pass_modulators.max
    ));
    out
}
