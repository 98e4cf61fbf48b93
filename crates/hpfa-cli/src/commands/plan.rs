//! Plan command
//!
//! Resolves first- and second-pass filters and modulators. Options come from
//! the config file first, then flags override them.

use crate::PlanArgs;
use anyhow::{Result, bail};
use hpfa_core::ratio::resolution_ratio;
use hpfa_core::{FusionOptions, FusionPass, FusionPlan, Level, Modulation};
use serde_json::{Value, json};
#[allow(unused_imports)]
use tracing::{debug, info, trace, warn};

pub fn run(args: PlanArgs, verbose: u8) -> Result<()> {
    let plan = resolve(&args)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan_json(&plan))?);
        return Ok(());
    }

    println!("Resolution ratio: {}", plan.ratio());
    for pass in plan.passes() {
        println!();
        print_pass(pass, verbose);
    }
    println!();
    println!("Second pass: {}", plan.second_pass_status());
    if plan.histogram_match() {
        println!("Histogram matching: requested");
    }

    Ok(())
}

/// Loads config, merges flags and resolves the plan.
pub fn resolve(args: &PlanArgs) -> Result<FusionPlan> {
    let config = super::load_config(args.config.as_deref())?;
    let options = merge_options(config.options.clone(), args)?;

    // Explicit ratio wins over pixel sizes
    let derived = match (options.ratio, args.high_res, args.low_res) {
        (None, Some(high), Some(low)) => Some(resolution_ratio(high, low)?),
        _ => None,
    };
    let Some(ratio) = options.effective_ratio(derived) else {
        bail!("Specify --ratio, --high-res/--low-res, or a ratio in the config file");
    };

    info!(ratio, "Resolving fusion plan");
    Ok(FusionPlan::resolve_with(config.tables(), &options, ratio)?)
}

/// Applies flag overrides on top of config options.
pub fn merge_options(mut options: FusionOptions, args: &PlanArgs) -> Result<FusionOptions> {
    if let Some(ratio) = args.ratio {
        options.ratio = Some(ratio);
    }
    if let Some(level) = &args.level {
        options.level = Level::parse(level)?;
    }
    if let Some(level) = &args.level2 {
        options.level2 = Level::parse(level)?;
    }
    if let Some(modulation) = &args.modulation {
        options.modulation = Modulation::parse(modulation)?;
    }
    if let Some(modulation) = &args.modulation2 {
        options.modulation2 = Modulation::parse(modulation)?;
    }
    options.two_pass |= args.two_pass;
    options.histogram_match |= args.histogram_match;
    debug!(?options, "Merged fusion options");
    Ok(options)
}

fn print_pass(pass: &FusionPass, verbose: u8) {
    println!(
        "Pass {}: kernel {}x{}, level {} (center {}), modulation {} ({})",
        pass.pass,
        pass.filter.size(),
        pass.filter.size(),
        pass.level,
        pass.filter.kernel.center(),
        pass.modulation,
        pass.modulator_value
    );
    if verbose > 0 || pass.filter.size() <= 9 {
        println!("{}", pass.filter);
    }
}

fn pass_json(pass: &FusionPass) -> Value {
    json!({
        "pass": pass.pass.number(),
        "ratio": pass.ratio,
        "level": pass.level,
        "modulation": pass.modulation,
        "kernel_size": pass.filter.size(),
        "center": pass.filter.kernel.center(),
        "divisor": pass.filter.divisor,
        "type": pass.filter.filter_type,
        "modulator": pass.modulator_value,
        "filter": pass.filter.serialize(),
    })
}

/// JSON view of a plan.
pub fn plan_json(plan: &FusionPlan) -> Value {
    json!({
        "ratio": plan.ratio(),
        "passes": plan.passes().map(pass_json).collect::<Vec<_>>(),
        "second_pass": plan.second_pass_status(),
        "downgraded": plan.downgraded(),
        "histogram_match": plan.histogram_match(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> PlanArgs {
        PlanArgs {
            ratio: None,
            high_res: None,
            low_res: None,
            level: None,
            level2: None,
            modulation: None,
            modulation2: None,
            two_pass: false,
            histogram_match: false,
            config: None,
            json: false,
        }
    }

    #[test]
    fn test_flags_override_config() {
        let base = FusionOptions {
            ratio: Some(3.0),
            level: Level::High,
            ..FusionOptions::default()
        };
        let a = PlanArgs {
            ratio: Some(8.0),
            modulation2: Some("MAX".into()),
            two_pass: true,
            ..args()
        };
        let merged = merge_options(base, &a).unwrap();
        assert_eq!(merged.ratio, Some(8.0));
        assert_eq!(merged.level, Level::High);
        assert_eq!(merged.modulation2, Modulation::Max);
        assert!(merged.two_pass);
    }

    #[test]
    fn test_explicit_ratio_skips_pixel_sizes() {
        let a = PlanArgs {
            ratio: Some(7.0),
            high_res: Some(0.0),
            low_res: Some(2.0),
            ..args()
        };
        let plan = resolve(&a).unwrap();
        assert_eq!(plan.ratio(), 7.0);
        assert_eq!(plan.first().filter.size(), 11);
    }

    #[test]
    fn test_ratio_from_pixel_sizes() {
        let a = PlanArgs {
            high_res: Some(0.6),
            low_res: Some(2.4),
            ..args()
        };
        assert_eq!(resolve(&a).unwrap().ratio(), 4.0);

        let bad = PlanArgs {
            high_res: Some(0.0),
            low_res: Some(2.0),
            ..args()
        };
        assert!(resolve(&bad).is_err());
        assert!(resolve(&args()).is_err());
    }

    #[test]
    fn test_bad_level_flag() {
        let a = PlanArgs {
            level: Some("huge".into()),
            ..args()
        };
        assert!(merge_options(FusionOptions::default(), &a).is_err());
    }

    #[test]
    fn test_plan_json() {
        let opts = FusionOptions {
            two_pass: true,
            ..FusionOptions::default()
        };
        let v = plan_json(&FusionPlan::resolve(&opts, 4.0).unwrap());
        assert_eq!(v["downgraded"], json!(true));
        assert_eq!(v["second_pass"], json!("downgraded"));
        assert_eq!(v["passes"].as_array().unwrap().len(), 1);
        assert_eq!(v["passes"][0]["kernel_size"], json!(9));
        assert_eq!(v["passes"][0]["level"], json!("Low"));
        assert_eq!(v["passes"][0]["type"], json!("P"));
    }
}
