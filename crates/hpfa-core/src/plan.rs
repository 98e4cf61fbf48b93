//! Two-pass fusion planning.
//!
//! A plan resolves every parameter the raster side needs, pass by pass:
//!
//! ```text
//! Init -> Pass1Resolved -> Pass2Resolved -> Ready
//!                       \-> SkipPass2    -/
//! ```
//!
//! The first pass is mandatory. The second pass uses the fixed small kernel
//! and is only permitted for ratios above [`SECOND_PASS_MIN_RATIO`]; a
//! request below that is downgraded, which is reported through
//! [`SecondPassStatus::Downgraded`] rather than as an error.
//!
//! The plan never touches rasters. The blend it prepares is
//!
//! ```text
//! fused = upsampled + hpf  * weight
//! fused = fused     + hpf2 * weight2     (second pass only)
//! ```
//!
//! # Example
//!
//! ```rust
//! use hpfa_core::{FusionOptions, FusionPlan, SecondPassStatus};
//!
//! let opts = FusionOptions { two_pass: true, ..FusionOptions::default() };
//!
//! let plan = FusionPlan::resolve(&opts, 4.0).unwrap();
//! assert_eq!(plan.passes().count(), 1);
//! assert_eq!(plan.second_pass_status(), SecondPassStatus::Downgraded);
//!
//! let plan = FusionPlan::resolve(&opts, 7.0).unwrap();
//! assert_eq!(plan.second().unwrap().filter.size(), 5);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use tracing::{debug, info, trace, warn};

use crate::config::{FusionOptions, SECOND_PASS_MIN_RATIO};
use crate::filter::FilterSpec;
use crate::kernel::Kernel;
use crate::params::{Level, Modulation, Pass};
use crate::tables::FusionTables;
use crate::weight::weight;
use crate::HpfaResult;

/// Planner states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanState {
    /// Nothing resolved.
    Init,
    /// First-pass filter and modulator resolved.
    Pass1Resolved,
    /// Second-pass filter and modulator resolved.
    Pass2Resolved,
    /// Second pass not requested or not permitted.
    SkipPass2,
    /// Plan complete.
    Ready,
}

/// Outcome of the second-pass gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecondPassStatus {
    /// Caller did not ask for a second pass.
    NotRequested,
    /// Caller asked, but the ratio does not permit it.
    Downgraded,
    /// Second pass resolved.
    Resolved,
}

impl fmt::Display for SecondPassStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRequested => write!(f, "not requested"),
            Self::Downgraded => write!(f, "requested, skipped (ratio <= {})", SECOND_PASS_MIN_RATIO),
            Self::Resolved => write!(f, "resolved"),
        }
    }
}

/// Parameters of one HPF-weight-add cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct FusionPass {
    /// Pass number.
    pub pass: Pass,
    /// Resolution ratio the plan was built for.
    pub ratio: f64,
    /// Center-cell level.
    pub level: Level,
    /// Modulation level.
    pub modulation: Modulation,
    /// High-pass filter for this pass.
    pub filter: FilterSpec,
    /// Modulation factor applied to the weight.
    pub modulator_value: f64,
}

impl FusionPass {
    /// Resolves kernel size, center and modulator for `pass`.
    pub fn resolve(
        tables: &FusionTables,
        pass: Pass,
        ratio: f64,
        level: Level,
        modulation: Modulation,
    ) -> HpfaResult<Self> {
        let size = match pass {
            Pass::First => tables.kernel_size(ratio)?,
            Pass::Second => tables.second_pass_kernel_size,
        };
        let center = tables.center_cell(level, size)?;
        let modulator_value = tables.modulation_factor(modulation, size, pass)?;
        let filter = FilterSpec::new(Kernel::build(size, center)?);

        debug!(%pass, ratio, size, center, modulator = modulator_value, "Resolved fusion pass");

        Ok(Self {
            pass,
            ratio,
            level,
            modulation,
            filter,
            modulator_value,
        })
    }

    /// Blend weight for this pass from fresh statistics.
    pub fn weight(&self, reference_std: f64, filtered_std: f64) -> HpfaResult<f64> {
        weight(reference_std, filtered_std, self.modulator_value)
    }

    /// Filter text for the convolution collaborator.
    pub fn filter_text(&self) -> String {
        self.filter.serialize()
    }
}

/// Resolved one- or two-pass fusion parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct FusionPlan {
    ratio: f64,
    first: FusionPass,
    second: Option<FusionPass>,
    second_pass: SecondPassStatus,
    histogram_match: bool,
    states: Vec<PlanState>,
}

impl FusionPlan {
    /// Resolves a plan against the canonical tables.
    pub fn resolve(options: &FusionOptions, ratio: f64) -> HpfaResult<Self> {
        Self::resolve_with(FusionTables::canonical(), options, ratio)
    }

    /// Resolves a plan against `tables`.
    ///
    /// `ratio` is used as given; apply [`FusionOptions::effective_ratio`]
    /// beforehand when an override may be present.
    pub fn resolve_with(tables: &FusionTables, options: &FusionOptions, ratio: f64) -> HpfaResult<Self> {
        trace!(ratio, ?options, "FusionPlan::resolve");
        let mut states = vec![PlanState::Init];

        let first = FusionPass::resolve(tables, Pass::First, ratio, options.level, options.modulation)?;
        advance(&mut states, PlanState::Pass1Resolved);

        let eligible = ratio > SECOND_PASS_MIN_RATIO;
        let (second, second_pass) = match (options.two_pass, eligible) {
            (true, true) => {
                let pass = FusionPass::resolve(
                    tables,
                    Pass::Second,
                    ratio,
                    options.level2,
                    options.modulation2,
                )?;
                advance(&mut states, PlanState::Pass2Resolved);
                (Some(pass), SecondPassStatus::Resolved)
            }
            (true, false) => {
                warn!(
                    ratio,
                    min = SECOND_PASS_MIN_RATIO,
                    "Second pass requested but ratio is too low, skipping"
                );
                advance(&mut states, PlanState::SkipPass2);
                (None, SecondPassStatus::Downgraded)
            }
            (false, eligible) => {
                if eligible {
                    info!(ratio, "Ratio permits a second pass, not requested");
                }
                advance(&mut states, PlanState::SkipPass2);
                (None, SecondPassStatus::NotRequested)
            }
        };

        advance(&mut states, PlanState::Ready);

        Ok(Self {
            ratio,
            first,
            second,
            second_pass,
            histogram_match: options.histogram_match,
            states,
        })
    }

    /// Resolution ratio.
    #[inline]
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Mandatory first pass.
    #[inline]
    pub fn first(&self) -> &FusionPass {
        &self.first
    }

    /// Second pass, if resolved.
    #[inline]
    pub fn second(&self) -> Option<&FusionPass> {
        self.second.as_ref()
    }

    /// Passes in application order.
    pub fn passes(&self) -> impl Iterator<Item = &FusionPass> {
        std::iter::once(&self.first).chain(self.second.as_ref())
    }

    /// Second-pass gate outcome.
    #[inline]
    pub fn second_pass_status(&self) -> SecondPassStatus {
        self.second_pass
    }

    /// True if a requested second pass was skipped.
    #[inline]
    pub fn downgraded(&self) -> bool {
        self.second_pass == SecondPassStatus::Downgraded
    }

    /// True if the fused result should be histogram-matched.
    #[inline]
    pub fn histogram_match(&self) -> bool {
        self.histogram_match
    }

    /// States visited while resolving, `Init` to `Ready`.
    pub fn states(&self) -> &[PlanState] {
        &self.states
    }
}

fn advance(states: &mut Vec<PlanState>, next: PlanState) {
    if let Some(prev) = states.last() {
        trace!(from = ?prev, to = ?next, "plan transition");
    }
    states.push(next);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HpfaError;
    use approx::assert_relative_eq;

    fn two_pass() -> FusionOptions {
        FusionOptions {
            two_pass: true,
            ..FusionOptions::default()
        }
    }

    #[test]
    fn test_single_pass() {
        let plan = FusionPlan::resolve(&FusionOptions::default(), 3.0).unwrap();
        assert_eq!(plan.passes().count(), 1);
        assert_eq!(plan.second_pass_status(), SecondPassStatus::NotRequested);
        assert!(!plan.downgraded());

        let first = plan.first();
        assert_eq!(first.pass, Pass::First);
        assert_eq!(first.filter.size(), 7);
        assert_eq!(first.filter.kernel.center(), 48);
        assert_relative_eq!(first.modulator_value, 0.50);
        assert_eq!(
            plan.states(),
            &[PlanState::Init, PlanState::Pass1Resolved, PlanState::SkipPass2, PlanState::Ready]
        );
    }

    #[test]
    fn test_downgrade_below_gate() {
        let plan = FusionPlan::resolve(&two_pass(), 4.0).unwrap();
        assert_eq!(plan.passes().count(), 1);
        assert!(plan.downgraded());
        assert!(plan.second().is_none());
    }

    #[test]
    fn test_gate_is_exclusive() {
        let plan = FusionPlan::resolve(&two_pass(), 5.5).unwrap();
        assert!(plan.downgraded());
        let plan = FusionPlan::resolve(&two_pass(), 5.51).unwrap();
        assert_eq!(plan.second_pass_status(), SecondPassStatus::Resolved);
    }

    #[test]
    fn test_two_passes() {
        let opts = FusionOptions {
            level: Level::Mid,
            level2: Level::High,
            modulation: Modulation::Max,
            modulation2: Modulation::Min,
            ..two_pass()
        };
        let plan = FusionPlan::resolve(&opts, 7.0).unwrap();
        let passes: Vec<_> = plan.passes().collect();
        assert_eq!(passes.len(), 2);

        assert_eq!(passes[0].filter.size(), 11);
        assert_eq!(passes[0].filter.kernel.center(), 150);
        assert_relative_eq!(passes[0].modulator_value, 1.00);

        assert_eq!(passes[1].pass, Pass::Second);
        assert_eq!(passes[1].filter.size(), 5);
        assert_eq!(passes[1].filter.kernel.center(), 32);
        assert_relative_eq!(passes[1].modulator_value, 0.25);
        assert_eq!(passes[1].ratio, 7.0);

        assert_eq!(
            plan.states(),
            &[PlanState::Init, PlanState::Pass1Resolved, PlanState::Pass2Resolved, PlanState::Ready]
        );
    }

    #[test]
    fn test_out_of_range_fails_first_pass() {
        assert!(matches!(
            FusionPlan::resolve(&two_pass(), 0.5),
            Err(HpfaError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_pass_weight_uses_modulator() {
        let plan = FusionPlan::resolve(&FusionOptions::default(), 1.5).unwrap();
        // 5x5, Mid modulation: 0.25
        assert_relative_eq!(plan.first().weight(20.0, 5.0).unwrap(), 1.0);
        assert!(plan.first().weight(20.0, 0.0).is_err());
    }

    #[test]
    fn test_histogram_flag_carried() {
        let opts = FusionOptions {
            histogram_match: true,
            ..FusionOptions::default()
        };
        assert!(FusionPlan::resolve(&opts, 2.0).unwrap().histogram_match());
        assert!(!FusionPlan::resolve(&FusionOptions::default(), 2.0).unwrap().histogram_match());
    }

    #[test]
    fn test_filter_text_matches_kernel() {
        let plan = FusionPlan::resolve(&FusionOptions::default(), 9.9).unwrap();
        let text = plan.first().filter_text();
        assert!(text.starts_with("MATRIX    15\n"));
        assert!(text.contains(" 336 "));
    }
}
