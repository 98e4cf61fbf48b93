//! Raster collaborator interface and the fusion driver.
//!
//! Pixel work (convolution, resampling, statistics, arithmetic) belongs to
//! an external toolkit. [`RasterOps`] is the seam: it takes raster handles
//! and filter text and hands back statistics or new handles. [`fuse`] walks a
//! resolved [`FusionPlan`] through those calls for each multispectral band.
//!
//! Call order per band:
//!
//! 1. `hpf = apply_convolution(pan, filter1)`
//! 2. `up = resample_bilinear(band)`
//! 3. `fused = weighted_sum(up, hpf, weight1)`
//! 4. second pass: `fused = weighted_sum(fused, convolve(pan, filter2), weight2)`
//! 5. histogram match: `fused = linear_rescale(fused, ..)`
//!
//! Bands are independent; nothing is shared between them.

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use tracing::{debug, info, trace};

use crate::plan::FusionPlan;
use crate::weight::LinearRescale;
use crate::HpfaResult;

/// Raster toolkit operations consumed by the fusion driver.
///
/// Implementations report failures as [`HpfaError::Raster`](crate::HpfaError::Raster).
pub trait RasterOps {
    /// Raster handle.
    type Id: Clone + std::fmt::Debug;

    /// Standard deviation of all cells.
    fn std_dev(&mut self, raster: &Self::Id) -> HpfaResult<f64>;

    /// Mean of all cells.
    fn mean(&mut self, raster: &Self::Id) -> HpfaResult<f64>;

    /// Convolves `input` with a filter given as text.
    fn apply_convolution(&mut self, input: &Self::Id, filter: &str) -> HpfaResult<Self::Id>;

    /// Bilinear resample onto the high-resolution grid.
    fn resample_bilinear(&mut self, input: &Self::Id) -> HpfaResult<Self::Id>;

    /// `a + b * scalar`, cell by cell.
    fn weighted_sum(&mut self, a: &Self::Id, b: &Self::Id, scalar: f64) -> HpfaResult<Self::Id>;

    /// `(raster - old_mean) / old_std * new_std + new_mean`, cell by cell.
    fn linear_rescale(
        &mut self,
        raster: &Self::Id,
        old_mean: f64,
        old_std: f64,
        new_mean: f64,
        new_std: f64,
    ) -> HpfaResult<Self::Id>;
}

/// Result of fusing one band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandOutcome<Id> {
    /// Fused raster.
    pub output: Id,
    /// Weight per applied pass.
    pub weights: Vec<f64>,
    /// Rescale applied at the end, if any.
    pub rescale: Option<LinearRescale>,
}

/// Fuses one multispectral band with the panchromatic raster.
pub fn fuse_band<R: RasterOps>(
    ops: &mut R,
    plan: &FusionPlan,
    pan: &R::Id,
    band: &R::Id,
) -> HpfaResult<BandOutcome<R::Id>> {
    trace!(?pan, ?band, ratio = plan.ratio(), "fuse_band");

    let reference_std = ops.std_dev(band)?;
    let upsampled = ops.resample_bilinear(band)?;

    let mut fused = upsampled;
    let mut weights = Vec::with_capacity(2);
    for pass in plan.passes() {
        let hpf = ops.apply_convolution(pan, &pass.filter_text())?;
        let filtered_std = ops.std_dev(&hpf)?;
        let w = pass.weight(reference_std, filtered_std)?;
        debug!(pass = %pass.pass, weight = w, reference_std, filtered_std, "Adding high-pass detail");
        fused = ops.weighted_sum(&fused, &hpf, w)?;
        weights.push(w);
    }

    let rescale = if plan.histogram_match() {
        let rescale = LinearRescale::new(
            ops.mean(&fused)?,
            ops.std_dev(&fused)?,
            ops.mean(band)?,
            reference_std,
        )?;
        debug!(gain = rescale.gain(), offset = rescale.offset(), "Histogram matching");
        fused = ops.linear_rescale(
            &fused,
            rescale.fused_mean,
            rescale.fused_std,
            rescale.reference_mean,
            rescale.reference_std,
        )?;
        Some(rescale)
    } else {
        None
    };

    Ok(BandOutcome {
        output: fused,
        weights,
        rescale,
    })
}

/// Fuses every band in order with the same plan.
pub fn fuse<R: RasterOps>(
    ops: &mut R,
    plan: &FusionPlan,
    pan: &R::Id,
    bands: &[R::Id],
) -> HpfaResult<Vec<BandOutcome<R::Id>>> {
    info!(bands = bands.len(), passes = plan.passes().count(), "Fusing");
    bands
        .iter()
        .map(|band| fuse_band(ops, plan, pan, band))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FusionOptions, HpfaError};
    use approx::assert_relative_eq;

    /// Records calls and returns canned statistics.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
        next: usize,
        hpf_std: f64,
    }

    impl Recorder {
        fn fresh(&mut self, prefix: &str) -> String {
            self.next += 1;
            format!("{}{}", prefix, self.next)
        }
    }

    impl RasterOps for Recorder {
        type Id = String;

        fn std_dev(&mut self, raster: &String) -> HpfaResult<f64> {
            self.calls.push(format!("std {}", raster));
            Ok(if raster.starts_with("hpf") { self.hpf_std } else { 10.0 })
        }

        fn mean(&mut self, raster: &String) -> HpfaResult<f64> {
            self.calls.push(format!("mean {}", raster));
            Ok(100.0)
        }

        fn apply_convolution(&mut self, input: &String, filter: &str) -> HpfaResult<String> {
            let size = filter.lines().next().unwrap_or_default().to_string();
            self.calls.push(format!("conv {} [{}]", input, size));
            Ok(self.fresh("hpf"))
        }

        fn resample_bilinear(&mut self, input: &String) -> HpfaResult<String> {
            self.calls.push(format!("resample {}", input));
            Ok(self.fresh("up"))
        }

        fn weighted_sum(&mut self, a: &String, b: &String, scalar: f64) -> HpfaResult<String> {
            self.calls.push(format!("sum {} {} {}", a, b, scalar));
            Ok(self.fresh("fused"))
        }

        fn linear_rescale(&mut self, raster: &String, _: f64, _: f64, _: f64, _: f64) -> HpfaResult<String> {
            self.calls.push(format!("rescale {}", raster));
            Ok(self.fresh("matched"))
        }
    }

    #[test]
    fn test_single_pass_call_order() {
        let mut ops = Recorder { hpf_std: 5.0, ..Default::default() };
        let plan = FusionPlan::resolve(&FusionOptions::default(), 2.0).unwrap();
        let out = fuse_band(&mut ops, &plan, &"pan".to_string(), &"b1".to_string()).unwrap();

        assert_eq!(
            ops.calls,
            [
                "std b1",
                "resample b1",
                "conv pan [MATRIX    5]",
                "std hpf2",
                "sum up1 hpf2 0.5",
            ]
        );
        assert_eq!(out.output, "fused3");
        assert_eq!(out.weights.len(), 1);
        // 10 / 5 * 0.25
        assert_relative_eq!(out.weights[0], 0.5);
        assert!(out.rescale.is_none());
    }

    #[test]
    fn test_two_pass_and_histogram_match() {
        let mut ops = Recorder { hpf_std: 4.0, ..Default::default() };
        let opts = FusionOptions {
            two_pass: true,
            histogram_match: true,
            ..FusionOptions::default()
        };
        let plan = FusionPlan::resolve(&opts, 8.0).unwrap();
        let out = fuse_band(&mut ops, &plan, &"pan".to_string(), &"b1".to_string()).unwrap();

        assert_eq!(out.weights.len(), 2);
        // 13x13 Mid: 1.00, second pass Mid: 0.35
        assert_relative_eq!(out.weights[0], 2.5);
        assert_relative_eq!(out.weights[1], 0.875);

        let convs: Vec<_> = ops.calls.iter().filter(|c| c.starts_with("conv")).collect();
        assert_eq!(convs, ["conv pan [MATRIX    13]", "conv pan [MATRIX    5]"]);
        assert!(ops.calls.last().unwrap().starts_with("rescale fused"));
        assert!(out.output.starts_with("matched"));

        let rescale = out.rescale.unwrap();
        assert_eq!(rescale.reference_std, 10.0);
        assert_eq!(rescale.reference_mean, 100.0);
    }

    #[test]
    fn test_zero_variance_high_pass_fails() {
        let mut ops = Recorder::default();
        let plan = FusionPlan::resolve(&FusionOptions::default(), 2.0).unwrap();
        let err = fuse_band(&mut ops, &plan, &"pan".to_string(), &"b1".to_string()).unwrap_err();
        assert!(matches!(err, HpfaError::DivisionByZero(_)));
    }

    #[test]
    fn test_multiple_bands_are_independent() {
        let mut ops = Recorder { hpf_std: 5.0, ..Default::default() };
        let plan = FusionPlan::resolve(&FusionOptions::default(), 2.0).unwrap();
        let bands: Vec<String> = ["red", "green", "blue"].iter().map(|s| s.to_string()).collect();
        let outs = fuse(&mut ops, &plan, &"pan".to_string(), &bands).unwrap();
        assert_eq!(outs.len(), 3);
        for out in &outs {
            assert_relative_eq!(out.weights[0], 0.5);
        }
        assert_eq!(ops.calls.iter().filter(|c| c.starts_with("resample")).count(), 3);
    }
}
