//! Blend weights and histogram matching.
//!
//! The high-pass image is added to the upsampled multispectral band scaled
//! by
//!
//! ```text
//! weight = reference_std / filtered_std * modulation_factor
//! ```
//!
//! so the injected detail carries a variance proportional to the band it
//! lands in. Statistics come from the raster collaborator and are always
//! fresh, nothing here is cached.

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use tracing::{debug, trace};

use crate::{HpfaError, HpfaResult};

/// Weight of the high-pass image in the fused result.
///
/// # Example
///
/// ```rust
/// use hpfa_core::weight::weight;
///
/// assert_eq!(weight(10.0, 5.0, 0.5).unwrap(), 1.0);
/// assert!(weight(10.0, 0.0, 0.5).is_err());
/// ```
pub fn weight(reference_std: f64, filtered_std: f64, modulation_factor: f64) -> HpfaResult<f64> {
    if filtered_std == 0.0 {
        return Err(HpfaError::DivisionByZero("high-pass filtered image"));
    }
    finite("high-pass filtered standard deviation", filtered_std)?;
    finite("reference standard deviation", reference_std)?;
    finite("modulation factor", modulation_factor)?;
    let w = reference_std / filtered_std * modulation_factor;
    trace!(reference_std, filtered_std, modulation_factor, weight = w, "weight");
    Ok(w)
}

/// Linear rescale of a fused raster onto reference statistics.
///
/// `result = (value - fused_mean) / fused_std * reference_std + reference_mean`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearRescale {
    /// Mean of the fused raster.
    pub fused_mean: f64,
    /// Standard deviation of the fused raster.
    pub fused_std: f64,
    /// Mean of the original low-resolution band.
    pub reference_mean: f64,
    /// Standard deviation of the original low-resolution band.
    pub reference_std: f64,
}

impl LinearRescale {
    /// Creates the transform; `fused_std` must be non-zero and every input
    /// finite.
    pub fn new(
        fused_mean: f64,
        fused_std: f64,
        reference_mean: f64,
        reference_std: f64,
    ) -> HpfaResult<Self> {
        if fused_std == 0.0 {
            return Err(HpfaError::DivisionByZero("fused image"));
        }
        finite("fused mean", fused_mean)?;
        finite("fused standard deviation", fused_std)?;
        finite("reference mean", reference_mean)?;
        finite("reference standard deviation", reference_std)?;
        Ok(Self {
            fused_mean,
            fused_std,
            reference_mean,
            reference_std,
        })
    }

    /// Multiplicative term.
    #[inline]
    pub fn gain(&self) -> f64 {
        self.reference_std / self.fused_std
    }

    /// Additive term.
    #[inline]
    pub fn offset(&self) -> f64 {
        self.reference_mean - self.fused_mean * self.gain()
    }

    /// Maps one value.
    #[inline]
    pub fn apply(&self, value: f64) -> f64 {
        (value - self.fused_mean) / self.fused_std * self.reference_std + self.reference_mean
    }
}

fn finite(name: &'static str, value: f64) -> HpfaResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(HpfaError::InvalidStatistic(name))
    }
}

/// Histogram-matches a single value.
pub fn histogram_match(
    value: f64,
    fused_mean: f64,
    fused_std: f64,
    reference_mean: f64,
    reference_std: f64,
) -> HpfaResult<f64> {
    Ok(LinearRescale::new(fused_mean, fused_std, reference_mean, reference_std)?.apply(value))
}
