//! Resolution ratio to kernel size.
//!
//! The ratio is the pixel size of the low-resolution (multispectral) image
//! divided by the pixel size of the high-resolution (panchromatic) image.
//! Ranges are closed-low, open-high: a ratio sitting exactly on a boundary
//! belongs to the higher range.
//!
//! # Example
//!
//! ```rust
//! use hpfa_core::ratio::{kernel_size, resolution_ratio};
//!
//! let ratio = resolution_ratio(0.6, 2.4).unwrap();
//! assert_eq!(ratio, 4.0);
//! assert_eq!(kernel_size(ratio).unwrap(), 9);
//! assert_eq!(kernel_size(2.5).unwrap(), 7);
//! ```

#[allow(unused_imports)]
use tracing::{debug, trace};

use crate::tables::FusionTables;
use crate::{HpfaError, HpfaResult};

impl FusionTables {
    /// Kernel size for `ratio`.
    ///
    /// Fails with [`HpfaError::OutOfRange`] below the first range, for NaN
    /// and for infinity.
    pub fn kernel_size(&self, ratio: f64) -> HpfaResult<usize> {
        if !ratio.is_finite() {
            return Err(HpfaError::OutOfRange {
                ratio,
                min: self.min_ratio(),
            });
        }
        let size = self
            .ratio_ranges
            .iter()
            .zip(&self.kernel_sizes)
            .find(|(range, _)| range.contains(ratio))
            .map(|(_, &size)| size)
            .ok_or(HpfaError::OutOfRange {
                ratio,
                min: self.min_ratio(),
            })?;
        trace!(ratio, size, "kernel_size");
        Ok(size)
    }
}

/// Kernel size for `ratio` from the canonical tables.
pub fn kernel_size(ratio: f64) -> HpfaResult<usize> {
    FusionTables::canonical().kernel_size(ratio)
}

/// Ratio of low-resolution to high-resolution pixel size.
pub fn resolution_ratio(high_res: f64, low_res: f64) -> HpfaResult<f64> {
    for (name, res) in [("high resolution", high_res), ("low resolution", low_res)] {
        if !res.is_finite() || res <= 0.0 {
            return Err(HpfaError::InvalidResolution(format!(
                "{} pixel size must be a positive number, got {}",
                name, res
            )));
        }
    }
    let ratio = low_res / high_res;
    debug!(high_res, low_res, ratio, "Derived resolution ratio");
    Ok(ratio)
}
