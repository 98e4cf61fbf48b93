//! Pinned numeric tables of the HPFA technique.
//!
//! Kernel size, center value and modulation factor all depend on the
//! resolution ratio. Values follow Gangkofner, Pradhan and Holcomb (2008),
//! "Optimizing the High-Pass Filter Addition Technique for Image Fusion".
//!
//! | ratio range | kernel | Low | Mid | High | Min  | Mid  | Max  |
//! |-------------|--------|-----|-----|------|------|------|------|
//! | [1, 2.5)    | 5      | 24  | 28  | 32   | 0.20 | 0.25 | 0.30 |
//! | [2.5, 3.5)  | 7      | 48  | 56  | 64   | 0.35 | 0.50 | 0.65 |
//! | [3.5, 5.5)  | 9      | 80  | 96  | 106  | 0.35 | 0.50 | 0.65 |
//! | [5.5, 7.5)  | 11     | 120 | 150 | 180  | 0.50 | 0.65 | 1.00 |
//! | [7.5, 9.5)  | 13     | 168 | 210 | 252  | 0.65 | 1.00 | 1.40 |
//! | [9.5, inf)  | 15     | 336 | 392 | 448  | 1.00 | 1.35 | 2.00 |
//!
//! The tables may be replaced from a config file; a replacement must pass
//! [`FusionTables::validate`] before use.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::kernel::{MAX_KERNEL_SIZE, MIN_KERNEL_SIZE};
use crate::params::{Level, Modulation};
use crate::{HpfaError, HpfaResult};

/// Half-open resolution-ratio interval `[low, high)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioRange {
    /// Inclusive lower bound.
    pub low: f64,
    /// Exclusive upper bound, `f64::INFINITY` for the last range.
    pub high: f64,
}

impl RatioRange {
    /// Creates a range.
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// True if `low <= ratio < high`.
    #[inline]
    pub fn contains(&self, ratio: f64) -> bool {
        self.low <= ratio && ratio < self.high
    }
}

/// One value per [`Level`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerLevel<T> {
    /// Value for [`Level::Low`].
    pub low: T,
    /// Value for [`Level::Mid`].
    pub mid: T,
    /// Value for [`Level::High`].
    pub high: T,
}

impl<T> PerLevel<T> {
    /// Value for `level`.
    pub fn get(&self, level: Level) -> &T {
        match level {
            Level::Low => &self.low,
            Level::Mid => &self.mid,
            Level::High => &self.high,
        }
    }
}

/// One value per [`Modulation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerModulation<T> {
    /// Value for [`Modulation::Min`].
    pub min: T,
    /// Value for [`Modulation::Mid`].
    pub mid: T,
    /// Value for [`Modulation::Max`].
    pub max: T,
}

impl<T> PerModulation<T> {
    /// Value for `modulation`.
    pub fn get(&self, modulation: Modulation) -> &T {
        match modulation {
            Modulation::Min => &self.min,
            Modulation::Mid => &self.mid,
            Modulation::Max => &self.max,
        }
    }
}

/// Ratio ranges, kernel sizes and per-size fusion parameters.
///
/// All per-size rows are index-aligned with `kernel_sizes`, which is in turn
/// index-aligned with `ratio_ranges`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionTables {
    /// Contiguous ascending ratio ranges.
    pub ratio_ranges: Vec<RatioRange>,
    /// Odd kernel sizes, one per ratio range.
    pub kernel_sizes: Vec<usize>,
    /// Center-cell values per level, one per kernel size.
    pub center_cells: PerLevel<Vec<i32>>,
    /// First-pass modulation factors, one per kernel size.
    pub modulators: PerModulation<Vec<f64>>,
    /// Second-pass modulation scalars.
    pub second_pass_modulators: PerModulation<f64>,
    /// Kernel size used by the second pass.
    pub second_pass_kernel_size: usize,
}

static CANONICAL: LazyLock<FusionTables> = LazyLock::new(FusionTables::default);

impl Default for FusionTables {
    fn default() -> Self {
        Self {
            ratio_ranges: vec![
                RatioRange::new(1.0, 2.5),
                RatioRange::new(2.5, 3.5),
                RatioRange::new(3.5, 5.5),
                RatioRange::new(5.5, 7.5),
                RatioRange::new(7.5, 9.5),
                RatioRange::new(9.5, f64::INFINITY),
            ],
            kernel_sizes: vec![5, 7, 9, 11, 13, 15],
            center_cells: PerLevel {
                low: vec![24, 48, 80, 120, 168, 336],
                mid: vec![28, 56, 96, 150, 210, 392],
                high: vec![32, 64, 106, 180, 252, 448],
            },
            modulators: PerModulation {
                min: vec![0.20, 0.35, 0.35, 0.50, 0.65, 1.00],
                mid: vec![0.25, 0.50, 0.50, 0.65, 1.00, 1.35],
                max: vec![0.30, 0.65, 0.65, 1.00, 1.40, 2.00],
            },
            second_pass_modulators: PerModulation {
                min: 0.25,
                mid: 0.35,
                max: 0.50,
            },
            second_pass_kernel_size: 5,
        }
    }
}

impl FusionTables {
    /// Shared canonical tables.
    pub fn canonical() -> &'static FusionTables {
        &CANONICAL
    }

    /// Lower bound of the supported ratio domain.
    pub fn min_ratio(&self) -> f64 {
        self.ratio_ranges.first().map_or(f64::INFINITY, |r| r.low)
    }

    /// Checks alignment, ordering and kernel-size constraints.
    pub fn validate(&self) -> HpfaResult<()> {
        let n = self.ratio_ranges.len();
        if n == 0 {
            return Err(HpfaError::InvalidTable("no ratio ranges".into()));
        }

        let rows = [
            ("kernel_sizes", self.kernel_sizes.len()),
            ("center_cells.low", self.center_cells.low.len()),
            ("center_cells.mid", self.center_cells.mid.len()),
            ("center_cells.high", self.center_cells.high.len()),
            ("modulators.min", self.modulators.min.len()),
            ("modulators.mid", self.modulators.mid.len()),
            ("modulators.max", self.modulators.max.len()),
        ];
        for (name, len) in rows {
            if len != n {
                return Err(HpfaError::InvalidTable(format!(
                    "{} has {} entries, expected {}",
                    name, len, n
                )));
            }
        }

        let first = self.ratio_ranges[0];
        if !first.low.is_finite() {
            return Err(HpfaError::InvalidTable(format!(
                "first ratio range must start at a finite value, got {}",
                first.low
            )));
        }
        for (i, range) in self.ratio_ranges.iter().enumerate() {
            if !(range.low < range.high) {
                return Err(HpfaError::InvalidTable(format!(
                    "ratio range {} [{}, {}) is empty",
                    i, range.low, range.high
                )));
            }
            if let Some(next) = self.ratio_ranges.get(i + 1) {
                if range.high != next.low {
                    return Err(HpfaError::InvalidTable(format!(
                        "ratio ranges {} and {} are not contiguous ({} != {})",
                        i,
                        i + 1,
                        range.high,
                        next.low
                    )));
                }
            }
        }
        if self.ratio_ranges[n - 1].high != f64::INFINITY {
            return Err(HpfaError::InvalidTable(
                "last ratio range must be unbounded".into(),
            ));
        }

        for &size in &self.kernel_sizes {
            if size % 2 == 0 || !(MIN_KERNEL_SIZE..=MAX_KERNEL_SIZE).contains(&size) {
                return Err(HpfaError::InvalidTable(format!(
                    "kernel size {} must be odd and within {}..={}",
                    size, MIN_KERNEL_SIZE, MAX_KERNEL_SIZE
                )));
            }
        }
        if self.kernel_sizes.windows(2).any(|w| w[0] >= w[1]) {
            return Err(HpfaError::InvalidTable(
                "kernel sizes must be strictly ascending".into(),
            ));
        }
        if !self.kernel_sizes.contains(&self.second_pass_kernel_size) {
            return Err(HpfaError::InvalidTable(format!(
                "second pass kernel size {} is not in the kernel size table",
                self.second_pass_kernel_size
            )));
        }

        Ok(())
    }
}
