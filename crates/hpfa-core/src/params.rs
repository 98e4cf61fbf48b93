//! Center-cell and modulation-factor lookup.
//!
//! Both values depend on the kernel size chosen for the resolution ratio.
//! The lookup is positional: the kernel size's index in
//! [`FusionTables::kernel_sizes`] selects the column of the level's row.
//!
//! # Levels
//!
//! - [`Level`] - center-cell intensity of the high-pass kernel
//! - [`Modulation`] - crispness of the fused result
//!
//! Input strings are matched case-insensitively and canonicalized here, so
//! nothing downstream deals with spelling variants.
//!
//! # Example
//!
//! ```rust
//! use hpfa_core::{FusionTables, Level, Modulation, Pass};
//!
//! let tables = FusionTables::default();
//! assert_eq!(tables.center_cell(Level::parse("MID").unwrap(), 7).unwrap(), 56);
//! assert_eq!(tables.modulation_factor(Modulation::Max, 11, Pass::First).unwrap(), 1.0);
//! assert_eq!(tables.modulation_factor(Modulation::Max, 11, Pass::Second).unwrap(), 0.5);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use tracing::{debug, trace};

use crate::tables::FusionTables;
use crate::{HpfaError, HpfaResult};

/// Center-cell level of the high-pass kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Level {
    /// Lowest center value, `size^2 - 1` for small kernels.
    #[default]
    Low,
    /// Intermediate center value.
    Mid,
    /// Strongest center value.
    High,
}

impl Level {
    /// All levels in table order.
    pub const ALL: [Level; 3] = [Level::Low, Level::Mid, Level::High];

    /// Parses a level name, ignoring case.
    ///
    /// `default` is accepted as a historical alias of `Low`.
    pub fn parse(name: &str) -> HpfaResult<Self> {
        match name.trim().to_lowercase().as_str() {
            "low" | "default" => Ok(Level::Low),
            "mid" => Ok(Level::Mid),
            "high" => Ok(Level::High),
            _ => Err(HpfaError::UnknownLevel(name.to_string())),
        }
    }

    /// Canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Low => "Low",
            Level::Mid => "Mid",
            Level::High => "High",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Level {
    type Error = HpfaError;

    fn try_from(value: String) -> HpfaResult<Self> {
        Level::parse(&value)
    }
}

impl From<Level> for &'static str {
    fn from(level: Level) -> Self {
        level.as_str()
    }
}

/// Modulation (crispness) level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Modulation {
    /// Softest result.
    Min,
    /// Balanced result.
    #[default]
    Mid,
    /// Crispest result.
    Max,
}

impl Modulation {
    /// All modulation levels in table order.
    pub const ALL: [Modulation; 3] = [Modulation::Min, Modulation::Mid, Modulation::Max];

    /// Parses a modulation name, ignoring case.
    ///
    /// `default` is accepted as a historical alias of `Mid`.
    pub fn parse(name: &str) -> HpfaResult<Self> {
        match name.trim().to_lowercase().as_str() {
            "min" => Ok(Modulation::Min),
            "mid" | "default" => Ok(Modulation::Mid),
            "max" => Ok(Modulation::Max),
            _ => Err(HpfaError::UnknownModulation(name.to_string())),
        }
    }

    /// Canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Modulation::Min => "Min",
            Modulation::Mid => "Mid",
            Modulation::Max => "Max",
        }
    }
}

impl fmt::Display for Modulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Modulation {
    type Error = HpfaError;

    fn try_from(value: String) -> HpfaResult<Self> {
        Modulation::parse(&value)
    }
}

impl From<Modulation> for &'static str {
    fn from(modulation: Modulation) -> Self {
        modulation.as_str()
    }
}

/// Fusion pass number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pass {
    /// Mandatory pass with a ratio-dependent kernel.
    First,
    /// Optional pass with the fixed small kernel.
    Second,
}

impl Pass {
    /// Pass number, 1 or 2.
    #[inline]
    pub fn number(&self) -> u8 {
        match self {
            Pass::First => 1,
            Pass::Second => 2,
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

impl FusionTables {
    /// Position of `kernel_size` in the kernel-size table.
    fn kernel_index(&self, kernel_size: usize) -> HpfaResult<usize> {
        self.kernel_sizes
            .iter()
            .position(|&k| k == kernel_size)
            .ok_or(HpfaError::UnknownKernelSize(kernel_size))
    }

    /// Center-cell value for `level` at `kernel_size`.
    pub fn center_cell(&self, level: Level, kernel_size: usize) -> HpfaResult<i32> {
        let idx = self.kernel_index(kernel_size)?;
        let row = self.center_cells.get(level);
        let center = row
            .get(idx)
            .copied()
            .ok_or(HpfaError::UnknownKernelSize(kernel_size))?;
        trace!(%level, kernel_size, center, "center_cell");
        Ok(center)
    }

    /// Modulation factor for `modulation` at `kernel_size`.
    ///
    /// The second pass ignores `kernel_size` and returns the fixed scalar.
    pub fn modulation_factor(
        &self,
        modulation: Modulation,
        kernel_size: usize,
        pass: Pass,
    ) -> HpfaResult<f64> {
        let factor = match pass {
            Pass::First => {
                let idx = self.kernel_index(kernel_size)?;
                self.modulators
                    .get(modulation)
                    .get(idx)
                    .copied()
                    .ok_or(HpfaError::UnknownKernelSize(kernel_size))?
            }
            Pass::Second => *self.second_pass_modulators.get(modulation),
        };
        trace!(%modulation, kernel_size, %pass, factor, "modulation_factor");
        Ok(factor)
    }
}

/// Center-cell value from the canonical tables.
pub fn center_cell(level: Level, kernel_size: usize) -> HpfaResult<i32> {
    FusionTables::canonical().center_cell(level, kernel_size)
}

/// Modulation factor from the canonical tables.
pub fn modulation_factor(modulation: Modulation, kernel_size: usize, pass: Pass) -> HpfaResult<f64> {
    FusionTables::canonical().modulation_factor(modulation, kernel_size, pass)
}
