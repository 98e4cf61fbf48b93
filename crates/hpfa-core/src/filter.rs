//! Filter specification text.
//!
//! The convolution collaborator consumes a plain-text matrix filter:
//!
//! ```text
//! MATRIX    5
//! -1 -1 -1 -1 -1
//! -1 -1 -1 -1 -1
//! -1 -1 24 -1 -1
//! -1 -1 -1 -1 -1
//! -1 -1 -1 -1 -1
//! DIVISOR   1
//! TYPE      P
//! ```
//!
//! Labels are left-aligned to a fixed column. Consumers may depend on the
//! alignment, so [`serialize`] output is byte-stable.
//!
//! # Example
//!
//! ```rust
//! use hpfa_core::filter::{FilterSpec, FilterType};
//! use hpfa_core::kernel::Kernel;
//!
//! let spec = FilterSpec::new(Kernel::build(5, 24).unwrap());
//! let text = spec.serialize();
//! assert!(text.starts_with("MATRIX    5\n"));
//!
//! let back = FilterSpec::parse(&text).unwrap();
//! assert_eq!(back, spec);
//! assert_eq!(back.filter_type, FilterType::Parallel);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use tracing::{debug, trace};

use crate::kernel::{Kernel, SURROUND};
use crate::{HpfaError, HpfaResult};

/// Column at which values start after a label.
const LABEL_WIDTH: usize = 10;

/// How the consumer applies the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterType {
    /// Every cell is computed from the unfiltered input (`P`).
    #[default]
    #[serde(rename = "P")]
    Parallel,
    /// Cells see already-filtered neighbours (`S`).
    #[serde(rename = "S")]
    Sequential,
}

impl FilterType {
    /// Single-letter tag.
    pub fn tag(&self) -> &'static str {
        match self {
            FilterType::Parallel => "P",
            FilterType::Sequential => "S",
        }
    }

    /// Parses a tag, ignoring case.
    pub fn parse(tag: &str) -> HpfaResult<Self> {
        match tag.trim().to_uppercase().as_str() {
            "P" => Ok(FilterType::Parallel),
            "S" => Ok(FilterType::Sequential),
            other => Err(HpfaError::MalformedFilter(format!(
                "unknown filter type '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Kernel plus divisor and type, ready to serialize.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    /// High-pass kernel.
    pub kernel: Kernel,
    /// Divisor applied to the weighted sum.
    pub divisor: f64,
    /// Application type.
    pub filter_type: FilterType,
}

impl FilterSpec {
    /// Wraps `kernel` with divisor 1 and type `P`.
    pub fn new(kernel: Kernel) -> Self {
        Self {
            kernel,
            divisor: 1.0,
            filter_type: FilterType::Parallel,
        }
    }

    /// Copy with a different divisor.
    pub fn with_divisor(self, divisor: f64) -> Self {
        Self { divisor, ..self }
    }

    /// Copy with a different type.
    pub fn with_type(self, filter_type: FilterType) -> Self {
        Self { filter_type, ..self }
    }

    /// Kernel size.
    #[inline]
    pub fn size(&self) -> usize {
        self.kernel.size()
    }

    /// Filter text, lines joined by `\n`, no trailing newline.
    pub fn serialize(&self) -> String {
        self.to_string()
    }

    /// Parses filter text produced by [`serialize`](Self::serialize).
    ///
    /// Blank lines and surrounding whitespace are ignored. A missing
    /// `DIVISOR` defaults to 1 and a missing `TYPE` to `P`.
    pub fn parse(text: &str) -> HpfaResult<Self> {
        let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

        let header = lines
            .next()
            .ok_or_else(|| HpfaError::MalformedFilter("empty filter".into()))?;
        let size: usize = labelled(header, "MATRIX")?
            .parse()
            .map_err(|_| HpfaError::MalformedFilter(format!("bad matrix size in '{}'", header)))?;

        // Invalid sizes fail before any row is read
        let mid = Kernel::build(size, 0)?.mid();
        let mut center = SURROUND;

        for row in 0..size {
            let line = lines.next().ok_or_else(|| {
                HpfaError::MalformedFilter(format!("expected {} rows, found {}", size, row))
            })?;
            let values = line
                .split_whitespace()
                .map(|tok| {
                    tok.parse::<i32>().map_err(|_| {
                        HpfaError::MalformedFilter(format!("bad cell '{}' in row {}", tok, row + 1))
                    })
                })
                .collect::<HpfaResult<Vec<i32>>>()?;
            if values.len() != size {
                return Err(HpfaError::MalformedFilter(format!(
                    "row {} has {} values, expected {}",
                    row + 1,
                    values.len(),
                    size
                )));
            }
            for (col, &v) in values.iter().enumerate() {
                if row == mid && col == mid {
                    center = v;
                } else if v != SURROUND {
                    return Err(HpfaError::MalformedFilter(format!(
                        "cell ({}, {}) is {}, expected {}",
                        row + 1,
                        col + 1,
                        v,
                        SURROUND
                    )));
                }
            }
        }

        let mut spec = FilterSpec::new(Kernel::build(size, center)?);
        for line in lines {
            if let Ok(value) = labelled(line, "DIVISOR") {
                spec.divisor = value.parse().map_err(|_| {
                    HpfaError::MalformedFilter(format!("bad divisor in '{}'", line))
                })?;
            } else if let Ok(value) = labelled(line, "TYPE") {
                spec.filter_type = FilterType::parse(value)?;
            } else {
                return Err(HpfaError::MalformedFilter(format!("unexpected line '{}'", line)));
            }
        }

        trace!(size, center = spec.kernel.center(), divisor = spec.divisor, "FilterSpec::parse");
        Ok(spec)
    }
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<width$}{}", "MATRIX", self.kernel.size(), width = LABEL_WIDTH)?;
        writeln!(f, "{}", self.kernel.matrix_text())?;
        writeln!(f, "{:<width$}{}", "DIVISOR", self.divisor, width = LABEL_WIDTH)?;
        write!(f, "{:<width$}{}", "TYPE", self.filter_type, width = LABEL_WIDTH)
    }
}

/// Serializes `spec` to filter text.
pub fn serialize(spec: &FilterSpec) -> String {
    spec.serialize()
}

/// Value following `label` on `line`.
fn labelled<'a>(line: &'a str, label: &str) -> HpfaResult<&'a str> {
    let mut parts = line.splitn(2, char::is_whitespace);
    match (parts.next(), parts.next()) {
        (Some(head), Some(value)) if head.eq_ignore_ascii_case(label) => Ok(value.trim()),
        _ => Err(HpfaError::MalformedFilter(format!(
            "expected '{}' line, found '{}'",
            label, line
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPECTED_5: &str = "MATRIX    5
-1 -1 -1 -1 -1
-1 -1 -1 -1 -1
-1 -1 24 -1 -1
-1 -1 -1 -1 -1
-1 -1 -1 -1 -1
DIVISOR   1
TYPE      P";

    #[test]
    fn test_serialize_exact() {
        let spec = FilterSpec::new(Kernel::build(5, 24).unwrap());
        assert_eq!(spec.serialize(), EXPECTED_5);
        assert_eq!(serialize(&spec), spec.serialize());
    }

    #[test]
    fn test_serialize_line_count() {
        let spec = FilterSpec::new(Kernel::build(15, 448).unwrap());
        let text = spec.serialize();
        assert_eq!(text.lines().count(), 15 + 3);
        assert!(text.lines().any(|l| l.contains(" 448 ")));
    }

    #[test]
    fn test_serialize_divisor_and_type() {
        let spec = FilterSpec::new(Kernel::build(7, 56).unwrap())
            .with_divisor(2.5)
            .with_type(FilterType::Sequential);
        let text = spec.serialize();
        assert!(text.contains("\nDIVISOR   2.5\n"));
        assert!(text.ends_with("TYPE      S"));
    }

    #[test]
    fn test_parse_roundtrip() {
        let spec = FilterSpec::new(Kernel::build(11, 150).unwrap())
            .with_divisor(3.0)
            .with_type(FilterType::Sequential);
        let back = FilterSpec::parse(&spec.serialize()).unwrap();
        assert_eq!(back.size(), 11);
        assert_eq!(back.kernel.center(), 150);
        assert_eq!(back.divisor, 3.0);
        assert_eq!(back.filter_type, FilterType::Sequential);
        assert_eq!(back, spec);
    }

    #[test]
    fn test_parse_is_lenient_with_whitespace() {
        let text = "\n  matrix 5\n-1 -1 -1 -1 -1\n-1 -1 -1 -1 -1\n-1  -1  9  -1 -1\n-1 -1 -1 -1 -1\n-1 -1 -1 -1 -1\n\n";
        let spec = FilterSpec::parse(text).unwrap();
        assert_eq!(spec.kernel.center(), 9);
        assert_eq!(spec.divisor, 1.0);
        assert_eq!(spec.filter_type, FilterType::Parallel);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(FilterSpec::parse(""), Err(HpfaError::MalformedFilter(_))));
        assert!(matches!(FilterSpec::parse("SIZE 5"), Err(HpfaError::MalformedFilter(_))));
        assert!(matches!(FilterSpec::parse("MATRIX 4"), Err(HpfaError::InvalidKernelSize(4))));

        let short = EXPECTED_5.replacen("-1 -1 -1 -1 -1\n", "", 1);
        assert!(FilterSpec::parse(&short).is_err());

        let bad_cell = EXPECTED_5.replacen("-1 -1 -1 -1 -1", "-1 -1 0 -1 -1", 1);
        assert!(matches!(FilterSpec::parse(&bad_cell), Err(HpfaError::MalformedFilter(_))));

        let bad_type = EXPECTED_5.replace("TYPE      P", "TYPE      X");
        assert!(matches!(FilterSpec::parse(&bad_type), Err(HpfaError::MalformedFilter(_))));
    }
}
