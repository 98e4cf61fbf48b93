//! High-pass convolution kernels.
//!
//! An HPFA kernel is an odd `N x N` matrix of `-1` with a single positive
//! center cell. Convolving the panchromatic image with it keeps only the
//! high-frequency detail that gets added back into the multispectral bands.
//!
//! ```text
//! -1 -1 -1 -1 -1
//! -1 -1 -1 -1 -1
//! -1 -1 24 -1 -1
//! -1 -1 -1 -1 -1
//! -1 -1 -1 -1 -1
//! ```
//!
//! # Example
//!
//! ```rust
//! use hpfa_core::kernel::Kernel;
//!
//! let k = Kernel::build(5, 24).unwrap();
//! assert_eq!(k.size(), 5);
//! assert_eq!(k.center(), 24);
//! assert_eq!(k.cell(2, 2), Some(24));
//! assert_eq!(k.row_text(0), "-1 -1 -1 -1 -1");
//! ```

use crate::{HpfaError, HpfaResult};
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Smallest kernel size.
pub const MIN_KERNEL_SIZE: usize = 5;
/// Largest kernel size.
pub const MAX_KERNEL_SIZE: usize = 15;
/// Value of every non-center cell.
pub const SURROUND: i32 = -1;

/// Square high-pass kernel.
///
/// Only [`Kernel::build`] creates kernels, so the center value lives in
/// exactly one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kernel {
    size: usize,
    data: Vec<i32>,
}

impl Kernel {
    /// Builds a kernel of `size` with `center` in the middle cell.
    ///
    /// `size` must be odd and within `5..=15`.
    pub fn build(size: usize, center: i32) -> HpfaResult<Self> {
        if size % 2 == 0 || !(MIN_KERNEL_SIZE..=MAX_KERNEL_SIZE).contains(&size) {
            return Err(HpfaError::InvalidKernelSize(size));
        }
        trace!(size, center, "Kernel::build");

        let mid = size / 2;
        let mut data = vec![SURROUND; size * size];
        data[mid * size + mid] = center;

        Ok(Self { size, data })
    }

    /// Kernel width and height (odd).
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Center cell value.
    #[inline]
    pub fn center(&self) -> i32 {
        let mid = self.mid();
        self.data[mid * self.size + mid]
    }

    /// Row-major cells, `size * size` entries.
    #[inline]
    pub fn data(&self) -> &[i32] {
        &self.data
    }

    /// Index of the middle row and column.
    #[inline]
    pub fn mid(&self) -> usize {
        self.size / 2
    }

    /// Value at `(row, col)`, `None` outside the matrix.
    #[inline]
    pub fn cell(&self, row: usize, col: usize) -> Option<i32> {
        if row < self.size && col < self.size {
            Some(self.data[row * self.size + col])
        } else {
            None
        }
    }

    /// Cells of one row, `None` past the last row.
    #[inline]
    pub fn row(&self, row: usize) -> Option<&[i32]> {
        self.data.chunks(self.size).nth(row)
    }

    /// Rows top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[i32]> {
        self.data.chunks(self.size)
    }

    /// One row as space-separated tokens, no trailing whitespace.
    ///
    /// Empty past the last row.
    pub fn row_text(&self, row: usize) -> String {
        self.row(row).map(join_tokens).unwrap_or_default()
    }

    /// All rows, one per line, no trailing newline.
    pub fn matrix_text(&self) -> String {
        self.rows().map(join_tokens).collect::<Vec<_>>().join("\n")
    }

    /// Sum of all cells. Zero means the kernel removes the mean exactly.
    pub fn sum(&self) -> i64 {
        self.data.iter().map(|&v| v as i64).sum()
    }

    /// Cells as floats, for convolution.
    pub fn weights(&self) -> Vec<f32> {
        self.data.iter().map(|&v| v as f32).collect()
    }
}

fn join_tokens(row: &[i32]) -> String {
    row.iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_shape() {
        for size in (MIN_KERNEL_SIZE..=MAX_KERNEL_SIZE).step_by(2) {
            let k = Kernel::build(size, 99).unwrap();
            assert_eq!(k.data().len(), size * size);
            assert_eq!(k.rows().count(), size);
            assert!(k.rows().all(|r| r.len() == size));

            let centers = k.data().iter().filter(|&&v| v == 99).count();
            let surround = k.data().iter().filter(|&&v| v == SURROUND).count();
            assert_eq!(centers, 1);
            assert_eq!(surround, size * size - 1);
            assert_eq!(k.cell(size / 2, size / 2), Some(99));
            assert_eq!(k.center(), 99);
        }
    }

    #[test]
    fn test_build_rejects_bad_sizes() {
        for size in [0, 3, 4, 6, 14, 16, 17] {
            assert!(matches!(Kernel::build(size, 24), Err(HpfaError::InvalidKernelSize(s)) if s == size));
        }
    }

    #[test]
    fn test_rotation_symmetry() {
        let k = Kernel::build(9, 80).unwrap();
        let n = k.size();
        for r in 0..n {
            for c in 0..n {
                assert_eq!(k.cell(r, c), k.cell(n - 1 - r, n - 1 - c));
            }
        }
    }

    #[test]
    fn test_text_rows() {
        let k = Kernel::build(5, 24).unwrap();
        let text = k.matrix_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[2], "-1 -1 24 -1 -1");
        for line in &lines {
            assert_eq!(line.trim_end(), *line);
            assert!(!line.is_empty());
        }
        assert!(!text.ends_with('\n'));
    }

    #[test]
    fn test_single_digit_center() {
        let k = Kernel::build(5, 7).unwrap();
        assert_eq!(k.row_text(2), "-1 -1 7 -1 -1");
    }

    #[test]
    fn test_low_level_sum_is_zero() {
        // size^2 - 1 center balances the surround
        let k = Kernel::build(7, 48).unwrap();
        assert_eq!(k.sum(), 0);
    }

    #[test]
    fn test_out_of_bounds_access() {
        let k = Kernel::build(5, 24).unwrap();
        assert_eq!(k.cell(4, 4), Some(-1));
        assert_eq!(k.cell(5, 0), None);
        assert_eq!(k.cell(0, 5), None);
        assert_eq!(k.row(4).map(<[i32]>::len), Some(5));
        assert!(k.row(5).is_none());
        assert_eq!(k.row_text(9), "");
    }
}
