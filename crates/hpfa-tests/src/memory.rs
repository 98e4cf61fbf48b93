//! In-memory raster backend.
//!
//! A small single-band implementation of [`RasterOps`] so the fusion driver
//! can be exercised end to end without a GIS toolkit. Rasters live in a
//! vector and are addressed by index.

use hpfa_core::{FilterSpec, HpfaError, HpfaResult, RasterOps};
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Single-band raster.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    /// Width in cells.
    pub width: usize,
    /// Height in cells.
    pub height: usize,
    /// Row-major cell values.
    pub data: Vec<f32>,
}

impl Raster {
    /// Creates a raster, checking the buffer length.
    pub fn new(width: usize, height: usize, data: Vec<f32>) -> HpfaResult<Self> {
        if width == 0 || height == 0 || data.len() != width * height {
            return Err(HpfaError::Raster(format!(
                "expected {}x{} cells, got {}",
                width,
                height,
                data.len()
            )));
        }
        Ok(Self { width, height, data })
    }

    /// Raster filled by `f(x, y)`.
    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> f32) -> Self {
        let data = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| f(x, y))
            .collect();
        Self { width, height, data }
    }

    /// Mean of all cells.
    pub fn mean(&self) -> f64 {
        self.data.iter().map(|&v| v as f64).sum::<f64>() / self.data.len() as f64
    }

    /// Population standard deviation.
    pub fn std_dev(&self) -> f64 {
        let mean = self.mean();
        let var = self
            .data
            .iter()
            .map(|&v| {
                let d = v as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / self.data.len() as f64;
        var.sqrt()
    }
}

/// Raster store implementing [`RasterOps`].
#[derive(Debug, Default)]
pub struct MemoryRasters {
    rasters: Vec<Raster>,
    target: (usize, usize),
    /// Kernel sizes of every convolution, in call order.
    pub convolutions: Vec<usize>,
}

impl MemoryRasters {
    /// Store whose resampling target is `width x height`.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            rasters: Vec::new(),
            target: (width, height),
            convolutions: Vec::new(),
        }
    }

    /// Adds a raster and returns its id.
    pub fn insert(&mut self, raster: Raster) -> usize {
        self.rasters.push(raster);
        self.rasters.len() - 1
    }

    /// Raster by id.
    pub fn get(&self, id: usize) -> HpfaResult<&Raster> {
        self.rasters
            .get(id)
            .ok_or_else(|| HpfaError::Raster(format!("no raster with id {}", id)))
    }

    fn map(&mut self, id: usize, f: impl Fn(f32) -> f32) -> HpfaResult<usize> {
        let src = self.get(id)?;
        let out = Raster {
            width: src.width,
            height: src.height,
            data: src.data.iter().map(|&v| f(v)).collect(),
        };
        Ok(self.insert(out))
    }
}

impl RasterOps for MemoryRasters {
    type Id = usize;

    fn std_dev(&mut self, raster: &usize) -> HpfaResult<f64> {
        Ok(self.get(*raster)?.std_dev())
    }

    fn mean(&mut self, raster: &usize) -> HpfaResult<f64> {
        Ok(self.get(*raster)?.mean())
    }

    fn apply_convolution(&mut self, input: &usize, filter: &str) -> HpfaResult<usize> {
        let spec = FilterSpec::parse(filter)?;
        let out = convolve(self.get(*input)?, &spec);
        self.convolutions.push(spec.size());
        Ok(self.insert(out))
    }

    fn resample_bilinear(&mut self, input: &usize) -> HpfaResult<usize> {
        let (dst_w, dst_h) = self.target;
        let out = resample_bilinear(self.get(*input)?, dst_w, dst_h);
        Ok(self.insert(out))
    }

    fn weighted_sum(&mut self, a: &usize, b: &usize, scalar: f64) -> HpfaResult<usize> {
        let (ra, rb) = (self.get(*a)?, self.get(*b)?);
        if (ra.width, ra.height) != (rb.width, rb.height) {
            return Err(HpfaError::Raster(format!(
                "size mismatch: {}x{} vs {}x{}",
                ra.width, ra.height, rb.width, rb.height
            )));
        }
        let s = scalar as f32;
        let data = ra.data.iter().zip(&rb.data).map(|(&x, &y)| x + y * s).collect();
        let out = Raster {
            width: ra.width,
            height: ra.height,
            data,
        };
        Ok(self.insert(out))
    }

    fn linear_rescale(
        &mut self,
        raster: &usize,
        old_mean: f64,
        old_std: f64,
        new_mean: f64,
        new_std: f64,
    ) -> HpfaResult<usize> {
        if old_std == 0.0 {
            return Err(HpfaError::DivisionByZero("rescaled raster"));
        }
        self.map(*raster, |v| {
            ((v as f64 - old_mean) / old_std * new_std + new_mean) as f32
        })
    }
}

/// Convolution with edge clamping, honouring the divisor.
fn convolve(src: &Raster, spec: &FilterSpec) -> Raster {
    trace!(width = src.width, height = src.height, size = spec.size(), "convolve");

    let weights = spec.kernel.weights();
    let size = spec.size();
    let r = (size / 2) as isize;
    let inv = if spec.divisor != 0.0 { 1.0 / spec.divisor as f32 } else { 1.0 };
    let (w, h) = (src.width as isize, src.height as isize);

    let mut data = vec![0.0f32; src.data.len()];
    for y in 0..h {
        for x in 0..w {
            let mut sum = 0.0f32;
            for ky in 0..size as isize {
                for kx in 0..size as isize {
                    let sx = (x + kx - r).clamp(0, w - 1) as usize;
                    let sy = (y + ky - r).clamp(0, h - 1) as usize;
                    sum += src.data[sy * src.width + sx] * weights[(ky as usize) * size + kx as usize];
                }
            }
            data[(y * w + x) as usize] = sum * inv;
        }
    }

    Raster {
        width: src.width,
        height: src.height,
        data,
    }
}

/// Separable bilinear resample to `dst_w x dst_h`.
fn resample_bilinear(src: &Raster, dst_w: usize, dst_h: usize) -> Raster {
    let temp = resample_axis(&src.data, src.width, src.height, dst_w, true);
    let data = resample_axis(&temp, dst_w, src.height, dst_h, false);
    Raster {
        width: dst_w,
        height: dst_h,
        data,
    }
}

/// One resampling pass, horizontal or vertical.
fn resample_axis(src: &[f32], w: usize, h: usize, dst_len: usize, horizontal: bool) -> Vec<f32> {
    let src_len = if horizontal { w } else { h };
    let (out_w, out_h) = if horizontal { (dst_len, h) } else { (w, dst_len) };
    let scale = src_len as f32 / dst_len as f32;

    let mut dst = vec![0.0f32; out_w * out_h];
    for i in 0..dst_len {
        // Map destination coordinate to source coordinate
        let center = ((i as f32 + 0.5) * scale - 0.5).clamp(0.0, (src_len - 1) as f32);
        let lo = center.floor() as usize;
        let hi = (lo + 1).min(src_len - 1);
        let t = center - lo as f32;

        let lines = if horizontal { h } else { w };
        for j in 0..lines {
            let (a, b, d) = if horizontal {
                (src[j * w + lo], src[j * w + hi], j * out_w + i)
            } else {
                (src[lo * w + j], src[hi * w + j], i * out_w + j)
            };
            dst[d] = a + (b - a) * t;
        }
    }
    dst
}
