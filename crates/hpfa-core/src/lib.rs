//! # hpfa-core
//!
//! Parameters and kernels for High-Pass Filter Additive (HPFA) image fusion.
//!
//! HPFA sharpens a low-resolution multispectral image with a high-resolution
//! panchromatic one: the panchromatic image is high-pass filtered, weighted,
//! and added to each upsampled multispectral band. Everything that depends
//! on the resolution ratio is resolved here.
//!
//! # Modules
//!
//! - [`tables`] - Pinned ratio ranges, kernel sizes, center cells, modulators
//! - [`ratio`] - Resolution ratio to kernel size
//! - [`params`] - Center-cell and modulation-factor lookup
//! - [`kernel`] - High-pass kernel matrices
//! - [`filter`] - Filter specification text
//! - [`weight`] - Blend weights and histogram matching
//! - [`plan`] - One- or two-pass fusion plans
//! - [`raster`] - Raster collaborator trait and the fusion driver
//! - [`config`] - Fusion options and YAML config files
//!
//! # Pipeline
//!
//! ```text
//! ratio -> kernel size -> center / modulator -> kernel -> filter text
//!                                                    \-> weight -> fused
//! ```
//!
//! # Example
//!
//! ```rust
//! use hpfa_core::{FusionOptions, FusionPlan, Level};
//!
//! let opts = FusionOptions { level: Level::Mid, ..FusionOptions::default() };
//! let plan = FusionPlan::resolve(&opts, 4.0).unwrap();
//!
//! let pass = plan.first();
//! assert_eq!(pass.filter.size(), 9);
//! assert_eq!(pass.filter.kernel.center(), 96);
//! assert_eq!(pass.weight(30.0, 15.0).unwrap(), 1.0);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod config;
pub mod filter;
pub mod kernel;
pub mod params;
pub mod plan;
pub mod ratio;
pub mod raster;
pub mod tables;
pub mod weight;

pub use config::{FusionConfig, FusionOptions, SECOND_PASS_MIN_RATIO};
pub use error::{HpfaError, HpfaResult};
pub use filter::{FilterSpec, FilterType};
pub use kernel::Kernel;
pub use params::{Level, Modulation, Pass};
pub use plan::{FusionPass, FusionPlan, PlanState, SecondPassStatus};
pub use raster::{BandOutcome, RasterOps};
pub use tables::FusionTables;
