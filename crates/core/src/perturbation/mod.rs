//! Perturbation engine: variables, classification, error tables and sampling
//!
//! ```
//! use storm_ensemble_core::perturbation::{
//!     intensity_class, sample_errors, Bucket, ErrorSeries, PerturbedVariable,
//! };
//! use storm_ensemble_core::Knots;
//!
//! let bucket = Bucket::Strength(intensity_class(Knots::new(40.0)));
//! let errors = sample_errors(PerturbedVariable::MaxSustainedWindSpeed, bucket, &[0.0, 12.0])
//!     .unwrap();
//! assert_eq!(errors, ErrorSeries::Symmetric(vec![1.45, 4.01]));
//! ```

pub mod classification;
pub mod error_tables;
pub mod sampler;
pub mod variables;

pub use classification::{bucket_for, intensity_class, size_class, Bucket, SizeClass, StrengthClass};
pub use error_tables::{lookup, AnchorTable, ErrorMagnitudes, SIZE_ANCHORS, STRENGTH_ANCHORS};
pub use sampler::{
    apply_perturbation, draw_alpha, interpolate, perturb, perturb_with_alpha, sample_errors,
    ErrorSeries, MEAN_ABSOLUTE_NORMAL,
};
pub use variables::{ClassificationKind, DistributionKind, PerturbedVariable};
