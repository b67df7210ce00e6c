//! Ensemble orchestration
//!
//! [`EnsembleGenerator`] prepares everything that is shared across members
//! once (Holland B, validation times, initial strength and size classes) and
//! then fans members out across the rayon thread pool. Each member owns a
//! deep copy of the base track and its own seeded RNG, so members never share
//! mutable state and a fixed seed reproduces the same ensemble regardless of
//! thread scheduling.
//!
//! Output layout:
//! - `original` is the unperturbed base track, written before any member
//! - `central_pressure`, when a scale is configured, is the base track with
//!   central pressure multiplied by the scale and wind rebalanced through the
//!   base Holland B
//! - per-variable mode writes `{variable}_{m}` for `m` in `1..=members`
//! - joint mode writes `joint_{m}`, perturbing every variable in each member

pub mod config;
pub mod report;

pub use config::{EnsembleConfig, EnsembleMode};
pub use report::{EnsembleReport, MemberOutput, ReportError, ScaledOutput};

use crate::core_types::{Knots, NauticalMiles, Track, TrackField};
use crate::error::{ConfigurationError, EnsembleError};
use crate::io::TrackWriter;
use crate::perturbation::{
    bucket_for, intensity_class, perturb, perturb_with_alpha, sample_errors, size_class, Bucket,
    ErrorSeries, PerturbedVariable, SizeClass, StrengthClass,
};
use crate::physics::{
    compute_holland_b, compute_initial, compute_pc_from_vmax, compute_vmax_from_pc,
    compute_vt_hours,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, info};

/// Name of the unperturbed baseline output
pub const ORIGINAL_NAME: &str = "original";

/// Name of the scaled central pressure output
pub const CENTRAL_PRESSURE_NAME: &str = "central_pressure";

/// Resolved error model for one variable on one track
#[derive(Debug, Clone, PartialEq)]
pub struct VariablePlan {
    /// Variable being perturbed
    pub variable: PerturbedVariable,
    /// Track field it writes
    pub field: TrackField,
    /// Table bucket chosen from the initial conditions
    pub bucket: Bucket,
    /// Error magnitudes at the track's validation times
    pub errors: ErrorSeries,
}

/// One output track to produce
struct MemberJob<'p> {
    name: String,
    member: usize,
    plans: Vec<&'p VariablePlan>,
}

/// Generates perturbed copies of a base track
#[derive(Debug)]
pub struct EnsembleGenerator<'a> {
    base: &'a Track,
    holland_b: Vec<f64>,
    vt_hours: Vec<f64>,
    strength: StrengthClass,
    size: SizeClass,
}

impl<'a> EnsembleGenerator<'a> {
    /// Derive the shared quantities for `base`
    ///
    /// # Errors
    /// Returns [`EnsembleError::PhysicalConsistency`] if any record's central
    /// pressure is not below its background pressure
    pub fn new(base: &'a Track) -> Result<Self, EnsembleError> {
        let holland_b = compute_holland_b(base)?;
        let vt_hours = compute_vt_hours(base);
        let strength = intensity_class(Knots::new(compute_initial(
            base,
            TrackField::MaxSustainedWindSpeed,
        )));
        let size = size_class(NauticalMiles::new(compute_initial(
            base,
            TrackField::RadiusOfMaximumWinds,
        )));

        info!(
            "Prepared {} {:02} {}: {} records over {:.0} h, strength {}, size {}",
            base.storm().basin,
            base.storm().number,
            base.storm().name,
            base.len(),
            vt_hours.last().copied().unwrap_or(0.0),
            strength.label(),
            size.label()
        );

        Ok(Self {
            base,
            holland_b,
            vt_hours,
            strength,
            size,
        })
    }

    /// Unperturbed track
    pub fn base(&self) -> &Track {
        self.base
    }

    /// Holland B of the unperturbed track, one per record
    pub fn holland_b(&self) -> &[f64] {
        &self.holland_b
    }

    /// Hours since the first record
    pub fn vt_hours(&self) -> &[f64] {
        &self.vt_hours
    }

    /// Strength class of the first record
    pub fn strength(&self) -> StrengthClass {
        self.strength
    }

    /// Size class of the first record
    pub fn size(&self) -> SizeClass {
        self.size
    }

    /// Resolve the error model of `variable` for this track
    ///
    /// # Errors
    /// Returns [`ConfigurationError::MissingErrorModel`] for variables without
    /// a forecast error table
    pub fn plan(&self, variable: PerturbedVariable) -> Result<VariablePlan, EnsembleError> {
        let bucket = bucket_for(variable, self.strength, self.size);
        let errors = sample_errors(variable, bucket, &self.vt_hours)?;
        let field = variable
            .field()
            .ok_or(ConfigurationError::MissingErrorModel(variable))?;
        debug!("{variable}: bucket {bucket}, {} error values", errors.len());
        Ok(VariablePlan {
            variable,
            field,
            bucket,
            errors,
        })
    }

    /// Build one member from explicit factors
    ///
    /// Each variable is perturbed from the base series and clamped to its
    /// bounds. A perturbed wind speed also rewrites central pressure through
    /// the base track's Holland B and background pressure.
    ///
    /// # Errors
    /// Returns a configuration error if a plan does not line up with the track
    pub fn perturb_member(&self, draws: &[(&VariablePlan, f64)]) -> Result<Track, EnsembleError> {
        let mut track = self.base.clone();
        for &(plan, alpha) in draws {
            let perturbed = perturb_with_alpha(
                &self.base.series(plan.field),
                plan.variable,
                &plan.errors,
                alpha,
            )?;
            self.store(&mut track, plan.field, &perturbed)?;
        }
        Ok(track)
    }

    /// Base track with central pressure multiplied by `scale`
    ///
    /// Wind speed follows from the scaled pressure through the base track's
    /// Holland B and each record's background pressure. Wind is not clamped.
    ///
    /// # Errors
    /// Returns [`EnsembleError::PhysicalConsistency`] for the first record
    /// whose scaled central pressure is not below its background pressure
    pub fn scale_central_pressure(&self, scale: f64) -> Result<Track, EnsembleError> {
        let background = self.base.series(TrackField::BackgroundPressure);
        let central: Vec<f64> = self
            .base
            .series(TrackField::CentralPressure)
            .iter()
            .map(|pc| pc * scale)
            .collect();

        for (index, (&pc, &pb)) in central.iter().zip(&background).enumerate() {
            if pc >= pb {
                return Err(EnsembleError::PhysicalConsistency {
                    record: index,
                    time: self.base.records()[index].time,
                    central_pressure: pc,
                    background_pressure: pb,
                });
            }
        }

        let wind = compute_vmax_from_pc(&central, &self.holland_b, &background)?;
        let mut track = self.base.clone();
        track.set_series(TrackField::CentralPressure, &central)?;
        track.set_series(TrackField::MaxSustainedWindSpeed, &wind)?;
        Ok(track)
    }

    /// Write a perturbed series into `track`, rebalancing central pressure
    /// when the series is wind speed
    fn store(
        &self,
        track: &mut Track,
        field: TrackField,
        perturbed: &[f64],
    ) -> Result<(), EnsembleError> {
        track.set_series(field, perturbed)?;
        if field == TrackField::MaxSustainedWindSpeed {
            let central_pressure = compute_pc_from_vmax(
                perturbed,
                &self.holland_b,
                &self.base.series(TrackField::BackgroundPressure),
            )?;
            track.set_series(TrackField::CentralPressure, &central_pressure)?;
        }
        Ok(())
    }

    /// Generate and write a full ensemble
    ///
    /// Every requested variable is resolved and the scaled central pressure
    /// track, if any, is built before anything is written, so a bad request
    /// leaves the writer untouched. The baseline is written next, then the
    /// scaled track, then members in parallel. The first failing member
    /// aborts the run.
    ///
    /// # Errors
    /// - configuration errors for invalid requests or variables without an
    ///   error model
    /// - [`EnsembleError::Member`] wrapping the first member failure, or a
    ///   scaled central pressure that reaches background pressure
    pub fn run<W: TrackWriter + ?Sized>(
        &self,
        config: &EnsembleConfig,
        writer: &W,
    ) -> Result<EnsembleReport, EnsembleError> {
        let config = config.validated()?;
        let plans = config
            .variables
            .iter()
            .map(|&variable| self.plan(variable))
            .collect::<Result<Vec<_>, _>>()?;
        let scaled = config
            .central_pressure_scale
            .map(|scale| {
                self.scale_central_pressure(scale)
                    .map(|track| (track, scale))
                    .map_err(|e| e.in_member(CENTRAL_PRESSURE_NAME))
            })
            .transpose()?;
        let seed = config.seed.unwrap_or_else(|| rand::rng().random());

        writer.write(self.base, ORIGINAL_NAME)?;
        let central_pressure = match scaled {
            Some((track, scale)) => {
                writer
                    .write(&track, CENTRAL_PRESSURE_NAME)
                    .map_err(|e| EnsembleError::from(e).in_member(CENTRAL_PRESSURE_NAME))?;
                info!("Wrote {CENTRAL_PRESSURE_NAME} with central pressure scaled by {scale}");
                Some(ScaledOutput {
                    name: CENTRAL_PRESSURE_NAME.to_string(),
                    scale,
                })
            }
            None => None,
        };

        let jobs = member_jobs(&plans, config.members, config.mode);
        info!(
            "Generating {} members ({:?}, seed {seed}) into .{} outputs",
            jobs.len(),
            config.mode,
            writer.extension()
        );

        let outputs = jobs
            .par_iter()
            .map(|job| self.run_member(job, seed, writer))
            .collect::<Result<Vec<_>, _>>()?;

        info!("Wrote {} members plus {ORIGINAL_NAME}", outputs.len());

        let storm = self.base.storm();
        Ok(EnsembleReport {
            storm: format!("{}{:02} {}", storm.basin, storm.number, storm.name),
            seed,
            mode: config.mode,
            strength: self.strength,
            size: self.size,
            original: ORIGINAL_NAME.to_string(),
            central_pressure,
            outputs,
        })
    }

    fn run_member<W: TrackWriter + ?Sized>(
        &self,
        job: &MemberJob<'_>,
        seed: u64,
        writer: &W,
    ) -> Result<MemberOutput, EnsembleError> {
        let in_job = |e: EnsembleError| e.in_member(job.name.as_str());
        let mut track = self.base.clone();
        let mut perturbations = Vec::with_capacity(job.plans.len());
        for &plan in &job.plans {
            let mut rng = ChaCha8Rng::seed_from_u64(member_seed(seed, plan.variable, job.member));
            let (perturbed, alpha) = perturb(
                &self.base.series(plan.field),
                plan.variable,
                &plan.errors,
                &mut rng,
            )
            .map_err(in_job)?;
            self.store(&mut track, plan.field, &perturbed).map_err(in_job)?;
            perturbations.push((plan.variable, alpha));
        }

        writer
            .write(&track, &job.name)
            .map_err(|e| in_job(EnsembleError::from(e)))?;
        debug!("Wrote {}", job.name);

        Ok(MemberOutput {
            name: job.name.clone(),
            member: job.member,
            perturbations,
        })
    }
}

fn member_jobs(plans: &[VariablePlan], members: usize, mode: EnsembleMode) -> Vec<MemberJob<'_>> {
    match mode {
        EnsembleMode::PerVariable => plans
            .iter()
            .flat_map(|plan| {
                (1..=members).map(move |member| MemberJob {
                    name: format!("{}_{member}", plan.variable),
                    member,
                    plans: vec![plan],
                })
            })
            .collect(),
        EnsembleMode::Joint => (1..=members)
            .map(|member| MemberJob {
                name: format!("joint_{member}"),
                member,
                plans: plans.iter().collect(),
            })
            .collect(),
    }
}

/// RNG seed for one variable of one member
///
/// SplitMix64 finalizer over the base seed, the variable's stream and the
/// member index, so neighbouring seeds and members give unrelated streams.
fn member_seed(seed: u64, variable: PerturbedVariable, member: usize) -> u64 {
    let mut z = seed
        ^ variable.stream_id().wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (member as u64).wrapping_mul(0xD1B5_4A32_D192_ED03);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
