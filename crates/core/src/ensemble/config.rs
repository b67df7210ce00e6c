//! Ensemble run configuration

use crate::error::ConfigurationError;
use crate::perturbation::PerturbedVariable;
use serde::{Deserialize, Serialize};

/// How requested variables are combined into members
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnsembleMode {
    /// `members` tracks per variable, each perturbing only that variable
    #[default]
    PerVariable,
    /// `members` tracks in total, each perturbing every variable independently
    Joint,
}

/// Parameters of one ensemble run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleConfig {
    /// Number of members (per variable in [`EnsembleMode::PerVariable`])
    pub members: usize,
    /// Variables to perturb, in output order
    pub variables: Vec<PerturbedVariable>,
    /// Base seed; drawn from OS entropy when `None`
    pub seed: Option<u64>,
    /// Member layout
    pub mode: EnsembleMode,
    /// Multiplier for central pressure; when set, a `central_pressure` track is
    /// written with wind rebalanced through Holland B
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub central_pressure_scale: Option<f64>,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            members: 10,
            variables: vec![PerturbedVariable::MaxSustainedWindSpeed],
            seed: None,
            mode: EnsembleMode::PerVariable,
            central_pressure_scale: None,
        }
    }
}

impl EnsembleConfig {
    /// Configuration for `members` members over `variables`
    pub fn new(members: usize, variables: Vec<PerturbedVariable>) -> Self {
        Self {
            members,
            variables,
            ..Self::default()
        }
    }

    /// Fix the base seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the member layout
    pub fn with_mode(mut self, mode: EnsembleMode) -> Self {
        self.mode = mode;
        self
    }

    /// Also write a `central_pressure` track scaled by `scale`
    pub fn with_central_pressure_scale(mut self, scale: f64) -> Self {
        self.central_pressure_scale = Some(scale);
        self
    }

    /// Check the request and drop repeated variables (first occurrence wins)
    ///
    /// An empty variable list is accepted when a central pressure scale is
    /// set, which produces only the baseline and the scaled track.
    ///
    /// # Errors
    /// - [`ConfigurationError::NonPositiveMemberCount`] for zero members
    /// - [`ConfigurationError::InvalidPressureScale`] for a scale that is not
    ///   positive and finite
    /// - [`ConfigurationError::NoVariables`] when there is nothing to produce
    pub fn validated(&self) -> Result<Self, ConfigurationError> {
        if self.members == 0 {
            return Err(ConfigurationError::NonPositiveMemberCount(self.members));
        }
        if let Some(scale) = self.central_pressure_scale {
            if !(scale.is_finite() && scale > 0.0) {
                return Err(ConfigurationError::InvalidPressureScale(scale));
            }
        }
        let mut variables: Vec<PerturbedVariable> = Vec::with_capacity(self.variables.len());
        for &variable in &self.variables {
            if !variables.contains(&variable) {
                variables.push(variable);
            }
        }
        if variables.is_empty() && self.central_pressure_scale.is_none() {
            return Err(ConfigurationError::NoVariables);
        }
        Ok(Self {
            variables,
            ..self.clone()
        })
    }

    /// Total number of perturbed tracks the run writes
    pub fn total_members(&self) -> usize {
        match self.mode {
            EnsembleMode::PerVariable => self.members * self.variables.len(),
            EnsembleMode::Joint if self.variables.is_empty() => 0,
            EnsembleMode::Joint => self.members,
        }
    }
}
