//! Line-list cascade decay generator.
//!
//! A decay walks an ordered chain of emission lines. Each line advances the
//! decay clock by its fixed `delay` plus, when it has a half-life, an
//! exponentially distributed wait; the line then emits one particle with
//! probability `probability`. The clock advances whether or not the line
//! emits, so a skipped line still delays the lines after it.
//!
//! Configuration keys (per dictionary entry):
//!
//! | key                  | type                   | required |
//! |----------------------|------------------------|----------|
//! | `line_kinds`         | list of species labels | yes      |
//! | `line_energies`      | list of energies       | yes      |
//! | `line_probabilities` | list of reals in [0,1] | yes      |
//! | `line_delays`        | list of times          | no       |
//! | `line_half_lives`    | list of times, `0 s` = prompt | no |

use std::f64::consts::{LN_2, PI};

use hifreq_core::error::{GeneratorError, RandomError};
use hifreq_core::properties::Properties;
use hifreq_core::random::RandomSource;
use hifreq_core::traits::{Component, DecayGenerator};
use hifreq_core::types::{Particle, ParticleKind, PrimaryEvent, Vector3};
use hifreq_core::units::Dimension;
use tracing::debug;

pub const KEY_LINE_KINDS: &str = "line_kinds";
pub const KEY_LINE_ENERGIES: &str = "line_energies";
pub const KEY_LINE_PROBABILITIES: &str = "line_probabilities";
pub const KEY_LINE_DELAYS: &str = "line_delays";
pub const KEY_LINE_HALF_LIVES: &str = "line_half_lives";

/// One step of a decay cascade.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionLine {
    pub kind: ParticleKind,
    /// Kinetic energy in MeV.
    pub kinetic_energy: f64,
    pub probability: f64,
    /// Fixed delay after the previous line, in seconds.
    pub delay: f64,
    /// Half-life of the level feeding this line, in seconds.
    pub half_life: Option<f64>,
}

impl EmissionLine {
    /// A prompt line emitted with certainty.
    pub fn prompt(kind: ParticleKind, kinetic_energy: f64) -> Self {
        Self {
            kind,
            kinetic_energy,
            probability: 1.0,
            delay: 0.0,
            half_life: None,
        }
    }

    pub fn with_probability(mut self, probability: f64) -> Self {
        self.probability = probability;
        self
    }

    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_half_life(mut self, half_life: f64) -> Self {
        self.half_life = Some(half_life);
        self
    }

    fn check(&self) -> Result<(), String> {
        if !(self.kinetic_energy.is_finite() && self.kinetic_energy >= 0.0) {
            return Err(format!("kinetic energy {} MeV must be >= 0", self.kinetic_energy));
        }
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(format!("probability {} outside [0, 1]", self.probability));
        }
        if !(self.delay.is_finite() && self.delay >= 0.0) {
            return Err(format!("delay {} s must be >= 0", self.delay));
        }
        if let Some(h) = self.half_life {
            if !(h.is_finite() && h > 0.0) {
                return Err(format!("half-life {h} s must be > 0"));
            }
        }
        Ok(())
    }
}

/// Uniformly distributed unit vector.
pub fn isotropic_direction(random: &mut RandomSource) -> Result<Vector3, RandomError> {
    let cos_theta = 2.0 * random.uniform()? - 1.0;
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let phi = 2.0 * PI * random.uniform()?;
    Ok(Vector3::new(
        sin_theta * phi.cos(),
        sin_theta * phi.sin(),
        cos_theta,
    ))
}

pub struct CascadeGenerator {
    name: String,
    lines: Vec<EmissionLine>,
    ready: bool,
}

impl CascadeGenerator {
    /// Create an uninitialized generator, to be configured from properties.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lines: Vec::new(),
            ready: false,
        }
    }

    /// Create a ready-to-use generator from explicit lines.
    pub fn with_lines(name: impl Into<String>, lines: Vec<EmissionLine>) -> Result<Self, GeneratorError> {
        let mut generator = Self::new(name);
        generator.install(lines)?;
        Ok(generator)
    }

    pub fn lines(&self) -> &[EmissionLine] {
        &self.lines
    }

    /// Mean number of particles emitted per decay.
    pub fn mean_multiplicity(&self) -> f64 {
        self.lines.iter().map(|l| l.probability).sum()
    }

    fn invalid(&self, reason: String) -> GeneratorError {
        GeneratorError::Invalid {
            name: self.name.clone(),
            reason,
        }
    }

    fn install(&mut self, lines: Vec<EmissionLine>) -> Result<(), GeneratorError> {
        if lines.is_empty() {
            return Err(self.invalid("no emission line".into()));
        }
        for (i, line) in lines.iter().enumerate() {
            line.check().map_err(|reason| self.invalid(format!("line {i}: {reason}")))?;
        }
        self.lines = lines;
        self.ready = true;
        Ok(())
    }

    fn lines_from(&self, config: &Properties) -> Result<Vec<EmissionLine>, GeneratorError> {
        let kinds = config.fetch_string_list(KEY_LINE_KINDS)?;
        let energies = config.fetch_quantity_list(KEY_LINE_ENERGIES, Dimension::Energy)?;
        let probabilities = config.fetch_real_list(KEY_LINE_PROBABILITIES)?;
        let n = kinds.len();
        let delays = if config.has_key(KEY_LINE_DELAYS) {
            config.fetch_quantity_list(KEY_LINE_DELAYS, Dimension::Time)?
        } else {
            vec![0.0; n]
        };
        let half_lives = if config.has_key(KEY_LINE_HALF_LIVES) {
            config.fetch_quantity_list(KEY_LINE_HALF_LIVES, Dimension::Time)?
        } else {
            vec![0.0; n]
        };
        for (key, len) in [
            (KEY_LINE_ENERGIES, energies.len()),
            (KEY_LINE_PROBABILITIES, probabilities.len()),
            (KEY_LINE_DELAYS, delays.len()),
            (KEY_LINE_HALF_LIVES, half_lives.len()),
        ] {
            if len != n {
                return Err(self.invalid(format!("'{key}' has {len} entries, expected {n}")));
            }
        }

        let mut lines = Vec::with_capacity(n);
        for i in 0..n {
            let kind = kinds[i]
                .parse::<ParticleKind>()
                .map_err(|reason| self.invalid(reason))?;
            lines.push(EmissionLine {
                kind,
                kinetic_energy: energies[i],
                probability: probabilities[i],
                delay: delays[i],
                half_life: (half_lives[i] != 0.0).then_some(half_lives[i]),
            });
        }
        Ok(lines)
    }
}

impl Component for CascadeGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_initialized(&self) -> bool {
        self.ready
    }

    fn initialize(&mut self, config: &Properties) -> Result<(), GeneratorError> {
        if self.ready {
            return Err(GeneratorError::AlreadyInitialized(self.name.clone()));
        }
        let lines = self.lines_from(config)?;
        self.install(lines)?;
        debug!(
            generator = %self.name,
            lines = self.lines.len(),
            mean_multiplicity = self.mean_multiplicity(),
            "cascade generator initialized"
        );
        Ok(())
    }

    fn reset(&mut self) {
        self.lines.clear();
        self.ready = false;
    }
}

impl DecayGenerator for CascadeGenerator {
    fn load_next(
        &mut self,
        random: &mut RandomSource,
        compute_classification: bool,
    ) -> Result<PrimaryEvent, GeneratorError> {
        if !self.ready {
            return Err(GeneratorError::NotInitialized(self.name.clone()));
        }
        let mut decay = PrimaryEvent::new(self.name.as_str());
        let mut t = 0.0;
        for line in &self.lines {
            t += line.delay;
            if let Some(half_life) = line.half_life {
                t += random.exponential(half_life / LN_2)?;
            }
            if random.uniform()? < line.probability {
                let direction = isotropic_direction(random)?;
                decay.add_particle(
                    Particle::with_kinetic_energy(line.kind, line.kinetic_energy, direction)
                        .at_time(t),
                );
            }
        }
        if compute_classification {
            decay.compute_classification();
        }
        Ok(decay)
    }
}

impl std::fmt::Debug for CascadeGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CascadeGenerator")
            .field("name", &self.name)
            .field("lines", &self.lines.len())
            .field("ready", &self.ready)
            .finish()
    }
}
