//! Particles, vertices and output events.
//!
//! A [`Particle`] time is interpreted by its holder: relative to the decay
//! start when it leaves a per-decay generator, absolute while it waits in
//! the stream's pending buffer, and relative to the window start once it is
//! emitted in a [`PrimaryEvent`].

use std::fmt;
use std::ops::{Add, Mul, Sub};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{ALPHA_MASS_MEV, ELECTRON_MASS_MEV, NEUTRON_MASS_MEV, PROTON_MASS_MEV};

/// A 3-vector. Positions are in mm, momenta in MeV/c.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vector3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vector3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vector3 {
    type Output = Self;
    fn mul(self, k: f64) -> Self {
        Self::new(self.x * k, self.y * k, self.z * k)
    }
}

impl fmt::Display for Vector3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Particle species.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParticleKind {
    #[serde(rename = "gamma")]
    Gamma,
    #[serde(rename = "e-")]
    Electron,
    #[serde(rename = "e+")]
    Positron,
    #[serde(rename = "alpha")]
    Alpha,
    #[serde(rename = "neutron")]
    Neutron,
    #[serde(rename = "proton")]
    Proton,
}

impl ParticleKind {
    /// Rest mass in MeV/c².
    pub fn mass(&self) -> f64 {
        match self {
            Self::Gamma => 0.0,
            Self::Electron | Self::Positron => ELECTRON_MASS_MEV,
            Self::Alpha => ALPHA_MASS_MEV,
            Self::Neutron => NEUTRON_MASS_MEV,
            Self::Proton => PROTON_MASS_MEV,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Gamma => "gamma",
            Self::Electron => "e-",
            Self::Positron => "e+",
            Self::Alpha => "alpha",
            Self::Neutron => "neutron",
            Self::Proton => "proton",
        }
    }
}

impl fmt::Display for ParticleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ParticleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gamma" | "g" => Ok(Self::Gamma),
            "e-" | "electron" => Ok(Self::Electron),
            "e+" | "positron" => Ok(Self::Positron),
            "alpha" | "a" => Ok(Self::Alpha),
            "neutron" | "n" => Ok(Self::Neutron),
            "proton" | "p" => Ok(Self::Proton),
            other => Err(format!("unknown particle species '{other}'")),
        }
    }
}

/// One emitted particle.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Particle {
    pub kind: ParticleKind,
    /// Momentum in MeV/c.
    pub momentum: Vector3,
    /// Emission time in seconds; see the module docs for its reference point.
    pub time: f64,
    /// Emission vertex in mm, shared by all particles of one decay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertex: Option<Vector3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_id: Option<u64>,
}

impl Particle {
    /// A particle emitted at time 0 without vertex.
    pub fn new(kind: ParticleKind, momentum: Vector3) -> Self {
        Self {
            kind,
            momentum,
            time: 0.0,
            vertex: None,
            track_id: None,
        }
    }

    /// Build from a kinetic energy (MeV) and a unit direction.
    pub fn with_kinetic_energy(kind: ParticleKind, kinetic_energy: f64, direction: Vector3) -> Self {
        let m = kind.mass();
        let p = (kinetic_energy * (kinetic_energy + 2.0 * m)).sqrt();
        Self::new(kind, direction * p)
    }

    pub fn at_time(mut self, time: f64) -> Self {
        self.time = time;
        self
    }

    pub fn shift_time(&mut self, dt: f64) {
        self.time += dt;
    }

    pub fn has_vertex(&self) -> bool {
        self.vertex.is_some()
    }

    /// Kinetic energy in MeV.
    pub fn kinetic_energy(&self) -> f64 {
        let m = self.kind.mass();
        let p = self.momentum.norm();
        (p * p + m * m).sqrt() - m
    }
}

/// An ordered particle set: one decay when produced by a per-decay
/// generator, one readout window when produced by the stream.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct PrimaryEvent {
    pub label: String,
    /// Absolute reference time of the event in seconds.
    pub time: f64,
    pub particles: Vec<Particle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
}

impl PrimaryEvent {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn add_particle(&mut self, particle: Particle) {
        self.particles.push(particle);
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Latest particle time, `None` for an empty event.
    pub fn latest_time(&self) -> Option<f64> {
        self.particles
            .iter()
            .map(|p| p.time)
            .fold(None, |acc, t| Some(acc.map_or(t, |a: f64| a.max(t))))
    }

    /// Species counts summary, e.g. `"2e-0e+1g0a0X"` (X: anything else).
    pub fn compute_classification(&mut self) {
        let (mut electrons, mut positrons, mut gammas, mut alphas, mut others) = (0, 0, 0, 0, 0);
        for p in &self.particles {
            match p.kind {
                ParticleKind::Electron => electrons += 1,
                ParticleKind::Positron => positrons += 1,
                ParticleKind::Gamma => gammas += 1,
                ParticleKind::Alpha => alphas += 1,
                ParticleKind::Neutron | ParticleKind::Proton => others += 1,
            }
        }
        self.classification = Some(format!(
            "{electrons}e-{positrons}e+{gammas}g{alphas}a{others}X"
        ));
    }
}
