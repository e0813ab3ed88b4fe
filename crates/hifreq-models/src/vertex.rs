//! Spatial models for decay vertices. Coordinates are in mm.

use hifreq_core::error::{GeneratorError, PropertyError};
use hifreq_core::properties::Properties;
use hifreq_core::random::RandomSource;
use hifreq_core::traits::{Component, VertexGenerator};
use hifreq_core::types::Vector3;
use tracing::debug;

pub const KEY_POSITION: &str = "position";
pub const KEY_BOX_MIN: &str = "box_min";
pub const KEY_BOX_MAX: &str = "box_max";
pub const KEY_VERTICES: &str = "vertices";

/// Read a 3-component real list as a finite vector.
fn fetch_vector(config: &Properties, key: &str) -> Result<Vector3, PropertyError> {
    let xyz = config.fetch_real_list(key)?;
    let [x, y, z] = xyz[..] else {
        return Err(PropertyError::Invalid {
            key: key.to_string(),
            reason: format!("expected 3 coordinates, got {}", xyz.len()),
        });
    };
    let v = Vector3::new(x, y, z);
    if !v.is_finite() {
        return Err(PropertyError::Invalid {
            key: key.to_string(),
            reason: "coordinates must be finite".into(),
        });
    }
    Ok(v)
}

/// Every vertex at one fixed position.
#[derive(Debug, Clone)]
pub struct PointVertexGenerator {
    name: String,
    position: Option<Vector3>,
}

impl PointVertexGenerator {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: None,
        }
    }

    /// A ready-to-use generator at `position`.
    pub fn at(name: impl Into<String>, position: Vector3) -> Self {
        Self {
            name: name.into(),
            position: Some(position),
        }
    }
}

impl Component for PointVertexGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_initialized(&self) -> bool {
        self.position.is_some()
    }

    fn initialize(&mut self, config: &Properties) -> Result<(), GeneratorError> {
        if self.position.is_some() {
            return Err(GeneratorError::AlreadyInitialized(self.name.clone()));
        }
        let position = fetch_vector(config, KEY_POSITION)?;
        debug!(generator = %self.name, %position, "point vertex generator initialized");
        self.position = Some(position);
        Ok(())
    }

    fn reset(&mut self) {
        self.position = None;
    }
}

impl VertexGenerator for PointVertexGenerator {
    fn shoot_vertex(&mut self, _random: &mut RandomSource) -> Result<Vector3, GeneratorError> {
        self.position
            .ok_or_else(|| GeneratorError::NotInitialized(self.name.clone()))
    }
}

/// Vertices uniformly distributed in an axis-aligned box. A degenerate axis
/// (min == max) is allowed and yields a flat source.
#[derive(Debug, Clone)]
pub struct BoxVertexGenerator {
    name: String,
    bounds: Option<(Vector3, Vector3)>,
}

impl BoxVertexGenerator {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bounds: None,
        }
    }

    pub fn with_bounds(
        name: impl Into<String>,
        min: Vector3,
        max: Vector3,
    ) -> Result<Self, GeneratorError> {
        let mut g = Self::new(name);
        g.install(min, max)?;
        Ok(g)
    }

    pub fn bounds(&self) -> Option<(Vector3, Vector3)> {
        self.bounds
    }

    fn install(&mut self, min: Vector3, max: Vector3) -> Result<(), GeneratorError> {
        if min.x > max.x || min.y > max.y || min.z > max.z {
            return Err(GeneratorError::Invalid {
                name: self.name.clone(),
                reason: format!("box_min {min} exceeds box_max {max}"),
            });
        }
        self.bounds = Some((min, max));
        Ok(())
    }
}

fn flat_or_fixed(random: &mut RandomSource, lo: f64, hi: f64) -> Result<f64, GeneratorError> {
    if lo == hi {
        return Ok(lo);
    }
    Ok(random.flat(lo, hi)?)
}

impl Component for BoxVertexGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_initialized(&self) -> bool {
        self.bounds.is_some()
    }

    fn initialize(&mut self, config: &Properties) -> Result<(), GeneratorError> {
        if self.bounds.is_some() {
            return Err(GeneratorError::AlreadyInitialized(self.name.clone()));
        }
        let min = fetch_vector(config, KEY_BOX_MIN)?;
        let max = fetch_vector(config, KEY_BOX_MAX)?;
        self.install(min, max)?;
        debug!(generator = %self.name, %min, %max, "box vertex generator initialized");
        Ok(())
    }

    fn reset(&mut self) {
        self.bounds = None;
    }
}

impl VertexGenerator for BoxVertexGenerator {
    fn shoot_vertex(&mut self, random: &mut RandomSource) -> Result<Vector3, GeneratorError> {
        let (min, max) = self
            .bounds
            .ok_or_else(|| GeneratorError::NotInitialized(self.name.clone()))?;
        Ok(Vector3::new(
            flat_or_fixed(random, min.x, max.x)?,
            flat_or_fixed(random, min.y, max.y)?,
            flat_or_fixed(random, min.z, max.z)?,
        ))
    }
}

/// Replays a finite list of vertices in order, then runs dry.
#[derive(Debug, Clone)]
pub struct ListVertexGenerator {
    name: String,
    vertices: Vec<Vector3>,
    next: usize,
    ready: bool,
}

impl ListVertexGenerator {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vertices: Vec::new(),
            next: 0,
            ready: false,
        }
    }

    pub fn from_vertices(name: impl Into<String>, vertices: Vec<Vector3>) -> Self {
        Self {
            name: name.into(),
            vertices,
            next: 0,
            ready: true,
        }
    }

    /// Vertices not yet handed out.
    pub fn remaining(&self) -> usize {
        self.vertices.len() - self.next
    }
}

impl Component for ListVertexGenerator {
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
        let flat = config.fetch_real_list(KEY_VERTICES)?;
        if flat.len() % 3 != 0 || flat.iter().any(|c| !c.is_finite()) {
            return Err(PropertyError::Invalid {
                key: KEY_VERTICES.to_string(),
                reason: format!(
                    "expected finite x, y, z triplets, got {} values",
                    flat.len()
                ),
            }
            .into());
        }
        self.vertices = flat
            .chunks_exact(3)
            .map(|c| Vector3::new(c[0], c[1], c[2]))
            .collect();
        self.next = 0;
        self.ready = true;
        debug!(generator = %self.name, count = self.vertices.len(), "list vertex generator initialized");
        Ok(())
    }

    fn reset(&mut self) {
        self.vertices.clear();
        self.next = 0;
        self.ready = false;
    }
}

impl VertexGenerator for ListVertexGenerator {
    fn has_next_vertex(&self) -> bool {
        self.ready && self.next < self.vertices.len()
    }

    fn shoot_vertex(&mut self, _random: &mut RandomSource) -> Result<Vector3, GeneratorError> {
        if !self.ready {
            return Err(GeneratorError::NotInitialized(self.name.clone()));
        }
        let v = self
            .vertices
            .get(self.next)
            .copied()
            .ok_or_else(|| GeneratorError::Exhausted(self.name.clone()))?;
        self.next += 1;
        Ok(v)
    }
}
