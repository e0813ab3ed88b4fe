//! Shared test helpers for integration and property tests.

use std::sync::Arc;

use hifreq_core::error::GeneratorError;
use hifreq_core::properties::Properties;
use hifreq_core::random::RandomSource;
use hifreq_core::registry::{DecayGeneratorRegistry, VertexGeneratorRegistry};
use hifreq_core::traits::{Component, DecayGenerator};
use hifreq_core::types::{Particle, ParticleKind, PrimaryEvent, Vector3};
use hifreq_models::PointVertexGenerator;
use hifreq_stream::{DecayStreamEngine, SharedVertexProvider, VertexProvider};
use parking_lot::Mutex;

/// Name under which [`decay_registry`] registers its generator.
pub const DECAY_NAME: &str = "fixed";

/// Position handed out by [`vertex_provider`].
pub const VERTEX: Vector3 = Vector3::new(0.0, 0.0, -1.0);

/// Emits one electron per configured offset for every decay, each with a
/// globally unique track id so duplicates across windows can be detected.
#[derive(Debug, Default)]
pub struct FixedOffsetGenerator {
    offsets: Vec<f64>,
    next_id: u64,
    ready: bool,
}

impl FixedOffsetGenerator {
    pub fn new(offsets: Vec<f64>) -> Self {
        Self {
            offsets,
            next_id: 0,
            ready: true,
        }
    }

    /// Number of track ids handed out so far.
    pub fn issued(&self) -> u64 {
        self.next_id
    }
}

impl Component for FixedOffsetGenerator {
    fn name(&self) -> &str {
        DECAY_NAME
    }
    fn is_initialized(&self) -> bool {
        self.ready
    }
    fn initialize(&mut self, _config: &Properties) -> Result<(), GeneratorError> {
        self.ready = true;
        Ok(())
    }
    fn reset(&mut self) {
        self.ready = false;
    }
}

impl DecayGenerator for FixedOffsetGenerator {
    fn load_next(
        &mut self,
        _random: &mut RandomSource,
        compute_classification: bool,
    ) -> Result<PrimaryEvent, GeneratorError> {
        let mut decay = PrimaryEvent::new(DECAY_NAME);
        for &dt in &self.offsets {
            let mut p = Particle::new(ParticleKind::Electron, Vector3::ZERO).at_time(dt);
            p.track_id = Some(self.next_id);
            self.next_id += 1;
            decay.add_particle(p);
        }
        if compute_classification {
            decay.compute_classification();
        }
        Ok(decay)
    }
}

/// Registry holding one [`FixedOffsetGenerator`] under [`DECAY_NAME`], plus
/// the shared handle for inspecting it afterwards.
pub fn decay_registry(offsets: Vec<f64>) -> (DecayGeneratorRegistry, Arc<Mutex<FixedOffsetGenerator>>) {
    let generator = Arc::new(Mutex::new(FixedOffsetGenerator::new(offsets)));
    let mut reg = DecayGeneratorRegistry::new();
    reg.register(DECAY_NAME, generator.clone(), Properties::new());
    (reg, generator)
}

/// Provider bound to a point source at [`VERTEX`].
pub fn vertex_provider() -> SharedVertexProvider {
    let vp = VertexProvider::shared("hf_vg");
    bind_point_source(&vp);
    vp
}

/// Bind an idle provider to a point source at [`VERTEX`].
pub fn bind_point_source(vertices: &SharedVertexProvider) {
    let mut reg = VertexGeneratorRegistry::new();
    reg.register(
        "point",
        Arc::new(Mutex::new(PointVertexGenerator::at("point", VERTEX))),
        Properties::new(),
    );
    vertices
        .lock()
        .initialize(&Properties::new().with("vg_name", "point"), &reg)
        .expect("bind vertex provider");
}

/// Stream configuration for the fixed-offset generator.
pub fn stream_config(activity: &str, duration: &str, seed: u64) -> Properties {
    Properties::new()
        .with("activity", activity)
        .with("duration", duration)
        .with("event_generator_name", DECAY_NAME)
        .with("seed", seed as i64)
}

/// Initialized engine over a [`FixedOffsetGenerator`].
pub fn make_engine(
    offsets: Vec<f64>,
    activity: &str,
    duration: &str,
    seed: u64,
) -> (DecayStreamEngine, Arc<Mutex<FixedOffsetGenerator>>) {
    let (reg, generator) = decay_registry(offsets);
    let mut engine = DecayStreamEngine::new("hifreq", vertex_provider());
    engine
        .initialize(&stream_config(activity, duration, seed), &reg)
        .expect("initialize engine");
    (engine, generator)
}

/// Pull `n` windows, panicking on the first error.
pub fn windows(engine: &mut DecayStreamEngine, n: usize) -> Vec<PrimaryEvent> {
    (0..n)
        .map(|_| engine.load_next(false).expect("window"))
        .collect()
}
