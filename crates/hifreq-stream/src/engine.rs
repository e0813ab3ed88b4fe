//! Decay stream engine.
//!
//! [`DecayStreamEngine`] owns the simulation clock and the pending buffer and
//! turns a fixed activity into successive readout windows. Each call to
//! [`DecayStreamEngine::load_next`]:
//!
//! 1. on the first call only, runs the warm-up pass (estimate of the longest
//!    emission delay of one decay) and back-fills pre-history decays that
//!    started before time zero but emit into `[0, ∞)`;
//! 2. draws `Poisson(activity × duration)` decays uniformly in
//!    `[clock, clock + duration)` and buffers their particles by absolute
//!    emission time;
//! 3. emits the window `[earliest, earliest + duration)` re-based to its
//!    lower edge and keeps the rest for later windows.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use hifreq_core::constants::{
    DEFAULT_WARMUP_FACTOR, KEY_ACTIVITY, KEY_DURATION, KEY_EVENT_GENERATOR_NAME, KEY_SEED,
    KEY_WARMUP_FACTOR,
};
use hifreq_core::error::{PropertyError, StreamError};
use hifreq_core::properties::Properties;
use hifreq_core::random::RandomSource;
use hifreq_core::registry::{DecayGeneratorRegistry, Handle};
use hifreq_core::traits::DecayGenerator;
use hifreq_core::types::{Particle, PrimaryEvent, Vector3};
use hifreq_core::units::Dimension;
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, info, trace};

use crate::buffer::PendingBuffer;
use crate::vertex::SharedVertexProvider;

/// Random source used by an initialized engine: either created and owned by
/// the engine from a seed, or supplied by the caller and shared.
#[derive(Debug)]
pub enum RandomHandle {
    Owned(RandomSource),
    Shared(Arc<Mutex<RandomSource>>),
}

impl RandomHandle {
    /// Borrow the underlying source for the duration of the guard.
    pub fn grab(&mut self) -> RandomGuard<'_> {
        match self {
            Self::Owned(r) => RandomGuard::Owned(r),
            Self::Shared(r) => RandomGuard::Shared(r.lock()),
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self, Self::Shared(_))
    }
}

pub enum RandomGuard<'a> {
    Owned(&'a mut RandomSource),
    Shared(MutexGuard<'a, RandomSource>),
}

impl Deref for RandomGuard<'_> {
    type Target = RandomSource;
    fn deref(&self) -> &RandomSource {
        match self {
            Self::Owned(r) => &**r,
            Self::Shared(g) => &**g,
        }
    }
}

impl DerefMut for RandomGuard<'_> {
    fn deref_mut(&mut self) -> &mut RandomSource {
        match self {
            Self::Owned(r) => &mut **r,
            Self::Shared(g) => &mut **g,
        }
    }
}

/// State that exists only between `initialize` and `reset`.
struct RunState {
    event_generator: Handle<dyn DecayGenerator>,
    random: RandomHandle,
    pending: PendingBuffer,
    /// Warm-up estimate; `None` until the first window is produced.
    max_delay_time: Option<f64>,
    /// Start of the next decay-sampling interval.
    current_time: f64,
}

/// Fixed parameters of one `load_next` call.
#[derive(Clone, Copy)]
struct Rates {
    activity: f64,
    duration: f64,
    warmup_factor: f64,
}

pub struct DecayStreamEngine {
    name: String,
    activity: Option<f64>,
    readout_window_duration: Option<f64>,
    event_generator_name: Option<String>,
    seed: Option<u64>,
    warmup_factor: f64,
    external_random: Option<Arc<Mutex<RandomSource>>>,
    vertices: SharedVertexProvider,
    run: Option<RunState>,
}

impl DecayStreamEngine {
    /// Create an idle engine drawing vertices from `vertices`.
    pub fn new(name: impl Into<String>, vertices: SharedVertexProvider) -> Self {
        Self {
            name: name.into(),
            activity: None,
            readout_window_duration: None,
            event_generator_name: None,
            seed: None,
            warmup_factor: DEFAULT_WARMUP_FACTOR,
            external_random: None,
            vertices,
            run: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_initialized(&self) -> bool {
        self.run.is_some()
    }

    /// The stream never runs dry.
    pub fn has_next(&self) -> bool {
        true
    }

    pub fn can_external_random(&self) -> bool {
        true
    }

    pub fn has_external_random(&self) -> bool {
        self.external_random.is_some()
    }

    /// Activity in becquerel.
    pub fn activity(&self) -> Option<f64> {
        self.activity
    }

    /// Readout window duration in seconds.
    pub fn readout_window_duration(&self) -> Option<f64> {
        self.readout_window_duration
    }

    pub fn event_generator_name(&self) -> Option<&str> {
        self.event_generator_name.as_deref()
    }

    pub fn warmup_factor(&self) -> f64 {
        self.warmup_factor
    }

    /// Warm-up estimate of the longest emission delay, once computed.
    pub fn max_delay_time(&self) -> Option<f64> {
        self.run.as_ref().and_then(|r| r.max_delay_time)
    }

    /// Absolute start of the next decay-sampling interval, once initialized.
    pub fn current_time(&self) -> Option<f64> {
        self.run.as_ref().map(|r| r.current_time)
    }

    /// Number of particles waiting for a later window.
    pub fn pending_len(&self) -> usize {
        self.run.as_ref().map_or(0, |r| r.pending.len())
    }

    fn ensure_unlocked(&self, operation: &'static str) -> Result<(), StreamError> {
        if self.is_initialized() {
            return Err(StreamError::Locked {
                name: self.name.clone(),
                operation,
            });
        }
        Ok(())
    }

    fn invalid(&self, reason: String) -> StreamError {
        StreamError::InvalidConfig {
            name: self.name.clone(),
            reason,
        }
    }

    /// Set the activity in becquerel (> 0).
    pub fn set_activity(&mut self, activity: f64) -> Result<(), StreamError> {
        self.ensure_unlocked("set_activity")?;
        if !(activity.is_finite() && activity > 0.0) {
            return Err(self.invalid(format!("invalid activity value {activity} (>0)")));
        }
        self.activity = Some(activity);
        Ok(())
    }

    /// Set the readout window duration in seconds (> 0).
    pub fn set_readout_window_duration(&mut self, duration: f64) -> Result<(), StreamError> {
        self.ensure_unlocked("set_readout_window_duration")?;
        if !(duration.is_finite() && duration > 0.0) {
            return Err(self.invalid(format!("invalid readout duration {duration} (>0)")));
        }
        self.readout_window_duration = Some(duration);
        Ok(())
    }

    pub fn set_event_generator_name(&mut self, name: impl Into<String>) -> Result<(), StreamError> {
        self.ensure_unlocked("set_event_generator_name")?;
        self.event_generator_name = Some(name.into());
        Ok(())
    }

    /// Seed for an engine-owned random source. Ignored when an external
    /// source is attached.
    pub fn set_seed(&mut self, seed: u64) -> Result<(), StreamError> {
        self.ensure_unlocked("set_seed")?;
        self.seed = Some(seed);
        Ok(())
    }

    pub fn set_warmup_factor(&mut self, factor: f64) -> Result<(), StreamError> {
        self.ensure_unlocked("set_warmup_factor")?;
        if !(factor.is_finite() && factor > 0.0) {
            return Err(self.invalid(format!("invalid warm-up factor {factor} (>0)")));
        }
        self.warmup_factor = factor;
        Ok(())
    }

    /// Attach a caller-owned random source shared with other users.
    pub fn set_external_random(&mut self, random: Arc<Mutex<RandomSource>>) -> Result<(), StreamError> {
        self.ensure_unlocked("set_external_random")?;
        self.external_random = Some(random);
        Ok(())
    }

    /// Initialize from `config`, resolving the per-decay generator in
    /// `generators`.
    ///
    /// Keys present in `config` take precedence over values given through
    /// the setters; a value absent from both is a configuration error. On
    /// failure the engine is left exactly as it was.
    pub fn initialize(
        &mut self,
        config: &Properties,
        generators: &DecayGeneratorRegistry,
    ) -> Result<(), StreamError> {
        if self.is_initialized() {
            return Err(StreamError::AlreadyInitialized(self.name.clone()));
        }

        let activity = if config.has_key(KEY_ACTIVITY) {
            config.fetch_quantity(KEY_ACTIVITY, Dimension::Activity)?
        } else {
            self.activity
                .ok_or_else(|| PropertyError::Missing(KEY_ACTIVITY.to_string()))?
        };
        if !(activity.is_finite() && activity > 0.0) {
            return Err(self.invalid(format!("invalid activity value {activity} (>0)")));
        }
        trace!(stream = %self.name, activity_bq = activity, "activity");

        let duration = if config.has_key(KEY_DURATION) {
            config.fetch_quantity(KEY_DURATION, Dimension::Time)?
        } else {
            self.readout_window_duration
                .ok_or_else(|| PropertyError::Missing(KEY_DURATION.to_string()))?
        };
        if !(duration.is_finite() && duration > 0.0) {
            return Err(self.invalid(format!("invalid readout duration {duration} (>0)")));
        }
        trace!(stream = %self.name, duration_s = duration, "readout duration");

        let warmup_factor = if config.has_key(KEY_WARMUP_FACTOR) {
            config.fetch_real(KEY_WARMUP_FACTOR)?
        } else {
            self.warmup_factor
        };
        if !(warmup_factor.is_finite() && warmup_factor > 0.0) {
            return Err(self.invalid(format!("invalid warm-up factor {warmup_factor} (>0)")));
        }

        let eg_name = if config.has_key(KEY_EVENT_GENERATOR_NAME) {
            config.fetch_string(KEY_EVENT_GENERATOR_NAME)?
        } else {
            self.event_generator_name
                .clone()
                .ok_or_else(|| PropertyError::Missing(KEY_EVENT_GENERATOR_NAME.to_string()))?
        };
        let event_generator = generators.resolve(&eg_name)?;
        trace!(stream = %self.name, event_generator = %eg_name, "event generator resolved");

        let random = match &self.external_random {
            Some(shared) => {
                if !shared.lock().is_initialized() {
                    return Err(self.invalid("external random source is not initialized".into()));
                }
                RandomHandle::Shared(Arc::clone(shared))
            }
            None => RandomHandle::Owned(RandomSource::seeded(self.seed_from(config)?)),
        };
        let external = random.is_external();
        let seed = match &random {
            RandomHandle::Owned(r) => r.seed(),
            RandomHandle::Shared(_) => None,
        };

        self.activity = Some(activity);
        self.readout_window_duration = Some(duration);
        self.warmup_factor = warmup_factor;
        self.event_generator_name = Some(eg_name);
        self.seed = seed;
        self.run = Some(RunState {
            event_generator,
            random,
            pending: PendingBuffer::new(),
            max_delay_time: None,
            current_time: 0.0,
        });

        info!(
            stream = %self.name,
            activity_bq = activity,
            duration_s = duration,
            expected_decays_per_window = activity * duration,
            external_random = external,
            "decay stream initialized"
        );
        Ok(())
    }

    fn seed_from(&self, config: &Properties) -> Result<u64, StreamError> {
        if !config.has_key(KEY_SEED) {
            return self
                .seed
                .ok_or_else(|| PropertyError::Missing(KEY_SEED.to_string()).into());
        }
        let seed = config.fetch_integer(KEY_SEED)?;
        u64::try_from(seed).map_err(|_| self.invalid(format!("invalid seed value {seed} (>=0)")))
    }

    /// Return to the idle state: drop pending particles, the warm-up
    /// estimate, the clock and the configuration, and release an owned random
    /// source. An external random source stays attached. No-op when idle.
    pub fn reset(&mut self) {
        let Some(mut run) = self.run.take() else {
            return;
        };
        if let RandomHandle::Owned(random) = &mut run.random {
            random.reset();
        }
        self.activity = None;
        self.readout_window_duration = None;
        self.event_generator_name = None;
        self.seed = None;
        self.warmup_factor = DEFAULT_WARMUP_FACTOR;
        info!(stream = %self.name, dropped = run.pending.len(), "decay stream reset");
    }

    /// Produce the next readout window with its classification computed.
    pub fn next_window(&mut self) -> Result<PrimaryEvent, StreamError> {
        self.load_next(true)
    }

    /// Produce the next readout window.
    pub fn load_next(&mut self, compute_classification: bool) -> Result<PrimaryEvent, StreamError> {
        let (Some(run), Some(activity), Some(duration)) = (
            self.run.as_mut(),
            self.activity,
            self.readout_window_duration,
        ) else {
            return Err(StreamError::NotInitialized(self.name.clone()));
        };
        let rates = Rates {
            activity,
            duration,
            warmup_factor: self.warmup_factor,
        };
        let vertices = Arc::clone(&self.vertices);

        // Nothing is committed to the run state until every draw of a step
        // has succeeded, so a failed call can be retried as if never made.
        if run.max_delay_time.is_none() {
            let max_delay = run.estimate_max_delay(&rates)?;
            debug!(stream = %self.name, max_delay_s = max_delay, "warm-up estimate");
            let pre_history = if max_delay > 0.0 {
                run.pre_history(&rates, max_delay, &vertices)?
            } else {
                Vec::new()
            };
            run.buffer(pre_history);
            run.max_delay_time = Some(max_delay);
            run.current_time = 0.0;
        }

        trace!(stream = %self.name, clock_s = run.current_time, "sampling window decays");
        let decays = run.sample_window(&rates, &vertices)?;
        run.buffer(decays);

        let mut event = run.emit_window(&rates);
        event.label = self.name.clone();
        if compute_classification {
            event.compute_classification();
        }
        debug!(
            stream = %self.name,
            window_start_s = event.time,
            particles = event.len(),
            pending = run.pending.len(),
            "window emitted"
        );
        Ok(event)
    }
}

impl RunState {
    /// Warm-up pass: oversample decays and return the largest emission
    /// offset seen. Nothing is buffered.
    fn estimate_max_delay(&mut self, rates: &Rates) -> Result<f64, StreamError> {
        let n_to_gen = (rates.warmup_factor * rates.activity * rates.duration).floor() as u64;
        trace!(n_to_gen, "warm-up sample size");
        let mut generator = self.event_generator.lock();
        let mut random = self.random.grab();
        let mut max_delay = 0.0_f64;
        for _ in 0..n_to_gen {
            let decay = generator.load_next(&mut random, false)?;
            if let Some(latest) = decay.latest_time() {
                max_delay = max_delay.max(latest);
            }
        }
        Ok(max_delay)
    }

    /// Back-fill decays started in `[-max_delay, 0)` whose particles reach
    /// `t >= 0`.
    fn pre_history(
        &mut self,
        rates: &Rates,
        max_delay: f64,
        vertices: &SharedVertexProvider,
    ) -> Result<Vec<Particle>, StreamError> {
        let mut generator = self.event_generator.lock();
        let mut random = self.random.grab();
        let n_to_gen = random.poisson(rates.activity * max_delay)?;
        trace!(n_to_gen, "pre-history decays");
        let mut particles = Vec::new();
        for _ in 0..n_to_gen {
            let start = random.flat(-max_delay, 0.0)?;
            let decay = generator.load_next(&mut random, false)?;
            let mut vertex: Option<Vector3> = None;
            for mut particle in decay.particles {
                let t = start + particle.time;
                if t < 0.0 {
                    continue;
                }
                if vertex.is_none() {
                    vertex = Some(vertices.lock().shoot_vertex(&mut random)?);
                }
                particle.vertex = vertex;
                particle.time = t;
                particles.push(particle);
            }
        }
        Ok(particles)
    }

    /// Generate this window's decays, timed on the absolute clock.
    fn sample_window(
        &mut self,
        rates: &Rates,
        vertices: &SharedVertexProvider,
    ) -> Result<Vec<Particle>, StreamError> {
        let mut generator = self.event_generator.lock();
        let mut random = self.random.grab();
        let begin = self.current_time;
        let n_to_gen = random.poisson(rates.activity * rates.duration)?;
        trace!(n_to_gen, "window decays");
        let mut particles = Vec::new();
        for _ in 0..n_to_gen {
            let start = random.flat(begin, begin + rates.duration)?;
            let decay = generator.load_next(&mut random, false)?;
            if decay.is_empty() {
                continue;
            }
            let vertex = vertices.lock().shoot_vertex(&mut random)?;
            for mut particle in decay.particles {
                particle.vertex = Some(vertex);
                particle.shift_time(start);
                particles.push(particle);
            }
        }
        Ok(particles)
    }

    fn buffer(&mut self, particles: Vec<Particle>) {
        for particle in particles {
            self.pending.insert(particle);
        }
    }

    /// Drain the window anchored at the earliest pending particle and
    /// advance the clock to its upper edge. With nothing pending, the window
    /// is `[clock, clock + duration)` and comes out empty.
    fn emit_window(&mut self, rates: &Rates) -> PrimaryEvent {
        let lower = self.pending.earliest_time().unwrap_or(self.current_time);
        let upper = lower + rates.duration;
        trace!(lower, upper, "window edges");

        let mut event = PrimaryEvent {
            time: lower,
            ..PrimaryEvent::default()
        };
        for mut particle in self.pending.drain_before(upper) {
            particle.shift_time(-lower);
            event.add_particle(particle);
        }
        self.current_time = upper;
        event
    }
}

impl std::fmt::Debug for DecayStreamEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecayStreamEngine")
            .field("name", &self.name)
            .field("activity", &self.activity)
            .field("readout_window_duration", &self.readout_window_duration)
            .field("event_generator_name", &self.event_generator_name)
            .field("initialized", &self.is_initialized())
            .field("max_delay_time", &self.max_delay_time())
            .field("pending", &self.pending_len())
            .finish()
    }
}
