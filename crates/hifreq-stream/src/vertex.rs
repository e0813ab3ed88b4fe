//! Vertex provider shared between stream engines.
//!
//! [`VertexProvider`] binds to exactly one vertex generator resolved by name
//! and forwards vertex requests to it. Engines receive a
//! [`SharedVertexProvider`] at construction, so several engines can draw
//! from one spatial model by sharing the handle, or from independent models
//! by holding different providers. The provider does no geometry or
//! randomness of its own: the caller passes the random source to use.

use std::sync::Arc;

use hifreq_core::constants::KEY_VG_NAME;
use hifreq_core::error::StreamError;
use hifreq_core::properties::Properties;
use hifreq_core::random::RandomSource;
use hifreq_core::registry::{Handle, VertexGeneratorRegistry};
use hifreq_core::traits::VertexGenerator;
use hifreq_core::types::Vector3;
use parking_lot::Mutex;
use tracing::{debug, info};

pub type SharedVertexProvider = Arc<Mutex<VertexProvider>>;

struct Binding {
    vg_name: String,
    generator: Handle<dyn VertexGenerator>,
}

pub struct VertexProvider {
    name: String,
    binding: Option<Binding>,
}

impl VertexProvider {
    /// Create an unbound provider.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            binding: None,
        }
    }

    /// Create an unbound provider wrapped for sharing.
    pub fn shared(name: impl Into<String>) -> SharedVertexProvider {
        Arc::new(Mutex::new(Self::new(name)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_initialized(&self) -> bool {
        self.binding.is_some()
    }

    /// Name of the bound vertex generator.
    pub fn vg_name(&self) -> Option<&str> {
        self.binding.as_ref().map(|b| b.vg_name.as_str())
    }

    /// Bind to the generator named by the `vg_name` property.
    pub fn initialize(
        &mut self,
        config: &Properties,
        vertex_generators: &VertexGeneratorRegistry,
    ) -> Result<(), StreamError> {
        if self.is_initialized() {
            return Err(StreamError::AlreadyInitialized(self.name.clone()));
        }
        let vg_name = config.fetch_string(KEY_VG_NAME)?;
        debug!(provider = %self.name, %vg_name, "vertex provider: resolving generator");
        let generator = vertex_generators.resolve(&vg_name)?;

        info!(provider = %self.name, %vg_name, "vertex provider: bound");
        self.binding = Some(Binding { vg_name, generator });
        Ok(())
    }

    /// Release the binding. Fails if the provider is not initialized.
    pub fn reset(&mut self) -> Result<(), StreamError> {
        if self.binding.take().is_none() {
            return Err(StreamError::NotInitialized(self.name.clone()));
        }
        debug!(provider = %self.name, "vertex provider: reset");
        Ok(())
    }

    /// Draw one vertex from the bound generator using `random`.
    pub fn shoot_vertex(&self, random: &mut RandomSource) -> Result<Vector3, StreamError> {
        let binding = self
            .binding
            .as_ref()
            .ok_or_else(|| StreamError::NotInitialized(self.name.clone()))?;
        let mut generator = binding.generator.lock();
        if !generator.has_next_vertex() {
            return Err(StreamError::Exhausted(binding.vg_name.clone()));
        }
        Ok(generator.shoot_vertex(random)?)
    }
}

impl std::fmt::Debug for VertexProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VertexProvider")
            .field("name", &self.name)
            .field("vg_name", &self.vg_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hifreq_core::error::{ErrorKind, GeneratorError, RegistryError};
    use hifreq_core::traits::Component;

    /// Emits `remaining` vertices along the x axis, then runs dry.
    struct Countdown {
        remaining: usize,
        emitted: usize,
        ready: bool,
    }

    impl Component for Countdown {
        fn name(&self) -> &str {
            "countdown"
        }
        fn is_initialized(&self) -> bool {
            self.ready
        }
        fn initialize(&mut self, config: &Properties) -> Result<(), GeneratorError> {
            self.remaining = config.fetch_integer("count")? as usize;
            self.ready = true;
            Ok(())
        }
        fn reset(&mut self) {
            self.ready = false;
        }
    }

    impl VertexGenerator for Countdown {
        fn has_next_vertex(&self) -> bool {
            self.remaining > 0
        }
        fn shoot_vertex(&mut self, _random: &mut RandomSource) -> Result<Vector3, GeneratorError> {
            self.remaining -= 1;
            self.emitted += 1;
            Ok(Vector3::new(self.emitted as f64, 0.0, 0.0))
        }
    }

    fn registry(count: i64) -> VertexGeneratorRegistry {
        let mut reg = VertexGeneratorRegistry::new();
        reg.register(
            "foil",
            Arc::new(Mutex::new(Countdown {
                remaining: 0,
                emitted: 0,
                ready: false,
            })),
            Properties::new().with("count", count),
        );
        reg
    }

    fn bound(count: i64) -> VertexProvider {
        let mut vp = VertexProvider::new("hf_vg");
        vp.initialize(&Properties::new().with("vg_name", "foil"), &registry(count))
            .unwrap();
        vp
    }

    #[test]
    fn binds_and_forwards() {
        let vp = bound(3);
        assert!(vp.is_initialized());
        assert_eq!(vp.vg_name(), Some("foil"));
        let mut rng = RandomSource::seeded(1);
        assert_eq!(vp.shoot_vertex(&mut rng).unwrap(), Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(vp.shoot_vertex(&mut rng).unwrap(), Vector3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn missing_vg_name_is_config_error() {
        let mut vp = VertexProvider::new("hf_vg");
        let err = vp.initialize(&Properties::new(), &registry(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(!vp.is_initialized());
    }

    #[test]
    fn unknown_vg_name_is_config_error() {
        let mut vp = VertexProvider::new("hf_vg");
        let err = vp
            .initialize(&Properties::new().with("vg_name", "nowhere"), &registry(1))
            .unwrap_err();
        assert_eq!(
            err,
            StreamError::Registry(RegistryError::Unknown("nowhere".into()))
        );
    }

    #[test]
    fn double_initialize_fails() {
        let mut vp = bound(1);
        let err = vp
            .initialize(&Properties::new().with("vg_name", "foil"), &registry(1))
            .unwrap_err();
        assert_eq!(err, StreamError::AlreadyInitialized("hf_vg".into()));
    }

    #[test]
    fn reset_allows_rebinding() {
        let mut vp = bound(1);
        vp.reset().unwrap();
        assert!(!vp.is_initialized());
        assert_eq!(vp.reset(), Err(StreamError::NotInitialized("hf_vg".into())));
        vp.initialize(&Properties::new().with("vg_name", "foil"), &registry(2))
            .unwrap();
        assert!(vp.is_initialized());
    }

    #[test]
    fn exhaustion_is_reported() {
        let vp = bound(1);
        let mut rng = RandomSource::seeded(1);
        vp.shoot_vertex(&mut rng).unwrap();
        let err = vp.shoot_vertex(&mut rng).unwrap_err();
        assert_eq!(err, StreamError::Exhausted("foil".into()));
        assert_eq!(err.kind(), ErrorKind::Exhaustion);
    }

    #[test]
    fn unbound_shoot_fails() {
        let vp = VertexProvider::new("hf_vg");
        let mut rng = RandomSource::seeded(1);
        assert_eq!(
            vp.shoot_vertex(&mut rng),
            Err(StreamError::NotInitialized("hf_vg".into()))
        );
    }

    #[test]
    fn shared_handle_serves_two_users() {
        let shared = VertexProvider::shared("hf_vg");
        shared
            .lock()
            .initialize(&Properties::new().with("vg_name", "foil"), &registry(2))
            .unwrap();
        let other = Arc::clone(&shared);
        let mut rng = RandomSource::seeded(1);
        let a = shared.lock().shoot_vertex(&mut rng).unwrap();
        let b = other.lock().shoot_vertex(&mut rng).unwrap();
        assert_ne!(a, b);
        assert!(other.lock().shoot_vertex(&mut rng).is_err());
    }
}
