//! # hifreq-models — concrete collaborators.
//!
//! - [`CascadeGenerator`]: per-decay generator driven by a list of emission
//!   lines, with fixed or exponentially distributed delays.
//! - [`PointVertexGenerator`], [`BoxVertexGenerator`],
//!   [`ListVertexGenerator`]: spatial models for decay vertices.
//!
//! [`decay_generator`] and [`vertex_generator`] build handles by model name
//! so that dictionaries can be populated from configuration files.

pub mod cascade;
pub mod vertex;

use std::sync::Arc;

use hifreq_core::error::GeneratorError;
use hifreq_core::registry::Handle;
use hifreq_core::traits::{DecayGenerator, VertexGenerator};
use parking_lot::Mutex;

pub use cascade::{CascadeGenerator, EmissionLine};
pub use vertex::{BoxVertexGenerator, ListVertexGenerator, PointVertexGenerator};

/// Model names accepted by [`decay_generator`].
pub const DECAY_MODELS: &[&str] = &["cascade"];

/// Model names accepted by [`vertex_generator`].
pub const VERTEX_MODELS: &[&str] = &["point", "box", "list"];

/// Create an uninitialized decay generator of the given model.
pub fn decay_generator(model: &str, name: &str) -> Result<Handle<dyn DecayGenerator>, GeneratorError> {
    match model {
        "cascade" => Ok(Arc::new(Mutex::new(CascadeGenerator::new(name)))),
        other => Err(unknown_model(name, other, DECAY_MODELS)),
    }
}

/// Create an uninitialized vertex generator of the given model.
pub fn vertex_generator(model: &str, name: &str) -> Result<Handle<dyn VertexGenerator>, GeneratorError> {
    match model {
        "point" => Ok(Arc::new(Mutex::new(PointVertexGenerator::new(name)))),
        "box" => Ok(Arc::new(Mutex::new(BoxVertexGenerator::new(name)))),
        "list" => Ok(Arc::new(Mutex::new(ListVertexGenerator::new(name)))),
        other => Err(unknown_model(name, other, VERTEX_MODELS)),
    }
}

fn unknown_model(name: &str, model: &str, known: &[&str]) -> GeneratorError {
    GeneratorError::Invalid {
        name: name.to_string(),
        reason: format!("unknown model '{model}' (expected one of: {})", known.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hifreq_core::traits::Component;

    #[test]
    fn builds_known_models() {
        let dg = decay_generator("cascade", "co60").unwrap();
        assert_eq!(dg.lock().name(), "co60");
        assert!(!dg.lock().is_initialized());
        for model in VERTEX_MODELS {
            let vg = vertex_generator(model, "src").unwrap();
            assert_eq!(vg.lock().name(), "src");
        }
    }

    #[test]
    fn unknown_model_is_rejected() {
        assert!(matches!(
            decay_generator("beta", "x"),
            Err(GeneratorError::Invalid { .. })
        ));
        let err = vertex_generator("sphere", "x").err().unwrap();
        assert!(err.to_string().contains("point, box, list"));
    }
}
