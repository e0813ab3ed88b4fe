//! Collaborator contracts.
//!
//! These traits define what the stream engine consumes:
//! - [`DecayGenerator`] — one decay's particle set, times relative to the decay start
//! - [`VertexGenerator`] — spatial positions for new decays
//!
//! Both share the [`Component`] lifecycle so a [`Registry`](crate::registry::Registry)
//! can initialize them lazily from their configuration.

use crate::error::GeneratorError;
use crate::properties::Properties;
use crate::random::RandomSource;
use crate::types::{PrimaryEvent, Vector3};

/// Named component with an initialize/reset lifecycle.
pub trait Component: Send {
    fn name(&self) -> &str;

    fn is_initialized(&self) -> bool;

    /// Configure from `config`. Fails if already initialized.
    fn initialize(&mut self, config: &Properties) -> Result<(), GeneratorError>;

    /// Return to the uninitialized state.
    fn reset(&mut self);
}

/// Produces the particles of a single decay.
///
/// Implementations know nothing about activity or absolute time: every
/// particle time is an offset `>= 0` from the decay start, and no vertex is
/// assigned.
pub trait DecayGenerator: Component {
    fn load_next(
        &mut self,
        random: &mut RandomSource,
        compute_classification: bool,
    ) -> Result<PrimaryEvent, GeneratorError>;
}

/// Produces spatial positions.
pub trait VertexGenerator: Component {
    /// Whether another vertex can be produced.
    fn has_next_vertex(&self) -> bool {
        true
    }

    fn shoot_vertex(&mut self, random: &mut RandomSource) -> Result<Vector3, GeneratorError>;
}
