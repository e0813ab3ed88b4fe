//! # hifreq-stream — windowed decay streams.
//!
//! Turns "decays per unit time" into a sequence of fixed-duration readout
//! windows:
//! - **Pending buffer**: particles generated but not yet emitted, ordered by
//!   absolute emission time.
//! - **Warm-up and pre-history**: on the first window the engine estimates
//!   the longest emission delay of a decay and back-fills decays that started
//!   before time zero but still emit into the first window.
//! - **Windowing**: each window is anchored at the earliest pending particle;
//!   particles beyond its upper edge stay buffered for later windows.
//! - **Vertex provider**: a shared handle to one vertex generator, injected
//!   into every engine that needs it.

pub mod buffer;
pub mod engine;
pub mod vertex;

pub use buffer::PendingBuffer;
pub use engine::{DecayStreamEngine, RandomHandle};
pub use vertex::{SharedVertexProvider, VertexProvider};
