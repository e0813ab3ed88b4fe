//! Shared constants. Times are in seconds, activities in becquerel,
//! energies in MeV and lengths in millimetres.

/// Warm-up oversampling factor: the warm-up pass generates this many times
/// the expected number of decays in one readout window.
pub const DEFAULT_WARMUP_FACTOR: f64 = 100.0;

/// Label used for an engine constructed without an explicit name.
pub const DEFAULT_STREAM_NAME: &str = "hifreq";

/// Property key for the source activity (quantity with an activity unit).
pub const KEY_ACTIVITY: &str = "activity";
/// Property key for the readout window duration (quantity with a time unit).
pub const KEY_DURATION: &str = "duration";
/// Property key naming the per-decay generator in the generator dictionary.
pub const KEY_EVENT_GENERATOR_NAME: &str = "event_generator_name";
/// Property key for the seed of an engine-owned random source.
pub const KEY_SEED: &str = "seed";
/// Property key overriding [`DEFAULT_WARMUP_FACTOR`].
pub const KEY_WARMUP_FACTOR: &str = "warmup_factor";
/// Property key naming the vertex generator bound by the vertex provider.
pub const KEY_VG_NAME: &str = "vg_name";

/// Rest masses in MeV/c².
pub const ELECTRON_MASS_MEV: f64 = 0.510_998_95;
pub const PROTON_MASS_MEV: f64 = 938.272_088;
pub const NEUTRON_MASS_MEV: f64 = 939.565_42;
pub const ALPHA_MASS_MEV: f64 = 3727.379_4;
