//! Simulation configuration loaded from a TOML file with `HIFREQ__*`
//! environment overrides (e.g. `HIFREQ__STREAM__ACTIVITY="50 kBq"`).

use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use hifreq_core::constants::DEFAULT_STREAM_NAME;
use hifreq_core::properties::Properties;
use hifreq_core::registry::{DecayGeneratorRegistry, VertexGeneratorRegistry};
use serde::{Deserialize, Serialize};

/// One dictionary entry: a named instance of a model with its properties.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ModelEntry {
    pub name: String,
    pub model: String,
    #[serde(default)]
    pub properties: Properties,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SimConfig {
    /// Stream name, used as the label of every window.
    #[serde(default = "default_name")]
    pub name: String,
    /// Decay stream engine properties.
    pub stream: Properties,
    /// Vertex provider properties.
    pub vertex: Properties,
    #[serde(default)]
    pub decay_generators: Vec<ModelEntry>,
    #[serde(default)]
    pub vertex_generators: Vec<ModelEntry>,
}

fn default_name() -> String {
    DEFAULT_STREAM_NAME.to_string()
}

impl SimConfig {
    /// Load from `path`, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let builder = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .add_source(
                ::config::Environment::with_prefix("HIFREQ")
                    .separator("__")
                    .try_parsing(true),
            );
        let cfg: SimConfig = builder
            .build()
            .with_context(|| format!("failed to read config file {}", path.display()))?
            .try_deserialize()
            .context("failed to parse simulation config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject duplicate or unknown dictionary entries.
    pub fn validate(&self) -> Result<()> {
        check_entries("decay_generators", &self.decay_generators, hifreq_models::DECAY_MODELS)?;
        check_entries("vertex_generators", &self.vertex_generators, hifreq_models::VERTEX_MODELS)?;
        Ok(())
    }

    /// Build both dictionaries. Entries are created uninitialized and
    /// configured on first lookup.
    pub fn registries(&self) -> Result<(DecayGeneratorRegistry, VertexGeneratorRegistry)> {
        let mut decay = DecayGeneratorRegistry::new();
        for entry in &self.decay_generators {
            let handle = hifreq_models::decay_generator(&entry.model, &entry.name)?;
            decay.register(entry.name.clone(), handle, entry.properties.clone());
        }
        let mut vertex = VertexGeneratorRegistry::new();
        for entry in &self.vertex_generators {
            let handle = hifreq_models::vertex_generator(&entry.model, &entry.name)?;
            vertex.register(entry.name.clone(), handle, entry.properties.clone());
        }
        Ok((decay, vertex))
    }
}

fn check_entries(section: &str, entries: &[ModelEntry], known: &[&str]) -> Result<()> {
    let mut names = HashSet::new();
    for entry in entries {
        if !names.insert(entry.name.as_str()) {
            bail!("{section}: duplicate entry '{}'", entry.name);
        }
        if !known.contains(&entry.model.as_str()) {
            bail!(
                "{section}: entry '{}' has unknown model '{}' (expected one of: {})",
                entry.name,
                entry.model,
                known.join(", ")
            );
        }
    }
    Ok(())
}
