use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Group/binding pair of a WGSL resource.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    #[serde(default)]
    pub group: u32,
    #[serde(default)]
    pub binding: u32,
}

/// Binding slots supplied by the GPU runtime, keyed by resource id.
///
/// Ids missing from a table get a stable slot from the build context instead.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct BindingTable {
    #[serde(default)]
    pub uniforms: HashMap<String, Binding>,
    /// `binding` is the sampler slot; the texture itself uses `binding + 1`.
    #[serde(default)]
    pub textures: HashMap<String, Binding>,
    #[serde(default)]
    pub storages: HashMap<String, Binding>,
    /// Vertex attribute locations.
    #[serde(default)]
    pub attributes: HashMap<String, u32>,
}

/// Particle count of storage buffers: a total, or explicit texture dimensions.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum ParticleCount {
    Total(u32),
    Dims(Vec<u32>),
}

impl Default for ParticleCount {
    fn default() -> Self {
        ParticleCount::Total(1024)
    }
}

fn default_workgroup_size() -> u32 {
    32
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    /// Vertices per draw, used to derive attribute strides.
    #[serde(default)]
    pub vertex_count: Option<u32>,
    #[serde(default)]
    pub instance_count: Option<u32>,
    #[serde(default)]
    pub particle_count: ParticleCount,
    #[serde(default = "default_workgroup_size")]
    pub workgroup_size: u32,
    /// Log every generated program at debug level.
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub bindings: BindingTable,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            vertex_count: None,
            instance_count: None,
            particle_count: ParticleCount::default(),
            workgroup_size: default_workgroup_size(),
            debug: false,
            bindings: BindingTable::default(),
        }
    }
}

impl BuildConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("failed to parse build config json")
    }
}

pub fn load_config_from_path(path: impl AsRef<std::path::Path>) -> Result<BuildConfig> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read build config at {}", path.display()))?;
    BuildConfig::from_json_str(&text)
}
