//! Per-track insert effect descriptors.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Effect type. Unknown names are preserved so patterns round-trip, but
/// the engine never inserts them.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EffectKind {
    Reverb,
    Delay,
    Distortion,
    Compression,
    Other(String),
}

impl EffectKind {
    pub fn as_str(&self) -> &str {
        match self {
            EffectKind::Reverb => "reverb",
            EffectKind::Delay => "delay",
            EffectKind::Distortion => "distortion",
            EffectKind::Compression => "compression",
            EffectKind::Other(name) => name,
        }
    }
}

impl From<String> for EffectKind {
    fn from(name: String) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "reverb" => EffectKind::Reverb,
            "delay" => EffectKind::Delay,
            "distortion" => EffectKind::Distortion,
            "compression" => EffectKind::Compression,
            _ => EffectKind::Other(name),
        }
    }
}

impl From<&str> for EffectKind {
    fn from(name: &str) -> Self {
        EffectKind::from(name.to_string())
    }
}

impl From<EffectKind> for String {
    fn from(kind: EffectKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An effect slot on a track. List order is processing order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EffectKind,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
    /// Raw parameter values. Non-numeric entries are kept but read as absent.
    #[serde(default)]
    pub parameters: BTreeMap<String, serde_json::Value>,
}

fn enabled_default() -> bool {
    true
}

impl Effect {
    /// A new enabled effect with no parameters set.
    pub fn new(id: impl Into<String>, kind: impl Into<EffectKind>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            enabled: true,
            parameters: BTreeMap::new(),
        }
    }

    /// Numeric parameter `key`, or `default` when absent, non-numeric or non-finite.
    pub fn param(&self, key: &str, default: f32) -> f32 {
        self.parameters
            .get(key)
            .and_then(|v| v.as_f64())
            .filter(|v| v.is_finite())
            .map_or(default, |v| v as f32)
    }

    pub fn set_param(&mut self, key: impl Into<String>, value: f32) {
        let value = serde_json::Number::from_f64(value as f64)
            .map_or(serde_json::Value::Null, serde_json::Value::Number);
        self.parameters.insert(key.into(), value);
    }
}
