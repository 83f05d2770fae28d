//! Saved sequencer projects.

use serde::{Deserialize, Serialize};

use crate::pattern::{Pattern, SEQUENCER_STEPS};
use crate::track::Track;

/// A named sequencer session as persisted by the host application.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub name: String,
    pub bpm: u32,
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Project {
    pub fn from_pattern(name: impl Into<String>, pattern: &Pattern) -> Self {
        Self {
            name: name.into(),
            bpm: pattern.bpm,
            tracks: pattern.tracks.clone(),
            created_at: None,
        }
    }

    /// The project as a full-grid pattern.
    pub fn to_pattern(&self) -> Pattern {
        Pattern {
            tracks: self.tracks.clone(),
            bpm: self.bpm,
            steps: SEQUENCER_STEPS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_json_uses_camel_case() {
        let mut p = Project::from_pattern("demo", &Pattern::default());
        p.created_at = Some("2024-01-01T00:00:00Z".into());
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["createdAt"], "2024-01-01T00:00:00Z");
        assert_eq!(p.to_pattern().steps, 64);
    }
}
