use crate::error::{Result, VibecraftError};
use crate::migrations::{self, CURRENT_VERSION};
use crate::paths;
use crate::phase::{self, CompletionMarker};
use crate::types::{Phase, ProjectMode};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

/// `.vibecraft/manifest.json`: project identity plus phase state.
///
/// Keys this type does not model (`agents`, `skills`, anything a newer tool
/// wrote) are kept in `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub project_type: Vec<String>,
    #[serde(default)]
    pub mode: ProjectMode,
    /// Key/value pairs read from the stack description at init.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub stack: BTreeMap<String, String>,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "Phase::default_names")]
    pub phases: Vec<String>,
    #[serde(default)]
    pub phases_completed: Vec<String>,
    #[serde(default)]
    pub current_phase: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_implement_phases: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_version() -> String {
    CURRENT_VERSION.to_string()
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl Manifest {
    pub fn new(project_name: impl Into<String>, mode: ProjectMode, project_type: Vec<String>) -> Self {
        Self {
            project_name: project_name.into(),
            project_type,
            mode,
            stack: BTreeMap::new(),
            version: default_version(),
            phases: Phase::default_names(),
            phases_completed: Vec::new(),
            current_phase: Phase::Research.as_str().to_string(),
            total_implement_phases: None,
            created_at: Some(now_iso()),
            updated_at: None,
            extra: Map::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::manifest_path(root);
        if !path.exists() {
            return Err(VibecraftError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        Self::from_json(&data)
    }

    /// Parse manifest JSON, running migrations on the raw object first.
    pub fn from_json(data: &str) -> Result<Self> {
        let mut doc = match serde_json::from_str::<Value>(data)? {
            Value::Object(map) => map,
            _ => {
                return Err(VibecraftError::Configuration(
                    "manifest must be a JSON object".to_string(),
                ))
            }
        };
        if migrations::migrate_manifest(&mut doc) {
            tracing::debug!(version = CURRENT_VERSION, "migrated manifest");
        }
        Ok(serde_json::from_value(Value::Object(doc))?)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        crate::io::write_json(&paths::manifest_path(root), self)
    }

    pub fn exists(root: &Path) -> bool {
        paths::manifest_path(root).exists()
    }

    // -----------------------------------------------------------------------
    // Completion events
    // -----------------------------------------------------------------------

    /// Record a skill run. With a positive `sub_phase` the marker is
    /// `<skill>_phase_<n>`, otherwise `skill` itself.
    pub fn complete_skill(&mut self, skill: &str, sub_phase: Option<u32>) {
        let marker = match sub_phase {
            Some(n) if n > 0 => format!("{skill}_phase_{n}"),
            _ => skill.to_string(),
        };
        self.record(marker);
    }

    pub fn complete_implement_phase(&mut self, n: u32) {
        self.record(CompletionMarker::sub_phase(n).to_string());
    }

    pub fn set_total_implement_phases(&mut self, total: u32) {
        self.total_implement_phases = Some(total);
        self.refresh();
    }

    pub fn next_phase(&self) -> String {
        phase::next_phase(self)
    }

    pub fn is_complete(&self, marker: &str) -> bool {
        self.phases_completed.iter().any(|m| m == marker)
    }

    fn record(&mut self, marker: String) {
        if !self.is_complete(&marker) {
            self.phases_completed.push(marker);
        }
        self.refresh();
    }

    fn refresh(&mut self) {
        self.current_phase = phase::next_phase(self);
        self.updated_at = Some(now_iso());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
