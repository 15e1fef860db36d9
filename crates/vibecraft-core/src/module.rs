use crate::paths;
use crate::types::ModuleStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Module
// ---------------------------------------------------------------------------

/// A unit of planned work as stored in the module registry.
///
/// Dependencies are referenced by name only. A dependency may name a module
/// that does not exist yet; [`crate::dependency::DependencyAnalyzer`] is the
/// place where that gets checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub status: ModuleStatus,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub exports: Vec<String>,
    #[serde(default)]
    pub phases_completed: Vec<u32>,
    #[serde(default = "Utc::now", with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

impl Module {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            path: paths::default_module_path(&name),
            name,
            status: ModuleStatus::Planned,
            description: description.into(),
            dependencies: Vec::new(),
            exports: Vec::new(),
            phases_completed: Vec::new(),
            created_at: Utc::now(),
            metadata: None,
        }
    }

    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_exports<I, S>(mut self, exports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exports = exports.into_iter().map(Into::into).collect();
        self
    }

    /// Fill in fields that older registry files may have left empty.
    pub(crate) fn normalize(&mut self) {
        if self.path.is_empty() {
            self.path = paths::default_module_path(&self.name);
        }
    }

    pub fn depends_on(&self, name: &str) -> bool {
        self.dependencies.iter().any(|d| d == name)
    }
}

// ---------------------------------------------------------------------------
// Timestamp serde
// ---------------------------------------------------------------------------

/// `created_at` is written as RFC 3339. Reading also accepts naive ISO-8601
/// strings (taken as UTC) and `null`, which older registries contain.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&t.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw {
            None => Ok(Utc::now()),
            Some(s) => parse(&s).map_err(D::Error::custom),
        }
    }

    pub fn parse(s: &str) -> Result<DateTime<Utc>, String> {
        if let Ok(t) = DateTime::parse_from_rfc3339(s) {
            return Ok(t.with_timezone(&Utc));
        }
        s.parse::<NaiveDateTime>()
            .map(|n| n.and_utc())
            .map_err(|e| format!("invalid timestamp '{s}': {e}"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
