use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// The five logical phases a project moves through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Research,
    Design,
    Plan,
    Implement,
    Review,
}

impl Phase {
    pub fn all() -> &'static [Phase] {
        &[
            Phase::Research,
            Phase::Design,
            Phase::Plan,
            Phase::Implement,
            Phase::Review,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Research => "research",
            Phase::Design => "design",
            Phase::Plan => "plan",
            Phase::Implement => "implement",
            Phase::Review => "review",
        }
    }

    /// Default `phases` list written into a new manifest.
    pub fn default_names() -> Vec<String> {
        Phase::all().iter().map(|p| p.as_str().to_string()).collect()
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Phase {
    type Err = crate::error::VibecraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "research" => Ok(Phase::Research),
            "design" => Ok(Phase::Design),
            "plan" => Ok(Phase::Plan),
            "implement" => Ok(Phase::Implement),
            "review" => Ok(Phase::Review),
            _ => Err(crate::error::VibecraftError::InvalidPhase(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Skill
// ---------------------------------------------------------------------------

/// Single-shot skills whose completion marks one logical phase done.
///
/// `implement` is deliberately absent: implementation is split into numbered
/// sub-phases and tracked separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Skill {
    Research,
    Design,
    Plan,
    Review,
}

impl Skill {
    pub fn all() -> &'static [Skill] {
        &[Skill::Research, Skill::Design, Skill::Plan, Skill::Review]
    }

    /// Persisted completion marker, e.g. `research_skill`.
    pub fn marker(self) -> &'static str {
        match self {
            Skill::Research => "research_skill",
            Skill::Design => "design_skill",
            Skill::Plan => "plan_skill",
            Skill::Review => "review_skill",
        }
    }

    pub fn phase(self) -> Phase {
        match self {
            Skill::Research => Phase::Research,
            Skill::Design => Phase::Design,
            Skill::Plan => Phase::Plan,
            Skill::Review => Phase::Review,
        }
    }

    pub fn from_marker(s: &str) -> Option<Skill> {
        Skill::all().iter().copied().find(|k| k.marker() == s)
    }
}

// ---------------------------------------------------------------------------
// ModuleStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleStatus {
    #[default]
    Planned,
    InProgress,
    Completed,
    Blocked,
}

impl ModuleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ModuleStatus::Planned => "planned",
            ModuleStatus::InProgress => "in_progress",
            ModuleStatus::Completed => "completed",
            ModuleStatus::Blocked => "blocked",
        }
    }
}

impl fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ModuleStatus {
    type Err = crate::error::VibecraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planned" => Ok(ModuleStatus::Planned),
            "in_progress" | "in-progress" => Ok(ModuleStatus::InProgress),
            "completed" => Ok(ModuleStatus::Completed),
            "blocked" => Ok(ModuleStatus::Blocked),
            _ => Err(crate::error::VibecraftError::InvalidStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ProjectMode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectMode {
    #[default]
    Simple,
    Modular,
}

impl ProjectMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectMode::Simple => "simple",
            ProjectMode::Modular => "modular",
        }
    }
}

impl fmt::Display for ProjectMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProjectMode {
    type Err = crate::error::VibecraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "simple" => Ok(ProjectMode::Simple),
            "modular" => Ok(ProjectMode::Modular),
            _ => Err(crate::error::VibecraftError::Configuration(format!(
                "unknown project mode '{s}': expected simple or modular"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
