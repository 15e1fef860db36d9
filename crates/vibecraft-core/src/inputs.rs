use crate::error::{Result, VibecraftError};
use crate::paths;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Shorter research documents cannot describe a project.
pub const MIN_RESEARCH_LEN: usize = 50;
pub const MIN_STACK_LEN: usize = 10;

/// Keywords looked for in research and stack text, in reporting order.
pub const PROJECT_TYPE_KEYWORDS: &[&str] =
    &["game", "multiplayer", "web", "api", "cli", "mobile", "database"];

pub const GENERIC_PROJECT_TYPE: &str = "generic";

// ---------------------------------------------------------------------------
// ProjectInputs
// ---------------------------------------------------------------------------

/// The research document and stack description a project is bootstrapped
/// from.
#[derive(Debug, Clone)]
pub struct ProjectInputs {
    pub research_path: PathBuf,
    pub stack_path: PathBuf,
    pub research: String,
    pub stack: String,
}

impl ProjectInputs {
    pub fn read(research_path: &Path, stack_path: &Path) -> Result<Self> {
        Ok(Self {
            research: std::fs::read_to_string(research_path)?,
            stack: std::fs::read_to_string(stack_path)?,
            research_path: research_path.to_path_buf(),
            stack_path: stack_path.to_path_buf(),
        })
    }

    /// Both documents must have real content. A research document without
    /// a project name is accepted only when the caller supplies one.
    pub fn validate(&self, name_given: bool) -> Result<()> {
        if self.research.trim().chars().count() < MIN_RESEARCH_LEN {
            return Err(VibecraftError::InvalidInput(format!(
                "{} is too short (at least {MIN_RESEARCH_LEN} characters)",
                self.research_path.display()
            )));
        }
        if self.stack.trim().chars().count() < MIN_STACK_LEN {
            return Err(VibecraftError::InvalidInput(format!(
                "{} is too short (at least {MIN_STACK_LEN} characters)",
                self.stack_path.display()
            )));
        }
        if !name_given && self.project_name().is_none() {
            return Err(VibecraftError::InvalidInput(format!(
                "no project name in {}: add a '# Title' or 'Project: <name>' line, or pass --name",
                self.research_path.display()
            )));
        }
        Ok(())
    }

    pub fn project_name(&self) -> Option<String> {
        extract_project_name(&self.research)
    }

    pub fn project_types(&self) -> Vec<String> {
        detect_project_types(&format!("{}\n{}", self.research, self.stack))
    }

    pub fn stack_entries(&self) -> BTreeMap<String, String> {
        parse_stack(&self.stack)
    }

    /// Copy both documents to `docs/research.md` and `docs/stack.md`,
    /// replacing earlier copies. Returns the destinations.
    pub fn copy_into(&self, root: &Path) -> Result<[PathBuf; 2]> {
        let research = root.join(paths::RESEARCH_DOC);
        let stack = root.join(paths::STACK_DOC);
        crate::io::atomic_write(&research, self.research.as_bytes())?;
        crate::io::atomic_write(&stack, self.stack.as_bytes())?;
        Ok([research, stack])
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// First markdown heading, or the value of the first `Project:` line,
/// whichever comes first.
pub fn extract_project_name(research: &str) -> Option<String> {
    for line in research.lines().map(str::trim) {
        if line.starts_with('#') {
            let title = line.trim_start_matches('#').trim();
            if !title.is_empty() {
                return Some(title.to_string());
            }
            continue;
        }
        let is_project_line = line
            .get(..8)
            .is_some_and(|p| p.eq_ignore_ascii_case("project:"));
        if is_project_line {
            let value = line[8..].trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Case-insensitive substring scan for [`PROJECT_TYPE_KEYWORDS`]. Falls
/// back to `["generic"]`.
pub fn detect_project_types(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let found: Vec<String> = PROJECT_TYPE_KEYWORDS
        .iter()
        .filter(|k| lower.contains(*k))
        .map(|k| k.to_string())
        .collect();
    if found.is_empty() {
        vec![GENERIC_PROJECT_TYPE.to_string()]
    } else {
        found
    }
}

/// `Key: value` lines, with any leading `#`, `*` or `-` markers removed.
/// Keys are lowercased with spaces turned into underscores. Later keys win.
pub fn parse_stack(stack: &str) -> BTreeMap<String, String> {
    stack
        .lines()
        .map(|l| l.trim().trim_start_matches(['#', '*', '-']).trim())
        .filter_map(|l| l.split_once(':'))
        .filter_map(|(k, v)| {
            let key = k.trim().to_lowercase().replace(' ', "_");
            let value = v.trim();
            (!key.is_empty() && !value.is_empty()).then(|| (key, value.to_string()))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
